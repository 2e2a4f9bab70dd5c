use crate::error::DashboardError;
use crate::models::{DerivedMetrics, EndgameStatus, ScoutedMatch, ScoutingRecord};

pub const AUTO_CORAL_WEIGHTS: [u32; 4] = [3, 4, 6, 7];
pub const TELEOP_CORAL_WEIGHTS: [u32; 4] = [2, 3, 4, 5];
pub const ALGAE_NET_POINTS: u32 = 4;
pub const ALGAE_PROCESSOR_POINTS: u32 = 6;

pub fn endgame_points(status: EndgameStatus) -> u32 {
    match status {
        EndgameStatus::Parked => 2,
        EndgameStatus::ShallowCage => 6,
        EndgameStatus::DeepCage => 12,
        EndgameStatus::None => 0,
    }
}

/// Per-level coral points, or `None` if a count is too large to score.
pub fn coral_points(levels: [u32; 4], weights: [u32; 4]) -> Option<[u32; 4]> {
    let mut points = [0; 4];
    for (slot, (count, weight)) in points.iter_mut().zip(levels.into_iter().zip(weights)) {
        *slot = count.checked_mul(weight)?;
    }
    Some(points)
}

pub fn algae_points(net: u32, processor: u32) -> Option<u32> {
    net.checked_mul(ALGAE_NET_POINTS)?
        .checked_add(processor.checked_mul(ALGAE_PROCESSOR_POINTS)?)
}

fn sum(values: &[u32]) -> Option<u32> {
    values.iter().try_fold(0u32, |total, value| total.checked_add(*value))
}

fn checked_metrics(record: &ScoutingRecord) -> Option<DerivedMetrics> {
    let auto_coral = record.auto_coral();
    let auto_coral_points = coral_points(auto_coral, AUTO_CORAL_WEIGHTS)?;
    let total_auto_coral_points = sum(&auto_coral_points)?;
    let total_auto_algae_points = algae_points(record.auto_algae_net, record.auto_algae_proc)?;
    let total_auto_points = total_auto_coral_points.checked_add(total_auto_algae_points)?;

    let teleop_coral = record.teleop_coral();
    let teleop_coral_points = coral_points(teleop_coral, TELEOP_CORAL_WEIGHTS)?;
    let total_teleop_coral_points = sum(&teleop_coral_points)?;
    let total_teleop_algae_points =
        algae_points(record.teleop_algae_net, record.teleop_algae_proc)?;
    let total_teleop_points = total_teleop_coral_points.checked_add(total_teleop_algae_points)?;

    let endgame_points = endgame_points(record.barge_status);

    Some(DerivedMetrics {
        total_auto_coral: sum(&auto_coral)?,
        auto_coral_points,
        total_auto_coral_points,
        total_auto_algae_points,
        total_auto_points,
        algae_auto: record.auto_algae_net.checked_add(record.auto_algae_proc)?,
        total_teleop_coral: sum(&teleop_coral)?,
        teleop_coral_points,
        total_teleop_coral_points,
        total_teleop_algae_points,
        total_teleop_points,
        algae_teleop: record.teleop_algae_net.checked_add(record.teleop_algae_proc)?,
        endgame_points,
        total_points_scored: sum(&[total_auto_points, total_teleop_points, endgame_points])?,
    })
}

pub fn derive(record: &ScoutingRecord) -> Result<DerivedMetrics, DashboardError> {
    checked_metrics(record).ok_or_else(|| DashboardError::CounterOverflow {
        team: record.team_key.clone(),
        match_key: record.match_key.clone(),
    })
}

/// The loaded scouting export with derived metrics attached to every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoutingTable {
    pub rows: Vec<ScoutedMatch>,
}

impl ScoutingTable {
    pub fn from_records(records: Vec<ScoutingRecord>) -> Result<Self, DashboardError> {
        let mut table = ScoutingTable {
            rows: records
                .into_iter()
                .map(|record| ScoutedMatch {
                    record,
                    metrics: DerivedMetrics::default(),
                })
                .collect(),
        };
        table.derive_metrics()?;
        Ok(table)
    }

    /// Recomputes every row's metrics from its raw counters, replacing
    /// whatever was there before.
    pub fn derive_metrics(&mut self) -> Result<(), DashboardError> {
        for row in self.rows.iter_mut() {
            row.metrics = derive(&row.record)?;
        }
        Ok(())
    }

    pub fn teams(&self) -> Vec<String> {
        let mut teams: Vec<String> = self
            .rows
            .iter()
            .map(|row| row.record.team_key.clone())
            .collect();
        teams.sort();
        teams.dedup();
        teams
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(team: &str) -> ScoutingRecord {
        ScoutingRecord {
            team_key: team.to_string(),
            match_key: "qm1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn endgame_points_follow_status() {
        assert_eq!(endgame_points(EndgameStatus::DeepCage), 12);
        assert_eq!(endgame_points(EndgameStatus::ShallowCage), 6);
        assert_eq!(endgame_points(EndgameStatus::Parked), 2);
        assert_eq!(endgame_points(EndgameStatus::None), 0);
        assert_eq!(endgame_points(EndgameStatus::parse("Deep  Cage")), 12);
    }

    #[test]
    fn auto_coral_points_use_auto_weights() {
        let mut raw = record("148");
        raw.auto_coral_l1 = 1;
        raw.auto_coral_l2 = 2;
        let metrics = derive(&raw).unwrap();
        assert_eq!(metrics.total_auto_coral, 3);
        assert_eq!(metrics.auto_coral_points, [3, 8, 0, 0]);
        assert_eq!(metrics.total_auto_coral_points, 11);
    }

    #[test]
    fn teleop_algae_points_weight_net_and_processor() {
        let mut raw = record("148");
        raw.teleop_algae_net = 2;
        raw.teleop_algae_proc = 1;
        let metrics = derive(&raw).unwrap();
        assert_eq!(metrics.total_teleop_algae_points, 14);
        assert_eq!(metrics.algae_teleop, 3);
        assert_eq!(metrics.total_teleop_points, 14);
    }

    #[test]
    fn total_combines_every_phase() {
        let raw = ScoutingRecord {
            team_key: "3504".to_string(),
            match_key: "qm4".to_string(),
            auto_coral_l4: 1,
            auto_algae_net: 1,
            teleop_coral_l1: 2,
            teleop_coral_l4: 3,
            teleop_algae_proc: 1,
            barge_status: EndgameStatus::ShallowCage,
            ..Default::default()
        };
        let metrics = derive(&raw).unwrap();
        assert_eq!(metrics.total_auto_points, 7 + 4);
        assert_eq!(metrics.total_teleop_points, 4 + 15 + 6);
        assert_eq!(metrics.endgame_points, 6);
        assert_eq!(metrics.total_points_scored, 11 + 25 + 6);
    }

    #[test]
    fn rederiving_does_not_accumulate() {
        let mut raw = record("148");
        raw.teleop_coral_l3 = 4;
        raw.barge_status = EndgameStatus::DeepCage;
        let mut table = ScoutingTable::from_records(vec![raw]).unwrap();
        let first = table.rows[0].metrics;
        table.derive_metrics().unwrap();
        table.derive_metrics().unwrap();
        assert_eq!(table.rows[0].metrics, first);
        assert_eq!(first.total_points_scored, 16 + 12);
    }

    #[test]
    fn oversized_counter_is_rejected_with_its_row() {
        let mut raw = record("148");
        raw.auto_coral_l4 = 1_000_000_000;
        assert_eq!(
            derive(&raw),
            Err(DashboardError::CounterOverflow {
                team: "148".to_string(),
                match_key: "qm1".to_string(),
            })
        );

        let mut big = record("538");
        big.teleop_algae_net = u32::MAX / 8;
        big.teleop_algae_proc = u32::MAX / 8;
        assert!(ScoutingTable::from_records(vec![big]).is_err());
    }

    #[test]
    fn teams_are_sorted_and_unique() {
        let table = ScoutingTable::from_records(vec![record("538"), record("148"), record("538")])
            .unwrap();
        assert_eq!(table.teams(), vec!["148".to_string(), "538".to_string()]);
        assert_eq!(table.len(), 3);
    }

    fn status() -> impl Strategy<Value = EndgameStatus> {
        prop_oneof![
            Just(EndgameStatus::None),
            Just(EndgameStatus::Parked),
            Just(EndgameStatus::ShallowCage),
            Just(EndgameStatus::DeepCage),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_total_is_sum_of_phases(
            auto in proptest::array::uniform4(0u32..20),
            teleop in proptest::array::uniform4(0u32..20),
            algae in proptest::array::uniform4(0u32..10),
            barge in status(),
        ) {
            let raw = ScoutingRecord {
                team_key: "148".to_string(),
                match_key: "qm1".to_string(),
                auto_coral_l1: auto[0],
                auto_coral_l2: auto[1],
                auto_coral_l3: auto[2],
                auto_coral_l4: auto[3],
                auto_algae_net: algae[0],
                auto_algae_proc: algae[1],
                teleop_coral_l1: teleop[0],
                teleop_coral_l2: teleop[1],
                teleop_coral_l3: teleop[2],
                teleop_coral_l4: teleop[3],
                teleop_algae_net: algae[2],
                teleop_algae_proc: algae[3],
                barge_status: barge,
            };
            let metrics = derive(&raw).unwrap();

            let auto_expected = auto[0] * 3 + auto[1] * 4 + auto[2] * 6 + auto[3] * 7
                + algae[0] * 4 + algae[1] * 6;
            let teleop_expected = teleop[0] * 2 + teleop[1] * 3 + teleop[2] * 4 + teleop[3] * 5
                + algae[2] * 4 + algae[3] * 6;

            prop_assert_eq!(metrics.total_auto_points, auto_expected);
            prop_assert_eq!(metrics.total_teleop_points, teleop_expected);
            prop_assert_eq!(
                metrics.total_points_scored,
                metrics.total_auto_points + metrics.total_teleop_points + metrics.endgame_points
            );
            prop_assert_eq!(derive(&raw), Ok(metrics));
        }
    }
}
