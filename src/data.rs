use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::DashboardError;
use crate::metrics::ScoutingTable;
use crate::models::{strip_team_prefix, ScheduledMatch, ScoutingRecord, TeamMatchStat};

/// Raw scouting columns that must be present in the export header.
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "team_key",
    "autoCoralL1",
    "autoCoralL2",
    "autoCoralL3",
    "autoCoralL4",
    "autoAlgaeNet",
    "autoAlgaeProc",
    "teleopCoralL1",
    "teleopCoralL2",
    "teleopCoralL3",
    "teleopCoralL4",
    "teleopAlgaeNet",
    "teleopAlgaeProc",
    "bargeStatus",
];

/// Any one of these identifies the match a row was scouted in.
pub const MATCH_COLUMNS: [&str; 2] = ["match_key", "match_number"];

pub fn check_columns(headers: &csv::StringRecord) -> Result<(), DashboardError> {
    let present = |name: &str| headers.iter().any(|header| header.trim() == name);

    if let Some(column) = REQUIRED_COLUMNS.iter().find(|column| !present(column)) {
        return Err(DashboardError::MissingColumn {
            column: column.to_string(),
        });
    }
    if !MATCH_COLUMNS.iter().any(|column| present(column)) {
        return Err(DashboardError::MissingColumn {
            column: MATCH_COLUMNS[0].to_string(),
        });
    }
    Ok(())
}

/// When an export carries both match columns, `match_number` is renamed out
/// of the way so that only `match_key` feeds the record.
fn single_match_column(headers: &csv::StringRecord) -> csv::StringRecord {
    let has_key = headers.iter().any(|header| header == MATCH_COLUMNS[0]);
    headers
        .iter()
        .map(|header| {
            if has_key && header == MATCH_COLUMNS[1] {
                "unused_match_number"
            } else {
                header
            }
        })
        .collect()
}

pub fn read_scouting<R: std::io::Read>(reader: R) -> anyhow::Result<ScoutingTable> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    check_columns(&headers)?;
    reader.set_headers(single_match_column(&headers));

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<ScoutingRecord>().enumerate() {
        let record = result.with_context(|| format!("invalid scouting row {}", line + 1))?;
        records.push(record);
    }

    Ok(ScoutingTable::from_records(records)?)
}

pub fn load_scouting(path: &Path) -> anyhow::Result<ScoutingTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open scouting data {}", path.display()))?;
    let table = read_scouting(file)
        .with_context(|| format!("failed to load scouting data {}", path.display()))?;
    info!(rows = table.len(), teams = table.teams().len(), "loaded scouting data");
    Ok(table)
}

#[derive(Debug, Deserialize)]
struct AllianceKeys {
    team_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TbaAlliances {
    red: AllianceKeys,
    blue: AllianceKeys,
}

#[derive(Debug, Deserialize)]
struct TbaMatch {
    match_number: u32,
    #[serde(default)]
    comp_level: Option<String>,
    alliances: TbaAlliances,
}

#[derive(Debug, Deserialize)]
struct FlatMatch {
    match_number: u32,
    red1: Option<String>,
    red2: Option<String>,
    red3: Option<String>,
    blue1: Option<String>,
    blue2: Option<String>,
    blue3: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScheduleEntry {
    Tba(TbaMatch),
    Flat(FlatMatch),
}

fn fill_slots(
    match_number: u32,
    color: &str,
    keys: [Option<&String>; 3],
) -> Result<[String; 3], DashboardError> {
    let mut teams: [String; 3] = Default::default();
    for (position, (slot, key)) in teams.iter_mut().zip(keys).enumerate() {
        let key = key.ok_or_else(|| DashboardError::IncompleteMatch {
            match_number,
            slot: format!("{color}{}", position + 1),
        })?;
        *slot = strip_team_prefix(key);
    }
    Ok(teams)
}

impl ScheduleEntry {
    fn is_qualification(&self) -> bool {
        match self {
            ScheduleEntry::Tba(tba) => tba.comp_level.as_deref().map_or(true, |level| level == "qm"),
            ScheduleEntry::Flat(_) => true,
        }
    }

    fn into_match(self) -> Result<ScheduledMatch, DashboardError> {
        match self {
            ScheduleEntry::Tba(tba) => {
                let red = &tba.alliances.red.team_keys;
                let blue = &tba.alliances.blue.team_keys;
                Ok(ScheduledMatch {
                    match_number: tba.match_number,
                    red: fill_slots(tba.match_number, "red", [red.first(), red.get(1), red.get(2)])?,
                    blue: fill_slots(
                        tba.match_number,
                        "blue",
                        [blue.first(), blue.get(1), blue.get(2)],
                    )?,
                })
            }
            ScheduleEntry::Flat(flat) => Ok(ScheduledMatch {
                match_number: flat.match_number,
                red: fill_slots(
                    flat.match_number,
                    "red",
                    [flat.red1.as_ref(), flat.red2.as_ref(), flat.red3.as_ref()],
                )?,
                blue: fill_slots(
                    flat.match_number,
                    "blue",
                    [flat.blue1.as_ref(), flat.blue2.as_ref(), flat.blue3.as_ref()],
                )?,
            }),
        }
    }
}

/// Qualification schedule ordered by match number; indexable by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSchedule {
    pub matches: Vec<ScheduledMatch>,
}

impl MatchSchedule {
    pub fn get(&self, index: usize) -> Result<&ScheduledMatch, DashboardError> {
        self.matches
            .get(index)
            .ok_or(DashboardError::MatchIndexOutOfRange {
                index,
                len: self.matches.len(),
            })
    }

    pub fn index_of(&self, match_number: u32) -> Result<usize, DashboardError> {
        self.matches
            .iter()
            .position(|scheduled| scheduled.match_number == match_number)
            .ok_or(DashboardError::UnknownMatch {
                number: match_number,
            })
    }

    pub fn match_numbers(&self) -> Vec<u32> {
        self.matches.iter().map(|scheduled| scheduled.match_number).collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

pub fn parse_schedule(json: &str) -> anyhow::Result<MatchSchedule> {
    let entries: Vec<ScheduleEntry> =
        serde_json::from_str(json).context("match schedule is not a JSON array of matches")?;

    let mut matches = Vec::new();
    for entry in entries {
        if !entry.is_qualification() {
            continue;
        }
        matches.push(entry.into_match()?);
    }
    matches.sort_by_key(|scheduled| scheduled.match_number);

    Ok(MatchSchedule { matches })
}

pub fn load_schedule(path: &Path) -> anyhow::Result<MatchSchedule> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read match schedule {}", path.display()))?;
    let schedule = parse_schedule(&json)
        .with_context(|| format!("failed to load match schedule {}", path.display()))?;
    info!(matches = schedule.len(), "loaded match schedule");
    Ok(schedule)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TeamId {
    Number(u64),
    Text(String),
}

impl TeamId {
    fn into_key(self) -> String {
        match self {
            TeamId::Number(number) => number.to_string(),
            TeamId::Text(text) => strip_team_prefix(&text),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTeamMatch {
    team: TeamId,
    #[serde(default)]
    match_number: Option<u32>,
    #[serde(rename = "match", default)]
    match_key: Option<String>,
}

/// Pulls the qualification number out of a key such as `2025txwac_qm12`.
pub fn match_number_from_key(key: &str) -> Option<u32> {
    let (_, level) = key.rsplit_once('_')?;
    level.strip_prefix("qm")?.parse().ok()
}

pub fn parse_team_matches(json: &str) -> anyhow::Result<Vec<TeamMatchStat>> {
    let raw: Vec<RawTeamMatch> =
        serde_json::from_str(json).context("team match stats are not a JSON array")?;

    let mut stats = Vec::with_capacity(raw.len());
    for entry in raw {
        let match_number = entry
            .match_number
            .or_else(|| entry.match_key.as_deref().and_then(match_number_from_key));
        let Some(match_number) = match_number else {
            debug!(key = ?entry.match_key, "skipping non-qualification team match");
            continue;
        };
        stats.push(TeamMatchStat {
            team: entry.team.into_key(),
            match_number,
        });
    }
    Ok(stats)
}

pub fn load_team_matches(path: &Path) -> anyhow::Result<Vec<TeamMatchStat>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read team match stats {}", path.display()))?;
    let stats = parse_team_matches(&json)
        .with_context(|| format!("failed to load team match stats {}", path.display()))?;
    info!(entries = stats.len(), "loaded team match stats");
    Ok(stats)
}

pub fn matches_for_team(stats: &[TeamMatchStat], team: &str) -> Vec<u32> {
    let team = strip_team_prefix(team);
    let mut numbers: Vec<u32> = stats
        .iter()
        .filter(|stat| stat.team == team)
        .map(|stat| stat.match_number)
        .collect();
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EndgameStatus;
    use std::io::Write;

    const HEADER: &str = "team_key,match_key,autoCoralL1,autoCoralL2,autoCoralL3,autoCoralL4,autoAlgaeNet,autoAlgaeProc,teleopCoralL1,teleopCoralL2,teleopCoralL3,teleopCoralL4,teleopAlgaeNet,teleopAlgaeProc,bargeStatus";

    #[test]
    fn reads_scouting_rows_and_derives_metrics() {
        let csv = format!(
            "{HEADER}\nfrc148,qm1,1,2,0,0,0,0,0,0,0,1,2,1,Deep  Cage\nfrc538,qm1,0,0,0,0,0,0,0,0,0,0,0,0,\n"
        );
        let table = read_scouting(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.rows[0];
        assert_eq!(first.record.team_key, "148");
        assert_eq!(first.record.barge_status, EndgameStatus::DeepCage);
        assert_eq!(first.metrics.total_auto_coral_points, 11);
        assert_eq!(first.metrics.total_teleop_algae_points, 14);
        assert_eq!(first.metrics.endgame_points, 12);
        assert_eq!(table.rows[1].record.barge_status, EndgameStatus::None);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let csv = HEADER.replace(",autoAlgaeProc", "") + "\n";
        let err = read_scouting(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DashboardError>(),
            Some(&DashboardError::MissingColumn {
                column: "autoAlgaeProc".to_string()
            })
        );
    }

    #[test]
    fn match_number_column_is_accepted() {
        let csv = format!(
            "{}\nfrc148,7,0,0,0,0,0,0,0,0,0,0,0,0,Parked\n",
            HEADER.replace("match_key", "match_number")
        );
        let table = read_scouting(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].record.match_key, "7");
    }

    #[test]
    fn both_match_columns_prefer_match_key() {
        let csv = format!(
            "{}\nfrc148,qm7,7,0,0,0,0,0,0,0,0,0,0,0,0,Parked\n",
            HEADER.replace("match_key", "match_key,match_number")
        );
        let table = read_scouting(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].record.match_key, "qm7");
        assert_eq!(table.rows[0].metrics.endgame_points, 2);
    }

    #[test]
    fn oversized_counter_fails_the_load() {
        let csv = format!("{HEADER}\nfrc148,qm1,0,0,0,1000000000,0,0,0,0,0,0,0,0,Parked\n");
        let err = read_scouting(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::CounterOverflow { team, .. }) if team == "148"
        ));
    }

    #[test]
    fn loads_scouting_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "frc3504,qm2,0,0,0,1,0,0,0,0,0,0,0,0,Shallow Cage").unwrap();
        let table = load_scouting(file.path()).unwrap();
        assert_eq!(table.rows[0].metrics.total_points_scored, 7 + 6);
    }

    #[test]
    fn flat_schedule_strips_prefixes_and_sorts() {
        let json = r#"[
            {"match_number": 2, "red1": "frc1", "red2": "frc2", "red3": "frc3",
             "blue1": "frc4", "blue2": "frc5", "blue3": "frc6"},
            {"match_number": 1, "red1": "frc148", "red2": "frc538", "red3": "frc3504",
             "blue1": "frc4467", "blue2": "frc10101", "blue3": "frc5045"}
        ]"#;
        let schedule = parse_schedule(json).unwrap();
        assert_eq!(schedule.match_numbers(), vec![1, 2]);
        let first = schedule.get(0).unwrap();
        assert_eq!(first.red, ["148", "538", "3504"].map(String::from));
        assert_eq!(first.blue, ["4467", "10101", "5045"].map(String::from));
    }

    #[test]
    fn tba_schedule_keeps_qualifications_only() {
        let json = r#"[
            {"match_number": 1, "comp_level": "sf",
             "alliances": {"red": {"team_keys": ["frc1","frc2","frc3"]},
                           "blue": {"team_keys": ["frc4","frc5","frc6"]}}},
            {"match_number": 3, "comp_level": "qm",
             "alliances": {"red": {"team_keys": ["frc7","frc8","frc9"]},
                           "blue": {"team_keys": ["frc10","frc11","frc12"]}}}
        ]"#;
        let schedule = parse_schedule(json).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.get(0).unwrap().match_number, 3);
        assert_eq!(schedule.index_of(3), Ok(0));
        assert_eq!(schedule.index_of(1), Err(DashboardError::UnknownMatch { number: 1 }));
    }

    #[test]
    fn incomplete_match_names_missing_slot() {
        let json = r#"[{"match_number": 5, "red1": "frc1", "red2": "frc2", "red3": "frc3",
                        "blue1": "frc4", "blue2": "frc5"}]"#;
        let err = parse_schedule(json).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DashboardError>(),
            Some(&DashboardError::IncompleteMatch {
                match_number: 5,
                slot: "blue3".to_string()
            })
        );
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let schedule = MatchSchedule::default();
        assert_eq!(
            schedule.get(4),
            Err(DashboardError::MatchIndexOutOfRange { index: 4, len: 0 })
        );
    }

    #[test]
    fn team_matches_accept_numbers_and_keys() {
        let json = r#"[
            {"team": 148, "match": "2025txwac_qm12", "alliance": "red"},
            {"team": "frc148", "match_number": 3},
            {"team": 148, "match": "2025txwac_sf1m1"},
            {"team": 538, "match": "2025txwac_qm4"},
            {"team": 148, "match": "2025txwac_qm3"}
        ]"#;
        let stats = parse_team_matches(json).unwrap();
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].team, "148");
        assert_eq!(matches_for_team(&stats, "148"), vec![3, 12]);
        assert_eq!(matches_for_team(&stats, "frc538"), vec![4]);
        assert!(matches_for_team(&stats, "254").is_empty());
    }

    #[test]
    fn match_key_parsing() {
        assert_eq!(match_number_from_key("2025txwac_qm12"), Some(12));
        assert_eq!(match_number_from_key("2025txwac_f1m1"), None);
        assert_eq!(match_number_from_key("qm12"), None);
    }
}
