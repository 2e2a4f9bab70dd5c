use std::collections::BTreeMap;

use tracing::debug;

use crate::context::EventData;
use crate::error::DashboardError;
use crate::models::{Alliance, NumericColumn, ScheduledMatch, ScoutedMatch, TeamAverages};

#[derive(Debug, Clone)]
pub struct AllianceRecord<'a> {
    pub alliance: Alliance,
    pub row: &'a ScoutedMatch,
}

impl AllianceRecord<'_> {
    pub fn team(&self) -> &str {
        &self.row.record.team_key
    }
}

/// Everything the alliance-based panels need for one scheduled match.
#[derive(Debug, Clone)]
pub struct AllianceView<'a> {
    pub match_number: u32,
    pub red: [String; 3],
    pub blue: [String; 3],
    /// Rows for the six teams, sorted by alliance label then team.
    pub records: Vec<AllianceRecord<'a>>,
    /// Per-team means for the six teams that have scouting rows.
    pub alliance_averages: Vec<TeamAverages>,
    /// Per-team means across the whole event.
    pub event_averages: Vec<TeamAverages>,
}

impl AllianceView<'_> {
    pub fn alliance_of(&self, team: &str) -> Alliance {
        if self.red.iter().any(|red| red == team) {
            Alliance::Red
        } else {
            Alliance::Blue
        }
    }

    pub fn color_of(&self, team: &str) -> &'static str {
        self.alliance_of(team).color()
    }

    /// Scheduled teams that have no scouting rows at all.
    pub fn unscouted(&self) -> Vec<String> {
        self.red
            .iter()
            .chain(self.blue.iter())
            .filter(|team| !self.alliance_averages.iter().any(|a| &a.team == *team))
            .cloned()
            .collect()
    }
}

/// Arithmetic mean of every numeric column, grouped by team. Teams without
/// rows never appear, so no mean is taken over an empty group.
pub fn average_by_team<'a, I>(rows: I) -> Vec<TeamAverages>
where
    I: IntoIterator<Item = &'a ScoutedMatch>,
{
    let mut sums: BTreeMap<String, (usize, [u64; NumericColumn::COUNT])> = BTreeMap::new();

    for row in rows {
        let entry = sums
            .entry(row.record.team_key.clone())
            .or_insert((0, [0; NumericColumn::COUNT]));
        entry.0 += 1;
        for column in NumericColumn::ALL {
            entry.1[column.index()] += u64::from(column.value(row));
        }
    }

    sums.into_iter()
        .map(|(team, (matches, totals))| TeamAverages {
            team,
            matches,
            values: totals.map(|total| total as f64 / matches as f64),
        })
        .collect()
}

pub fn resolve_match<'a>(
    data: &'a EventData,
    scheduled: &ScheduledMatch,
) -> AllianceView<'a> {
    let mut records: Vec<AllianceRecord<'a>> = data
        .scouting
        .rows
        .iter()
        .filter_map(|row| {
            scheduled
                .alliance_of(&row.record.team_key)
                .map(|alliance| AllianceRecord { alliance, row })
        })
        .collect();
    records.sort_by(|a, b| {
        a.alliance
            .label()
            .cmp(b.alliance.label())
            .then_with(|| a.team().cmp(b.team()))
    });

    let mut alliance_averages = average_by_team(records.iter().map(|record| record.row));
    let label = |team: &str| scheduled.alliance_of(team).map_or("", Alliance::label);
    alliance_averages.sort_by(|a, b| {
        label(&a.team)
            .cmp(label(&b.team))
            .then_with(|| a.team.cmp(&b.team))
    });

    debug!(
        match_number = scheduled.match_number,
        rows = records.len(),
        teams = alliance_averages.len(),
        "resolved alliance view"
    );

    AllianceView {
        match_number: scheduled.match_number,
        red: scheduled.red.clone(),
        blue: scheduled.blue.clone(),
        records,
        alliance_averages,
        event_averages: average_by_team(&data.scouting.rows),
    }
}

/// Resolves the alliances for the match at `index` in the loaded schedule.
pub fn resolve(data: &EventData, index: usize) -> Result<AllianceView<'_>, DashboardError> {
    let scheduled = data.schedule.get(index)?;
    Ok(resolve_match(data, scheduled))
}

/// Resolves the alliances for a match picked by its number in the dropdown.
pub fn resolve_number(data: &EventData, match_number: u32) -> Result<AllianceView<'_>, DashboardError> {
    let index = data.schedule.index_of(match_number)?;
    resolve(data, index)
}
