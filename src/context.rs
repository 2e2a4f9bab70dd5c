use tracing::{info, warn};

use crate::config::EventConfig;
use crate::data::{self, MatchSchedule};
use crate::metrics::ScoutingTable;
use crate::models::{strip_team_prefix, TeamMatchStat};

/// Every table the dashboard reads, loaded once and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct EventData {
    pub event_key: String,
    pub scouting: ScoutingTable,
    pub schedule: MatchSchedule,
    pub team_matches: Vec<TeamMatchStat>,
    pub team_of_interest: Option<String>,
}

impl EventData {
    pub fn load(config: &EventConfig) -> anyhow::Result<Self> {
        info!(event = %config.event_key, dir = %config.event_dir().display(), "loading event data");

        let scouting = data::load_scouting(&config.scouting_path())?;
        let schedule = data::load_schedule(&config.schedule_path())?;
        let team_matches = data::load_team_matches(&config.team_matches_path())?;

        if scouting.is_empty() {
            warn!("scouting export has no rows; every chart will be empty");
        }
        if schedule.is_empty() {
            warn!("match schedule is empty; the match selector has no options");
        }

        Ok(EventData {
            event_key: config.event_key.clone(),
            scouting,
            schedule,
            team_matches,
            team_of_interest: config.team_of_interest.as_deref().map(strip_team_prefix),
        })
    }

    /// Match numbers offered by the selector: the whole schedule, or only
    /// the team of interest's matches when the filter switch is on.
    pub fn match_options(&self, ours_only: bool) -> Vec<u32> {
        if !ours_only {
            return self.schedule.match_numbers();
        }
        match &self.team_of_interest {
            Some(team) => data::matches_for_team(&self.team_matches, team),
            None => {
                warn!("no team of interest configured; filtered match list is empty");
                Vec::new()
            }
        }
    }
}
