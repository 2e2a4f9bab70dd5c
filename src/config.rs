use std::path::PathBuf;

pub const SCOUTING_FILE: &str = "match_scouting.csv";
pub const SCHEDULE_FILE: &str = "tba_matches.json";
pub const TEAM_MATCHES_FILE: &str = "statbotics_matches.json";

/// Where one event's data lives and whose matches the filter switch picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
    pub data_dir: PathBuf,
    pub event_key: String,
    pub team_of_interest: Option<String>,
}

impl EventConfig {
    pub fn event_dir(&self) -> PathBuf {
        self.data_dir.join(&self.event_key)
    }

    pub fn scouting_path(&self) -> PathBuf {
        self.event_dir().join(SCOUTING_FILE)
    }

    pub fn schedule_path(&self) -> PathBuf {
        self.event_dir().join(SCHEDULE_FILE)
    }

    pub fn team_matches_path(&self) -> PathBuf {
        self.event_dir().join(TEAM_MATCHES_FILE)
    }
}
