use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("scouting table is missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("match index {index} is out of range for a schedule of {len} matches")]
    MatchIndexOutOfRange { index: usize, len: usize },

    #[error("match {number} is not in the loaded schedule")]
    UnknownMatch { number: u32 },

    #[error("schedule entry for match {match_number} is missing slot `{slot}`")]
    IncompleteMatch { match_number: u32, slot: String },

    #[error("scouting counters for team {team} in {match_key} are too large to score")]
    CounterOverflow { team: String, match_key: String },
}
