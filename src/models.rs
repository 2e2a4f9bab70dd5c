use std::fmt;

use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Length of the league prefix carried by team keys (`frc148`).
pub const TEAM_PREFIX_LEN: usize = 3;

/// Strips the league prefix from a team key. Keys that are already bare
/// (purely numeric, or shorter than the prefix) are returned unchanged.
pub fn strip_team_prefix(key: &str) -> String {
    let key = key.trim();
    let has_prefix = key.len() > TEAM_PREFIX_LEN
        && key
            .bytes()
            .take(TEAM_PREFIX_LEN)
            .all(|b| b.is_ascii_alphabetic());
    if has_prefix {
        key[TEAM_PREFIX_LEN..].to_string()
    } else {
        key.to_string()
    }
}

fn team_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(strip_team_prefix(&raw))
}

fn endgame_status<'de, D>(deserializer: D) -> Result<EndgameStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(EndgameStatus::parse).unwrap_or_default())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EndgameStatus {
    #[default]
    None,
    Parked,
    ShallowCage,
    DeepCage,
}

impl EndgameStatus {
    /// Statuses that earn points, in stacking order.
    pub const SCORED: [EndgameStatus; 3] = [
        EndgameStatus::Parked,
        EndgameStatus::ShallowCage,
        EndgameStatus::DeepCage,
    ];

    /// Parses a scouting-app label. Case and internal whitespace are not
    /// significant, so `"Deep  Cage"` and `"deep cage"` are the same status.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();

        match normalized.as_str() {
            "parked" | "park" => EndgameStatus::Parked,
            "shallow cage" | "shallow" => EndgameStatus::ShallowCage,
            "deep cage" | "deep" => EndgameStatus::DeepCage,
            "" | "none" | "nan" => EndgameStatus::None,
            other => {
                warn!(status = other, "unrecognised barge status, scoring as none");
                EndgameStatus::None
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EndgameStatus::None => "None",
            EndgameStatus::Parked => "Parked",
            EndgameStatus::ShallowCage => "Shallow Cage",
            EndgameStatus::DeepCage => "Deep Cage",
        }
    }
}

impl fmt::Display for EndgameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scouted (team, match) observation as it appears in the CSV export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScoutingRecord {
    #[serde(deserialize_with = "team_key")]
    pub team_key: String,
    #[serde(alias = "match_number")]
    pub match_key: String,
    #[serde(rename = "autoCoralL1")]
    pub auto_coral_l1: u32,
    #[serde(rename = "autoCoralL2")]
    pub auto_coral_l2: u32,
    #[serde(rename = "autoCoralL3")]
    pub auto_coral_l3: u32,
    #[serde(rename = "autoCoralL4")]
    pub auto_coral_l4: u32,
    #[serde(rename = "autoAlgaeNet")]
    pub auto_algae_net: u32,
    #[serde(rename = "autoAlgaeProc")]
    pub auto_algae_proc: u32,
    #[serde(rename = "teleopCoralL1")]
    pub teleop_coral_l1: u32,
    #[serde(rename = "teleopCoralL2")]
    pub teleop_coral_l2: u32,
    #[serde(rename = "teleopCoralL3")]
    pub teleop_coral_l3: u32,
    #[serde(rename = "teleopCoralL4")]
    pub teleop_coral_l4: u32,
    #[serde(rename = "teleopAlgaeNet")]
    pub teleop_algae_net: u32,
    #[serde(rename = "teleopAlgaeProc")]
    pub teleop_algae_proc: u32,
    #[serde(rename = "bargeStatus", default, deserialize_with = "endgame_status")]
    pub barge_status: EndgameStatus,
}

impl ScoutingRecord {
    pub fn auto_coral(&self) -> [u32; 4] {
        [
            self.auto_coral_l1,
            self.auto_coral_l2,
            self.auto_coral_l3,
            self.auto_coral_l4,
        ]
    }

    pub fn teleop_coral(&self) -> [u32; 4] {
        [
            self.teleop_coral_l1,
            self.teleop_coral_l2,
            self.teleop_coral_l3,
            self.teleop_coral_l4,
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedMetrics {
    pub total_auto_coral: u32,
    pub auto_coral_points: [u32; 4],
    pub total_auto_coral_points: u32,
    pub total_auto_algae_points: u32,
    pub total_auto_points: u32,
    pub algae_auto: u32,
    pub total_teleop_coral: u32,
    pub teleop_coral_points: [u32; 4],
    pub total_teleop_coral_points: u32,
    pub total_teleop_algae_points: u32,
    pub total_teleop_points: u32,
    pub algae_teleop: u32,
    pub endgame_points: u32,
    pub total_points_scored: u32,
}

/// A raw record together with the metrics derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoutedMatch {
    pub record: ScoutingRecord,
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledMatch {
    pub match_number: u32,
    pub red: [String; 3],
    pub blue: [String; 3],
}

impl ScheduledMatch {
    pub fn alliance_of(&self, team: &str) -> Option<Alliance> {
        if self.red.iter().any(|red| red == team) {
            Some(Alliance::Red)
        } else if self.blue.iter().any(|blue| blue == team) {
            Some(Alliance::Blue)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMatchStat {
    pub team: String,
    pub match_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Alliance {
    Blue,
    Red,
}

impl Alliance {
    pub fn label(self) -> &'static str {
        match self {
            Alliance::Blue => "Blue",
            Alliance::Red => "Red",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Alliance::Blue => "#1F77B4",
            Alliance::Red => "#FF5733",
        }
    }
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every numeric column that is averaged per team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericColumn {
    AutoCoralL1,
    AutoCoralL2,
    AutoCoralL3,
    AutoCoralL4,
    AutoAlgaeNet,
    AutoAlgaeProc,
    TeleopCoralL1,
    TeleopCoralL2,
    TeleopCoralL3,
    TeleopCoralL4,
    TeleopAlgaeNet,
    TeleopAlgaeProc,
    TotalAutoCoral,
    AutoCoralL1Points,
    AutoCoralL2Points,
    AutoCoralL3Points,
    AutoCoralL4Points,
    TotalAutoCoralPoints,
    TotalAutoAlgaePoints,
    TotalAutoPoints,
    AlgaeAuto,
    TotalTeleopCoral,
    TeleopCoralL1Points,
    TeleopCoralL2Points,
    TeleopCoralL3Points,
    TeleopCoralL4Points,
    TotalTeleopCoralPoints,
    TotalTeleopAlgaePoints,
    TotalTeleopPoints,
    AlgaeTeleop,
    EndgamePoints,
    TotalPointsScored,
}

impl NumericColumn {
    pub const COUNT: usize = 32;

    pub const ALL: [NumericColumn; NumericColumn::COUNT] = [
        NumericColumn::AutoCoralL1,
        NumericColumn::AutoCoralL2,
        NumericColumn::AutoCoralL3,
        NumericColumn::AutoCoralL4,
        NumericColumn::AutoAlgaeNet,
        NumericColumn::AutoAlgaeProc,
        NumericColumn::TeleopCoralL1,
        NumericColumn::TeleopCoralL2,
        NumericColumn::TeleopCoralL3,
        NumericColumn::TeleopCoralL4,
        NumericColumn::TeleopAlgaeNet,
        NumericColumn::TeleopAlgaeProc,
        NumericColumn::TotalAutoCoral,
        NumericColumn::AutoCoralL1Points,
        NumericColumn::AutoCoralL2Points,
        NumericColumn::AutoCoralL3Points,
        NumericColumn::AutoCoralL4Points,
        NumericColumn::TotalAutoCoralPoints,
        NumericColumn::TotalAutoAlgaePoints,
        NumericColumn::TotalAutoPoints,
        NumericColumn::AlgaeAuto,
        NumericColumn::TotalTeleopCoral,
        NumericColumn::TeleopCoralL1Points,
        NumericColumn::TeleopCoralL2Points,
        NumericColumn::TeleopCoralL3Points,
        NumericColumn::TeleopCoralL4Points,
        NumericColumn::TotalTeleopCoralPoints,
        NumericColumn::TotalTeleopAlgaePoints,
        NumericColumn::TotalTeleopPoints,
        NumericColumn::AlgaeTeleop,
        NumericColumn::EndgamePoints,
        NumericColumn::TotalPointsScored,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::AutoCoralL1 => "autoCoralL1",
            NumericColumn::AutoCoralL2 => "autoCoralL2",
            NumericColumn::AutoCoralL3 => "autoCoralL3",
            NumericColumn::AutoCoralL4 => "autoCoralL4",
            NumericColumn::AutoAlgaeNet => "autoAlgaeNet",
            NumericColumn::AutoAlgaeProc => "autoAlgaeProc",
            NumericColumn::TeleopCoralL1 => "teleopCoralL1",
            NumericColumn::TeleopCoralL2 => "teleopCoralL2",
            NumericColumn::TeleopCoralL3 => "teleopCoralL3",
            NumericColumn::TeleopCoralL4 => "teleopCoralL4",
            NumericColumn::TeleopAlgaeNet => "teleopAlgaeNet",
            NumericColumn::TeleopAlgaeProc => "teleopAlgaeProc",
            NumericColumn::TotalAutoCoral => "totalAutoCoral",
            NumericColumn::AutoCoralL1Points => "autoCoralL1Points",
            NumericColumn::AutoCoralL2Points => "autoCoralL2Points",
            NumericColumn::AutoCoralL3Points => "autoCoralL3Points",
            NumericColumn::AutoCoralL4Points => "autoCoralL4Points",
            NumericColumn::TotalAutoCoralPoints => "totalAutoCoralPoints",
            NumericColumn::TotalAutoAlgaePoints => "totalAutoAlgaePoints",
            NumericColumn::TotalAutoPoints => "totalAutoPoints",
            NumericColumn::AlgaeAuto => "algaeAuto",
            NumericColumn::TotalTeleopCoral => "totalTeleopCoral",
            NumericColumn::TeleopCoralL1Points => "teleopCoralL1Points",
            NumericColumn::TeleopCoralL2Points => "teleopCoralL2Points",
            NumericColumn::TeleopCoralL3Points => "teleopCoralL3Points",
            NumericColumn::TeleopCoralL4Points => "teleopCoralL4Points",
            NumericColumn::TotalTeleopCoralPoints => "totalTeleopCoralPoints",
            NumericColumn::TotalTeleopAlgaePoints => "totalTeleopAlgaePoints",
            NumericColumn::TotalTeleopPoints => "totalTeleopPoints",
            NumericColumn::AlgaeTeleop => "algaeTeleop",
            NumericColumn::EndgamePoints => "endgamePoints",
            NumericColumn::TotalPointsScored => "totalPointsScored",
        }
    }

    pub fn value(self, scouted: &ScoutedMatch) -> u32 {
        let r = &scouted.record;
        let m = &scouted.metrics;
        match self {
            NumericColumn::AutoCoralL1 => r.auto_coral_l1,
            NumericColumn::AutoCoralL2 => r.auto_coral_l2,
            NumericColumn::AutoCoralL3 => r.auto_coral_l3,
            NumericColumn::AutoCoralL4 => r.auto_coral_l4,
            NumericColumn::AutoAlgaeNet => r.auto_algae_net,
            NumericColumn::AutoAlgaeProc => r.auto_algae_proc,
            NumericColumn::TeleopCoralL1 => r.teleop_coral_l1,
            NumericColumn::TeleopCoralL2 => r.teleop_coral_l2,
            NumericColumn::TeleopCoralL3 => r.teleop_coral_l3,
            NumericColumn::TeleopCoralL4 => r.teleop_coral_l4,
            NumericColumn::TeleopAlgaeNet => r.teleop_algae_net,
            NumericColumn::TeleopAlgaeProc => r.teleop_algae_proc,
            NumericColumn::TotalAutoCoral => m.total_auto_coral,
            NumericColumn::AutoCoralL1Points => m.auto_coral_points[0],
            NumericColumn::AutoCoralL2Points => m.auto_coral_points[1],
            NumericColumn::AutoCoralL3Points => m.auto_coral_points[2],
            NumericColumn::AutoCoralL4Points => m.auto_coral_points[3],
            NumericColumn::TotalAutoCoralPoints => m.total_auto_coral_points,
            NumericColumn::TotalAutoAlgaePoints => m.total_auto_algae_points,
            NumericColumn::TotalAutoPoints => m.total_auto_points,
            NumericColumn::AlgaeAuto => m.algae_auto,
            NumericColumn::TotalTeleopCoral => m.total_teleop_coral,
            NumericColumn::TeleopCoralL1Points => m.teleop_coral_points[0],
            NumericColumn::TeleopCoralL2Points => m.teleop_coral_points[1],
            NumericColumn::TeleopCoralL3Points => m.teleop_coral_points[2],
            NumericColumn::TeleopCoralL4Points => m.teleop_coral_points[3],
            NumericColumn::TotalTeleopCoralPoints => m.total_teleop_coral_points,
            NumericColumn::TotalTeleopAlgaePoints => m.total_teleop_algae_points,
            NumericColumn::TotalTeleopPoints => m.total_teleop_points,
            NumericColumn::AlgaeTeleop => m.algae_teleop,
            NumericColumn::EndgamePoints => m.endgame_points,
            NumericColumn::TotalPointsScored => m.total_points_scored,
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamAverages {
    pub team: String,
    pub matches: usize,
    pub values: [f64; NumericColumn::COUNT],
}

impl TeamAverages {
    pub fn get(&self, column: NumericColumn) -> f64 {
        self.values[column.index()]
    }
}
