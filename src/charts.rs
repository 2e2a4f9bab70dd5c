//! Figure specifications for the dashboard panels.
//!
//! Figures serialise to the plotly.js `{"data": [...], "layout": {...}}`
//! shape, so the page only has to hand them to `Plotly.react`. Every builder
//! is a pure function of an [`AllianceView`]; teams without scouting rows are
//! simply absent from the view and therefore from the figure.

use serde::Serialize;

use crate::alliance::{AllianceRecord, AllianceView};
use crate::models::{EndgameStatus, NumericColumn, TeamAverages};

const SEGMENT_LINE: &str = "white";
const TICK_FONT_SIZE: u32 = 14;
const MARKER_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Bar(BarTrace),
    Box(BoxTrace),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub text: Vec<String>,
    pub mode: &'static str,
    pub textposition: &'static str,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTrace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub name: String,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxTrace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub name: String,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    One(String),
    Each(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLine {
    pub color: &'static str,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: MarkerColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<MarkerLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: impl Into<String>) -> Self {
        Title { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticktext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickfont: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoryorder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoryarray: Option<Vec<String>>,
}

impl Axis {
    fn titled(text: impl Into<String>) -> Self {
        Axis {
            title: Some(Title::new(text)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    pub showlegend: bool,
}

/// Wraps each team id in a span coloured by its alliance.
pub fn alliance_tick_labels(view: &AllianceView<'_>, teams: &[String]) -> Vec<String> {
    teams
        .iter()
        .map(|team| format!("<span style='color:{}'>{}</span>", view.color_of(team), team))
        .collect()
}

fn team_axis(view: &AllianceView<'_>, teams: &[String]) -> Axis {
    Axis {
        title: Some(Title::new("Team")),
        tickmode: Some("array"),
        tickvals: Some(teams.to_vec()),
        ticktext: Some(alliance_tick_labels(view, teams)),
        tickfont: Some(Font {
            size: TICK_FONT_SIZE,
        }),
        categoryorder: Some("array"),
        categoryarray: Some(teams.to_vec()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterSpec {
    pub title: &'static str,
    pub x: NumericColumn,
    pub y: NumericColumn,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

pub const TELEOP_VS_AUTO_POINTS: ScatterSpec = ScatterSpec {
    title: "Teleop vs Auto Points",
    x: NumericColumn::TotalTeleopPoints,
    y: NumericColumn::TotalAutoPoints,
    x_label: "Avg Teleop Points",
    y_label: "Avg Auto Points",
};

pub const CORAL_VS_ALGAE_AUTO: ScatterSpec = ScatterSpec {
    title: "Coral vs Algae AUTO",
    x: NumericColumn::TotalAutoCoral,
    y: NumericColumn::AlgaeAuto,
    x_label: "Avg Coral Scored",
    y_label: "Avg Algae Scored",
};

pub const CORAL_VS_ALGAE_TELEOP: ScatterSpec = ScatterSpec {
    title: "Coral vs Algae TELEOP",
    x: NumericColumn::TotalTeleopCoral,
    y: NumericColumn::AlgaeTeleop,
    x_label: "Avg Coral Scored",
    y_label: "Avg Algae Scored",
};

/// One labelled point per team, coloured by alliance.
pub fn scatter(view: &AllianceView<'_>, spec: &ScatterSpec) -> Figure {
    let averages = &view.alliance_averages;
    let trace = ScatterTrace {
        x: averages.iter().map(|a| a.get(spec.x)).collect(),
        y: averages.iter().map(|a| a.get(spec.y)).collect(),
        text: averages.iter().map(|a| a.team.clone()).collect(),
        mode: "markers+text",
        textposition: "middle left",
        marker: Marker {
            color: MarkerColor::Each(
                averages
                    .iter()
                    .map(|a| view.color_of(&a.team).to_string())
                    .collect(),
            ),
            size: Some(MARKER_SIZE),
            symbol: Some("circle"),
            line: None,
        },
    };

    Figure {
        data: vec![Trace::Scatter(trace)],
        layout: Layout {
            title: Title::new(spec.title),
            xaxis: Axis::titled(spec.x_label),
            yaxis: Axis::titled(spec.y_label),
            barmode: None,
            legend: None,
            showlegend: false,
        },
    }
}

/// One box per team over its per-match total points, in alliance order.
pub fn total_points_box(view: &AllianceView<'_>) -> Figure {
    let mut traces: Vec<BoxTrace> = Vec::new();
    for record in &view.records {
        let team = record.team();
        let points = f64::from(record.row.metrics.total_points_scored);
        let same_team = traces.last().is_some_and(|trace| trace.name == team);
        if !same_team {
            traces.push(BoxTrace {
                x: Vec::new(),
                y: Vec::new(),
                name: team.to_string(),
                marker: Marker {
                    color: MarkerColor::One(record.alliance.color().to_string()),
                    size: None,
                    symbol: None,
                    line: None,
                },
            });
        }
        if let Some(trace) = traces.last_mut() {
            trace.x.push(team.to_string());
            trace.y.push(points);
        }
    }

    let teams: Vec<String> = traces.iter().map(|trace| trace.name.clone()).collect();
    Figure {
        data: traces.into_iter().map(Trace::Box).collect(),
        layout: Layout {
            title: Title::new("Total Points Distribution"),
            xaxis: team_axis(view, &teams),
            yaxis: Axis::titled(NumericColumn::TotalPointsScored.name()),
            barmode: None,
            legend: None,
            showlegend: true,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub color: &'static str,
    pub values: Vec<f64>,
}

/// Per-team values split into stacked segments; `values[i]` of every
/// segment belongs to `teams[i]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StackedRows {
    pub teams: Vec<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpec {
    pub column: NumericColumn,
    pub label: &'static str,
    pub color: &'static str,
}

const CORAL_COLORS: [&str; 4] = ["#9BE3DF", "#F7898A", "#FACE9F", "#FFE493"];

const fn segment(column: NumericColumn, label: &'static str, color: &'static str) -> SegmentSpec {
    SegmentSpec {
        column,
        label,
        color,
    }
}

const fn coral_segments(columns: [NumericColumn; 4]) -> [SegmentSpec; 4] {
    [
        segment(columns[0], "Coral L1", CORAL_COLORS[0]),
        segment(columns[1], "Coral L2", CORAL_COLORS[1]),
        segment(columns[2], "Coral L3", CORAL_COLORS[2]),
        segment(columns[3], "Coral L4", CORAL_COLORS[3]),
    ]
}

pub const AUTO_CORAL_LEVELS: [SegmentSpec; 4] = coral_segments([
    NumericColumn::AutoCoralL1,
    NumericColumn::AutoCoralL2,
    NumericColumn::AutoCoralL3,
    NumericColumn::AutoCoralL4,
]);

pub const AUTO_CORAL_LEVEL_POINTS: [SegmentSpec; 4] = coral_segments([
    NumericColumn::AutoCoralL1Points,
    NumericColumn::AutoCoralL2Points,
    NumericColumn::AutoCoralL3Points,
    NumericColumn::AutoCoralL4Points,
]);

pub const TELEOP_CORAL_LEVELS: [SegmentSpec; 4] = coral_segments([
    NumericColumn::TeleopCoralL1,
    NumericColumn::TeleopCoralL2,
    NumericColumn::TeleopCoralL3,
    NumericColumn::TeleopCoralL4,
]);

pub const TELEOP_CORAL_LEVEL_POINTS: [SegmentSpec; 4] = coral_segments([
    NumericColumn::TeleopCoralL1Points,
    NumericColumn::TeleopCoralL2Points,
    NumericColumn::TeleopCoralL3Points,
    NumericColumn::TeleopCoralL4Points,
]);

pub const TELEOP_ALGAE_LOCATIONS: [SegmentSpec; 2] = [
    segment(NumericColumn::TeleopAlgaeNet, "Net", "#83DCDD"),
    segment(NumericColumn::TeleopAlgaeProc, "Processor", "#FFB480"),
];

const ENDGAME_COLORS: [&str; 3] = ["#EB89B5", "#FFD7E9", "#FFF2AF"];

pub fn averaged_rows(averages: &[TeamAverages], segments: &[SegmentSpec]) -> StackedRows {
    StackedRows {
        teams: averages.iter().map(|a| a.team.clone()).collect(),
        segments: segments
            .iter()
            .map(|spec| Segment {
                label: spec.label.to_string(),
                color: spec.color,
                values: averages.iter().map(|a| a.get(spec.column)).collect(),
            })
            .collect(),
    }
}

/// Counts of each scoring endgame status per team. Records must already be
/// grouped by team, as [`AllianceView::records`] is.
pub fn endgame_rows(records: &[AllianceRecord<'_>]) -> StackedRows {
    let mut teams: Vec<String> = Vec::new();
    let mut counts: Vec<[usize; 3]> = Vec::new();

    for record in records {
        if teams.last().map(String::as_str) != Some(record.team()) {
            teams.push(record.team().to_string());
            counts.push([0; 3]);
        }
        let status = record.row.record.barge_status;
        if let Some(slot) = EndgameStatus::SCORED.iter().position(|s| *s == status) {
            if let Some(team_counts) = counts.last_mut() {
                team_counts[slot] += 1;
            }
        }
    }

    StackedRows {
        teams,
        segments: EndgameStatus::SCORED
            .iter()
            .enumerate()
            .map(|(slot, status)| Segment {
                label: status.label().to_string(),
                color: ENDGAME_COLORS[slot],
                values: counts.iter().map(|team| team[slot] as f64).collect(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLabels {
    pub title: &'static str,
    pub y_title: &'static str,
    pub legend_title: &'static str,
}

/// One trace per segment stacked per team, tick labels coloured by alliance.
pub fn stacked_bar(view: &AllianceView<'_>, rows: &StackedRows, labels: &BarLabels) -> Figure {
    let data = rows
        .segments
        .iter()
        .map(|segment| {
            Trace::Bar(BarTrace {
                x: rows.teams.clone(),
                y: segment.values.clone(),
                name: segment.label.clone(),
                marker: Marker {
                    color: MarkerColor::One(segment.color.to_string()),
                    size: None,
                    symbol: None,
                    line: Some(MarkerLine {
                        color: SEGMENT_LINE,
                        width: 1,
                    }),
                },
            })
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Title::new(labels.title),
            xaxis: team_axis(view, &rows.teams),
            yaxis: Axis::titled(labels.y_title),
            barmode: Some("stack"),
            legend: Some(Legend {
                title: Title::new(labels.legend_title),
            }),
            showlegend: true,
        },
    }
}

/// The all-teams averages laid out for on-screen display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn summary_table(averages: &[TeamAverages], columns: &[NumericColumn]) -> SummaryTable {
    let mut header = vec!["team_key".to_string(), "matches".to_string()];
    header.extend(columns.iter().map(|column| column.name().to_string()));

    let rows = averages
        .iter()
        .map(|team| {
            let mut row = vec![team.team.clone(), team.matches.to_string()];
            row.extend(columns.iter().map(|column| format!("{:.2}", team.get(*column))));
            row
        })
        .collect();

    SummaryTable {
        columns: header,
        rows,
    }
}
