//! Control state and recompute-on-change wiring for the dashboard panels.
//!
//! Each panel declares the controls it reads. When a control changes, the
//! dashboard re-renders exactly the panels that depend on it and reports
//! which ones were refreshed.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::alliance::{self, AllianceView};
use crate::charts::{self, BarLabels, Figure, SummaryTable};
use crate::context::EventData;
use crate::models::NumericColumn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Control {
    OurMatchesSwitch,
    MatchSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tab {
    FilterMatches,
    General,
    Auto,
    Teleop,
    Endgame,
    AllianceSelection,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::FilterMatches,
        Tab::General,
        Tab::Auto,
        Tab::Teleop,
        Tab::Endgame,
        Tab::AllianceSelection,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::FilterMatches => "Filter Matches",
            Tab::General => "General Data",
            Tab::Auto => "Auto Data",
            Tab::Teleop => "Teleop Data",
            Tab::Endgame => "Endgame Data",
            Tab::AllianceSelection => "Alliance Selection",
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Tab::FilterMatches => "filter",
            Tab::General => "general",
            Tab::Auto => "auto",
            Tab::Teleop => "teleop",
            Tab::Endgame => "endgame",
            Tab::AllianceSelection => "alliance-selection",
        }
    }

    pub fn panels(self) -> impl Iterator<Item = PanelId> {
        PanelId::ALL.into_iter().filter(move |panel| panel.tab() == self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PanelId {
    MatchList,
    TeleopAutoPointsScatter,
    TotalPointsBoxplot,
    CoralAlgaeAutoScatter,
    CoralLevelDistributionAutoBar,
    CoralPointDistributionAutoBar,
    CoralAlgaeTeleopScatter,
    NetProcessorTeleop,
    CoralLevelDistributionTeleopBar,
    CoralPointDistributionTeleopBar,
    EndgameBar,
    KeyStatsTable,
}

impl PanelId {
    pub const ALL: [PanelId; 12] = [
        PanelId::MatchList,
        PanelId::TeleopAutoPointsScatter,
        PanelId::TotalPointsBoxplot,
        PanelId::CoralAlgaeAutoScatter,
        PanelId::CoralLevelDistributionAutoBar,
        PanelId::CoralPointDistributionAutoBar,
        PanelId::CoralAlgaeTeleopScatter,
        PanelId::NetProcessorTeleop,
        PanelId::CoralLevelDistributionTeleopBar,
        PanelId::CoralPointDistributionTeleopBar,
        PanelId::EndgameBar,
        PanelId::KeyStatsTable,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PanelId::MatchList => "match_list",
            PanelId::TeleopAutoPointsScatter => "teleop_auto_points_scatter",
            PanelId::TotalPointsBoxplot => "total_points_boxplot",
            PanelId::CoralAlgaeAutoScatter => "coral_algae_auto_scatter",
            PanelId::CoralLevelDistributionAutoBar => "coral_level_distribution_auto_bar",
            PanelId::CoralPointDistributionAutoBar => "coral_point_distribution_auto_bar",
            PanelId::CoralAlgaeTeleopScatter => "coral_algae_teleop_scatter",
            PanelId::NetProcessorTeleop => "net_processor_teleop",
            PanelId::CoralLevelDistributionTeleopBar => "coral_level_distribution_teleop_bar",
            PanelId::CoralPointDistributionTeleopBar => "coral_point_distribution_teleop_bar",
            PanelId::EndgameBar => "endgame_bar",
            PanelId::KeyStatsTable => "key_stats_table",
        }
    }

    pub fn tab(self) -> Tab {
        match self {
            PanelId::MatchList => Tab::FilterMatches,
            PanelId::TeleopAutoPointsScatter | PanelId::TotalPointsBoxplot => Tab::General,
            PanelId::CoralAlgaeAutoScatter
            | PanelId::CoralLevelDistributionAutoBar
            | PanelId::CoralPointDistributionAutoBar => Tab::Auto,
            PanelId::CoralAlgaeTeleopScatter
            | PanelId::NetProcessorTeleop
            | PanelId::CoralLevelDistributionTeleopBar
            | PanelId::CoralPointDistributionTeleopBar => Tab::Teleop,
            PanelId::EndgameBar => Tab::Endgame,
            PanelId::KeyStatsTable => Tab::AllianceSelection,
        }
    }

    pub fn depends_on(self) -> &'static [Control] {
        match self {
            PanelId::MatchList => &[Control::OurMatchesSwitch],
            PanelId::KeyStatsTable => &[],
            _ => &[Control::MatchSelect],
        }
    }

    pub fn is_chart(self) -> bool {
        self.depends_on().contains(&Control::MatchSelect)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchList {
    pub ours_only: bool,
    pub options: Vec<u32>,
    pub selected: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PanelOutput {
    Figure(Figure),
    Table(SummaryTable),
    MatchList(MatchList),
    Message(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub ours_only: bool,
    pub selected_match: Option<u32>,
}

fn render_chart(panel: PanelId, view: &AllianceView<'_>) -> Option<Figure> {
    let figure = match panel {
        PanelId::TeleopAutoPointsScatter => charts::scatter(view, &charts::TELEOP_VS_AUTO_POINTS),
        PanelId::TotalPointsBoxplot => charts::total_points_box(view),
        PanelId::CoralAlgaeAutoScatter => charts::scatter(view, &charts::CORAL_VS_ALGAE_AUTO),
        PanelId::CoralLevelDistributionAutoBar => charts::stacked_bar(
            view,
            &charts::averaged_rows(&view.alliance_averages, &charts::AUTO_CORAL_LEVELS),
            &BarLabels {
                title: "Coral Level Distribution Auto",
                y_title: "Avg Coral in L1, L2, L3, L4",
                legend_title: "Coral Levels",
            },
        ),
        PanelId::CoralPointDistributionAutoBar => charts::stacked_bar(
            view,
            &charts::averaged_rows(&view.alliance_averages, &charts::AUTO_CORAL_LEVEL_POINTS),
            &BarLabels {
                title: "Coral Point Distribution by Level Auto",
                y_title: "Avg Coral Points in L1, L2, L3, L4",
                legend_title: "Coral Levels",
            },
        ),
        PanelId::CoralAlgaeTeleopScatter => charts::scatter(view, &charts::CORAL_VS_ALGAE_TELEOP),
        PanelId::NetProcessorTeleop => charts::stacked_bar(
            view,
            &charts::averaged_rows(&view.alliance_averages, &charts::TELEOP_ALGAE_LOCATIONS),
            &BarLabels {
                title: "Algae in Processor and Net TELEOP",
                y_title: "Avg Algae in Net / Processor",
                legend_title: "Algae Type",
            },
        ),
        PanelId::CoralLevelDistributionTeleopBar => charts::stacked_bar(
            view,
            &charts::averaged_rows(&view.alliance_averages, &charts::TELEOP_CORAL_LEVELS),
            &BarLabels {
                title: "Coral Level Distribution Teleop",
                y_title: "Avg Coral in L1, L2, L3, L4",
                legend_title: "Coral Levels",
            },
        ),
        PanelId::CoralPointDistributionTeleopBar => charts::stacked_bar(
            view,
            &charts::averaged_rows(&view.alliance_averages, &charts::TELEOP_CORAL_LEVEL_POINTS),
            &BarLabels {
                title: "Coral Point Distribution by Level Teleop",
                y_title: "Avg Coral Points in L1, L2, L3, L4",
                legend_title: "Coral Levels",
            },
        ),
        PanelId::EndgameBar => charts::stacked_bar(
            view,
            &charts::endgame_rows(&view.records),
            &BarLabels {
                title: "Endgame Status",
                y_title: "Matches",
                legend_title: "Status Levels",
            },
        ),
        PanelId::MatchList | PanelId::KeyStatsTable => return None,
    };
    Some(figure)
}

pub struct Dashboard<'a> {
    data: &'a EventData,
    state: ControlState,
    outputs: BTreeMap<PanelId, PanelOutput>,
}

impl<'a> Dashboard<'a> {
    /// Builds the dashboard with the switch off and the first scheduled
    /// match selected, rendering every panel once.
    pub fn new(data: &'a EventData) -> Self {
        let mut dashboard = Dashboard {
            data,
            state: ControlState {
                ours_only: false,
                selected_match: data.match_options(false).first().copied(),
            },
            outputs: BTreeMap::new(),
        };
        for panel in PanelId::ALL {
            let output = dashboard.render(panel);
            dashboard.outputs.insert(panel, output);
        }
        dashboard
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn output(&self, panel: PanelId) -> Option<&PanelOutput> {
        self.outputs.get(&panel)
    }

    pub fn options(&self) -> Vec<u32> {
        self.data.match_options(self.state.ours_only)
    }

    /// Flips the "our matches" switch. If the current selection is not in
    /// the new option list, the first option is selected instead.
    pub fn set_ours_only(&mut self, ours_only: bool) -> Vec<PanelId> {
        if self.state.ours_only == ours_only {
            return Vec::new();
        }
        self.state.ours_only = ours_only;
        let mut changed = vec![Control::OurMatchesSwitch];

        let options = self.options();
        let still_offered = self
            .state
            .selected_match
            .is_some_and(|selected| options.contains(&selected));
        if !still_offered {
            let first = options.first().copied();
            if first != self.state.selected_match {
                self.state.selected_match = first;
                changed.push(Control::MatchSelect);
            }
        }

        self.invalidate(&changed)
    }

    pub fn select_match(&mut self, match_number: u32) -> Vec<PanelId> {
        if self.state.selected_match == Some(match_number) {
            return Vec::new();
        }
        self.state.selected_match = Some(match_number);
        self.invalidate(&[Control::MatchSelect])
    }

    fn invalidate(&mut self, changed: &[Control]) -> Vec<PanelId> {
        let stale: Vec<PanelId> = PanelId::ALL
            .into_iter()
            .filter(|panel| panel.depends_on().iter().any(|c| changed.contains(c)))
            .collect();

        let view = if stale.iter().any(|panel| panel.is_chart()) {
            Some(self.resolve())
        } else {
            None
        };

        for panel in &stale {
            let output = match (&view, panel.is_chart()) {
                (Some(Ok(view)), true) => render_chart(*panel, view)
                    .map(PanelOutput::Figure)
                    .unwrap_or_else(|| self.render(*panel)),
                (Some(Err(message)), true) => PanelOutput::Message(message.clone()),
                _ => self.render(*panel),
            };
            self.outputs.insert(*panel, output);
        }

        debug!(?changed, panels = stale.len(), "re-rendered dependent panels");
        stale
    }

    fn resolve(&self) -> Result<AllianceView<'a>, String> {
        let selected = self
            .state
            .selected_match
            .ok_or_else(|| "No match selected".to_string())?;
        alliance::resolve_number(self.data, selected)
            .map_err(|err| format!("Invalid selection: {err}"))
    }

    fn render(&self, panel: PanelId) -> PanelOutput {
        match panel {
            PanelId::MatchList => PanelOutput::MatchList(MatchList {
                ours_only: self.state.ours_only,
                options: self.options(),
                selected: self.state.selected_match,
            }),
            PanelId::KeyStatsTable => PanelOutput::Table(charts::summary_table(
                &alliance::average_by_team(&self.data.scouting.rows),
                &NumericColumn::ALL,
            )),
            chart => match self.resolve() {
                Ok(view) => render_chart(chart, &view)
                    .map(PanelOutput::Figure)
                    .unwrap_or_else(|| PanelOutput::Message("Nothing to show".to_string())),
                Err(message) => PanelOutput::Message(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::sample_event;

    #[test]
    fn every_panel_renders_on_startup() {
        let data = sample_event();
        let dashboard = Dashboard::new(&data);

        assert_eq!(dashboard.state().selected_match, Some(1));
        for panel in PanelId::ALL {
            let output = dashboard.output(panel).unwrap();
            if panel.is_chart() {
                assert!(matches!(output, PanelOutput::Figure(_)), "{panel:?}");
            }
        }
        assert!(matches!(
            dashboard.output(PanelId::KeyStatsTable),
            Some(PanelOutput::Table(_))
        ));
    }

    #[test]
    fn selecting_a_match_refreshes_only_charts() {
        let data = sample_event();
        let mut dashboard = Dashboard::new(&data);

        let refreshed = dashboard.select_match(2);
        assert!(refreshed.iter().all(|panel| panel.is_chart()));
        assert!(!refreshed.contains(&PanelId::KeyStatsTable));
        assert!(!refreshed.contains(&PanelId::MatchList));
        assert_eq!(refreshed.len(), 10);

        let Some(PanelOutput::Figure(figure)) = dashboard.output(PanelId::TotalPointsBoxplot)
        else {
            panic!("expected a figure");
        };
        assert_eq!(figure.data.len(), 2);
    }

    #[test]
    fn reselecting_same_match_is_a_no_op() {
        let data = sample_event();
        let mut dashboard = Dashboard::new(&data);
        assert!(dashboard.select_match(1).is_empty());
    }

    #[test]
    fn switch_refreshes_match_list() {
        let data = sample_event();
        let mut dashboard = Dashboard::new(&data);

        let refreshed = dashboard.set_ours_only(true);
        assert_eq!(refreshed, vec![PanelId::MatchList]);
        let Some(PanelOutput::MatchList(list)) = dashboard.output(PanelId::MatchList) else {
            panic!("expected the match list");
        };
        assert_eq!(list.options, vec![1]);
        assert!(list.ours_only);
    }

    #[test]
    fn switch_moves_selection_when_current_match_is_filtered_out() {
        let data = sample_event();
        let mut dashboard = Dashboard::new(&data);
        dashboard.select_match(2);

        let refreshed = dashboard.set_ours_only(true);
        assert!(refreshed.contains(&PanelId::MatchList));
        assert!(refreshed.contains(&PanelId::EndgameBar));
        assert_eq!(dashboard.state().selected_match, Some(1));
    }

    #[test]
    fn unknown_match_renders_message_instead_of_failing() {
        let data = sample_event();
        let mut dashboard = Dashboard::new(&data);
        dashboard.select_match(42);

        let Some(PanelOutput::Message(message)) = dashboard.output(PanelId::EndgameBar) else {
            panic!("expected a message");
        };
        assert!(message.starts_with("Invalid selection"));
    }

    #[test]
    fn empty_filtered_list_clears_the_charts() {
        let data = EventData {
            team_of_interest: None,
            ..sample_event()
        };
        let mut dashboard = Dashboard::new(&data);

        let refreshed = dashboard.set_ours_only(true);
        assert!(refreshed.contains(&PanelId::EndgameBar));
        assert_eq!(dashboard.state().selected_match, None);
        assert_eq!(
            dashboard.output(PanelId::EndgameBar),
            Some(&PanelOutput::Message("No match selected".to_string()))
        );
    }

    #[test]
    fn every_tab_has_panels() {
        for tab in Tab::ALL {
            assert!(tab.panels().count() > 0, "{tab:?}");
        }
    }
}
