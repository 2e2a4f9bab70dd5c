use std::collections::BTreeMap;
use std::fmt::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::alliance::AllianceView;
use crate::charts::SummaryTable;
use crate::context::EventData;
use crate::dashboard::{Dashboard, PanelId, PanelOutput, Tab};
use crate::models::NumericColumn;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Columns shown by the terminal summary; the page shows all of them.
pub const KEY_COLUMNS: [NumericColumn; 6] = [
    NumericColumn::TotalAutoPoints,
    NumericColumn::TotalTeleopPoints,
    NumericColumn::EndgamePoints,
    NumericColumn::TotalPointsScored,
    NumericColumn::TotalTeleopCoral,
    NumericColumn::AlgaeTeleop,
];

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Fixed-width rendering of a summary table for the terminal.
pub fn format_table(table: &SummaryTable) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut output = String::new();
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:>width$}", width = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let _ = writeln!(output, "{}", line(&table.columns));
    for row in &table.rows {
        let _ = writeln!(output, "{}", line(row));
    }
    output
}

pub fn alliance_summary(view: &AllianceView<'_>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Match {}", view.match_number);
    let _ = writeln!(output, "Red:  {}", view.red.join(", "));
    let _ = writeln!(output, "Blue: {}", view.blue.join(", "));

    let unscouted = view.unscouted();
    if !unscouted.is_empty() {
        let _ = writeln!(output, "No scouting data for: {}", unscouted.join(", "));
    }
    let _ = writeln!(output);

    if view.alliance_averages.is_empty() {
        let _ = writeln!(output, "No scouted teams in this match.");
        return output;
    }

    for team in &view.alliance_averages {
        let _ = writeln!(
            output,
            "- {} ({}) auto {:.1}, teleop {:.1}, endgame {:.1}, total {:.1} across {} matches",
            team.team,
            view.alliance_of(&team.team),
            team.get(NumericColumn::TotalAutoPoints),
            team.get(NumericColumn::TotalTeleopPoints),
            team.get(NumericColumn::EndgamePoints),
            team.get(NumericColumn::TotalPointsScored),
            team.matches
        );
    }
    output
}

#[derive(Debug, Serialize)]
struct MatchOptions {
    all: Vec<u32>,
    ours: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct PagePayload {
    ours_only: bool,
    selected: Option<u32>,
    options: MatchOptions,
    matches: BTreeMap<u32, BTreeMap<&'static str, PanelOutput>>,
}

/// Chart outputs for every selectable match, produced by driving the
/// dashboard's match selector through each option.
fn chart_panels(dashboard: &Dashboard<'_>) -> BTreeMap<&'static str, PanelOutput> {
    PanelId::ALL
        .into_iter()
        .filter(|panel| panel.is_chart())
        .filter_map(|panel| dashboard.output(panel).map(|out| (panel.id(), out.clone())))
        .collect()
}

fn collect_match_panels(data: &EventData) -> BTreeMap<u32, BTreeMap<&'static str, PanelOutput>> {
    let mut numbers = data.match_options(false);
    numbers.extend(data.match_options(true));
    numbers.sort_unstable();
    numbers.dedup();

    let mut explorer = Dashboard::new(data);
    let mut matches = BTreeMap::new();
    for number in numbers {
        explorer.select_match(number);
        matches.insert(number, chart_panels(&explorer));
    }
    matches
}

fn write_table(output: &mut String, table: &SummaryTable) {
    let _ = writeln!(output, "<table class=\"summary\">");
    let _ = write!(output, "<thead><tr>");
    for column in &table.columns {
        let _ = write!(output, "<th>{}</th>", escape_html(column));
    }
    let _ = writeln!(output, "</tr></thead>");
    let _ = writeln!(output, "<tbody>");
    for row in &table.rows {
        let _ = write!(output, "<tr>");
        for cell in row {
            let _ = write!(output, "<td>{}</td>", escape_html(cell));
        }
        let _ = writeln!(output, "</tr>");
    }
    let _ = writeln!(output, "</tbody></table>");
}

fn write_panel(output: &mut String, dashboard: &Dashboard<'_>, panel: PanelId) {
    match dashboard.output(panel) {
        Some(PanelOutput::MatchList(list)) => {
            let _ = writeln!(output, "<div class=\"card\" id=\"{}\">", panel.id());
            let checked = if list.ours_only { " checked" } else { "" };
            let _ = writeln!(
                output,
                "<label><input type=\"checkbox\" id=\"our_matches_switch\"{checked}> Filter Our Matches</label>"
            );
            let _ = writeln!(output, "<label>Match <select id=\"match_select\"></select></label>");
            let _ = writeln!(output, "</div>");
        }
        Some(PanelOutput::Table(table)) => {
            let _ = writeln!(output, "<div class=\"card\" id=\"{}\">", panel.id());
            write_table(output, table);
            let _ = writeln!(output, "</div>");
        }
        Some(PanelOutput::Message(message)) => {
            let _ = writeln!(
                output,
                "<div class=\"card\"><div class=\"chart\" id=\"{}\">{}</div></div>",
                panel.id(),
                escape_html(message)
            );
        }
        _ => {
            let _ = writeln!(
                output,
                "<div class=\"card\"><div class=\"chart\" id=\"{}\"></div></div>",
                panel.id()
            );
        }
    }
}

const PAGE_SCRIPT: &str = r##"
const payload = JSON.parse(document.getElementById("dashboard-data").textContent);
const select = document.getElementById("match_select");
const toggle = document.getElementById("our_matches_switch");

function renderMatch(number) {
  const panels = payload.matches[number];
  if (!panels) {
    for (const el of document.querySelectorAll(".chart")) {
      Plotly.purge(el);
      el.textContent = number === "" ? "No match selected" : "Invalid selection: match " + number;
    }
    return;
  }
  for (const [id, output] of Object.entries(panels)) {
    const el = document.getElementById(id);
    if (!el) continue;
    if (output.kind === "figure") {
      el.textContent = "";
      Plotly.react(el, output.value.data, output.value.layout, {responsive: true});
    } else {
      Plotly.purge(el);
      el.textContent = output.value;
    }
  }
}

function fillOptions() {
  const options = toggle.checked ? payload.options.ours : payload.options.all;
  const previous = select.value;
  select.innerHTML = "";
  for (const number of options) {
    const option = document.createElement("option");
    option.value = String(number);
    option.textContent = String(number);
    select.appendChild(option);
  }
  if (options.map(String).includes(previous)) {
    select.value = previous;
  }
}

function showTab(id) {
  for (const section of document.querySelectorAll("section.tab")) {
    section.hidden = section.id !== id;
  }
  for (const button of document.querySelectorAll("nav button")) {
    button.classList.toggle("active", button.dataset.tab === id);
  }
  for (const chart of document.querySelectorAll("#" + id + " .chart")) {
    if (chart.data) Plotly.Plots.resize(chart);
  }
}

toggle.addEventListener("change", () => {
  const before = select.value;
  fillOptions();
  if (select.value !== before) renderMatch(select.value);
});
select.addEventListener("change", () => renderMatch(select.value));
for (const button of document.querySelectorAll("nav button")) {
  button.addEventListener("click", () => showTab(button.dataset.tab));
}

fillOptions();
const initial = payload.selected !== null ? String(payload.selected) : select.value;
select.value = initial;
renderMatch(initial);
showTab("filter");
"##;

const PAGE_STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #fafafa; }
header { background: #1f2933; color: #fff; padding: 0.75rem 1.5rem; }
nav { display: flex; gap: 0.25rem; padding: 0.5rem 1.5rem; background: #e4e7eb; }
nav button { border: 0; padding: 0.5rem 1rem; background: transparent; cursor: pointer; }
nav button.active { background: #fff; font-weight: 600; }
section.tab { padding: 1rem 1.5rem; }
.card { background: #fff; border-radius: 6px; box-shadow: 0 1px 3px rgba(0,0,0,0.15); margin-bottom: 1rem; padding: 1rem; }
.chart { min-height: 420px; }
table.summary { border-collapse: collapse; font-size: 0.85rem; }
table.summary th, table.summary td { border: 1px solid #d9dde1; padding: 0.25rem 0.5rem; text-align: right; }
footer { color: #7b8794; font-size: 0.8rem; padding: 0 1.5rem 1rem; }
"#;

pub fn build_page(
    data: &EventData,
    ours_only: bool,
    selected: Option<u32>,
    generated_at: DateTime<Utc>,
) -> anyhow::Result<String> {
    let mut dashboard = Dashboard::new(data);
    dashboard.set_ours_only(ours_only);
    if let Some(number) = selected {
        dashboard.select_match(number);
    }

    let mut matches = collect_match_panels(data);
    if let Some(number) = selected {
        if !matches.contains_key(&number) {
            warn!(match_number = number, "requested match is not selectable");
            matches.insert(number, chart_panels(&dashboard));
        }
    }

    let payload = PagePayload {
        ours_only,
        selected: dashboard.state().selected_match,
        options: MatchOptions {
            all: data.match_options(false),
            ours: data.match_options(true),
        },
        matches,
    };
    let json = serde_json::to_string(&payload)
        .context("failed to serialise dashboard payload")?
        .replace("</", "<\\/");

    let title = format!("{} REEFSCAPE Data Science Report", data.event_key);
    let mut output = String::new();

    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<title>{}</title>", escape_html(&title));
    let _ = writeln!(output, "<script src=\"{PLOTLY_CDN}\"></script>");
    let _ = writeln!(output, "<style>{PAGE_STYLE}</style>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<header><h1>{}</h1></header>", escape_html(&title));

    let _ = writeln!(output, "<nav>");
    for tab in Tab::ALL {
        let _ = writeln!(
            output,
            "<button type=\"button\" data-tab=\"{}\">{}</button>",
            tab.id(),
            tab.title()
        );
    }
    let _ = writeln!(output, "</nav>");

    for tab in Tab::ALL {
        let _ = writeln!(output, "<section class=\"tab\" id=\"{}\">", tab.id());
        for panel in tab.panels() {
            write_panel(&mut output, &dashboard, panel);
        }
        let _ = writeln!(output, "</section>");
    }

    let _ = writeln!(
        output,
        "<footer>Generated {} from {} scouted rows across {} scheduled matches.</footer>",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        data.scouting.len(),
        data.schedule.len()
    );
    let _ = writeln!(
        output,
        "<script type=\"application/json\" id=\"dashboard-data\">{json}</script>"
    );
    let _ = writeln!(output, "<script>{PAGE_SCRIPT}</script>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");

    info!(
        matches = payload.matches.len(),
        bytes = output.len(),
        "built dashboard page"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alliance::resolve;
    use crate::charts::summary_table;
    use crate::context::tests::sample_event;
    use chrono::TimeZone;

    fn generated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 18, 30, 0).unwrap()
    }

    #[test]
    fn page_contains_every_panel_and_tab() {
        let data = sample_event();
        let page = build_page(&data, false, None, generated()).unwrap();

        for panel in PanelId::ALL {
            assert!(page.contains(&format!("id=\"{}\"", panel.id())), "{panel:?}");
        }
        for tab in Tab::ALL {
            assert!(page.contains(tab.title()), "{tab:?}");
        }
        assert!(page.contains("Generated 2025-03-07 18:30 UTC"));
    }

    #[test]
    fn embedded_payload_cannot_close_script_tag() {
        let data = sample_event();
        let page = build_page(&data, false, None, generated()).unwrap();

        let start = page.find("id=\"dashboard-data\">").unwrap();
        let payload = &page[start..];
        let end = payload.find("</script>").unwrap();
        assert!(payload[..end].contains("<\\/span>"));
    }

    #[test]
    fn payload_covers_every_match_option() {
        let data = sample_event();
        let matches = collect_match_panels(&data);
        assert_eq!(matches.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(matches[&1].len(), 10);
        assert!(matches!(
            matches[&2].get("endgame_bar"),
            Some(PanelOutput::Figure(_))
        ));
    }

    #[test]
    fn requested_match_is_preselected() {
        let data = sample_event();
        let page = build_page(&data, false, Some(2), generated()).unwrap();
        assert!(page.contains("\"selected\":2"));
    }

    #[test]
    fn unknown_requested_match_shows_invalid_selection() {
        let data = sample_event();
        let page = build_page(&data, false, Some(99), generated()).unwrap();

        assert!(page.contains("\"selected\":99"));
        assert!(page.contains("\"99\":{"));
        let chart = page.find("id=\"endgame_bar\">").unwrap();
        assert!(page[chart..].starts_with("id=\"endgame_bar\">Invalid selection"));
    }

    #[test]
    fn script_handles_empty_and_unknown_selections() {
        assert!(PAGE_SCRIPT.contains("querySelectorAll(\"#\" + id + \" .chart\")"));
        assert!(PAGE_SCRIPT.contains("No match selected"));
        assert!(PAGE_SCRIPT.trim_end().ends_with("showTab(\"filter\");"));
    }

    #[test]
    fn alliance_summary_lists_unscouted_teams() {
        let data = sample_event();
        let view = resolve(&data, 0).unwrap();
        let text = alliance_summary(&view);

        assert!(text.contains("Red:  148, 538, 3504"));
        assert!(text.contains("No scouting data for: 5045"));
        assert!(text.contains("- 148 (Red)"));
    }

    #[test]
    fn table_columns_are_aligned() {
        let data = sample_event();
        let view = resolve(&data, 0).unwrap();
        let text = format_table(&summary_table(&view.event_averages, &KEY_COLUMNS));

        let widths: Vec<usize> = text.lines().map(str::len).collect();
        assert!(widths.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(text.lines().count(), data.scouting.teams().len() + 1);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }
}
