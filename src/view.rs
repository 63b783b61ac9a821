//! Declarative view model for the dashboard.
//!
//! Everything here is plain serializable data derived from an [`AppState`];
//! the HTML layer in `render` only formats it.

use serde::Serialize;

use crate::aggregate::{
    distinct_personas, errors_per_persona, steps_per_persona_per_task, success_rate_per_persona,
    PersonaValue,
};
use crate::model::{ActionRecord, AppState, Persona};

/// Rows shown in the log table. Fixed; there is no paging.
pub const LOG_TABLE_CAP: usize = 200;

/// Goals and frustrations listed per card.
const CARD_LIST_LIMIT: usize = 3;

const DEFAULT_ACCENT: &str = "#4f46e5";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    fn new(key: &str, value: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaCard {
    pub persona_id: String,
    pub image_path: String,
    pub image_alt: String,
    pub badge: String,
    pub accent: String,
    pub demographics: Vec<KeyValue>,
    pub description: String,
    pub goals: Vec<String>,
    pub frustrations: Vec<String>,
}

/// Static card image for a persona. The id is used verbatim.
pub fn persona_image_path(asset_dir: &str, persona_id: &str) -> String {
    format!("{}/{}.png", asset_dir.trim_end_matches('/'), persona_id)
}

pub fn accent_for(persona_type: Option<&str>) -> &'static str {
    match persona_type {
        Some("novice") => "#3b82f6",
        Some("expert") => "#10b981",
        Some("distracted") => "#f59e0b",
        Some("accessibility-focused") => "#8b5cf6",
        _ => DEFAULT_ACCENT,
    }
}

pub fn persona_card(persona: &Persona, asset_dir: &str) -> PersonaCard {
    let d = &persona.demographics;
    PersonaCard {
        persona_id: persona.id.clone(),
        image_path: persona_image_path(asset_dir, &persona.id),
        image_alt: persona.label.clone(),
        badge: persona.label.clone(),
        accent: accent_for(persona.persona_type.as_deref()).to_string(),
        demographics: vec![
            KeyValue::new("Age", d.age),
            KeyValue::new("Occupation", &d.occupation),
            KeyValue::new("Tech comfort", &d.tech_comfort),
        ],
        description: persona.behavior.description.clone(),
        goals: persona.behavior.goals.iter().take(CARD_LIST_LIMIT).cloned().collect(),
        frustrations: persona
            .behavior
            .frustrations
            .iter()
            .take(CARD_LIST_LIMIT)
            .cloned()
            .collect(),
    }
}

pub fn persona_cards(personas: &[Persona], asset_dir: &str) -> Vec<PersonaCard> {
    personas.iter().map(|p| persona_card(p, asset_dir)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    pub persona: String,
    pub task: String,
    pub steps: u32,
    pub errors: u32,
    pub success: String,
    pub actions: String,
}

impl From<&ActionRecord> for LogRow {
    fn from(r: &ActionRecord) -> Self {
        Self {
            persona: r.persona_label.clone(),
            task: r.task_label.clone(),
            steps: r.steps_count,
            errors: r.errors,
            success: if r.success { "Yes" } else { "No" }.to_string(),
            actions: r.actions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogTable {
    pub columns: Vec<String>,
    pub rows: Vec<LogRow>,
    /// Rows in the log before the cap was applied.
    pub total_rows: usize,
}

pub fn log_table(actions: &[ActionRecord]) -> LogTable {
    LogTable {
        columns: ["Persona", "Task", "Steps", "Errors", "Success", "Actions"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows: actions.iter().take(LOG_TABLE_CAP).map(LogRow::from).collect(),
        total_rows: actions.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Legend {
    Bottom,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub id: String,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    pub legend: Legend,
    /// Upper bound of the value axis when it is fixed (percentages).
    pub max: Option<f64>,
}

impl BarChart {
    /// Largest value to scale bars against.
    pub fn scale(&self) -> f64 {
        self.max.unwrap_or_else(|| {
            self.datasets
                .iter()
                .flat_map(|d| d.data.iter().copied())
                .fold(0.0, f64::max)
        })
    }
}

fn single_series(id: &str, title: &str, label: &str, values: Vec<PersonaValue>) -> BarChart {
    let (labels, data) = values.into_iter().map(|v| (v.persona, v.value)).unzip();
    BarChart {
        id: id.to_string(),
        title: title.to_string(),
        labels,
        datasets: vec![ChartDataset {
            label: label.to_string(),
            data,
        }],
        legend: Legend::Hidden,
        max: None,
    }
}

/// Grouped chart: one bar group per task, one dataset per persona.
pub fn steps_chart(actions: &[ActionRecord]) -> BarChart {
    let steps = steps_per_persona_per_task(actions);
    BarChart {
        id: "chart-steps".to_string(),
        title: "Average Steps per Persona per Task".to_string(),
        labels: steps.tasks,
        datasets: steps
            .series
            .into_iter()
            .map(|s| ChartDataset {
                label: s.persona,
                data: s.values,
            })
            .collect(),
        legend: Legend::Bottom,
        max: None,
    }
}

pub fn errors_chart(actions: &[ActionRecord]) -> BarChart {
    single_series(
        "chart-errors",
        "Average Errors per Persona (across tasks)",
        "Errors",
        errors_per_persona(actions),
    )
}

pub fn success_chart(actions: &[ActionRecord]) -> BarChart {
    let mut chart = single_series(
        "chart-success",
        "Success Rate by Persona (%)",
        "Success Rate (%)",
        success_rate_per_persona(actions),
    );
    chart.max = Some(100.0);
    chart
}

pub fn charts(actions: &[ActionRecord]) -> Vec<BarChart> {
    vec![steps_chart(actions), errors_chart(actions), success_chart(actions)]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub generated_at: String,
    pub persona_labels: Vec<String>,
    pub cards: Vec<PersonaCard>,
    pub table: LogTable,
    pub charts: Vec<BarChart>,
}

/// Build every view from the loaded state. Each call rebuilds from scratch.
pub fn build_dashboard(state: &AppState, asset_dir: &str, generated_at: &str) -> DashboardView {
    DashboardView {
        title: "SimPersona Dashboard".to_string(),
        generated_at: generated_at.to_string(),
        persona_labels: distinct_personas(&state.actions),
        cards: persona_cards(&state.personas, asset_dir),
        table: log_table(&state.actions),
        charts: charts(&state.actions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Behavior, Demographics};

    fn persona(id: &str, kind: Option<&str>) -> Persona {
        Persona {
            id: id.to_string(),
            label: "Novice User".to_string(),
            persona_type: kind.map(str::to_string),
            demographics: Demographics {
                age: 58,
                occupation: "Librarian".to_string(),
                tech_comfort: "Low".to_string(),
                gender: None,
                location: None,
            },
            behavior: Behavior {
                description: "Reads every label.".to_string(),
                goals: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                frustrations: vec!["tiny fonts".into()],
                preferred_actions: Vec::new(),
            },
        }
    }

    fn row(i: usize) -> ActionRecord {
        ActionRecord {
            persona_id: format!("p{}", i % 4),
            persona_label: format!("P{}", i % 4),
            task: None,
            task_label: "Login Form".to_string(),
            steps_count: i as u32,
            errors: 0,
            success: i % 2 == 0,
            actions: format!("row {}", i),
            estimated_time: None,
        }
    }

    #[test]
    fn image_path_uses_id_verbatim() {
        let card = persona_card(&persona("persona_07", None), "./data/persona_cards");
        assert_eq!(card.image_path, "./data/persona_cards/persona_07.png");
        assert!(card.image_path.contains(&card.persona_id));
        assert_eq!(persona_image_path("assets/", "Mixed Case-id"), "assets/Mixed Case-id.png");
    }

    #[test]
    fn card_has_three_demographic_rows() {
        let card = persona_card(&persona("p1", Some("novice")), "img");
        let keys: Vec<_> = card.demographics.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["Age", "Occupation", "Tech comfort"]);
        assert_eq!(card.demographics[0].value, "58");
        assert_eq!(card.badge, "Novice User");
        assert_eq!(card.accent, "#3b82f6");
        assert_eq!(card.goals.len(), 3);
    }

    #[test]
    fn unknown_type_gets_default_accent() {
        assert_eq!(accent_for(None), DEFAULT_ACCENT);
        assert_eq!(accent_for(Some("power-user")), DEFAULT_ACCENT);
    }

    #[test]
    fn table_caps_at_two_hundred_rows_in_order() {
        let rows: Vec<_> = (0..250).map(row).collect();
        let table = log_table(&rows);
        assert_eq!(table.rows.len(), LOG_TABLE_CAP);
        assert_eq!(table.total_rows, 250);
        assert_eq!(table.rows[0].actions, "row 0");
        assert_eq!(table.rows[199].actions, "row 199");
        assert_eq!(table.columns.len(), 6);
    }

    #[test]
    fn success_column_is_yes_or_no() {
        let table = log_table(&[row(0), row(1)]);
        assert_eq!(table.rows[0].success, "Yes");
        assert_eq!(table.rows[1].success, "No");
    }

    #[test]
    fn charts_follow_aggregates() {
        let rows: Vec<_> = (0..8).map(row).collect();
        let charts = charts(&rows);
        assert_eq!(charts.len(), 3);
        assert_eq!(charts[0].labels, vec!["Login Form"]);
        assert_eq!(charts[0].datasets.len(), 4);
        assert_eq!(charts[0].legend, Legend::Bottom);
        // P0 ran rows 0 and 4
        assert_eq!(charts[0].datasets[0].data, vec![2.0]);
        assert_eq!(charts[2].labels, vec!["P0", "P1", "P2", "P3"]);
        assert_eq!(charts[2].datasets[0].data, vec![100.0, 0.0, 100.0, 0.0]);
        assert_eq!(charts[2].scale(), 100.0);
    }

    #[test]
    fn empty_state_builds_empty_views() {
        let view = build_dashboard(&AppState::default(), "img", "now");
        assert!(view.cards.is_empty());
        assert!(view.table.rows.is_empty());
        assert!(view.charts.iter().all(|c| c.labels.is_empty()));
    }
}
