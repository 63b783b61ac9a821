use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: u32,
    pub occupation: String,
    pub tech_comfort: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub frustrations: Vec<String>,
    #[serde(default)]
    pub preferred_actions: Vec<String>,
}

/// A simulated user profile as written to `simpersonas.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub persona_type: Option<String>,
    pub demographics: Demographics,
    pub behavior: Behavior,
}

/// One persona/task run from the action log.
///
/// `persona_label` is a denormalized copy of the persona label; it is used as
/// the grouping key by every aggregate and is never checked against the
/// loaded personas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub persona_id: String,
    pub persona_label: String,
    pub task: Option<String>,
    pub task_label: String,
    pub steps_count: u32,
    pub errors: u32,
    pub success: bool,
    pub actions: String,
    pub estimated_time: Option<f64>,
}

/// Everything the dashboard reads. Built once after loading, then only
/// borrowed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppState {
    pub personas: Vec<Persona>,
    pub actions: Vec<ActionRecord>,
}

impl AppState {
    pub fn new(personas: Vec<Persona>, actions: Vec<ActionRecord>) -> Self {
        Self { personas, actions }
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty() && self.actions.is_empty()
    }
}
