//! Group-by and averaging over the action log.
//!
//! Every computation here is keyed by `persona_label` (and `task_label` for the
//! steps chart), with labels listed in first-occurrence order.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use crate::model::ActionRecord;

/// Partition `items` by `key`, keeping groups in first-occurrence order and
/// items in source order within each group.
pub fn group_by<'a, T, K, F>(items: &'a [T], key: F) -> Vec<(K, Vec<&'a T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a T>)> = Vec::new();
    for item in items {
        let k = key(item);
        match slots.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                slots.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn average(nums: &[f64]) -> f64 {
    if nums.is_empty() {
        return 0.0;
    }
    nums.iter().sum::<f64>() / nums.len() as f64
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn distinct<F>(actions: &[ActionRecord], label: F) -> Vec<String>
where
    F: Fn(&ActionRecord) -> &str,
{
    group_by(actions, |r| label(r).to_string())
        .into_iter()
        .map(|(k, _)| k)
        .collect()
}

pub fn distinct_tasks(actions: &[ActionRecord]) -> Vec<String> {
    distinct(actions, |r| r.task_label.as_str())
}

pub fn distinct_personas(actions: &[ActionRecord]) -> Vec<String> {
    distinct(actions, |r| r.persona_label.as_str())
}

/// Average steps for one persona over its runs of each task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaSeries {
    pub persona: String,
    /// One value per entry of `StepsByTask::tasks`, in the same order.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepsByTask {
    pub tasks: Vec<String>,
    pub series: Vec<PersonaSeries>,
}

impl StepsByTask {
    pub fn get(&self, persona: &str, task: &str) -> Option<f64> {
        let col = self.tasks.iter().position(|t| t == task)?;
        self.series
            .iter()
            .find(|s| s.persona == persona)
            .map(|s| s.values[col])
    }
}

/// A single value per persona label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaValue {
    pub persona: String,
    pub value: f64,
}

pub fn lookup(values: &[PersonaValue], persona: &str) -> Option<f64> {
    values.iter().find(|v| v.persona == persona).map(|v| v.value)
}

/// Average step count for every observed (persona, task) pair, 2 places.
/// Pairs that never occur together are reported as 0.
pub fn steps_per_persona_per_task(actions: &[ActionRecord]) -> StepsByTask {
    let tasks = distinct_tasks(actions);
    let series = group_by(actions, |r| r.persona_label.clone())
        .into_iter()
        .map(|(persona, rows)| {
            let values = tasks
                .iter()
                .map(|task| {
                    let steps: Vec<f64> = rows
                        .iter()
                        .filter(|r| &r.task_label == task)
                        .map(|r| r.steps_count as f64)
                        .collect();
                    round_to(average(&steps), 2)
                })
                .collect();
            PersonaSeries { persona, values }
        })
        .collect();
    StepsByTask { tasks, series }
}

/// Average error count per persona across all tasks, 2 places.
pub fn errors_per_persona(actions: &[ActionRecord]) -> Vec<PersonaValue> {
    per_persona(actions, |r| r.errors as f64, |avg| round_to(avg, 2))
}

/// Share of successful runs per persona as a percentage, 1 place.
pub fn success_rate_per_persona(actions: &[ActionRecord]) -> Vec<PersonaValue> {
    per_persona(
        actions,
        |r| if r.success { 1.0 } else { 0.0 },
        |avg| round_to(100.0 * avg, 1),
    )
}

fn per_persona<P, R>(actions: &[ActionRecord], project: P, finish: R) -> Vec<PersonaValue>
where
    P: Fn(&ActionRecord) -> f64,
    R: Fn(f64) -> f64,
{
    group_by(actions, |r| r.persona_label.clone())
        .into_iter()
        .map(|(persona, rows)| {
            let nums: Vec<f64> = rows.iter().map(|r| project(r)).collect();
            PersonaValue {
                persona,
                value: finish(average(&nums)),
            }
        })
        .collect()
}

/// One line of the per-persona summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaSummary {
    pub persona: String,
    pub runs: usize,
    pub avg_steps: f64,
    pub total_errors: u64,
    pub success_rate: f64,
}

/// Per-persona summary with exact means. The console table formats these
/// directly; [`persona_summary`] rounds them for display and export.
pub fn persona_means(actions: &[ActionRecord]) -> Vec<PersonaSummary> {
    group_by(actions, |r| r.persona_label.clone())
        .into_iter()
        .map(|(persona, rows)| {
            let steps: Vec<f64> = rows.iter().map(|r| r.steps_count as f64).collect();
            let flags: Vec<f64> = rows
                .iter()
                .map(|r| if r.success { 1.0 } else { 0.0 })
                .collect();
            PersonaSummary {
                persona,
                runs: rows.len(),
                avg_steps: average(&steps),
                total_errors: rows.iter().map(|r| r.errors as u64).sum(),
                success_rate: 100.0 * average(&flags),
            }
        })
        .collect()
}

/// [`persona_means`] with steps at 2 places and success at 1.
pub fn persona_summary(actions: &[ActionRecord]) -> Vec<PersonaSummary> {
    persona_means(actions)
        .into_iter()
        .map(|s| PersonaSummary {
            avg_steps: round_to(s.avg_steps, 2),
            success_rate: round_to(s.success_rate, 1),
            ..s
        })
        .collect()
}
