//! Per-persona summary: console table and SQLite export.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::aggregate::{persona_means, PersonaSummary};
use crate::model::ActionRecord;

/// Fixed-width summary, one line per persona. Steps are the exact mean
/// truncated to a whole number and success a whole percentage, both taken
/// from unrounded means.
pub fn summary_table(actions: &[ActionRecord]) -> String {
    let rule = format!("{}\n", "-".repeat(56));
    let mut out = String::new();
    out.push_str(&rule);
    out.push_str(&format!("{:<20} {:<8} {:<8} {}\n", "Persona", "Steps", "Errors", "Success"));
    out.push_str(&rule);
    for r in persona_means(actions) {
        out.push_str(&format!(
            "{:<20} {:<8} {:<8} {:.0}%\n",
            r.persona,
            r.avg_steps.trunc() as u64,
            r.total_errors,
            r.success_rate
        ));
    }
    out
}

pub struct SummaryStore {
    conn: Connection,
}

impl SummaryStore {
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS summary (
                run_id TEXT NOT NULL,
                persona TEXT NOT NULL,
                runs INTEGER NOT NULL,
                avg_steps REAL NOT NULL,
                total_errors INTEGER NOT NULL,
                success_rate REAL NOT NULL,
                PRIMARY KEY (run_id, persona)
            );
            CREATE TABLE IF NOT EXISTS actions (
                run_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                persona_id TEXT NOT NULL,
                persona_label TEXT NOT NULL,
                task TEXT,
                task_label TEXT NOT NULL,
                steps_count INTEGER NOT NULL,
                errors INTEGER NOT NULL,
                success INTEGER NOT NULL,
                actions TEXT NOT NULL,
                estimated_time REAL,
                PRIMARY KEY (run_id, seq)
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Write the summary and every kept row under `run_id` in one transaction,
    /// replacing whatever an earlier export stored under the same id.
    pub fn export(
        &mut self,
        run_id: &str,
        summary: &[PersonaSummary],
        actions: &[ActionRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM summary WHERE run_id = ?1", params![run_id])?;
        tx.execute("DELETE FROM actions WHERE run_id = ?1", params![run_id])?;
        for s in summary {
            tx.execute(
                "INSERT INTO summary (run_id, persona, runs, avg_steps, total_errors, success_rate)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    run_id,
                    s.persona,
                    s.runs as i64,
                    s.avg_steps,
                    s.total_errors as i64,
                    s.success_rate
                ],
            )?;
        }
        for (seq, r) in actions.iter().enumerate() {
            tx.execute(
                "INSERT INTO actions (run_id, seq, persona_id, persona_label, task, task_label,
                                      steps_count, errors, success, actions, estimated_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    run_id,
                    seq as i64,
                    r.persona_id,
                    r.persona_label,
                    r.task,
                    r.task_label,
                    r.steps_count as i64,
                    r.errors as i64,
                    r.success,
                    r.actions,
                    r.estimated_time
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn summary_for(&self, run_id: &str) -> Result<Vec<PersonaSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT persona, runs, avg_steps, total_errors, success_rate
             FROM summary WHERE run_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(PersonaSummary {
                    persona: row.get(0)?,
                    runs: row.get::<_, i64>(1)? as usize,
                    avg_steps: row.get(2)?,
                    total_errors: row.get::<_, i64>(3)? as u64,
                    success_rate: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn action_count(&self, run_id: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM actions WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Vec<PersonaSummary> {
        vec![PersonaSummary {
            persona: "Novice User".to_string(),
            runs: 3,
            avg_steps: 11.67,
            total_errors: 7,
            success_rate: 66.7,
        }]
    }

    fn rec(persona: &str, steps: u32, errors: u32, success: bool) -> ActionRecord {
        ActionRecord {
            persona_id: format!("id-{}", persona),
            persona_label: persona.to_string(),
            task: Some("login".to_string()),
            task_label: "Login Form".to_string(),
            steps_count: steps,
            errors,
            success,
            actions: "click(button)".to_string(),
            estimated_time: None,
        }
    }

    fn row_for<'a>(table: &'a str, persona: &str) -> &'a str {
        table.lines().find(|l| l.starts_with(persona)).unwrap()
    }

    #[test]
    fn table_lists_each_persona() {
        let rows = vec![
            rec("Novice User", 12, 3, true),
            rec("Novice User", 14, 2, false),
            rec("Novice User", 9, 2, true),
        ];
        let table = summary_table(&rows);
        let line = table.lines().nth(3).unwrap();
        assert!(line.starts_with("Novice User"));
        assert!(line.contains(" 11 "));
        assert!(line.contains(" 7 "));
        assert!(line.ends_with("67%"));
    }

    #[test]
    fn table_formats_exact_success_rate() {
        let rows: Vec<ActionRecord> = (0..52).map(|i| rec("A", 1, 0, i < 7)).collect();
        assert!(row_for(&summary_table(&rows), "A").ends_with(" 13%"));
    }

    #[test]
    fn table_truncates_exact_mean_steps() {
        let mut rows = vec![rec("A", 12, 0, true); 199];
        rows.push(rec("A", 11, 0, true));
        let table = summary_table(&rows);
        let line = row_for(&table, "A");
        let steps = line.split_whitespace().nth(1).unwrap();
        assert_eq!(steps, "11");
    }

    #[test]
    fn export_round_trips_summary() {
        let mut store = SummaryStore::in_memory().unwrap();
        store.init().unwrap();
        store.export("r-1", &summary(), &[]).unwrap();
        assert_eq!(store.summary_for("r-1").unwrap(), summary());
        assert!(store.summary_for("r-2").unwrap().is_empty());
        assert_eq!(store.action_count("r-1").unwrap(), 0);
    }

    #[test]
    fn repeated_export_under_one_run_id_replaces_rows() {
        let actions = vec![
            rec("Novice User", 12, 3, true),
            rec("Expert User", 6, 0, true),
            rec("Novice User", 14, 2, false),
        ];
        let summary = crate::aggregate::persona_summary(&actions);
        let mut store = SummaryStore::in_memory().unwrap();
        store.init().unwrap();
        store.export("r-1", &summary, &actions).unwrap();
        store.export("r-1", &summary, &actions).unwrap();
        store.export("r-2", &summary, &actions[..1]).unwrap();
        assert_eq!(store.summary_for("r-1").unwrap(), summary);
        assert_eq!(store.action_count("r-1").unwrap(), 3);
        assert_eq!(store.action_count("r-2").unwrap(), 1);
    }
}
