//! Loading of the persona document and the action log.
//!
//! Both sources are fetched concurrently, parsed against a fixed schema and
//! returned as an immutable [`AppState`] together with a [`LoadReport`]
//! describing what was read, dropped and coerced.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::error::LoadError;
use crate::logging::{self, obj, v_count, v_str, Domain, ProfileScope};
use crate::model::{ActionRecord, AppState, Persona};

pub mod csv;
pub mod source;

pub use source::{open_source, DataSource, FileSource, HttpSource, SourceKind};

pub const EXPECTED_COLUMNS: [&str; 7] = [
    "persona_id",
    "persona_label",
    "task_label",
    "steps_count",
    "errors",
    "success",
    "actions",
];

/// Written by the generator but not required by the dashboard.
pub const OPTIONAL_COLUMNS: [&str; 2] = ["task", "estimated_time"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceManifest {
    pub location: String,
    pub hash_sha256: String,
    pub bytes: u64,
}

impl SourceManifest {
    fn of(location: &str, text: &str) -> Self {
        Self {
            location: location.to_string(),
            hash_sha256: content_sha256(text.as_bytes()),
            bytes: text.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub personas_source: SourceManifest,
    pub actions_source: SourceManifest,
    pub personas: usize,
    pub columns: Vec<String>,
    pub missing_columns: Vec<String>,
    pub rows_parsed: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub coerced_cells: usize,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

/// Result of parsing the action log, before it is merged into a report.
#[derive(Debug, Clone, Default)]
pub struct ParsedActions {
    pub records: Vec<ActionRecord>,
    pub columns: Vec<String>,
    pub missing_columns: Vec<String>,
    pub rows_parsed: usize,
    pub rows_dropped: usize,
    pub coerced_cells: usize,
    pub warnings: Vec<String>,
}

pub fn parse_personas(text: &str) -> Result<Vec<Persona>, LoadError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse the action log by header name.
///
/// Rows without a persona id are dropped. Counts that are not non-negative
/// whole numbers become 0 and unreadable success flags become `false`; each
/// such cell is counted in `coerced_cells`.
pub fn parse_actions(text: &str) -> Result<ParsedActions, LoadError> {
    let mut records = csv::parse_records(text)?.into_iter();
    let mut out = ParsedActions::default();

    let header = match records.next() {
        Some(h) => h,
        None => {
            out.warnings.push("missing_header".to_string());
            return Ok(out);
        }
    };
    let columns = Columns::new(&header.fields);
    out.columns = header.fields.iter().map(|s| s.trim().to_string()).collect();
    out.missing_columns = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !columns.has(c))
        .map(|c| c.to_string())
        .collect();
    for missing in &out.missing_columns {
        out.warnings.push(format!("missing_column: {}", missing));
    }
    for name in &out.columns {
        let name = name.as_str();
        if !EXPECTED_COLUMNS.contains(&name) && !OPTIONAL_COLUMNS.contains(&name) {
            out.warnings.push(format!("ignored_column: {}", name));
        }
    }

    for record in records {
        out.rows_parsed += 1;
        let fields = &record.fields;
        let persona_id = columns.get(fields, "persona_id").trim();
        if is_missing_id(persona_id) {
            out.rows_dropped += 1;
            continue;
        }

        let mut count_cell = |column: &str| -> u32 {
            let cell = columns.get(fields, column);
            coerce_count(cell).unwrap_or_else(|| {
                out.coerced_cells += 1;
                out.warnings.push(format!(
                    "coerced_cell: line={} column={} value={:?}",
                    record.line, column, cell
                ));
                0
            })
        };
        let steps_count = count_cell("steps_count");
        let errors = count_cell("errors");

        let success_cell = columns.get(fields, "success");
        let success = coerce_flag(success_cell).unwrap_or_else(|| {
            out.coerced_cells += 1;
            out.warnings.push(format!(
                "coerced_cell: line={} column=success value={:?}",
                record.line, success_cell
            ));
            false
        });

        let task = Some(columns.get(fields, "task"))
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        let estimated_time = columns.get(fields, "estimated_time").trim().parse::<f64>().ok();

        out.records.push(ActionRecord {
            persona_id: persona_id.to_string(),
            persona_label: columns.get(fields, "persona_label").to_string(),
            task,
            task_label: columns.get(fields, "task_label").to_string(),
            steps_count,
            errors,
            success,
            actions: columns.get(fields, "actions").to_string(),
            estimated_time,
        });
    }
    Ok(out)
}

/// An id cell that names no persona: empty, `false`, or a number equal to
/// zero (`0`, `0.0`, `-0`). Such rows are dropped.
fn is_missing_id(id: &str) -> bool {
    id.is_empty()
        || id.eq_ignore_ascii_case("false")
        || id.parse::<f64>().map(|f| f == 0.0).unwrap_or(false)
}

/// Non-negative whole number, written as an integer or as a float with no
/// fractional part. Counts are whole events, so negative and fractional
/// values (`-1`, `4.5`) are rejected like non-numeric text and the caller
/// records them as coerced to 0.
pub fn coerce_count(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<u32>() {
        return Some(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        _ => None,
    }
}

/// `true`/`false` in any case, or a number where non-zero means success.
pub fn coerce_flag(cell: &str) -> Option<bool> {
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    match cell.parse::<f64>() {
        Ok(f) if !f.is_nan() => Some(f != 0.0),
        _ => None,
    }
}

struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(header: &[String]) -> Self {
        let mut index = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            // first occurrence wins on duplicate headers
            index.entry(name.trim().to_string()).or_insert(i);
        }
        Self { index }
    }

    fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn get<'a>(&self, fields: &'a [String], name: &str) -> &'a str {
        self.index
            .get(name)
            .and_then(|&i| fields.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

pub fn content_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Fetch both sources concurrently and build the application state.
///
/// Any fetch or parse failure aborts the whole load.
pub async fn load_state(
    personas_src: &dyn DataSource,
    actions_src: &dyn DataSource,
) -> Result<(AppState, LoadReport), LoadError> {
    let _scope = ProfileScope::new(Domain::Load, "load_state");
    let (persona_text, action_text) =
        tokio::try_join!(personas_src.fetch_text(), actions_src.fetch_text())?;

    let personas = parse_personas(&persona_text)?;
    let parsed = parse_actions(&action_text)?;

    let report = LoadReport {
        personas_source: SourceManifest::of(personas_src.location(), &persona_text),
        actions_source: SourceManifest::of(actions_src.location(), &action_text),
        personas: personas.len(),
        columns: parsed.columns,
        missing_columns: parsed.missing_columns,
        rows_parsed: parsed.rows_parsed,
        rows_kept: parsed.records.len(),
        rows_dropped: parsed.rows_dropped,
        coerced_cells: parsed.coerced_cells,
        warnings: parsed.warnings,
        generated_at: logging::ts_now(),
    };

    for missing in &report.missing_columns {
        logging::warn(
            Domain::Load,
            "missing_column",
            obj(&[("column", v_str(missing)), ("source", v_str(actions_src.location()))]),
        );
    }
    logging::info(
        Domain::Load,
        "loaded",
        obj(&[
            ("personas", v_count(report.personas)),
            ("rows_parsed", v_count(report.rows_parsed)),
            ("rows_kept", v_count(report.rows_kept)),
            ("rows_dropped", v_count(report.rows_dropped)),
            ("coerced_cells", v_count(report.coerced_cells)),
        ]),
    );

    Ok((AppState::new(personas, parsed.records), report))
}

/// Resolve two locations (paths or URLs) and load them.
pub async fn load_from_locations(
    personas_location: &str,
    actions_location: &str,
) -> Result<(AppState, LoadReport), LoadError> {
    let client = Client::new();
    let personas_src = open_source(personas_location, &client)?;
    let actions_src = open_source(actions_location, &client)?;
    load_state(personas_src.as_ref(), actions_src.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "persona_id,persona_label,task,task_label,\
                          steps_count,errors,success,actions,estimated_time";

    #[test]
    fn drops_rows_without_persona_id_and_keeps_order() {
        let text = format!(
            "{HEADER}\np1,Novice User,login,Login Form,9,2,1,look(page),22.5\n\
             ,Ghost,login,Login Form,1,0,1,,\n\
             p2,Expert User,login,Login Form,5,0,1,key(tab),12.5\n"
        );
        let parsed = parse_actions(&text).unwrap();
        assert_eq!(parsed.rows_parsed, 3);
        assert_eq!(parsed.rows_dropped, 1);
        let ids: Vec<_> = parsed.records.iter().map(|r| r.persona_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(parsed.records[0].task.as_deref(), Some("login"));
        assert_eq!(parsed.records[0].estimated_time, Some(22.5));
        assert!(parsed.missing_columns.is_empty());
    }

    #[test]
    fn zero_and_false_ids_are_missing() {
        let text = format!(
            "{HEADER}
p1,A,login,Login Form,1,0,1,,
             0,B,login,Login Form,1,0,1,,
             false,C,login,Login Form,1,0,1,,
             0.0,D,login,Login Form,1,0,1,,
             p0,E,login,Login Form,1,0,1,,
             10,F,login,Login Form,1,0,1,,
"
        );
        let parsed = parse_actions(&text).unwrap();
        assert_eq!(parsed.rows_dropped, 3);
        let ids: Vec<_> = parsed.records.iter().map(|r| r.persona_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p0", "10"]);
    }

    #[test]
    fn negative_and_fractional_counts_become_zero() {
        let text = format!("{HEADER}
p1,A,login,Login Form,4.5,-1,1,x,
");
        let parsed = parse_actions(&text).unwrap();
        assert_eq!(parsed.records[0].steps_count, 0);
        assert_eq!(parsed.records[0].errors, 0);
        assert_eq!(parsed.coerced_cells, 2);
    }

    #[test]
    fn coerces_bad_cells_and_counts_them() {
        let text = format!("{HEADER}\np1,A,login,Login Form,abc,,maybe,x,\n");
        let parsed = parse_actions(&text).unwrap();
        let r = &parsed.records[0];
        assert_eq!(r.steps_count, 0);
        assert_eq!(r.errors, 0);
        assert!(!r.success);
        assert_eq!(r.estimated_time, None);
        assert_eq!(parsed.coerced_cells, 3);
        assert_eq!(parsed.warnings.len(), 3);
    }

    #[test]
    fn columns_are_found_by_name() {
        let text = "success,errors,persona_id,steps_count,task_label,persona_label,actions\n\
                    true,3,p9,7,Checkout Form,Distracted User,wait(page)\n";
        let parsed = parse_actions(text).unwrap();
        let r = &parsed.records[0];
        assert_eq!(r.persona_id, "p9");
        assert_eq!(r.persona_label, "Distracted User");
        assert_eq!(r.steps_count, 7);
        assert_eq!(r.errors, 3);
        assert!(r.success);
        assert_eq!(r.task, None);
    }

    #[test]
    fn reports_missing_columns() {
        let parsed = parse_actions("persona_id,persona_label\np1,A\n").unwrap();
        assert_eq!(
            parsed.missing_columns,
            vec!["task_label", "steps_count", "errors", "success", "actions"]
        );
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].steps_count, 0);
    }

    #[test]
    fn empty_log_yields_no_rows() {
        let parsed = parse_actions("").unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.warnings, vec!["missing_header".to_string()]);
    }

    #[test]
    fn count_coercion() {
        assert_eq!(coerce_count("4"), Some(4));
        assert_eq!(coerce_count(" 12 "), Some(12));
        assert_eq!(coerce_count("6.0"), Some(6));
        assert_eq!(coerce_count("4.5"), None);
        assert_eq!(coerce_count("-1"), None);
        assert_eq!(coerce_count(""), None);
        assert_eq!(coerce_count("NaN"), None);
    }

    #[test]
    fn flag_coercion() {
        assert_eq!(coerce_flag("1"), Some(true));
        assert_eq!(coerce_flag("0"), Some(false));
        assert_eq!(coerce_flag("TRUE"), Some(true));
        assert_eq!(coerce_flag("False"), Some(false));
        assert_eq!(coerce_flag("1.0"), Some(true));
        assert_eq!(coerce_flag("yes"), None);
        assert_eq!(coerce_flag(""), None);
    }

    #[test]
    fn malformed_persona_json_is_fatal() {
        assert!(matches!(parse_personas("[{\"id\": 1"), Err(LoadError::Json(_))));
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = content_sha256(b"abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
