//! Print the per-persona summary for an action log and optionally export it.
//!
//! usage: persona_summary [actions.csv|url] [summary.sqlite]

use anyhow::{Context, Result};
use reqwest::Client;
use simpersona::app::export_summary;
use simpersona::config::DashboardConfig;
use simpersona::data::{open_source, parse_actions};
use simpersona::model::AppState;
use simpersona::report::summary_table;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = DashboardConfig::from_env();
    let mut args = std::env::args().skip(1);
    let actions_src = args.next().unwrap_or(cfg.actions_src);
    let db = args.next().or(cfg.summary_db);

    let client = Client::new();
    let text = open_source(&actions_src, &client)?
        .fetch_text()
        .await
        .with_context(|| format!("reading {}", actions_src))?;
    let parsed = parse_actions(&text)?;
    if parsed.records.is_empty() {
        eprintln!("no action rows in {}", actions_src);
        std::process::exit(2);
    }

    println!("SUMMARY ({} runs, {} dropped)", parsed.records.len(), parsed.rows_dropped);
    print!("{}", summary_table(&parsed.records));

    if let Some(db) = db {
        let state = AppState::new(Vec::new(), parsed.records);
        export_summary(&db, &state)?;
        println!("exported to {}", db);
    }
    Ok(())
}
