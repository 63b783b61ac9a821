//! End-to-end dashboard build: load, derive views, activate the default
//! panel, write the page and its manifest.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::persona_summary;
use crate::config::DashboardConfig;
use crate::data::{load_from_locations, LoadReport};
use crate::logging::{self, obj, v_count, v_str, Domain, ProfileScope};
use crate::model::AppState;
use crate::render::render_dashboard;
use crate::report::SummaryStore;
use crate::tabs::{TabController, DEFAULT_PANEL};
use crate::view::{build_dashboard, DashboardView};

/// Files written by a build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub html_path: PathBuf,
    pub manifest_path: PathBuf,
    pub html_bytes: usize,
    pub report: LoadReport,
}

/// Views plus tab state, ready to render.
pub struct Dashboard {
    pub view: DashboardView,
    pub tabs: TabController,
}

/// Derive every view from `state`, then make the dashboard panel the visible
/// one.
pub fn assemble(state: &AppState, asset_dir: &str) -> Result<Dashboard> {
    let _scope = ProfileScope::new(Domain::Render, "assemble");
    if state.is_empty() {
        logging::warn(
            Domain::Render,
            "empty_dataset",
            obj(&[("msg", v_str("rendering empty views"))]),
        );
    }
    let mut tabs = TabController::with_default_panels();
    let view = build_dashboard(state, asset_dir, &logging::ts_now());
    tabs.set_active_panel(DEFAULT_PANEL)?;
    logging::info(
        Domain::Aggregate,
        "views_built",
        obj(&[
            ("cards", v_count(view.cards.len())),
            ("table_rows", v_count(view.table.rows.len())),
            ("personas", v_count(view.persona_labels.len())),
            ("charts", v_count(view.charts.len())),
        ]),
    );
    Ok(Dashboard { view, tabs })
}

pub fn write_outputs(
    out_dir: &Path,
    dashboard: &Dashboard,
    report: &LoadReport,
) -> Result<(PathBuf, PathBuf, usize)> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let html = render_dashboard(&dashboard.view, &dashboard.tabs)?;
    let html_path = out_dir.join("index.html");
    let manifest_path = out_dir.join("manifest.json");
    fs::write(&html_path, &html).with_context(|| format!("writing {}", html_path.display()))?;
    fs::write(&manifest_path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;
    Ok((html_path, manifest_path, html.len()))
}

pub fn export_summary(db_path: &str, state: &AppState) -> Result<()> {
    let summary = persona_summary(&state.actions);
    let mut store = SummaryStore::open(db_path)?;
    store.init()?;
    store.export(logging::run_id(), &summary, &state.actions)?;
    logging::info(
        Domain::Export,
        "summary_exported",
        obj(&[
            ("path", v_str(db_path)),
            ("personas", v_count(summary.len())),
            ("rows", v_count(state.actions.len())),
        ]),
    );
    Ok(())
}

/// Full build. A load failure aborts before anything is written.
pub async fn build(cfg: &DashboardConfig) -> Result<BuildOutput> {
    let (state, report) = load_from_locations(&cfg.personas_src, &cfg.actions_src)
        .await
        .context("loading dashboard data")?;
    let dashboard = assemble(&state, &cfg.asset_dir)?;
    let (html_path, manifest_path, html_bytes) =
        write_outputs(Path::new(&cfg.out_dir), &dashboard, &report)?;
    logging::info(
        Domain::Render,
        "dashboard_written",
        obj(&[
            ("html", v_str(&html_path.display().to_string())),
            ("manifest", v_str(&manifest_path.display().to_string())),
            ("bytes", v_count(html_bytes)),
        ]),
    );
    if let Some(db) = &cfg.summary_db {
        export_summary(db, &state)?;
    }
    Ok(BuildOutput {
        html_path,
        manifest_path,
        html_bytes,
        report,
    })
}
