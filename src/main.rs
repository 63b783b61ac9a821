use anyhow::Result;
use simpersona::app;
use simpersona::config::DashboardConfig;
use simpersona::logging::{self, obj, v_count, v_str, Domain, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = DashboardConfig::from_env().with_args(std::env::args().skip(1));
    logging::info(
        Domain::System,
        "startup",
        obj(&[
            ("personas_src", v_str(&cfg.personas_src)),
            ("actions_src", v_str(&cfg.actions_src)),
            ("out_dir", v_str(&cfg.out_dir)),
        ]),
    );

    match app::build(&cfg).await {
        Ok(out) => {
            println!("dashboard: {}", out.html_path.display());
            println!("manifest:  {}", out.manifest_path.display());
            println!(
                "personas: {}  rows: {} kept / {} dropped  coerced cells: {}",
                out.report.personas,
                out.report.rows_kept,
                out.report.rows_dropped,
                out.report.coerced_cells
            );
            logging::info(Domain::System, "shutdown", obj(&[("bytes", v_count(out.html_bytes))]));
            Ok(())
        }
        Err(err) => {
            logging::log(
                Level::Error,
                Domain::System,
                "build_failed",
                obj(&[("msg", v_str(&format!("{:#}", err)))]),
            );
            Err(err)
        }
    }
}
