use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    /// Persona document: a path or an http(s) URL
    pub personas_src: String,
    /// Action log: a path or an http(s) URL
    pub actions_src: String,
    /// Directory holding `<persona_id>.png` card images, as seen from the page
    pub asset_dir: String,
    pub out_dir: String,
    /// SQLite file for the summary export; no export when unset
    pub summary_db: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            personas_src: "data/simpersonas.json".to_string(),
            actions_src: "data/simpersona_actions.csv".to_string(),
            asset_dir: "./data/persona_cards".to_string(),
            out_dir: "out/dashboard".to_string(),
            summary_db: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            personas_src: std::env::var("PERSONAS_SRC").unwrap_or(d.personas_src),
            actions_src: std::env::var("ACTIONS_SRC").unwrap_or(d.actions_src),
            asset_dir: std::env::var("ASSET_DIR").unwrap_or(d.asset_dir),
            out_dir: std::env::var("OUT_DIR").unwrap_or(d.out_dir),
            summary_db: std::env::var("SUMMARY_DB").ok().filter(|s| !s.is_empty()),
        }
    }

    /// Positional arguments override the two sources: `<personas> <actions>`.
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        if let Some(p) = args.next() {
            self.personas_src = p;
        }
        if let Some(a) = args.next() {
            self.actions_src = a;
        }
        self
    }
}
