//! Error types for loading and view state.
//!
//! Load failures are fatal: a dashboard is never built from a partial dataset.
//! Bad individual cells are not errors; they are coerced and counted in the
//! load report instead.

/// Failure to fetch or parse one of the two input sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Local file could not be read
    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Remote fetch failed or returned a non-success status
    #[error("failed to fetch {location}: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    /// Source location looked like a URL but did not parse
    #[error("invalid source location {location}: {reason}")]
    InvalidLocation { location: String, reason: String },

    /// Persona document is not a valid persona array
    #[error("invalid persona json: {0}")]
    Json(#[from] serde_json::Error),

    /// Action log is not valid delimited text
    #[error("invalid action csv at line {line}: {reason}")]
    Csv { line: usize, reason: String },
}

/// Tab controller transition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TabError {
    #[error("unknown panel: {0}")]
    UnknownPanel(String),
}
