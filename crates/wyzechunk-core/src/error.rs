use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Malformed fragment path {}: {reason}", path.display())]
    MalformedPath { path: PathBuf, reason: String },

    #[error("Failed to render session {session}: {source}")]
    Render {
        session: String,
        #[source]
        source: ToolError,
    },

    #[error("Cancelled")]
    Cancelled,

    #[error("{} session(s) failed to render", .0.len())]
    Sessions(Vec<Error>),
}

impl Error {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single external concatenation run.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exited with {status}: {diagnostics}")]
    Failed { status: String, diagnostics: String },

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("reported success but produced no output")]
    NoOutput,

    #[error("interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
