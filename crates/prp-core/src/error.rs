//! Error taxonomy for the PRP runner.

use std::io;
use std::path::PathBuf;

use crate::config::INTERRUPTED_EXIT_CODE;

/// Generic failure exit code for configuration problems.
pub const CONFIG_EXIT_CODE: i32 = 1;

/// Runner errors.
///
/// Every variant aborts the run; the malformed stream line case is recovered
/// inside the relay and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("you must provide --prp or --prp-path")]
    MissingPrp,

    #[error("PRP not found: {}", path.display())]
    PrpNotFound { path: PathBuf },

    #[error("failed to read PRP {}: {source}", path.display())]
    PrpUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start agent `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("agent failed with exit code {code}")]
    AgentFailed { code: i32, stderr: String },

    #[error("interrupted by user")]
    Interrupted,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunnerError {
    /// Process exit code this error should terminate the run with.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::MissingPrp
            | RunnerError::PrpNotFound { .. }
            | RunnerError::PrpUnreadable { .. } => CONFIG_EXIT_CODE,
            RunnerError::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => 127,
                io::ErrorKind::PermissionDenied => 126,
                _ => CONFIG_EXIT_CODE,
            },
            RunnerError::AgentFailed { code, .. } => *code,
            RunnerError::Interrupted => INTERRUPTED_EXIT_CODE,
            RunnerError::Io(_) | RunnerError::Json(_) => 1,
        }
    }
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
