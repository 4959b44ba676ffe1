// ext-fuzzing/src/error.rs
//! Error types for the fuzz-execution harness

use thiserror::Error;

use crate::instrumentation::coverage::CoverageError;

/// Run-level failures. Per-case resolution and invocation errors are data
/// (they land in the report's error bucket), not variants here.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The controller never answered the readiness probe
    #[error("controller never became ready after {0} attempts")]
    ControllerUnavailable(u32),

    /// The coverage session could not produce a snapshot
    #[error("coverage snapshot failed: {0}")]
    Coverage(#[from] CoverageError),

    /// HTTP communication with the controller failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The run report could not be serialized
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}
