// ext-fuzzing/src/queue.rs
//! Wire types shared with the controller
//!
//! The controller supplies the case queue as JSON (`funcName` + `args`);
//! the harness fills `coverage` and, for failing cases, `error` on the way
//! out. Field names follow the controller's camelCase convention.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single fuzz case: target function name plus argument list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzCase {
    /// Dotted name of the function to invoke
    pub func_name: String,
    /// Pre-generated argument list
    #[serde(default)]
    pub args: Vec<Value>,
    /// Functions newly hit by this case, per target source (output)
    #[serde(default)]
    pub coverage: BTreeMap<String, Vec<String>>,
    /// Failure message for cases in the error bucket (output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// End-of-run coverage figures for one target source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Functions instrumented in the source
    pub total: usize,
    /// Functions with at least one recorded call
    pub hit: usize,
}

/// The full run result, posted once to the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Cases whose invocation returned normally
    pub clean: Vec<FuzzCase>,
    /// Cases that failed resolution or invocation
    pub errors: Vec<FuzzCase>,
    /// Reserved for a case that killed the process; always `None` in the
    /// in-process sequential loop, serialized as `null`
    pub crash: Option<FuzzCase>,
    /// Per-source total/hit summary
    pub coverage: BTreeMap<String, SourceSummary>,
}
