// ext-fuzzing/src/instrumentation/coverage.rs
//! Precise per-function call-count coverage session
//!
//! The session is a single process-wide handle with an explicit lifecycle:
//! `open -> {record_call, snapshot}* -> close`. Instrumented target sources
//! register their full function list up front so a snapshot reports every
//! declared function, including those never called. Call counts only ever
//! increase; they are never reset within one session.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the coverage session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoverageError {
    /// A snapshot was requested after the session was closed
    #[error("coverage session is closed")]
    SessionClosed,
}

/// Call-count entry for a single function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCoverage {
    /// Function name as declared by the source
    pub name: String,
    /// Total calls observed since the session opened
    pub count: u64,
}

/// Absolute coverage for one instrumented source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCoverage {
    /// Source identifier (target sources carry the target marker)
    pub source_id: String,
    /// Per-function call counts, in declaration order
    pub functions: Vec<FunctionCoverage>,
}

struct SessionState {
    open: bool,
    /// Source id -> declared functions, declaration order preserved
    sources: BTreeMap<String, Vec<String>>,
    counts: HashMap<(String, String), u64>,
}

/// Handle to the process-wide coverage instrumentation.
///
/// Clones share the same underlying session; target functions hold a clone
/// and report into it via [`record_call`](CoverageSession::record_call).
#[derive(Clone)]
pub struct CoverageSession {
    inner: Arc<Mutex<SessionState>>,
}

impl CoverageSession {
    /// Open a fresh session with no registered sources
    pub fn open() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                open: true,
                sources: BTreeMap::new(),
                counts: HashMap::new(),
            })),
        }
    }

    /// Register a source and its declared function list. Registration gives
    /// the source a `total` in the end-of-run summary even if nothing in it
    /// is ever called.
    pub fn register_source(&self, source_id: &str, functions: &[&str]) {
        let mut state = self.lock();
        let declared = state.sources.entry(source_id.to_string()).or_default();
        for function in functions {
            if !declared.iter().any(|f| f == function) {
                declared.push((*function).to_string());
            }
        }
    }

    /// Record one call of `function` in `source_id`. Calls against a closed
    /// session are dropped.
    pub fn record_call(&self, source_id: &str, function: &str) {
        let mut state = self.lock();
        if !state.open {
            return;
        }
        // Functions observed without prior registration are added on the fly
        let declared = state.sources.entry(source_id.to_string()).or_default();
        if !declared.iter().any(|f| f == function) {
            declared.push(function.to_string());
        }
        *state
            .counts
            .entry((source_id.to_string(), function.to_string()))
            .or_insert(0) += 1;
    }

    /// Take an absolute snapshot of every registered source.
    ///
    /// Async to match the round-trip nature of the instrumentation
    /// interface; the executor awaits each retrieval before moving on.
    pub async fn snapshot(&self) -> Result<Vec<SourceCoverage>, CoverageError> {
        let state = self.lock();
        if !state.open {
            return Err(CoverageError::SessionClosed);
        }
        let mut snapshot = Vec::with_capacity(state.sources.len());
        for (source_id, declared) in &state.sources {
            let functions = declared
                .iter()
                .map(|name| FunctionCoverage {
                    name: name.clone(),
                    count: state
                        .counts
                        .get(&(source_id.clone(), name.clone()))
                        .copied()
                        .unwrap_or(0),
                })
                .collect();
            snapshot.push(SourceCoverage {
                source_id: source_id.clone(),
                functions,
            });
        }
        Ok(snapshot)
    }

    /// Stop collection. Subsequent snapshots fail and records are dropped.
    pub fn close(&self) {
        self.lock().open = false;
    }

    /// Whether the session is still collecting
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            // A panic inside a target function can poison the lock; counts
            // remain valid because increments are atomic under the guard.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
