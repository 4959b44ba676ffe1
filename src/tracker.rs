// ext-fuzzing/src/tracker.rs
//! Coverage tracking across a fuzzing run
//!
//! The tracker owns the coverage session handle and the running hit tally:
//! the highest call count seen so far for every `(source, function)` key.
//! Diffing against the running tally, rather than the previous snapshot
//! alone, keeps a function hit by an earlier case from being re-reported as
//! newly hit unless its count actually increased again.

use std::collections::{BTreeMap, HashMap};

use crate::constants::TARGET_SOURCE_MARKER;
use crate::instrumentation::coverage::{CoverageError, CoverageSession};
use crate::queue::SourceSummary;

/// Identity of one tracked function
pub type CoverageKey = (String, String);

/// Functions newly hit by a single case, per target source
pub type CoverageDelta = BTreeMap<String, Vec<String>>;

/// Per-run coverage state: session handle plus hit tally
pub struct CoverageTracker {
    session: CoverageSession,
    tally: HashMap<CoverageKey, u64>,
}

impl CoverageTracker {
    /// Start tracking against an open session with an empty tally
    pub fn new(session: CoverageSession) -> Self {
        Self {
            session,
            tally: HashMap::new(),
        }
    }

    /// Snapshot and report every target-module function whose call count
    /// strictly exceeds the tally, updating the tally as it goes. Sources
    /// without the target marker are harness or runtime code and skipped.
    pub async fn delta(&mut self) -> Result<CoverageDelta, CoverageError> {
        let snapshot = self.session.snapshot().await?;
        let mut newly_hit: CoverageDelta = BTreeMap::new();
        for source in &snapshot {
            if !source.source_id.contains(TARGET_SOURCE_MARKER) {
                continue;
            }
            for function in &source.functions {
                if function.count == 0 {
                    continue;
                }
                let key = (source.source_id.clone(), function.name.clone());
                let previous = self.tally.get(&key).copied().unwrap_or(0);
                if function.count > previous {
                    newly_hit
                        .entry(source.source_id.clone())
                        .or_default()
                        .push(function.name.clone());
                }
                // update running tally
                self.tally.insert(key, function.count);
            }
        }
        Ok(newly_hit)
    }

    /// End-of-run summary from one final absolute snapshot: per target
    /// source, the number of instrumented functions and how many were hit
    /// at least once.
    pub async fn summary(&self) -> Result<BTreeMap<String, SourceSummary>, CoverageError> {
        let snapshot = self.session.snapshot().await?;
        let mut summary = BTreeMap::new();
        for source in &snapshot {
            if !source.source_id.contains(TARGET_SOURCE_MARKER) {
                continue;
            }
            let hit = source.functions.iter().filter(|f| f.count > 0).count();
            summary.insert(
                source.source_id.clone(),
                SourceSummary {
                    total: source.functions.len(),
                    hit,
                },
            );
        }
        Ok(summary)
    }

    /// Highest call count recorded in the tally for one function
    pub fn recorded_count(&self, source_id: &str, function: &str) -> u64 {
        self.tally
            .get(&(source_id.to_string(), function.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Stop coverage collection
    pub fn close(&self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "demo://ext-fuzz-sample";
    const RUNTIME_SRC: &str = "runtime://internal";
    const FUNCS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

    fn tracked_session() -> (CoverageSession, CoverageTracker) {
        let session = CoverageSession::open();
        session.register_source(SRC, &FUNCS);
        session.register_source(RUNTIME_SRC, &["helper"]);
        let tracker = CoverageTracker::new(session.clone());
        (session, tracker)
    }

    #[tokio::test]
    async fn delta_reports_only_marked_sources() {
        let (session, mut tracker) = tracked_session();
        session.record_call(SRC, "alpha");
        session.record_call(RUNTIME_SRC, "helper");

        let delta = tracker.delta().await.unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[SRC], vec!["alpha".to_string()]);
    }

    #[tokio::test]
    async fn function_hit_earlier_is_not_rereported() {
        let (session, mut tracker) = tracked_session();

        session.record_call(SRC, "alpha");
        let first = tracker.delta().await.unwrap();
        assert_eq!(first[SRC], vec!["alpha".to_string()]);

        // Nothing ran in between: the next delta must be empty
        let second = tracker.delta().await.unwrap();
        assert!(second.is_empty());

        // But a further increase is newly reportable
        session.record_call(SRC, "alpha");
        let third = tracker.delta().await.unwrap();
        assert_eq!(third[SRC], vec!["alpha".to_string()]);
    }

    #[tokio::test]
    async fn delta_attributes_each_function_once_per_case() {
        let (session, mut tracker) = tracked_session();
        session.record_call(SRC, "beta");
        session.record_call(SRC, "beta");
        session.record_call(SRC, "gamma");

        let delta = tracker.delta().await.unwrap();
        assert_eq!(delta[SRC], vec!["beta".to_string(), "gamma".to_string()]);
    }

    #[tokio::test]
    async fn summary_counts_hit_and_total() {
        let (session, mut tracker) = tracked_session();
        session.record_call(SRC, "alpha");
        session.record_call(SRC, "gamma");
        session.record_call(RUNTIME_SRC, "helper");
        tracker.delta().await.unwrap();

        let summary = tracker.summary().await.unwrap();
        assert_eq!(summary.len(), 1);
        let sample = &summary[SRC];
        assert_eq!(sample.total, FUNCS.len());
        assert_eq!(sample.hit, 2);
        assert!(sample.hit <= sample.total);
    }

    #[tokio::test]
    async fn summary_after_close_fails() {
        let (_, tracker) = tracked_session();
        tracker.close();
        assert!(tracker.summary().await.is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Tally counts never decrease, whatever the case sequence does.
            #[test]
            fn tally_is_monotonically_nondecreasing(
                chunks in prop::collection::vec(
                    prop::collection::vec(0usize..FUNCS.len(), 0..6),
                    1..8,
                )
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let (session, mut tracker) = tracked_session();
                    let mut last_seen = [0u64; 4];
                    for chunk in &chunks {
                        for &idx in chunk {
                            session.record_call(SRC, FUNCS[idx]);
                        }
                        tracker.delta().await.unwrap();
                        for (idx, name) in FUNCS.iter().enumerate() {
                            let now = tracker.recorded_count(SRC, name);
                            assert!(now >= last_seen[idx]);
                            last_seen[idx] = now;
                        }
                    }
                });
            }
        }
    }
}
