// ext-fuzzing/src/reporters/mod.rs
//! Run-report assembly and transmission

use log::warn;

use crate::client::ControllerClient;
use crate::error::HarnessError;
use crate::queue::{FuzzCase, RunReport};
use crate::tracker::CoverageTracker;

/// Assemble the final report: one last absolute snapshot for the summary,
/// then stop coverage collection. `crash` stays empty under normal
/// completion; a genuine process death would have to be detected by an
/// external supervisor.
pub async fn assemble(
    tracker: CoverageTracker,
    clean: Vec<FuzzCase>,
    errors: Vec<FuzzCase>,
) -> Result<RunReport, HarnessError> {
    let coverage = tracker.summary().await?;
    tracker.close();
    Ok(RunReport {
        clean,
        errors,
        crash: None,
        coverage,
    })
}

/// Assemble, print the operator summary, and post the report exactly once.
/// Transmission is best-effort: a failed post is logged and the run still
/// terminates normally.
pub async fn finalize_run(
    tracker: CoverageTracker,
    clean: Vec<FuzzCase>,
    errors: Vec<FuzzCase>,
    client: &ControllerClient,
) -> Result<RunReport, HarnessError> {
    let report = assemble(tracker, clean, errors).await?;
    print_summary(&report);
    if let Err(err) = client.send_report(&report).await {
        warn!("failed to transmit report to {}: {}", client.base_url(), err);
    }
    Ok(report)
}

/// Console summary in the shape operators expect from the fuzzing tools
pub fn print_summary(report: &RunReport) {
    println!("\n=================================================================");
    println!("Fuzzing Run Summary");
    println!("=================================================================");
    println!("Clean cases:  {}", report.clean.len());
    println!("Error cases:  {}", report.errors.len());
    if !report.errors.is_empty() {
        println!("\nFailures:");
        for case in &report.errors {
            println!(
                "  {}: {}",
                case.func_name,
                case.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    if !report.coverage.is_empty() {
        println!("\nCoverage by source:");
        for (source, summary) in &report.coverage {
            println!("  {}: {}/{} functions hit", source, summary.hit, summary.total);
        }
    }
    println!("=================================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrumentation::coverage::CoverageSession;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn assemble_summarizes_and_closes_the_session() {
        let session = CoverageSession::open();
        session.register_source("demo://ext-fuzz-sample", &["alpha", "beta"]);
        session.record_call("demo://ext-fuzz-sample", "alpha");
        let tracker = CoverageTracker::new(session.clone());

        let report = assemble(tracker, Vec::new(), Vec::new()).await.unwrap();

        assert!(report.crash.is_none());
        let summary = &report.coverage["demo://ext-fuzz-sample"];
        assert_eq!(summary.total, 2);
        assert_eq!(summary.hit, 1);
        // Collection stopped once the summary was taken
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn assemble_fails_on_a_closed_session() {
        let session = CoverageSession::open();
        session.close();
        let tracker = CoverageTracker::new(session);

        let result = assemble(tracker, Vec::new(), Vec::new()).await;
        assert!(result.is_err());
    }

    #[test]
    fn print_summary_handles_an_empty_report() {
        print_summary(&RunReport {
            clean: Vec::new(),
            errors: Vec::new(),
            crash: None,
            coverage: BTreeMap::new(),
        });
    }
}
