// ext-fuzzing/src/executor.rs
//! Sequential fuzz-case execution
//!
//! Cases run strictly one at a time: coverage attribution depends on no
//! interleaved execution between the pre-call tally state and the post-call
//! snapshot. A case that fails to resolve, returns an error, or panics goes
//! to the error bucket with its delta attached; only a lost coverage
//! snapshot aborts the run.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use log::{debug, warn};
use serde_json::Value;

use crate::error::HarnessError;
use crate::queue::FuzzCase;
use crate::resolver::{Bound, Resolver};
use crate::target::TargetReturn;
use crate::tracker::CoverageTracker;

/// Runs the case queue and accumulates the clean/error buckets
pub struct CaseExecutor<'a> {
    resolver: &'a Resolver,
    tracker: CoverageTracker,
    clean: Vec<FuzzCase>,
    errors: Vec<FuzzCase>,
}

impl<'a> CaseExecutor<'a> {
    pub fn new(resolver: &'a Resolver, tracker: CoverageTracker) -> Self {
        Self {
            resolver,
            tracker,
            clean: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Process the whole queue in order. Case-level failures never abort
    /// the run; a failed snapshot does.
    pub async fn run(&mut self, cases: Vec<FuzzCase>) -> Result<(), HarnessError> {
        for case in cases {
            self.run_case(case).await?;
        }
        Ok(())
    }

    async fn run_case(&mut self, case: FuzzCase) -> Result<(), HarnessError> {
        let FuzzCase {
            func_name, args, ..
        } = case;
        debug!("executing case {}", func_name);

        let outcome = match self.resolver.resolve(&func_name) {
            Some(bound) => invoke(&bound, &args).await,
            None => Err(format!("no such function: {}", func_name)),
        };

        // Snapshot and diff whether the call succeeded or not; the failed
        // call may still have executed target code before failing.
        let coverage = self.tracker.delta().await?;

        match outcome {
            Ok(_) => self.clean.push(FuzzCase {
                func_name,
                args,
                coverage,
                error: None,
            }),
            Err(message) => {
                warn!("case {} failed: {}", func_name, message);
                self.errors.push(FuzzCase {
                    func_name,
                    args,
                    coverage,
                    error: Some(message),
                });
            }
        }
        Ok(())
    }

    /// Cases executed so far that returned normally
    pub fn clean(&self) -> &[FuzzCase] {
        &self.clean
    }

    /// Cases executed so far that failed
    pub fn errors(&self) -> &[FuzzCase] {
        &self.errors
    }

    /// Tear down into the buckets and the tracker for report assembly
    pub fn finish(self) -> (Vec<FuzzCase>, Vec<FuzzCase>, CoverageTracker) {
        (self.clean, self.errors, self.tracker)
    }
}

/// Invoke a resolved callable, awaiting an awaitable return and containing
/// panics from either phase. A panic is the invocation-error analogue of a
/// thrown exception: it is captured as a message, never propagated.
async fn invoke(bound: &Bound, args: &[Value]) -> Result<Value, String> {
    let ret = match std::panic::catch_unwind(AssertUnwindSafe(|| bound.invoke(args))) {
        Ok(ret) => ret,
        Err(payload) => return Err(panic_message(payload)),
    };
    match ret {
        TargetReturn::Ready(result) => result,
        TargetReturn::Pending(future) => match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(panic_message(payload)),
        },
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "target function panicked".to_string()
    }
}
