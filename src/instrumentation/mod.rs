// ext-fuzzing/src/instrumentation/mod.rs
//! Instrumentation utilities for precise per-function coverage tracking

pub mod coverage;

pub use coverage::{CoverageError, CoverageSession, FunctionCoverage, SourceCoverage};
