// ext-fuzzing
// Coverage-guided fuzz-execution harness

pub mod constants;
pub mod error;

// Core modules
pub mod client;
pub mod demo;
pub mod executor;
pub mod instrumentation;
pub mod isolation;
pub mod queue;
pub mod reporters;
pub mod resolver;
pub mod target;
pub mod tracker;

// Re-exports for convenience
pub use constants::*;
pub use error::HarnessError;

use log::info;

/// Initialize the harness: logging first, so every later component can
/// report. Safe to call more than once.
pub fn init() {
    let _ = env_logger::Builder::from_default_env().try_init();
    info!("extension fuzzing harness initialized");
}

/// Finalize the harness after the report has been handed off
pub fn finalize() {
    info!("extension fuzzing harness finished");
}
