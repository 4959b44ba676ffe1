// ext-fuzzing/src/constants.rs
//! Shared constants for the fuzz-execution harness

use std::time::Duration;

/// Default controller host supplying the fuzz-case queue
pub const CONTROLLER_HOST: &str = "127.0.0.1";

/// Default controller port
pub const CONTROLLER_PORT: u16 = 5000;

/// Substring that marks target-module sources in coverage snapshots.
/// Sources without this marker belong to the harness or runtime and are
/// never reported.
pub const TARGET_SOURCE_MARKER: &str = "/ext-fuzz-";

/// Maximum number of readiness probes against the controller
pub const READY_MAX_ATTEMPTS: u32 = 10;

/// Delay between readiness probes
pub const READY_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Timeout for individual controller HTTP requests
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Dummy values seeded into the target configuration before a run so the
/// target never reaches a real service
pub mod seeded {
    /// Placeholder service URL
    pub const SERVICE_URL: &str = "http://127.0.0.1:8080";
    /// Placeholder credential value
    pub const CREDENTIAL: &str = "fuzzer";
    /// Configuration keys that receive the placeholder URL
    pub const URL_KEYS: &[&str] = &["url", "baseUrl"];
    /// Configuration keys that receive the placeholder credential
    pub const CREDENTIAL_KEYS: &[&str] = &["username", "password"];
}

/// Environment variable overrides
pub mod env_vars {
    /// Override for the controller host
    pub const CONTROLLER_HOST: &str = "EXT_FUZZING_CONTROLLER_HOST";
    /// Override for the controller port
    pub const CONTROLLER_PORT: &str = "EXT_FUZZING_CONTROLLER_PORT";
}
