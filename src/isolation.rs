// ext-fuzzing/src/isolation.rs
//! Network and configuration isolation for the target module
//!
//! Before a run, connection and credential settings the target expects are
//! pre-seeded with dummy values, and its outbound-fetch capability is
//! replaced with a stub that always answers with an empty success. The
//! target must never depend on real network responses during fuzzing.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::constants::seeded;

/// Canned response handed to the target in place of a real one
#[derive(Debug, Clone)]
pub struct StubResponse {
    /// Whether the response counts as a success
    pub ok: bool,
    /// HTTP-style status code
    pub status: u16,
    body: Value,
}

impl StubResponse {
    /// Empty successful response
    pub fn empty_ok() -> Self {
        Self {
            ok: true,
            status: 200,
            body: Value::Object(Default::default()),
        }
    }

    /// Body parsed as JSON (always an empty object for the stub)
    pub fn json(&self) -> Value {
        self.body.clone()
    }

    /// Body as text (always empty for the stub)
    pub fn text(&self) -> String {
        String::new()
    }
}

/// Outbound-HTTP capability exposed to target code
pub trait TargetHttp: Send + Sync {
    /// Perform a fetch on behalf of the target
    fn fetch(&self, url: &str) -> StubResponse;
}

/// The fuzzing implementation: swallows every request
pub struct StubHttp;

impl TargetHttp for StubHttp {
    fn fetch(&self, url: &str) -> StubResponse {
        debug!("intercepted target fetch to {}", url);
        StubResponse::empty_ok()
    }
}

/// Environment handed to the target module at construction time
pub struct TargetEnv {
    config: HashMap<String, String>,
    http: Arc<dyn TargetHttp>,
}

impl TargetEnv {
    /// Environment with an empty configuration, dummy-seeded, and the
    /// stubbed fetch capability
    pub fn seeded() -> Self {
        Self::with_config(HashMap::new())
    }

    /// Seed an existing configuration; keys already set are left alone
    pub fn with_config(mut config: HashMap<String, String>) -> Self {
        for key in seeded::URL_KEYS {
            config
                .entry((*key).to_string())
                .or_insert_with(|| seeded::SERVICE_URL.to_string());
        }
        for key in seeded::CREDENTIAL_KEYS {
            config
                .entry((*key).to_string())
                .or_insert_with(|| seeded::CREDENTIAL.to_string());
        }
        Self {
            config,
            http: Arc::new(StubHttp),
        }
    }

    /// Look up a configuration value
    pub fn config(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// The fetch capability the target should use for outward calls
    pub fn http(&self) -> Arc<dyn TargetHttp> {
        Arc::clone(&self.http)
    }
}
