// ext-fuzzing/src/client.rs
//! HTTP client for the controller service
//!
//! The controller is an opaque peer: it answers a liveness probe, hands out
//! the fuzz-case queue, and stores the final report. A missing or malformed
//! queue is an empty run, not a failure; only an unreachable controller is
//! fatal.

use log::{debug, error, info};
use tokio::time::sleep;

use crate::constants::{HTTP_TIMEOUT, READY_MAX_ATTEMPTS, READY_RETRY_DELAY};
use crate::error::HarnessError;
use crate::queue::{FuzzCase, RunReport};

pub struct ControllerClient {
    client: reqwest::Client,
    base_url: String,
}

impl ControllerClient {
    pub fn new(host: &str, port: u16) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: format!("http://{}:{}", host, port),
        }
    }

    /// Readiness gate: poll `GET /ping` until the controller answers with
    /// any success status, up to the retry budget.
    pub async fn wait_ready(&self) -> Result<(), HarnessError> {
        for attempt in 1..=READY_MAX_ATTEMPTS {
            match self
                .client
                .get(format!("{}/ping", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    info!("controller ready after {} attempt(s)", attempt);
                    return Ok(());
                }
                Ok(response) => {
                    debug!("ping attempt {} returned {}", attempt, response.status());
                }
                Err(err) => {
                    debug!("ping attempt {} failed: {}", attempt, err);
                }
            }
            sleep(READY_RETRY_DELAY).await;
        }
        Err(HarnessError::ControllerUnavailable(READY_MAX_ATTEMPTS))
    }

    /// Fetch the case queue from `GET /tests`. Non-success statuses and
    /// malformed bodies yield an empty queue.
    pub async fn fetch_cases(&self) -> Vec<FuzzCase> {
        let response = match self
            .client
            .get(format!("{}/tests", self.base_url))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("GET /tests failed: {}", err);
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            error!("GET /tests -> {}", response.status());
            return Vec::new();
        }
        match response.json::<Vec<FuzzCase>>().await {
            Ok(cases) => {
                info!("fetched queue of {} case(s)", cases.len());
                cases
            }
            Err(err) => {
                error!("malformed /tests body: {}", err);
                Vec::new()
            }
        }
    }

    /// Post the final report to `POST /report`. Fire-and-forget: the
    /// response body is not interpreted.
    pub async fn send_report(&self, report: &RunReport) -> Result<(), HarnessError> {
        self.client
            .post(format!("{}/report", self.base_url))
            .json(report)
            .send()
            .await?;
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
