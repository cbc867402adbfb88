//! HTTP verification client

use crate::verify::error::{VerifyError, VerifyResult};
use crate::verify::payload::VerificationPayload;
use crate::verify::response::interpret_response;
use crate::verify::types::{VerificationReport, VerifyConfig};
use async_trait::async_trait;
use std::time::Duration;

/// Anything that can verify one scanned text
///
/// Implementations must not fail: every problem is reported as a
/// transport-error report.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, scanned: &str) -> VerificationReport;
}

/// Posts scanned payloads to the ticket verification endpoint
#[derive(Debug, Clone)]
pub struct VerificationClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl VerificationClient {
    pub fn new(config: &VerifyConfig) -> VerifyResult<Self> {
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(VerifyError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VerifyError::ClientBuild {
                reason: e.to_string(),
            })?;

        log::debug!(
            "Verification client for {} (timeout {:?})",
            config.endpoint,
            config.timeout
        );

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            timeout: config.timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one payload and classify the answer
    pub async fn submit(&self, payload: &VerificationPayload) -> VerifyResult<VerificationReport> {
        log::debug!("Verification request body: {}", payload.to_value());
        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        match interpret_response(&body) {
            Ok(report) => {
                if !status.is_success() {
                    log::debug!("Endpoint answered HTTP {} with a verification body", status);
                }
                Ok(report)
            }
            Err(_) if !status.is_success() => Err(VerifyError::HttpStatus {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    fn request_error(&self, error: reqwest::Error) -> VerifyError {
        if error.is_timeout() {
            VerifyError::Timeout {
                after: self.timeout,
            }
        } else {
            VerifyError::Transport {
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Verifier for VerificationClient {
    async fn verify(&self, scanned: &str) -> VerificationReport {
        let payload = VerificationPayload::from_scanned(scanned);
        log::debug!(
            "Submitting {} payload to {}",
            if payload.is_structured() {
                "structured"
            } else {
                "ticket-id"
            },
            self.endpoint
        );

        match self.submit(&payload).await {
            Ok(report) => {
                log::info!("Verification answered: {}", report.outcome);
                report
            }
            Err(e) => {
                log::warn!("Verification transport error: {}", e);
                VerificationReport::transport_error(e.to_string())
            }
        }
    }
}
