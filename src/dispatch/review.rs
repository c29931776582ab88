//! The analysis sink and its HTTP implementation.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::ReviewConfig;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Review request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result of a submission, surfaced verbatim to the review log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub text: String,
}

/// Downstream analysis sink for extracted diffs.
///
/// The pipeline treats the sink as opaque: it only needs success or failure
/// plus a textual result for logging.
#[async_trait]
pub trait ReviewSink: Send + Sync {
    async fn submit(&self, diff: &str) -> Result<ReviewOutcome, SinkError>;
}

/// Review backend client.
///
/// Submits the diff as JSON and reports the response body whatever the
/// status code; only transport failures are errors.
pub struct HttpReviewClient {
    http: reqwest::Client,
    base_url: String,
    org_id: u64,
}

impl HttpReviewClient {
    pub fn new(config: &ReviewConfig) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            org_id: config.org_id,
        })
    }
}

#[async_trait]
impl ReviewSink for HttpReviewClient {
    async fn submit(&self, diff: &str) -> Result<ReviewOutcome, SinkError> {
        let response = self
            .http
            .post(format!("{}/api/review/analyze", self.base_url))
            .json(&serde_json::json!({
                "code": diff,
                "orgId": self.org_id,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Ok(ReviewOutcome {
            text: format!("review response ({}): {body}", status.as_u16()),
        })
    }
}
