//! Login client for the review backend.

use std::time::Duration;
use thiserror::Error;

use crate::config::ReviewConfig;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Login rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Login succeeded but the response carried no token")]
    EmptyToken,
}

/// Exchanges credentials for a bearer token.
///
/// Talks to the same backend as the review sink; the token it returns is
/// only ever held in an in-memory [`AuthSession`](super::AuthSession).
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(config: &ReviewConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let response = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // The backend returns the token as the first line of the body
        let token = body.lines().next().unwrap_or("").trim().to_string();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        Ok(token)
    }
}
