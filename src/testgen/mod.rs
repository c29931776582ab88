//! Test generation tooling on top of the review backend.
//!
//! Takes a diff (usually the most recent one the dispatcher stored),
//! asks the backend to generate tests for it, optionally validates the
//! result, and writes the test text beneath the project root.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::auth::AuthSession;
use crate::config::{ReviewConfig, TestGenConfig};

#[derive(Error, Debug)]
pub enum TestGenError {
    #[error("Test generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Cannot write generated test to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of validating generated tests against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub passed: bool,
    /// Raw backend verdict, shown to the user as is.
    pub verdict: String,
}

/// Client for the backend's test generation endpoints.
///
/// Requests carry the session's bearer token when one is present; the
/// backend decides what anonymous callers may do.
pub struct TestGenClient {
    http: reqwest::Client,
    base_url: String,
}

impl TestGenClient {
    pub fn new(config: &ReviewConfig) -> Result<Self, TestGenError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Generate test code for a diff.
    pub async fn generate(&self, diff: &str, auth: &AuthSession) -> Result<String, TestGenError> {
        let mut request = self
            .http
            .post(format!("{}/api/test/generate", self.base_url))
            .json(&serde_json::json!({ "code": diff }));

        if let Some(token) = auth.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TestGenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    /// Ask the backend to run and judge generated tests.
    ///
    /// The backend marks a passing run with a check mark in its verdict
    /// text; everything else counts as failed.
    pub async fn validate(
        &self,
        tests: &str,
        auth: &AuthSession,
    ) -> Result<ValidationReport, TestGenError> {
        let mut request = self
            .http
            .post(format!("{}/api/test/validate", self.base_url))
            .json(&serde_json::json!({ "tests": tests }));

        if let Some(token) = auth.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TestGenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ValidationReport {
            passed: body.contains('✅'),
            verdict: body,
        })
    }
}

/// Write generated test text beneath the project root, creating the
/// output directory as needed. Returns the written path.
pub fn write_test_file(
    project_root: &Path,
    config: &TestGenConfig,
    contents: &str,
) -> Result<PathBuf, TestGenError> {
    let dir = project_root.join(&config.output_dir);
    std::fs::create_dir_all(&dir).map_err(|source| TestGenError::Write {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join(&config.file_name);
    std::fs::write(&path, contents).map_err(|source| TestGenError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_output_dir() {
        let temp = TempDir::new().unwrap();
        let config = TestGenConfig {
            output_dir: PathBuf::from("test/generated"),
            file_name: "GeneratedTest.java".to_string(),
        };

        let path = write_test_file(temp.path(), &config, "class GeneratedTest {}").unwrap();

        assert_eq!(
            path,
            temp.path().join("test/generated/GeneratedTest.java")
        );
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "class GeneratedTest {}"
        );
    }

    #[test]
    fn test_write_overwrites_previous_output() {
        let temp = TempDir::new().unwrap();
        let config = TestGenConfig::default();

        write_test_file(temp.path(), &config, "first").unwrap();
        let path = write_test_file(temp.path(), &config, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
