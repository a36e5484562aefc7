//! Judgment Labs scoring service client

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::types::{EvaluationRun, ScoringResponse, ScoringResult};
use super::{EvaluationError, ScoringService};
use crate::config::{ConfigError, ResolvedEvaluationConfig};

/// Client for the hosted evaluation API
pub struct JudgmentClient {
    api_key: String,
    org_key: Option<String>,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl JudgmentClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedEvaluationConfig) -> Result<Self, ConfigError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            api_key: config.api_key.clone(),
            org_key: config.org_key.clone(),
            base_url: config.base_url.clone(),
            http,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/evaluate/", self.base_url)
    }

    /// Fail when any example or scorer did not meet its threshold
    fn check_results(results: &[ScoringResult]) -> Result<(), EvaluationError> {
        debug!(result_count = results.len(), "check_results: called");
        if results.is_empty() {
            return Err(EvaluationError::InvalidResponse(
                "Scoring service returned no results".to_string(),
            ));
        }

        let failures: Vec<String> = results
            .iter()
            .filter(|r| !r.success)
            .flat_map(|r| match &r.scorers_data {
                Some(data) if data.iter().any(|d| !d.success) => {
                    data.iter().filter(|d| !d.success).map(|d| d.describe()).collect()
                }
                _ => vec!["example did not pass its scorers".to_string()],
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EvaluationError::AssertionFailed(failures.join("; ")))
        }
    }
}

#[async_trait]
impl ScoringService for JudgmentClient {
    async fn assert_test(&self, run: &EvaluationRun) -> Result<(), EvaluationError> {
        debug!(eval_name = %run.eval_name, project = %run.project_name, "assert_test: called");

        let mut request = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org_key) = &self.org_key {
            request = request.header("X-Organization-Id", org_key);
        }

        let response = request.json(run).send().await.map_err(|e| {
            if e.is_timeout() {
                EvaluationError::Timeout(self.timeout)
            } else {
                EvaluationError::Network(e)
            }
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "assert_test: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(EvaluationError::ApiError { status, message: text });
        }

        let body = response.text().await?;
        let parsed: ScoringResponse = serde_json::from_str(&body)
            .map_err(|e| EvaluationError::InvalidResponse(format!("{}: {}", e, body)))?;

        Self::check_results(&parsed.into_results())
    }
}
