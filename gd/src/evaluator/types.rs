//! Scoring service payload types

use serde::{Deserialize, Serialize};

/// One scored example: the goal, the model's answer, and the reference context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub actual_output: String,
    pub retrieval_context: Vec<String>,
}

/// Metric a scorer computes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreType {
    Faithfulness,
}

/// Scorer definition sent with a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub score_type: ScoreType,
    pub threshold: f64,
}

impl ScorerConfig {
    pub fn faithfulness(threshold: f64) -> Self {
        Self {
            score_type: ScoreType::Faithfulness,
            threshold,
        }
    }
}

/// Everything the service needs for one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRun {
    pub project_name: String,
    pub eval_name: String,
    pub examples: Vec<Example>,
    pub scorers: Vec<ScorerConfig>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

/// Per-example result returned by the service
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringResult {
    pub success: bool,
    #[serde(default)]
    pub scorers_data: Option<Vec<ScorerData>>,
}

/// Per-scorer detail within a result
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerData {
    pub name: String,
    #[serde(default)]
    pub threshold: Option<f64>,
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScorerData {
    /// One-line description of a failed scorer
    pub fn describe(&self) -> String {
        let mut line = self.name.clone();
        if let Some(score) = self.score {
            line.push_str(&format!(" scored {:.2}", score));
        }
        if let Some(threshold) = self.threshold {
            line.push_str(&format!(" (threshold {})", threshold));
        }
        if let Some(error) = &self.error {
            line.push_str(&format!(": {}", error));
        } else if let Some(reason) = &self.reason {
            line.push_str(&format!(": {}", reason));
        }
        line
    }
}

/// The service has answered with both a bare list and a wrapped one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ScoringResponse {
    Wrapped { results: Vec<ScoringResult> },
    Bare(Vec<ScoringResult>),
}

impl ScoringResponse {
    pub(crate) fn into_results(self) -> Vec<ScoringResult> {
        match self {
            ScoringResponse::Wrapped { results } => results,
            ScoringResponse::Bare(results) => results,
        }
    }
}
