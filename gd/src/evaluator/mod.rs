//! Faithfulness evaluation of decompositions
//!
//! Packages the goal and the provider's answer with a fixed reference context
//! and asks the scoring service whether the answer stays faithful to it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

mod error;
mod judgment;
pub mod types;

pub use error::{EvaluationError, PROJECT_LIMIT_MARKER};
pub use judgment::JudgmentClient;
pub use types::{EvaluationRun, Example, ScoreType, ScorerConfig};

use crate::config::ResolvedEvaluationConfig;

/// Reference context every decomposition is checked against
pub const RETRIEVAL_CONTEXT: &str = "To become an AI Engineer, you typically need to learn Python, machine learning, deep learning, and build projects.";

/// Minimum faithfulness score for a pass
pub const FAITHFULNESS_THRESHOLD: f64 = 0.5;

/// A service that scores examples and fails when any scorer misses its threshold
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Submit the run; `Ok` means every example passed every scorer
    async fn assert_test(&self, run: &EvaluationRun) -> Result<(), EvaluationError>;
}

/// Why an evaluation did not pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The service's project quota is exhausted
    QuotaExceeded,
    /// Any other failure, carrying the service's message
    Other(String),
}

/// Result of one evaluation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Passed,
    Failed(FailureReason),
}

impl EvaluationOutcome {
    /// Categorize a scoring failure
    pub fn from_error(err: &EvaluationError) -> Self {
        if err.is_quota_exceeded() {
            EvaluationOutcome::Failed(FailureReason::QuotaExceeded)
        } else {
            EvaluationOutcome::Failed(FailureReason::Other(err.to_string()))
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, EvaluationOutcome::Passed)
    }
}

impl fmt::Display for EvaluationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationOutcome::Passed => write!(f, "Evaluation passed successfully!"),
            EvaluationOutcome::Failed(FailureReason::QuotaExceeded) => write!(
                f,
                "Project limit exceeded. Please upgrade your plan or use a different org/project."
            ),
            EvaluationOutcome::Failed(FailureReason::Other(message)) => {
                write!(f, "Evaluation failed: {}", message)
            }
        }
    }
}

/// Scores decompositions against the fixed reference context
pub struct Evaluator {
    service: Arc<dyn ScoringService>,
    project_name: String,
    model: String,
    organization_id: Option<String>,
}

impl Evaluator {
    /// Create a new evaluator
    pub fn new(service: Arc<dyn ScoringService>, project_name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            service,
            project_name: project_name.into(),
            model: model.into(),
            organization_id: None,
        }
    }

    /// Create an evaluator using the project, judge model and organization from config
    pub fn from_config(service: Arc<dyn ScoringService>, config: &ResolvedEvaluationConfig) -> Self {
        Self {
            organization_id: config.org_key.clone(),
            ..Self::new(service, config.project_name.clone(), config.model.clone())
        }
    }

    /// Build the single-example faithfulness run for a decomposition
    pub fn build_run(&self, goal: &str, decomposition: &str) -> EvaluationRun {
        debug!(project = %self.project_name, "build_run: called");
        EvaluationRun {
            project_name: self.project_name.clone(),
            eval_name: format!("{}-{}", self.project_name, chrono::Utc::now().format("%Y%m%d-%H%M%S")),
            examples: vec![Example {
                input: goal.to_string(),
                actual_output: decomposition.to_string(),
                retrieval_context: vec![RETRIEVAL_CONTEXT.to_string()],
            }],
            scorers: vec![ScorerConfig::faithfulness(FAITHFULNESS_THRESHOLD)],
            model: self.model.clone(),
            organization_id: self.organization_id.clone(),
        }
    }

    /// Score a decomposition; one attempt, failures become [`EvaluationOutcome::Failed`]
    #[instrument(skip_all, fields(project = %self.project_name, model = %self.model))]
    pub async fn evaluate(&self, goal: &str, decomposition: &str) -> EvaluationOutcome {
        info!("Running faithfulness evaluation");
        let run = self.build_run(goal, decomposition);

        match self.service.assert_test(&run).await {
            Ok(()) => {
                info!("Evaluation passed");
                EvaluationOutcome::Passed
            }
            Err(e) => {
                warn!(error = %e, quota = e.is_quota_exceeded(), "Evaluation failed");
                EvaluationOutcome::from_error(&e)
            }
        }
    }
}
