//! Decomposer - LLM-driven breakdown of a goal into attributed steps
//!
//! Builds the fixed planner prompt, hands it to whichever provider was
//! selected and returns the provider's text untouched.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::ConfigError;
use crate::llm::{ClientFactory, CompletionRequest, LlmError, Message, Provider, StopReason};

/// Timeframe used when the user leaves the prompt blank
pub const DEFAULT_TIMEFRAME: &str = "6 months";

/// Sampling temperature for every decomposition call
pub const TEMPERATURE: f64 = 0.7;

/// System prompt describing the expected output shape
pub const SYSTEM_PROMPT: &str = "You are an expert planner. Given a high-level goal, you will break it into actionable, chronological subtasks. \
Each task should include:\n\
- step (name of the subtask)\n\
- priority (High, Medium, Low)\n\
- duration (how long it takes)\n\
- resources (helpful links or topics)\n\
- depends_on (list of previous steps)\n\
Output as a JSON list.";

/// Errors returned by [`Decomposer::decompose`]
#[derive(Debug, Error)]
pub enum DecomposeError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Failed to get response from {provider} API: {source}")]
    Provider {
        provider: Provider,
        #[source]
        source: LlmError,
    },
}

impl DecomposeError {
    /// Provider the failed call was made against, if one was made
    pub fn provider(&self) -> Option<Provider> {
        match self {
            DecomposeError::Provider { provider, .. } => Some(*provider),
            DecomposeError::Configuration(_) => None,
        }
    }
}

/// One decomposition call: what to plan, by when, and with which backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionRequest {
    pub goal: String,
    pub timeframe: String,
    pub provider: Provider,
}

impl DecompositionRequest {
    /// Build a request; a blank timeframe becomes [`DEFAULT_TIMEFRAME`]
    pub fn new(goal: impl Into<String>, timeframe: &str, provider: Provider) -> Self {
        Self {
            goal: goal.into(),
            timeframe: resolve_timeframe(timeframe),
            provider,
        }
    }

    /// User instruction interpolating the goal and timeframe
    pub fn user_prompt(&self) -> String {
        format!(
            "My goal is: '{}' to be completed in {}. Please decompose it into detailed steps.",
            self.goal, self.timeframe
        )
    }
}

/// Trimmed goal, or `None` when nothing but whitespace was entered
pub fn parse_goal(input: &str) -> Option<String> {
    let goal = input.trim();
    if goal.is_empty() { None } else { Some(goal.to_string()) }
}

/// Trimmed timeframe, defaulting to [`DEFAULT_TIMEFRAME`] when blank
pub fn resolve_timeframe(input: &str) -> String {
    let timeframe = input.trim();
    if timeframe.is_empty() {
        DEFAULT_TIMEFRAME.to_string()
    } else {
        timeframe.to_string()
    }
}

/// The goal as submitted plus the provider's raw answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecompositionResult {
    pub goal: String,
    pub decomposition: String,
    /// The provider stopped at its length limit, so the text is cut off
    pub truncated: bool,
}

impl DecompositionResult {
    /// Best-effort view of the decomposition as structured steps
    ///
    /// The raw text is what gets displayed and evaluated; this is only used for
    /// the step summary. Markdown code fences around the JSON are tolerated.
    pub fn steps(&self) -> Result<Vec<PlanStep>, serde_json::Error> {
        serde_json::from_str(strip_code_fence(&self.decomposition))
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Priority tier of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// A single step as the planner prompt asks for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step: String,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub resources: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub depends_on: Vec<String>,
}

/// Models answer with either a single string or a list for list-valued fields
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.trim().is_empty() => vec![],
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => vec![],
    })
}

/// Decomposer turns a goal into a provider-written step list
pub struct Decomposer {
    clients: Arc<dyn ClientFactory>,
}

impl Decomposer {
    /// Create a new decomposer
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }

    /// Check that `provider` has a credential, without any network activity
    pub fn preflight(&self, provider: Provider) -> Result<(), ConfigError> {
        debug!(%provider, "preflight: called");
        self.clients.check(provider)
    }

    /// Decompose a goal with the requested provider
    ///
    /// Returns the first completion's text verbatim. No parsing, validation or
    /// retry happens here.
    #[instrument(skip(self, request), fields(provider = %request.provider))]
    pub async fn decompose(&self, request: &DecompositionRequest) -> Result<DecompositionResult, DecomposeError> {
        info!(timeframe = %request.timeframe, "Decomposing goal");

        let client = self.clients.create(request.provider)?;

        let completion = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            messages: vec![Message::user(request.user_prompt())],
            max_tokens: None,
            temperature: TEMPERATURE,
        };

        let provider_error = |source: LlmError| DecomposeError::Provider {
            provider: request.provider,
            source,
        };

        let response = client.complete(completion).await.map_err(|e| {
            if e.is_rate_limit() || e.is_auth_failure() {
                warn!(error = %e, "Provider rejected the request");
            }
            provider_error(e)
        })?;

        debug!(
            model = %client.model(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            stop_reason = ?response.stop_reason,
            "decompose: completion received"
        );

        let decomposition = response
            .content
            .ok_or_else(|| provider_error(LlmError::InvalidResponse("Completion had no text content".to_string())))?;

        let truncated = response.stop_reason == StopReason::MaxTokens;
        if truncated {
            warn!(chars = decomposition.len(), "Provider hit its length limit; decomposition is incomplete");
        }

        info!(chars = decomposition.len(), "Goal decomposed");

        Ok(DecompositionResult {
            goal: request.goal.clone(),
            decomposition,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::mock::MockClientFactory;

    const PLAN_JSON: &str = r#"[{"step": "Learn Python", "priority": "High", "duration": "1 month", "resources": ["docs.python.org"], "depends_on": []}]"#;

    fn decomposer_with(client: Arc<MockLlmClient>) -> (Decomposer, Arc<MockClientFactory>) {
        let factory = Arc::new(MockClientFactory::new(client));
        (Decomposer::new(factory.clone()), factory)
    }

    #[test]
    fn test_resolve_timeframe() {
        assert_eq!(resolve_timeframe(""), "6 months");
        assert_eq!(resolve_timeframe("   \t"), "6 months");
        assert_eq!(resolve_timeframe(" 1 year "), "1 year");
    }

    #[test]
    fn test_parse_goal() {
        assert_eq!(parse_goal(""), None);
        assert_eq!(parse_goal("  \n "), None);
        assert_eq!(parse_goal("  Become an AI engineer "), Some("Become an AI engineer".to_string()));
    }

    #[test]
    fn test_user_prompt() {
        let request = DecompositionRequest::new("Run a marathon", "", Provider::Groq);
        assert_eq!(
            request.user_prompt(),
            "My goal is: 'Run a marathon' to be completed in 6 months. Please decompose it into detailed steps."
        );
    }

    #[test]
    fn test_system_prompt_describes_fields() {
        for field in ["step", "priority (High, Medium, Low)", "duration", "resources", "depends_on"] {
            assert!(SYSTEM_PROMPT.contains(field), "missing {}", field);
        }
        assert!(SYSTEM_PROMPT.ends_with("Output as a JSON list."));
    }

    #[tokio::test]
    async fn test_decompose_returns_text_verbatim() {
        let client = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(PLAN_JSON)]));
        let (decomposer, factory) = decomposer_with(client.clone());

        let request = DecompositionRequest::new("Become an AI engineer", "1 year", Provider::OpenAI);
        let result = decomposer.decompose(&request).await.unwrap();

        assert_eq!(result.goal, "Become an AI engineer");
        assert_eq!(result.decomposition, PLAN_JSON);
        assert_eq!(factory.created(), vec![Provider::OpenAI]);

        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].system_prompt, SYSTEM_PROMPT);
        assert_eq!(sent[0].temperature, TEMPERATURE);
        assert_eq!(sent[0].messages, vec![Message::user(request.user_prompt())]);
    }

    #[tokio::test]
    async fn test_decompose_sends_no_length_cap() {
        let client = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(PLAN_JSON)]));
        let (decomposer, _) = decomposer_with(client.clone());

        let request = DecompositionRequest::new("Become an AI engineer", "", Provider::Groq);
        let result = decomposer.decompose(&request).await.unwrap();

        assert_eq!(client.requests()[0].max_tokens, None);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_decompose_flags_length_cutoff() {
        let response = CompletionResponse {
            stop_reason: StopReason::MaxTokens,
            ..CompletionResponse::text(r#"[{"step": "Learn Py"#)
        };
        let client = Arc::new(MockLlmClient::new(vec![response]));
        let (decomposer, _) = decomposer_with(client);

        let request = DecompositionRequest::new("Become an AI engineer", "", Provider::Groq);
        let result = decomposer.decompose(&request).await.unwrap();

        assert!(result.truncated);
        assert_eq!(result.decomposition, r#"[{"step": "Learn Py"#);
    }

    #[tokio::test]
    async fn test_decompose_keeps_goal_unmodified() {
        let client = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("[]")]));
        let (decomposer, _) = decomposer_with(client);

        let goal = "  odd  spacing\tand 'quotes' ";
        let request = DecompositionRequest::new(goal, "2 weeks", Provider::Groq);
        let result = decomposer.decompose(&request).await.unwrap();
        assert_eq!(result.goal, goal);
    }

    #[tokio::test]
    async fn test_decompose_passes_empty_text_through() {
        let client = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("")]));
        let (decomposer, _) = decomposer_with(client);

        let request = DecompositionRequest::new("Learn Rust", "", Provider::Groq);
        let result = decomposer.decompose(&request).await.unwrap();
        assert_eq!(result.decomposition, "");
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let client = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(PLAN_JSON)]));
        let factory = Arc::new(MockClientFactory::new(client.clone()).without_credential(Provider::Groq));
        let decomposer = Decomposer::new(factory.clone());

        assert!(decomposer.preflight(Provider::Groq).is_err());
        assert!(decomposer.preflight(Provider::OpenAI).is_ok());

        let request = DecompositionRequest::new("Learn Rust", "", Provider::Groq);
        let err = decomposer.decompose(&request).await.unwrap_err();

        assert!(matches!(err, DecomposeError::Configuration(_)));
        assert_eq!(err.to_string(), "GROQ_API_KEY not set in environment variables.");
        assert_eq!(client.call_count(), 0);
        assert!(factory.created().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_names_provider() {
        let client = Arc::new(MockLlmClient::failing(401, "Invalid API Key"));
        let (decomposer, _) = decomposer_with(client.clone());

        let request = DecompositionRequest::new("Learn Rust", "", Provider::OpenAI);
        let err = decomposer.decompose(&request).await.unwrap_err();

        assert_eq!(err.provider(), Some(Provider::OpenAI));
        assert_eq!(
            err.to_string(),
            "Failed to get response from OpenAI API: API error 401: Invalid API Key"
        );
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_content_is_provider_error() {
        let response = CompletionResponse {
            content: None,
            ..CompletionResponse::text("")
        };
        let client = Arc::new(MockLlmClient::new(vec![response]));
        let (decomposer, _) = decomposer_with(client);

        let request = DecompositionRequest::new("Learn Rust", "", Provider::Groq);
        let err = decomposer.decompose(&request).await.unwrap_err();
        assert_eq!(err.provider(), Some(Provider::Groq));
    }

    #[test]
    fn test_steps_parses_plain_json() {
        let result = DecompositionResult {
            goal: "g".to_string(),
            decomposition: PLAN_JSON.to_string(),
            truncated: false,
        };
        let steps = result.steps().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step, "Learn Python");
        assert_eq!(steps[0].priority, Some(Priority::High));
        assert_eq!(steps[0].resources, vec!["docs.python.org"]);
        assert!(steps[0].depends_on.is_empty());
    }

    #[test]
    fn test_steps_tolerates_code_fence_and_loose_fields() {
        let text = "```json\n[\n  {\"step\": \"Build projects\", \"priority\": \"medium\", \"resources\": \"Kaggle\", \"depends_on\": \"Learn Python\"}\n]\n```";
        let result = DecompositionResult {
            goal: "g".to_string(),
            decomposition: text.to_string(),
            truncated: false,
        };
        let steps = result.steps().unwrap();
        assert_eq!(steps[0].priority, Some(Priority::Medium));
        assert_eq!(steps[0].resources, vec!["Kaggle"]);
        assert_eq!(steps[0].depends_on, vec!["Learn Python"]);
        assert!(steps[0].duration.is_none());
    }

    #[test]
    fn test_steps_rejects_prose() {
        let result = DecompositionResult {
            goal: "g".to_string(),
            decomposition: "Here is your plan: first, learn Python.".to_string(),
            truncated: false,
        };
        assert!(result.steps().is_err());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```json\n[1]\n```\n"), "[1]");
    }
}
