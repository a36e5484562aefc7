//! Goal Decomposer - LLM goal planning with faithfulness scoring
//!
//! Asks a chat-completion provider (Groq or OpenAI) to break a high-level goal
//! into attributed, ordered steps, prints the answer, and scores it against a
//! reference context with a hosted faithfulness metric.
//!
//! # Modules
//!
//! - [`llm`] - Provider selection and the chat-completion client
//! - [`decomposer`] - Prompt construction and the decomposition call
//! - [`evaluator`] - Faithfulness evaluation and outcome categorization
//! - [`repl`] - Interactive prompts and the session flow
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod decomposer;
pub mod evaluator;
pub mod llm;
pub mod repl;

// Re-export commonly used types
pub use config::{Config, ConfigError, EvaluationConfig, LlmConfig};
pub use decomposer::{DecomposeError, Decomposer, DecompositionRequest, DecompositionResult, PlanStep, Priority};
pub use evaluator::{EvaluationError, EvaluationOutcome, Evaluator, FailureReason, JudgmentClient, ScoringService};
pub use llm::{ClientFactory, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, Provider};
pub use repl::{GoalSession, Prompter, SessionOutcome};
