//! LLM client module
//!
//! Provider selection, the chat-completion client trait and its
//! OpenAI-compatible implementation.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod provider;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use provider::Provider;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::{Config, ConfigError, ResolvedLlmConfig};

/// Create a chat-completion client from a resolved configuration
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>, ConfigError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    Ok(Arc::new(OpenAIClient::from_config(config)?))
}

/// Hands out a configured client for a provider
///
/// The decomposer asks the factory for a client instead of branching on the
/// provider itself.
pub trait ClientFactory: Send + Sync {
    /// Build a client for `provider`
    fn create(&self, provider: Provider) -> Result<Arc<dyn LlmClient>, ConfigError>;

    /// Verify the provider can be used without building a client
    fn check(&self, provider: Provider) -> Result<(), ConfigError> {
        self.create(provider).map(|_| ())
    }
}

impl ClientFactory for Config {
    fn create(&self, provider: Provider) -> Result<Arc<dyn LlmClient>, ConfigError> {
        debug!(%provider, "Config::create: called");
        create_client(&self.llm(provider))
    }

    fn check(&self, provider: Provider) -> Result<(), ConfigError> {
        debug!(%provider, "Config::check: called");
        self.llm(provider).get_api_key().map(|_| ())
    }
}
