//! Chat completion providers and their defaults

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the interchangeable chat-completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    #[serde(rename = "openai")]
    OpenAI,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Groq, Provider::OpenAI];

    /// Map the interactive menu selection to a provider
    ///
    /// `"1"` selects Groq and `"2"` selects OpenAI; anything else is rejected.
    pub fn from_selection(input: &str) -> Option<Self> {
        debug!(%input, "Provider::from_selection: called");
        match input.trim() {
            "1" => Some(Provider::Groq),
            "2" => Some(Provider::OpenAI),
            _ => None,
        }
    }

    /// Menu key shown in the selection prompt
    pub fn selection_key(&self) -> &'static str {
        match self {
            Provider::Groq => "1",
            Provider::OpenAI => "2",
        }
    }

    /// Human-readable name used in status lines and errors
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.3-70b-versatile",
            Provider::OpenAI => "gpt-4.1",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Base URL; the client appends `/v1/chat/completions`
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai",
            Provider::OpenAI => "https://api.openai.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
