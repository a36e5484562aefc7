//! Goal decomposer configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::llm::Provider;

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = ".goal-decomposer.yml";

/// Errors raised while resolving credentials and clients
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{env} not set in environment variables.")]
    MissingCredential { env: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Read an environment variable, treating empty values as unset
fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Groq provider overrides
    pub groq: LlmConfig,

    /// OpenAI provider overrides
    pub openai: LlmConfig,

    /// Scoring service configuration
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// The evaluation credential is required for every run, so a missing key
    /// stops the program before any prompt is shown.
    pub fn validate(&self) -> Result<()> {
        self.evaluation
            .resolve()
            .map(|_| ())
            .context("An evaluation API key is required to score decompositions")
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .goal-decomposer.yml
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/goal-decomposer/goal-decomposer.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("goal-decomposer").join("goal-decomposer.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Provider settings merged with that provider's defaults
    pub fn llm(&self, provider: Provider) -> ResolvedLlmConfig {
        match provider {
            Provider::Groq => self.groq.resolve(provider),
            Provider::OpenAI => self.openai.resolve(provider),
        }
    }
}

/// Per-provider overrides; unset fields fall back to the provider defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,

    /// Explicit API key; takes precedence over the environment
    #[serde(rename = "api-key", skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Cap on response tokens; no cap is sent when unset
    #[serde(rename = "max-tokens")]
    pub max_tokens: Option<u32>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

impl LlmConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

    /// Fill unset fields from the provider's defaults
    pub fn resolve(&self, provider: Provider) -> ResolvedLlmConfig {
        debug!(%provider, "LlmConfig::resolve: called");
        ResolvedLlmConfig {
            provider,
            model: self.model.clone().unwrap_or_else(|| provider.default_model().to_string()),
            api_key_env: self
                .api_key_env
                .clone()
                .unwrap_or_else(|| provider.default_api_key_env().to_string()),
            api_key: self.api_key.clone(),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms.unwrap_or(Self::DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Fully resolved settings for one provider
#[derive(Clone)]
pub struct ResolvedLlmConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// The explicit key if configured, else the named environment variable
    pub fn get_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        read_env(&self.api_key_env).ok_or_else(|| ConfigError::MissingCredential {
            env: self.api_key_env.clone(),
        })
    }
}

impl std::fmt::Debug for ResolvedLlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedLlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Scoring service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Explicit API key; takes precedence over the environment
    #[serde(rename = "api-key", skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable containing the optional organization key
    #[serde(rename = "org-key-env")]
    pub org_key_env: String,

    /// Environment variable that overrides `project-name`
    #[serde(rename = "project-name-env")]
    pub project_name_env: String,

    /// Project the evaluation runs are filed under
    #[serde(rename = "project-name")]
    pub project_name: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Judge model used by the scorer
    pub model: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            api_key_env: "JUDGMENT_API_KEY".to_string(),
            api_key: None,
            org_key_env: "JUDGMENT_ORG_KEY".to_string(),
            project_name_env: "JUDGMENT_PROJECT_NAME".to_string(),
            project_name: "goal-decomposer-agent".to_string(),
            base_url: "https://api.judgmentlabs.ai".to_string(),
            model: "gpt-4.1".to_string(),
            timeout_ms: 300_000,
        }
    }
}

impl EvaluationConfig {
    /// Resolve credentials and the project name from the environment
    pub fn resolve(&self) -> Result<ResolvedEvaluationConfig, ConfigError> {
        debug!(api_key_env = %self.api_key_env, "EvaluationConfig::resolve: called");
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| read_env(&self.api_key_env))
            .ok_or_else(|| ConfigError::MissingCredential {
                env: self.api_key_env.clone(),
            })?;

        Ok(ResolvedEvaluationConfig {
            api_key,
            org_key: read_env(&self.org_key_env),
            project_name: read_env(&self.project_name_env).unwrap_or_else(|| self.project_name.clone()),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Scoring service settings with credentials in hand
#[derive(Clone)]
pub struct ResolvedEvaluationConfig {
    pub api_key: String,
    pub org_key: Option<String>,
    pub project_name: String,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for ResolvedEvaluationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedEvaluationConfig")
            .field("api_key", &"<redacted>")
            .field("org_key", &self.org_key.as_ref().map(|_| "<redacted>"))
            .field("project_name", &self.project_name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET: &str = "GD_TEST_NEVER_SET_VARIABLE";

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.groq.model.is_none());
        assert_eq!(config.evaluation.api_key_env, "JUDGMENT_API_KEY");
        assert_eq!(config.evaluation.project_name, "goal-decomposer-agent");
        assert_eq!(config.evaluation.model, "gpt-4.1");
    }

    #[test]
    fn test_llm_resolve_uses_provider_defaults() {
        let config = Config::default();

        let groq = config.llm(Provider::Groq);
        assert_eq!(groq.model, "llama-3.3-70b-versatile");
        assert_eq!(groq.api_key_env, "GROQ_API_KEY");
        assert_eq!(groq.base_url, "https://api.groq.com/openai");
        assert!(groq.max_tokens.is_none());

        let openai = config.llm(Provider::OpenAI);
        assert_eq!(openai.model, "gpt-4.1");
        assert_eq!(openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(openai.base_url, "https://api.openai.com");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
groq:
  model: llama-3.1-8b-instant
  api-key-env: MY_GROQ_KEY
  timeout-ms: 60000

openai:
  base-url: https://proxy.example.com
  max-tokens: 2048

evaluation:
  project-name: career-plans
  model: gpt-4o
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        let groq = config.llm(Provider::Groq);
        assert_eq!(groq.model, "llama-3.1-8b-instant");
        assert_eq!(groq.api_key_env, "MY_GROQ_KEY");
        assert_eq!(groq.timeout_ms, 60000);
        assert_eq!(groq.base_url, "https://api.groq.com/openai");

        let openai = config.llm(Provider::OpenAI);
        assert_eq!(openai.base_url, "https://proxy.example.com");
        assert_eq!(openai.max_tokens, Some(2048));
        assert_eq!(openai.model, "gpt-4.1");

        assert_eq!(config.evaluation.project_name, "career-plans");
        assert_eq!(config.evaluation.model, "gpt-4o");
        assert_eq!(config.evaluation.api_key_env, "JUDGMENT_API_KEY");
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-secret".to_string());
        config.evaluation.api_key = Some("jdg-secret".to_string());

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
        assert!(!yaml.contains("jdg-secret"));
    }

    #[test]
    fn test_get_api_key_prefers_explicit_key() {
        let resolved = LlmConfig {
            api_key: Some("gsk-explicit".to_string()),
            api_key_env: Some(UNSET.to_string()),
            ..Default::default()
        }
        .resolve(Provider::Groq);

        assert_eq!(resolved.get_api_key().unwrap(), "gsk-explicit");
    }

    #[test]
    fn test_get_api_key_missing() {
        let resolved = LlmConfig {
            api_key: Some("   ".to_string()),
            api_key_env: Some(UNSET.to_string()),
            ..Default::default()
        }
        .resolve(Provider::OpenAI);

        let err = resolved.get_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { ref env } if env == UNSET));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let resolved = LlmConfig {
            api_key: Some("gsk-explicit".to_string()),
            ..Default::default()
        }
        .resolve(Provider::Groq);
        assert!(!format!("{:?}", resolved).contains("gsk-explicit"));
    }

    #[test]
    fn test_evaluation_resolve_requires_key() {
        let config = EvaluationConfig {
            api_key_env: UNSET.to_string(),
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(ConfigError::MissingCredential { .. })));
    }

    #[test]
    fn test_evaluation_resolve_defaults_project_name() {
        let config = EvaluationConfig {
            api_key: Some("jdg-test".to_string()),
            org_key_env: UNSET.to_string(),
            project_name_env: UNSET.to_string(),
            base_url: "https://api.judgmentlabs.ai/".to_string(),
            ..Default::default()
        };

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.api_key, "jdg-test");
        assert!(resolved.org_key.is_none());
        assert_eq!(resolved.project_name, "goal-decomposer-agent");
        assert_eq!(resolved.base_url, "https://api.judgmentlabs.ai");
    }

    #[test]
    fn test_validate_fails_without_evaluation_key() {
        let config = Config {
            evaluation: EvaluationConfig {
                api_key_env: UNSET.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gd.yml");
        fs::write(&path, "evaluation:\n  project-name: from-file\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.evaluation.project_name, "from-file");
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let path = PathBuf::from("/nonexistent/goal-decomposer.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
