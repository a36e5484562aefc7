//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

/// Goal Decomposer - break a goal into steps and score the plan
#[derive(Parser, Debug)]
#[command(
    name = "gd",
    about = "Break a high-level goal into attributed steps with an LLM and check the plan for faithfulness",
    version = env!("GIT_DESCRIBE"),
    after_help = "Environment:\n  GROQ_API_KEY           Groq credential (option 1)\n  OPENAI_API_KEY         OpenAI credential (option 2)\n  JUDGMENT_API_KEY       evaluation credential (required)\n  JUDGMENT_ORG_KEY       evaluation organization (optional)\n  JUDGMENT_PROJECT_NAME  evaluation project (default: goal-decomposer-agent)\n\nLogs are written to: ~/.local/share/goal-decomposer/logs/goal-decomposer.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose (debug) logging")]
    pub verbose: bool,

    /// Dotenv file to load instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("goal-decomposer")
        .join("logs")
        .join("goal-decomposer.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["gd"]);
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert!(cli.env_file.is_none());
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["gd", "-c", "/path/to/config.yml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
    }

    #[test]
    fn test_cli_verbose_and_env_file() {
        let cli = Cli::parse_from(["gd", "-v", "--env-file", "secrets.env"]);
        assert!(cli.verbose);
        assert_eq!(cli.env_file, Some(PathBuf::from("secrets.env")));
    }

    #[test]
    fn test_cli_rejects_positional_args() {
        assert!(Cli::try_parse_from(["gd", "Become an AI engineer"]).is_err());
    }

    #[test]
    fn test_log_path() {
        let path = get_log_path();
        assert!(path.ends_with("goal-decomposer/logs/goal-decomposer.log"));
    }
}
