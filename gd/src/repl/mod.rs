//! Interactive prompts for the goal decomposer
//!
//! Reads the provider choice, goal and timeframe from the terminal (or from
//! piped stdin) and drives one [`GoalSession`].

mod session;

pub use session::{GoalSession, SessionOutcome};

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::config::Config;
use crate::decomposer::Decomposer;
use crate::evaluator::{Evaluator, JudgmentClient};

/// Source of answers to interactive prompts
pub trait Prompter {
    /// Show `prompt` and read one line; `None` when input has ended
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Terminal prompter with line editing
pub struct ReadlinePrompter {
    editor: DefaultEditor,
}

impl ReadlinePrompter {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        Ok(Self { editor })
    }
}

impl Prompter for ReadlinePrompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                println!("^C");
                Ok(None)
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                println!();
                Ok(None)
            }
            Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
        }
    }
}

/// Prompter over any line source, used when stdin is not a terminal
pub struct LinePrompter<R> {
    reader: R,
    echo: bool,
}

impl<R: BufRead> LinePrompter<R> {
    /// Read answers from `reader`; prompts are echoed to stdout when `echo` is set
    pub fn new(reader: R, echo: bool) -> Self {
        Self { reader, echo }
    }
}

impl<R: BufRead> Prompter for LinePrompter<R> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if self.echo {
            print!("{}", prompt);
            io::stdout().flush()?;
        }

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }

        if self.echo {
            println!();
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Build the session from configuration
///
/// Fails before anything is shown when the evaluation credential is missing.
pub fn build_session(config: &Config) -> Result<GoalSession> {
    debug!("build_session: called");
    config.validate()?;

    let evaluation = config.evaluation.resolve()?;
    let scorer = JudgmentClient::from_config(&evaluation).context("Failed to create evaluation client")?;
    let evaluator = Evaluator::from_config(Arc::new(scorer), &evaluation);

    let decomposer = Decomposer::new(Arc::new(config.clone()));

    Ok(GoalSession::new(decomposer, evaluator))
}

/// Run one interactive session against stdin/stdout
///
/// This is the main entry point for `gd`.
pub async fn run_interactive(config: &Config) -> Result<SessionOutcome> {
    let session = build_session(config)?;
    let mut out = io::stdout();

    let outcome = if io::stdin().is_terminal() {
        let mut prompter = ReadlinePrompter::new()?;
        session.run(&mut prompter, &mut out).await?
    } else {
        let mut prompter = LinePrompter::new(io::stdin().lock(), true);
        session.run(&mut prompter, &mut out).await?
    };

    info!(?outcome, "Session finished");
    Ok(outcome)
}
