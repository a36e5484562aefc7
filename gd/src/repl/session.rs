//! Interactive goal decomposition session

use std::io::Write;

use colored::Colorize;
use eyre::Result;
use tracing::{debug, info, warn};

use super::Prompter;
use crate::decomposer::{DecompositionRequest, DecompositionResult, Decomposer, parse_goal};
use crate::evaluator::{EvaluationOutcome, Evaluator};
use crate::llm::Provider;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Input ended (Ctrl+C / Ctrl+D) before the goal was complete
    Cancelled,
    /// The provider selection was not `1` or `2`
    InvalidProvider,
    /// The selected provider has no credential configured
    MissingCredential(Provider),
    /// The goal was blank
    EmptyGoal,
    /// Decomposition ran and was evaluated
    Completed {
        result: DecompositionResult,
        evaluation: EvaluationOutcome,
    },
}

/// One pass through the prompt -> decompose -> evaluate flow
pub struct GoalSession {
    decomposer: Decomposer,
    evaluator: Evaluator,
}

impl GoalSession {
    /// Create a new session
    pub fn new(decomposer: Decomposer, evaluator: Evaluator) -> Self {
        Self { decomposer, evaluator }
    }

    /// Run the session, writing everything the user sees to `out`
    ///
    /// Expected failures (bad selection, missing credential, empty goal,
    /// evaluation errors) are printed and reported through the outcome.
    /// Provider failures are returned as errors.
    pub async fn run<P: Prompter, W: Write>(&self, prompter: &mut P, out: &mut W) -> Result<SessionOutcome> {
        writeln!(out, "Select which API to use for goal decomposition:")?;
        for provider in Provider::ALL {
            writeln!(out, "{} - {} API", provider.selection_key(), provider.display_name())?;
        }

        let Some(choice) = prompter.read_line("Enter 1 or 2: ")? else {
            return Ok(SessionOutcome::Cancelled);
        };

        let Some(provider) = Provider::from_selection(&choice) else {
            debug!(%choice, "run: invalid provider selection");
            print_error(out, "Invalid choice. Please enter 1 or 2.")?;
            return Ok(SessionOutcome::InvalidProvider);
        };

        if let Err(e) = self.decomposer.preflight(provider) {
            warn!(%provider, error = %e, "Selected provider is not configured");
            print_error(out, &e.to_string())?;
            return Ok(SessionOutcome::MissingCredential(provider));
        }

        writeln!(out)?;
        let Some(line) = prompter.read_line("Enter your high-level goal: ")? else {
            return Ok(SessionOutcome::Cancelled);
        };
        let Some(goal) = parse_goal(&line) else {
            print_error(out, "Goal cannot be empty.")?;
            return Ok(SessionOutcome::EmptyGoal);
        };

        let Some(timeframe) = prompter.read_line("Enter the timeframe to complete this goal (default: 6 months): ")?
        else {
            return Ok(SessionOutcome::Cancelled);
        };

        let request = DecompositionRequest::new(goal, &timeframe, provider);
        info!(%provider, timeframe = %request.timeframe, "Session collected request");

        writeln!(
            out,
            "\n{} Running goal decomposition using {} API...\n",
            "::".bright_blue(),
            provider
        )?;
        let result = self.decomposer.decompose(&request).await?;

        writeln!(out, "{}", "Goal Decomposition Result:".bold())?;
        writeln!(out, "{}", result.decomposition)?;
        if result.truncated {
            writeln!(
                out,
                "{} {}",
                "Warning:".yellow().bold(),
                "the provider stopped at its length limit, so this plan is incomplete."
            )?;
        }
        match result.steps() {
            Ok(steps) => writeln!(out, "{}", format!("{} step(s) parsed", steps.len()).dimmed())?,
            Err(e) => debug!(error = %e, "run: decomposition is not a JSON step list"),
        }

        writeln!(out, "\n{} Running evaluation on the decomposition...\n", "::".bright_blue())?;
        let evaluation = self.evaluator.evaluate(&result.goal, &result.decomposition).await;

        let message = evaluation.to_string();
        if evaluation.is_passed() {
            writeln!(out, "{} {}", "\u{2713}".green(), message.green())?;
        } else {
            writeln!(out, "{} {}", "\u{2717}".red(), message.red())?;
        }

        Ok(SessionOutcome::Completed { result, evaluation })
    }
}

fn print_error<W: Write>(out: &mut W, message: &str) -> std::io::Result<()> {
    writeln!(out, "{} {}", "Error:".red().bold(), message)
}
