//! Submit commands - each prints exactly one JSON object to stdout

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use anstream::println;
use serde::Serialize;
use stackpilot::ai::ClaudeCli;
use stackpilot::submit::{
    PhaseError, execute_finalize, execute_post_analysis, execute_pre_analysis, execute_preflight,
    execute_submit, to_json,
};
use std::path::Path;
use tracing::error;

/// Which submit phase to run
#[derive(Debug, Clone)]
pub enum SubmitCommand {
    /// Commit, check conflicts, squash
    PreAnalysis,
    /// Amend with the message, push, update the PR
    PostAnalysis {
        /// Full commit message, title first
        commit_message: String,
    },
    /// Prepare, push, and write the diff file
    Preflight {
        /// Names the diff file
        session_id: String,
    },
    /// Set PR title and body, amend the commit
    Finalize {
        /// PR to update
        pr_number: u64,
        /// New title
        pr_title: String,
        /// New body, without footer
        pr_body: String,
    },
    /// Prepare, generate a message, push
    Submit,
}

/// Run one submit phase and print its result.
///
/// Returns whether the phase succeeded.
pub async fn run_submit(path: &Path, command: SubmitCommand) -> bool {
    let ctx = match CommandContext::new(path).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "setup failed");
            let outcome: Result<(), PhaseError<&str>> =
                Err(PhaseError::new("unexpected_error", e.to_string()));
            return emit(&outcome);
        }
    };
    let progress = CliProgress::quiet();
    let options = ctx.submit_options();
    let phase = ctx.submit(&progress, &options);

    match command {
        SubmitCommand::PreAnalysis => emit(&execute_pre_analysis(&phase).await),
        SubmitCommand::PostAnalysis { commit_message } => {
            emit(&execute_post_analysis(&phase, &commit_message).await)
        }
        SubmitCommand::Preflight { session_id } => {
            emit(&execute_preflight(&phase, &session_id).await)
        }
        SubmitCommand::Finalize {
            pr_number,
            pr_title,
            pr_body,
        } => emit(&execute_finalize(&phase, pr_number, &pr_title, &pr_body).await),
        SubmitCommand::Submit => {
            let generator = ClaudeCli::from_config(&ctx.config.ai, ctx.worktree.clone());
            emit(&execute_submit(&phase, &generator).await)
        }
    }
}

fn emit<T: Serialize, K: Serialize>(outcome: &Result<T, PhaseError<K>>) -> bool {
    match to_json(outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!(error = %e, "could not serialize result");
            let fallback = serde_json::json!({
                "success": false,
                "error_type": "unexpected_error",
                "message": e.to_string(),
            });
            println!("{fallback}");
            return false;
        }
    }
    outcome.is_ok()
}
