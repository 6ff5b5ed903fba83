//! Shared CLI progress callback with styled output
//!
//! Writes to stderr only: stdout carries the JSON result of the submit
//! commands.

use crate::cli::style::{Stylize, arrow, check, cross, hyperlink_url};
use anstream::eprintln;
use async_trait::async_trait;
use stackpilot::progress::{Phase, ProgressCallback, PushStatus};
use stackpilot::types::PullRequestRef;

/// CLI progress callback
///
/// Two modes:
/// - verbose (`land-stack`): phases, retry lines, every push
/// - quiet (submit commands): warnings and phase headers only
pub struct CliProgress {
    /// Show retry and status messages
    pub verbose: bool,
}

impl CliProgress {
    /// Progress for the landing operation log
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }

    /// Progress for JSON-emitting commands
    pub const fn quiet() -> Self {
        Self { verbose: false }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        match phase {
            Phase::Landing | Phase::Complete => {}
            _ if self.verbose => eprintln!("{}...", phase.to_string().emphasis()),
            Phase::Submitting | Phase::Finalizing => {
                eprintln!("{}...", phase.to_string().emphasis());
            }
            _ => {}
        }
    }

    async fn on_branch_push(&self, branch: &str, status: PushStatus) {
        match &status {
            PushStatus::Started => {
                if self.verbose {
                    eprintln!("  {} Pushing {}", arrow(), branch.accent());
                }
            }
            PushStatus::Success => eprintln!("  {} Pushed {}", check(), branch.accent()),
            PushStatus::Failed(_) => eprintln!(
                "  {} {} {}",
                cross(),
                branch.accent(),
                status.to_string().error()
            ),
        }
    }

    async fn on_pr_merged(&self, branch: &str, pr_number: u64) {
        let pr_num = format!("#{pr_number}");
        eprintln!(
            "  {} Merged PR {} ({})",
            check(),
            pr_num.accent(),
            branch.emphasis()
        );
    }

    async fn on_pr_updated(&self, branch: &str, pr: &PullRequestRef) {
        let pr_num = format!("#{}", pr.number);
        eprintln!(
            "  {} Updated PR {} for {} (base {})",
            check(),
            pr_num.accent(),
            branch.emphasis(),
            pr.base_branch.accent()
        );
        if self.verbose {
            eprintln!("    {}", hyperlink_url(&pr.url));
        }
    }

    async fn on_warning(&self, message: &str) {
        eprintln!("{}: {message}", "warning".warn());
    }

    async fn on_message(&self, message: &str) {
        if self.verbose {
            eprintln!("  {}", message.muted());
        }
    }
}
