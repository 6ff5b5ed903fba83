//! Progress callback trait for interface-agnostic updates
//!
//! Submit and land report what they are doing through this trait, so the CLI
//! can render styled terminal output while tests record or ignore it.
//! Nothing reported here ever influences control flow.

use crate::types::PullRequestRef;
use async_trait::async_trait;

/// Workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Checking Graphite and GitHub authentication
    Authenticating,
    /// Committing, conflict-checking, and squashing
    Preparing,
    /// Pushing via `gt submit`
    Submitting,
    /// Polling for the PR to become visible
    WaitingForPr,
    /// Updating PR title and body
    Finalizing,
    /// Validating landing preconditions
    Validating,
    /// Landing one branch
    Landing,
    /// Pulling trunk after a merge
    SyncingTrunk,
    /// Restacking and force-pushing the upstack
    Propagating,
    /// Workflow complete
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authenticating => "Checking authentication",
            Self::Preparing => "Preparing branch",
            Self::Submitting => "Submitting",
            Self::WaitingForPr => "Waiting for PR",
            Self::Finalizing => "Finalizing PR",
            Self::Validating => "Validating stack",
            Self::Landing => "Landing",
            Self::SyncingTrunk => "Syncing trunk",
            Self::Propagating => "Updating upstack",
            Self::Complete => "Done",
        };
        write!(f, "{s}")
    }
}

/// Push operation status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// Push started
    Started,
    /// Push succeeded
    Success,
    /// Push failed with error message
    Failed(String),
}

impl std::fmt::Display for PushStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "pushing"),
            Self::Success => write!(f, "pushed"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during submit and land.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called when a branch is being force-pushed
    async fn on_branch_push(&self, branch: &str, status: PushStatus);

    /// Called when a PR was merged
    async fn on_pr_merged(&self, branch: &str, pr_number: u64);

    /// Called when a PR base or metadata was updated
    async fn on_pr_updated(&self, branch: &str, pr: &PullRequestRef);

    /// Called on soft degradation: the operation continues
    async fn on_warning(&self, message: &str);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_branch_push(&self, _branch: &str, _status: PushStatus) {}
    async fn on_pr_merged(&self, _branch: &str, _pr_number: u64) {}
    async fn on_pr_updated(&self, _branch: &str, _pr: &PullRequestRef) {}
    async fn on_warning(&self, _message: &str) {}
    async fn on_message(&self, _message: &str) {}
}
