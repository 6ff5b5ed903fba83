//! Landing engine for stacked PRs
//!
//! Three-phase pattern:
//! 1. Validate - check preconditions once and build the plan ([`prepare_landing`])
//! 2. Plan - order the branches bottom-up (pure, [`build_landing_plan`])
//! 3. Execute - merge one PR at a time, re-validating before every merge and
//!    propagating the restack upward after it ([`execute_landing`])
//!
//! A failure stops the run. Merges that already happened are reported, never
//! rolled back.

mod execute;
mod plan;
mod validate;

pub use execute::execute_landing;
pub use plan::{
    LandingPlan, LandingPlanEntry, MergeGate, build_landing_plan, find_worktree_conflicts,
    merge_gate,
};
pub use validate::prepare_landing;

use crate::git::GitOps;
use crate::graphite::StackTool;
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::retry::Clock;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Flags of `land-stack`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LandOptions {
    /// Only propagate to branches still in the plan
    pub down: bool,
    /// Skip the interactive confirmation
    pub force: bool,
    /// Print the plan and stop
    pub dry_run: bool,
    /// Debug-level logging
    pub verbose: bool,
}

/// Collaborators one landing run works against
#[derive(Clone, Copy)]
pub struct LandContext<'a> {
    /// Worktree the command runs from
    pub worktree: &'a Path,
    /// Remote trunk is synced from
    pub remote: &'a str,
    /// Whether Graphite integration is enabled in config
    pub graphite_enabled: bool,
    /// Git
    pub git: &'a dyn GitOps,
    /// Graphite
    pub stack_tool: &'a dyn StackTool,
    /// GitHub
    pub platform: &'a dyn PlatformService,
    /// Sleeps for retry backoff
    pub clock: &'a dyn Clock,
    /// Operator-facing progress
    pub progress: &'a dyn ProgressCallback,
}

/// Why landing stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LandErrorKind {
    /// Graphite integration is disabled
    GraphiteDisabled,
    /// HEAD is not on a branch
    DetachedHead,
    /// Working tree is dirty
    UncommittedChanges,
    /// Current branch is trunk
    OnTrunk,
    /// Current branch is not tracked by Graphite
    UntrackedBranch,
    /// Nothing to land
    EmptyPlan,
    /// A plan branch has no PR
    NoPullRequest,
    /// A plan branch's PR is merged or closed
    PrNotOpen,
    /// A plan branch is checked out in another worktree
    WorktreeConflict,
    /// Checking out the branch to land failed
    CheckoutFailed,
    /// The branch's parent is not trunk, or the tree is inconsistent
    StackIntegrity,
    /// The PR base could not be corrected
    BaseUpdateFailed,
    /// GitHub reports the PR cannot be merged
    MergeBlocked,
    /// GitHub never finished computing mergeability
    MergeabilityUnknown,
    /// The merge call failed
    MergeFailed,
    /// Pulling trunk after the merge failed
    TrunkSyncFailed,
    /// Restacking after the merge failed
    RestackFailed,
    /// Force-pushing an upstack branch failed
    PushFailed,
}

impl LandErrorKind {
    /// Wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GraphiteDisabled => "graphite_disabled",
            Self::DetachedHead => "detached_head",
            Self::UncommittedChanges => "uncommitted_changes",
            Self::OnTrunk => "on_trunk",
            Self::UntrackedBranch => "untracked_branch",
            Self::EmptyPlan => "empty_plan",
            Self::NoPullRequest => "no_pull_request",
            Self::PrNotOpen => "pr_not_open",
            Self::WorktreeConflict => "worktree_conflict",
            Self::CheckoutFailed => "checkout_failed",
            Self::StackIntegrity => "stack_integrity",
            Self::BaseUpdateFailed => "base_update_failed",
            Self::MergeBlocked => "merge_blocked",
            Self::MergeabilityUnknown => "mergeability_unknown",
            Self::MergeFailed => "merge_failed",
            Self::TrunkSyncFailed => "trunk_sync_failed",
            Self::RestackFailed => "restack_failed",
            Self::PushFailed => "push_failed",
        }
    }
}

impl fmt::Display for LandErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal landing error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandingFailure {
    /// Failure kind
    pub kind: LandErrorKind,
    /// Explanation with remediation
    pub message: String,
    /// Branch being processed, if the failure is branch-specific
    pub branch: Option<String>,
}

impl LandingFailure {
    /// Failure not tied to a branch
    pub fn new(kind: LandErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            branch: None,
        }
    }

    /// Attach the branch being processed
    #[must_use]
    pub fn on_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }
}

impl fmt::Display for LandingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{} ({branch}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LandingFailure {}

/// Result of a landing run, including partial progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LandingOutcome {
    /// Branches merged, in order
    pub merged: Vec<String>,
    /// What stopped the run, if anything
    pub failure: Option<LandingFailure>,
}

impl LandingOutcome {
    /// Whether every planned branch landed
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
