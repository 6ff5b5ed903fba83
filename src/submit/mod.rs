//! Single-branch submission
//!
//! A branch is submitted in phases so an external caller can write the
//! commit message in between:
//!
//! 1. Prepare ([`execute_pre_analysis`]): auth checks, commit stray changes,
//!    conflict pre-check, squash.
//! 2. Submit ([`execute_post_analysis`]): amend the message, `gt submit`,
//!    poll for the PR, update its title and body.
//!
//! The three-phase variant ([`execute_preflight`] / [`execute_finalize`])
//! pushes first and writes the message afterwards. [`execute_submit`] runs
//! everything in one go with an injected
//! [`crate::ai::CommitMessageGenerator`].

mod metadata;
mod outcome;
mod prepare;
mod publish;

pub use metadata::{
    IMPL_DIR, ISSUE_FILE, IssueReference, PLACEHOLDER_COMMIT_MESSAGE, build_footer,
    compose_body, compose_commit_message, graphite_url, read_issue_reference,
};
pub use outcome::{
    FinalizeErrorKind, FinalizeResult, PhaseError, PostAnalysisErrorKind, PostAnalysisResult,
    PreAnalysisErrorKind, PreAnalysisResult, PreflightResult, SubmitErrorKind, to_json,
};
pub use prepare::execute_pre_analysis;
pub use publish::{execute_finalize, execute_post_analysis, execute_preflight, execute_submit};

use crate::git::GitOps;
use crate::graphite::StackTool;
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::retry::Clock;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the phases are split around commit message generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFlow {
    /// Prepare, then amend + push + update PR with a caller-supplied message
    TwoPhase,
    /// Prepare + push without a message, then update PR and amend
    ThreePhase,
    /// Prepare, generate the message, then amend + push + update PR
    OneShot,
}

impl SubmitFlow {
    /// Whether the commit is amended before `gt submit`
    pub const fn amends_before_push(self) -> bool {
        !matches!(self, Self::ThreePhase)
    }
}

/// Tunables for the submit workflow
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Deadline for `gt submit`
    pub submit_timeout: Duration,
    /// Interval between elapsed-time markers while `gt submit` runs
    pub ticker_interval: Duration,
    /// Directory preflight writes diff files into
    pub scratch_dir: PathBuf,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(120),
            ticker_interval: Duration::from_secs(10),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Collaborators one submit invocation runs against
#[derive(Clone, Copy)]
pub struct SubmitContext<'a> {
    /// Worktree root the branch is checked out in
    pub worktree: &'a Path,
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
    /// Tunables
    pub options: &'a SubmitOptions,
}
