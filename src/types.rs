//! Core types for stackpilot

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A branch in Graphite's stack metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    /// Branch name
    pub name: String,
    /// Parent branch (`None` only for trunk)
    pub parent: Option<String>,
    /// Child branches, in the order Graphite records them
    pub children: Vec<String>,
    /// Whether this branch is the trunk
    pub is_trunk: bool,
    /// Commit the branch pointed at when Graphite last recorded it
    pub commit_sha: Option<String>,
}

/// A git worktree and the branch checked out in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeBinding {
    /// Absolute worktree path
    pub path: PathBuf,
    /// Checked-out branch (`None` for detached HEAD or bare entries)
    pub branch: Option<String>,
    /// Whether this is the main worktree of the repository
    pub is_root: bool,
}

/// Pull request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was merged
    Merged,
    /// PR was closed without merging
    Closed,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Merged => write!(f, "MERGED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Host-computed conflict status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mergeable {
    /// No conflicts with the base branch
    Mergeable,
    /// Conflicts with the base branch
    Conflicting,
    /// GitHub has not finished computing
    Unknown,
}

impl Mergeable {
    /// Map GitHub's tri-state `mergeable` field
    pub const fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Mergeable,
            Some(false) => Self::Conflicting,
            None => Self::Unknown,
        }
    }
}

/// Host-computed merge gate status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeStateStatus {
    /// Ready to merge
    Clean,
    /// Merge conflicts
    Dirty,
    /// Blocked by required reviews or checks
    Blocked,
    /// Head is behind the base branch
    Behind,
    /// Mergeable, but with failing non-required checks
    Unstable,
    /// Still being computed
    Unknown,
}

impl std::fmt::Display for MergeStateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Clean => "CLEAN",
            Self::Dirty => "DIRTY",
            Self::Blocked => "BLOCKED",
            Self::Behind => "BEHIND",
            Self::Unstable => "UNSTABLE",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// A pull request as last observed on the host.
///
/// Every field may be stale relative to a write that just completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub url: String,
    /// Lifecycle state
    pub state: PrState,
    /// Base branch name
    pub base_branch: String,
    /// Head branch name
    pub head_branch: String,
    /// PR title
    pub title: String,
    /// Conflict status
    pub mergeable: Mergeable,
    /// Merge gate status
    pub merge_state_status: MergeStateStatus,
    /// Whether the PR is a draft
    pub is_draft: bool,
}

/// The two mergeability signals read together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStatus {
    /// Conflict status
    pub mergeable: Mergeable,
    /// Merge gate status
    pub merge_state_status: MergeStateStatus,
}

impl MergeStatus {
    /// Whether either signal is still being computed
    pub const fn is_unknown(&self) -> bool {
        matches!(self.mergeable, Mergeable::Unknown)
            || matches!(self.merge_state_status, MergeStateStatus::Unknown)
    }
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    /// Squash all commits into one
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

/// A git remote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRemote {
    /// Remote name (e.g., "origin")
    pub name: String,
    /// Remote URL
    pub url: String,
}

/// Repository coordinates on GitHub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// Captured output of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout and stderr joined, the text output classification runs against
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}
