//! Git collaborator
//!
//! Every method takes the directory to run in explicitly. Operations that
//! touch a branch checked out in another worktree must be pointed at that
//! worktree, never at an assumed current directory.

mod cli;

pub use cli::GitCli;

use crate::error::Result;
use crate::types::{GitRemote, WorktreeBinding};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Git operations the orchestrator needs
#[async_trait]
pub trait GitOps: Send + Sync {
    /// Top-level directory of the worktree containing `cwd`
    async fn repository_root(&self, cwd: &Path) -> Result<PathBuf>;

    /// Checked-out branch, `None` on detached HEAD
    async fn current_branch(&self, cwd: &Path) -> Result<Option<String>>;

    /// Whether the worktree has staged, unstaged, or untracked changes
    async fn has_uncommitted_changes(&self, cwd: &Path) -> Result<bool>;

    /// Stage everything, including untracked files
    async fn stage_all(&self, cwd: &Path) -> Result<()>;

    /// Commit the index
    async fn commit(&self, cwd: &Path, message: &str) -> Result<()>;

    /// Replace the message of HEAD
    async fn amend_commit_message(&self, cwd: &Path, message: &str) -> Result<()>;

    /// Commits on HEAD that are not on `base`
    async fn count_commits_ahead(&self, cwd: &Path, base: &str) -> Result<usize>;

    /// Dry-run merge of `head` into `base`; true when it would conflict
    async fn has_merge_conflicts(&self, cwd: &Path, base: &str, head: &str) -> Result<bool>;

    /// Diff of HEAD against its merge base with `base`
    async fn diff_against(&self, cwd: &Path, base: &str) -> Result<String>;

    /// All worktrees of the repository, main worktree first
    async fn list_worktrees(&self, cwd: &Path) -> Result<Vec<WorktreeBinding>>;

    /// Check out `branch`
    async fn checkout(&self, cwd: &Path, branch: &str) -> Result<()>;

    /// Fetch one branch from `remote`
    async fn fetch(&self, cwd: &Path, remote: &str, branch: &str) -> Result<()>;

    /// Fast-forward-only pull of `branch` from `remote`
    async fn pull_ff_only(&self, cwd: &Path, remote: &str, branch: &str) -> Result<()>;

    /// Configured remotes
    async fn remotes(&self, cwd: &Path) -> Result<Vec<GitRemote>>;
}
