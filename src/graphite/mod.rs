//! Graphite (`gt`) integration
//!
//! Branch metadata is read from Graphite's persisted cache rather than by
//! parsing `gt log` output. Mutations (squash, restack, submit) shell out to
//! `gt`.

mod cache;
mod cli;

pub use cache::parse_branch_cache;
pub use cli::GraphiteCli;

use crate::error::Result;
use crate::types::{BranchNode, CommandOutput};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Stacked-branch tool operations
#[async_trait]
pub trait StackTool: Send + Sync {
    /// Fail unless the tool is authenticated
    async fn check_auth(&self, cwd: &Path) -> Result<()>;

    /// Every tracked branch, keyed by name
    async fn all_branches(&self, cwd: &Path) -> Result<HashMap<String, BranchNode>>;

    /// Squash the current branch into one commit.
    ///
    /// A non-zero exit is returned as output, not as an error, so callers can
    /// classify it.
    async fn squash(&self, cwd: &Path) -> Result<CommandOutput>;

    /// Reparent children of merged branches and rebase the stack
    async fn restack(&self, cwd: &Path) -> Result<()>;

    /// Push the current stack and create or update its PRs.
    ///
    /// Exceeding `timeout` yields [`crate::error::Error::CommandTimeout`].
    async fn submit_stack(
        &self,
        cwd: &Path,
        publish: bool,
        restack: bool,
        timeout: Duration,
    ) -> Result<CommandOutput>;

    /// Force-push a single branch; `cwd` must be the worktree holding it
    async fn submit_branch(&self, cwd: &Path, branch: &str) -> Result<()>;
}
