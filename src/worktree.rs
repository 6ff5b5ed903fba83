//! Worktree registry: which worktree holds which branch
//!
//! Any operation that checks out or force-pushes a branch must run inside the
//! worktree holding it. Running `gt submit` from a different directory checks
//! the branch out there and corrupts the other worktree.

use crate::error::Result;
use crate::git::GitOps;
use crate::types::WorktreeBinding;
use std::path::{Path, PathBuf};

/// Snapshot of `git worktree list`
#[derive(Debug, Clone)]
pub struct WorktreeRegistry {
    bindings: Vec<WorktreeBinding>,
}

impl WorktreeRegistry {
    /// Read the current worktree listing
    pub async fn load(git: &dyn GitOps, cwd: &Path) -> Result<Self> {
        Ok(Self::from_bindings(git.list_worktrees(cwd).await?))
    }

    /// Build a registry from already-listed bindings
    pub const fn from_bindings(bindings: Vec<WorktreeBinding>) -> Self {
        Self { bindings }
    }

    /// Every worktree, root first
    pub fn list(&self) -> &[WorktreeBinding] {
        &self.bindings
    }

    /// Path of the main worktree
    pub fn root(&self) -> Option<&Path> {
        self.bindings
            .iter()
            .find(|b| b.is_root)
            .map(|b| b.path.as_path())
    }

    /// Worktree that currently has `branch` checked out
    pub fn find_worktree_for_branch(&self, branch: &str) -> Option<&Path> {
        self.bindings
            .iter()
            .find(|b| b.branch.as_deref() == Some(branch))
            .map(|b| b.path.as_path())
    }

    /// Whether any worktree has `branch` checked out, and which
    pub fn is_branch_checked_out(&self, branch: &str) -> Option<&Path> {
        self.find_worktree_for_branch(branch)
    }

    /// Directory to run a branch-scoped command in: the worktree holding
    /// `branch`, otherwise `fallback`
    pub fn dir_for_branch(&self, branch: &str, fallback: &Path) -> PathBuf {
        self.find_worktree_for_branch(branch)
            .unwrap_or(fallback)
            .to_path_buf()
    }
}

/// Parse `git worktree list --porcelain`.
///
/// Records are separated by blank lines. The first record is the main
/// worktree. Detached and bare records get no branch.
pub fn parse_worktree_porcelain(raw: &str) -> Vec<WorktreeBinding> {
    let mut bindings = Vec::new();
    let mut path: Option<PathBuf> = None;
    let mut branch: Option<String> = None;

    let mut flush = |path: &mut Option<PathBuf>, branch: &mut Option<String>| {
        if let Some(p) = path.take() {
            let is_root = bindings.is_empty();
            bindings.push(WorktreeBinding {
                path: p,
                branch: branch.take(),
                is_root,
            });
        }
        *branch = None;
    };

    for line in raw.lines() {
        if line.trim().is_empty() {
            flush(&mut path, &mut branch);
        } else if let Some(p) = line.strip_prefix("worktree ") {
            flush(&mut path, &mut branch);
            path = Some(PathBuf::from(p));
        } else if let Some(b) = line.strip_prefix("branch ") {
            branch = Some(b.strip_prefix("refs/heads/").unwrap_or(b).to_string());
        }
    }
    flush(&mut path, &mut branch);

    bindings
}
