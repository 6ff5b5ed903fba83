//! [`GitOps`] backed by the `git` binary

use crate::error::{Error, Result};
use crate::git::GitOps;
use crate::process::{best_error_line, run};
use crate::types::{CommandOutput, GitRemote, WorktreeBinding};
use crate::worktree::parse_worktree_porcelain;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Shells out to `git`
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl GitCli {
    async fn git(cwd: &Path, args: &[&str]) -> Result<CommandOutput> {
        run("git", args, cwd).await
    }

    /// Run git and fail with its best stderr line unless it exits 0
    async fn git_ok(cwd: &Path, args: &[&str]) -> Result<String> {
        let output = Self::git(cwd, args).await?;
        if !output.success {
            return Err(Error::Git(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                best_error_line(&output.stderr)
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl GitOps for GitCli {
    async fn repository_root(&self, cwd: &Path) -> Result<PathBuf> {
        let out = Self::git_ok(cwd, &["rev-parse", "--show-toplevel"]).await?;
        let root = out.trim();
        if root.is_empty() {
            return Err(Error::Git("git did not return a repository root".to_string()));
        }
        Ok(PathBuf::from(root))
    }

    async fn current_branch(&self, cwd: &Path) -> Result<Option<String>> {
        let out = Self::git_ok(cwd, &["branch", "--show-current"]).await?;
        let branch = out.trim();
        Ok((!branch.is_empty()).then(|| branch.to_string()))
    }

    async fn has_uncommitted_changes(&self, cwd: &Path) -> Result<bool> {
        let out = Self::git_ok(cwd, &["status", "--porcelain"]).await?;
        Ok(!out.trim().is_empty())
    }

    async fn stage_all(&self, cwd: &Path) -> Result<()> {
        Self::git_ok(cwd, &["add", "-A"]).await.map(drop)
    }

    async fn commit(&self, cwd: &Path, message: &str) -> Result<()> {
        Self::git_ok(cwd, &["commit", "-m", message]).await.map(drop)
    }

    async fn amend_commit_message(&self, cwd: &Path, message: &str) -> Result<()> {
        Self::git_ok(cwd, &["commit", "--amend", "-m", message])
            .await
            .map(drop)
    }

    async fn count_commits_ahead(&self, cwd: &Path, base: &str) -> Result<usize> {
        let range = format!("{base}..HEAD");
        let out = Self::git_ok(cwd, &["rev-list", "--count", &range]).await?;
        out.trim()
            .parse()
            .map_err(|e| Error::Parse(format!("unexpected rev-list output {out:?}: {e}")))
    }

    async fn has_merge_conflicts(&self, cwd: &Path, base: &str, head: &str) -> Result<bool> {
        let output = Self::git(cwd, &["merge-tree", "--write-tree", base, head]).await?;
        if output.success {
            return Ok(false);
        }
        if output.stdout.contains("CONFLICT") {
            return Ok(true);
        }
        Err(Error::Git(format!(
            "git merge-tree failed: {}",
            best_error_line(&output.stderr)
        )))
    }

    async fn diff_against(&self, cwd: &Path, base: &str) -> Result<String> {
        let range = format!("{base}...HEAD");
        Self::git_ok(cwd, &["diff", &range]).await
    }

    async fn list_worktrees(&self, cwd: &Path) -> Result<Vec<WorktreeBinding>> {
        let out = Self::git_ok(cwd, &["worktree", "list", "--porcelain"]).await?;
        Ok(parse_worktree_porcelain(&out))
    }

    async fn checkout(&self, cwd: &Path, branch: &str) -> Result<()> {
        Self::git_ok(cwd, &["checkout", branch]).await.map(drop)
    }

    async fn fetch(&self, cwd: &Path, remote: &str, branch: &str) -> Result<()> {
        Self::git_ok(cwd, &["fetch", remote, branch]).await.map(drop)
    }

    async fn pull_ff_only(&self, cwd: &Path, remote: &str, branch: &str) -> Result<()> {
        Self::git_ok(cwd, &["pull", "--ff-only", remote, branch])
            .await
            .map(drop)
    }

    async fn remotes(&self, cwd: &Path) -> Result<Vec<GitRemote>> {
        let out = Self::git_ok(cwd, &["remote", "-v"]).await?;
        Ok(parse_remotes(&out))
    }
}

/// Parse `git remote -v`, keeping the fetch URL of each remote
fn parse_remotes(raw: &str) -> Vec<GitRemote> {
    raw.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let url = parts.next()?;
            (parts.next() == Some("(fetch)")).then(|| GitRemote {
                name: name.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}
