//! Pull request host
//!
//! Everything stackpilot reads from or writes to GitHub goes through
//! [`PlatformService`]. Reads may lag behind writes that just completed, so
//! callers wrap reads that follow a mutation in [`crate::retry::with_retry`].

mod detection;
mod github;

pub use detection::{is_github_url, parse_repo_info, resolve_remote};
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{MergeMethod, MergeResult, MergeStatus, PlatformConfig, PullRequestRef};
use async_trait::async_trait;

/// Platform service trait for PR operations
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Verify credentials, returning the authenticated login
    async fn check_auth(&self) -> Result<String>;

    /// Most recent PR (any state) whose head is `branch`
    async fn find_pr_for_branch(&self, branch: &str) -> Result<Option<PullRequestRef>>;

    /// Fetch a PR by number
    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestRef>;

    /// Current base branch of a PR
    async fn get_pr_base(&self, pr_number: u64) -> Result<String> {
        Ok(self.get_pr(pr_number).await?.base_branch)
    }

    /// Point a PR at a new base branch
    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<()>;

    /// Read both mergeability signals
    async fn get_merge_status(&self, pr_number: u64) -> Result<MergeStatus>;

    /// Replace PR title and body
    async fn update_pr_metadata(&self, pr_number: u64, title: &str, body: &str) -> Result<()>;

    /// Merge a PR
    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult>;

    /// Unified diff of a PR
    async fn get_pr_diff(&self, pr_number: u64) -> Result<String>;

    /// Repository coordinates
    fn config(&self) -> &PlatformConfig;
}
