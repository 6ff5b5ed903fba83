//! Shared command context for CLI commands
//!
//! Extracts the setup shared by the submit and land commands.

use stackpilot::config::Config;
use stackpilot::error::Result;
use stackpilot::git::{GitCli, GitOps};
use stackpilot::graphite::GraphiteCli;
use stackpilot::land::LandContext;
use stackpilot::platform::{GitHubService, resolve_remote};
use stackpilot::progress::ProgressCallback;
use stackpilot::retry::TokioClock;
use stackpilot::submit::{SubmitContext, SubmitOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Real collaborators for one command run
///
/// Holds no stack or PR state: every operation re-reads what it needs.
pub struct CommandContext {
    /// Root of the worktree the command runs in
    pub worktree: PathBuf,
    /// Merged configuration
    pub config: Config,
    /// Git
    pub git: GitCli,
    /// Graphite
    pub stack_tool: GraphiteCli,
    /// GitHub
    pub platform: GitHubService,
    /// Real-time sleeps
    pub clock: TokioClock,
}

impl CommandContext {
    /// Resolve the worktree, load config, and detect the GitHub repository
    pub async fn new(path: &Path) -> Result<Self> {
        let git = GitCli;
        let worktree = git.repository_root(path).await?;
        let config = Config::load(&worktree)?;

        let remotes = git.remotes(&worktree).await?;
        let platform_config = resolve_remote(&remotes, &config.remote)?;
        debug!(
            owner = %platform_config.owner,
            repo = %platform_config.repo,
            remote = %config.remote,
            "detected repository"
        );

        Ok(Self {
            worktree,
            config,
            git,
            stack_tool: GraphiteCli::new(),
            platform: GitHubService::new(platform_config),
            clock: TokioClock,
        })
    }

    /// Submit options from config
    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            submit_timeout: self.config.submit.timeout(),
            ..SubmitOptions::default()
        }
    }

    /// Borrow the collaborators for a submit phase
    pub fn submit<'a>(
        &'a self,
        progress: &'a dyn ProgressCallback,
        options: &'a SubmitOptions,
    ) -> SubmitContext<'a> {
        SubmitContext {
            worktree: &self.worktree,
            git: &self.git,
            stack_tool: &self.stack_tool,
            platform: &self.platform,
            clock: &self.clock,
            progress,
            options,
        }
    }

    /// Borrow the collaborators for a landing run
    pub fn land<'a>(&'a self, progress: &'a dyn ProgressCallback) -> LandContext<'a> {
        LandContext {
            worktree: &self.worktree,
            remote: &self.config.remote,
            graphite_enabled: self.config.graphite.enabled,
            git: &self.git,
            stack_tool: &self.stack_tool,
            platform: &self.platform,
            clock: &self.clock,
            progress,
        }
    }
}
