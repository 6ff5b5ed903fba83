//! [`StackTool`] backed by the `gt` binary

use crate::error::{Error, Result};
use crate::graphite::StackTool;
use crate::graphite::cache::{CACHE_FILE, parse_branch_cache};
use crate::process::{best_error_line, run, run_with_timeout};
use crate::types::{BranchNode, CommandOutput};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const USER_CONFIG_FILE: &str = ".graphite_user_config";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserConfig {
    auth_token: Option<String>,
}

/// Shells out to `gt`
#[derive(Debug, Clone, Default)]
pub struct GraphiteCli {
    user_config: Option<PathBuf>,
}

impl GraphiteCli {
    /// Use `~/.graphite_user_config` for the auth check
    pub fn new() -> Self {
        Self {
            user_config: dirs::home_dir().map(|home| home.join(USER_CONFIG_FILE)),
        }
    }

    /// Use a specific user config file for the auth check
    pub const fn with_user_config(path: PathBuf) -> Self {
        Self {
            user_config: Some(path),
        }
    }

    async fn gt_ok(cwd: &Path, args: &[&str]) -> Result<CommandOutput> {
        let output = run("gt", args, cwd).await?;
        if !output.success {
            let detail = if output.stderr.trim().is_empty() {
                &output.stdout
            } else {
                &output.stderr
            };
            return Err(Error::StackTool(format!(
                "gt {} failed: {}",
                args.first().copied().unwrap_or_default(),
                best_error_line(detail)
            )));
        }
        Ok(output)
    }
}

#[async_trait]
impl StackTool for GraphiteCli {
    async fn check_auth(&self, _cwd: &Path) -> Result<()> {
        let path = self
            .user_config
            .as_deref()
            .ok_or_else(|| Error::Auth("cannot locate home directory".to_string()))?;

        let raw = tokio::fs::read_to_string(path).await.map_err(|_| {
            Error::Auth("Graphite is not authenticated. Run `gt auth --token <token>`".to_string())
        })?;
        let config: UserConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Auth(format!("unreadable {}: {e}", path.display())))?;

        if config.auth_token.is_some_and(|t| !t.trim().is_empty()) {
            debug!("Graphite auth token present");
            Ok(())
        } else {
            Err(Error::Auth(
                "Graphite is not authenticated. Run `gt auth --token <token>`".to_string(),
            ))
        }
    }

    async fn all_branches(&self, cwd: &Path) -> Result<HashMap<String, BranchNode>> {
        let out = run(
            "git",
            &["rev-parse", "--path-format=absolute", "--git-common-dir"],
            cwd,
        )
        .await?;
        if !out.success {
            return Err(Error::Git(best_error_line(&out.stderr)));
        }
        let cache_path = PathBuf::from(out.stdout.trim()).join(CACHE_FILE);
        debug!(path = %cache_path.display(), "reading Graphite cache");

        let raw = tokio::fs::read_to_string(&cache_path).await.map_err(|e| {
            Error::StackTool(format!(
                "no Graphite metadata at {} ({e}); run `gt init`",
                cache_path.display()
            ))
        })?;
        parse_branch_cache(&raw)
    }

    async fn squash(&self, cwd: &Path) -> Result<CommandOutput> {
        run("gt", &["squash", "--no-edit", "--no-interactive"], cwd).await
    }

    async fn restack(&self, cwd: &Path) -> Result<()> {
        Self::gt_ok(cwd, &["sync", "--force", "--no-interactive"]).await?;
        Self::gt_ok(cwd, &["restack", "--no-interactive"]).await?;
        Ok(())
    }

    async fn submit_stack(
        &self,
        cwd: &Path,
        publish: bool,
        restack: bool,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let mut args = vec!["submit", "--no-edit", "--no-interactive"];
        if publish {
            args.push("--publish");
        }
        if restack {
            args.push("--restack");
        }
        run_with_timeout("gt", &args, cwd, timeout).await
    }

    async fn submit_branch(&self, cwd: &Path, branch: &str) -> Result<()> {
        Self::gt_ok(
            cwd,
            &[
                "submit",
                "--branch",
                branch,
                "--no-edit",
                "--no-interactive",
                "--force",
            ],
        )
        .await
        .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_auth_token_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(USER_CONFIG_FILE);
        std::fs::write(&path, r#"{"authToken": "secret"}"#).unwrap();

        let gt = GraphiteCli::with_user_config(path);
        assert!(gt.check_auth(dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_auth_missing_file_or_token() {
        let dir = TempDir::new().unwrap();
        let missing = GraphiteCli::with_user_config(dir.path().join("nope"));
        assert!(matches!(
            missing.check_auth(dir.path()).await,
            Err(Error::Auth(_))
        ));

        let path = dir.path().join(USER_CONFIG_FILE);
        std::fs::write(&path, r#"{"authToken": ""}"#).unwrap();
        let empty = GraphiteCli::with_user_config(path);
        assert!(matches!(empty.check_auth(dir.path()).await, Err(Error::Auth(_))));
    }
}
