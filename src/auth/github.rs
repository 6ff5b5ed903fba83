//! GitHub token lookup

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use crate::process;
use std::path::Path;
use tracing::debug;

/// Environment variables consulted after the `gh` CLI, in order
pub const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// A resolved GitHub token
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

/// Resolve a token for `host` (github.com when `None`).
///
/// The `gh` CLI wins; `GITHUB_TOKEN` and then `GH_TOKEN` are the fallback.
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(token) = gh_cli_token(host).await {
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    token_from_env(|var| std::env::var(var).ok()).ok_or_else(|| {
        Error::Auth(
            "No GitHub authentication found. Run `gh auth login` or set GITHUB_TOKEN".to_string(),
        )
    })
}

/// First non-blank token among [`TOKEN_VARS`]
pub fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<GitHubAuthConfig> {
    TOKEN_VARS.iter().find_map(|var| {
        let token = lookup(var)?.trim().to_string();
        if token.is_empty() {
            return None;
        }
        debug!(var, "using GitHub token from environment");
        Some(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        })
    })
}

async fn gh_cli_token(host: Option<&str>) -> Option<String> {
    let mut args = vec!["auth", "token"];
    if let Some(host) = host {
        args.extend(["--hostname", host]);
    }

    let output = process::run("gh", &args, Path::new(".")).await.ok()?;
    if !output.success {
        debug!(stderr = %output.stderr.trim(), "gh has no token");
        return None;
    }
    let token = output.stdout.trim().to_string();
    (!token.is_empty()).then_some(token)
}
