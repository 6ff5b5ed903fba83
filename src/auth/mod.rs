//! GitHub credentials
//!
//! Tokens come from the `gh` CLI or the environment. Whether a token is
//! actually valid is checked by [`crate::platform::PlatformService::check_auth`].

mod github;

pub use github::{GitHubAuthConfig, TOKEN_VARS, get_github_auth, token_from_env};

/// Where a token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// `gh auth token`
    Cli,
    /// `GITHUB_TOKEN` or `GH_TOKEN`
    EnvVar,
}
