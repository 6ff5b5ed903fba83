//! Error types for stackpilot

use thiserror::Error;

/// Errors raised by collaborators and library plumbing.
///
/// Phase functions in [`crate::submit`] and [`crate::land`] translate these
/// into their own tagged error values; this type never reaches the JSON output
/// directly.
#[derive(Debug, Error)]
pub enum Error {
    /// A git invocation failed
    #[error("git error: {0}")]
    Git(String),

    /// A Graphite (`gt`) invocation failed
    #[error("gt error: {0}")]
    StackTool(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Generic PR host error
    #[error("platform error: {0}")]
    Platform(String),

    /// Authentication failed or is missing
    #[error("authentication error: {0}")]
    Auth(String),

    /// Failed to parse tool output, remote URLs, or metadata files
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// A subprocess exceeded its deadline
    #[error("`{program}` timed out after {seconds}s")]
    CommandTimeout {
        /// Program that was running
        program: String,
        /// Deadline that was exceeded
        seconds: u64,
    },

    /// A subprocess could not be started
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The AI commit-message collaborator failed
    #[error("commit message generation failed: {0}")]
    Generation(String),

    /// No GitHub remote found
    #[error("no GitHub remote found")]
    NoSupportedRemotes,

    /// Named remote does not exist
    #[error("remote '{0}' not found")]
    RemoteNotFound(String),

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias using stackpilot's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
