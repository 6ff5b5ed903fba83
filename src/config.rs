//! Configuration loaded from TOML
//!
//! Lookup order (later wins):
//! 1. built-in defaults
//! 2. `<config-dir>/stackpilot/config.toml` (user)
//! 3. `<repo-root>/.stackpilot.toml` (repository)
//!
//! Files are merged table by table; a key set in the repository file
//! overrides the same key from the user file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Repository-level config filename
pub const REPO_CONFIG_FILE: &str = ".stackpilot.toml";

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Git remote PRs are pushed to
    pub remote: String,
    /// Graphite integration
    pub graphite: GraphiteConfig,
    /// Submit workflow settings
    pub submit: SubmitConfig,
    /// Commit-message generation settings
    pub ai: AiConfig,
}

/// Graphite integration settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphiteConfig {
    /// Whether stacked-branch operations are allowed at all
    pub enabled: bool,
}

/// Submit workflow settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmitConfig {
    /// Deadline for the `gt submit` call
    pub timeout_secs: u64,
}

/// Commit-message generation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AiConfig {
    /// Executable invoked with `--print`
    pub command: String,
    /// Deadline for one generation
    pub timeout_secs: u64,
    /// Optional `--model` argument
    pub model: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            graphite: GraphiteConfig::default(),
            submit: SubmitConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Default for GraphiteConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            timeout_secs: 60,
            model: None,
        }
    }
}

impl SubmitConfig {
    /// Submit deadline as a [`Duration`]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AiConfig {
    /// Generation deadline as a [`Duration`]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Path of the user-level config file, if a config dir exists
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stackpilot").join("config.toml"))
}

impl Config {
    /// Load config for a repository, merging user and repository files
    pub fn load(repo_root: &Path) -> Result<Self> {
        let repo_file = repo_root.join(REPO_CONFIG_FILE);
        let files: Vec<PathBuf> = user_config_path()
            .into_iter()
            .chain(std::iter::once(repo_file))
            .collect();
        Self::load_from(&files)
    }

    /// Load config from an explicit list of files, later files winning.
    ///
    /// Missing files are skipped.
    pub fn load_from(files: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Table::new();
        for path in files {
            if !path.exists() {
                continue;
            }
            debug!(path = %path.display(), "loading config");
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
            let table: toml::Table = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
            merge_tables(&mut merged, table);
        }
        Self::from_table(merged)
    }

    /// Build config from a parsed TOML table
    pub fn from_table(table: toml::Table) -> Result<Self> {
        let config: Self = toml::Value::Table(table).try_into()?;
        if config.submit.timeout_secs == 0 || config.ai.timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least 1 second".to_string()));
        }
        Ok(config)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let toml::Value::Table(incoming) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}
