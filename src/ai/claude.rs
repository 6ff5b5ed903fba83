//! [`CommitMessageGenerator`] backed by the `claude` CLI

use crate::ai::{
    CommitMessage, CommitMessageGenerator, GenerationRequest, build_prompt, parse_commit_message,
};
use crate::config::AiConfig;
use crate::error::{Error, Result};
use crate::process::{best_error_line, run_with_input};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Runs `claude --print` with the prompt on stdin
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    command: String,
    model: Option<String>,
    timeout: Duration,
    cwd: PathBuf,
}

impl ClaudeCli {
    /// Build from the `[ai]` config section, running in `cwd`
    pub fn from_config(config: &AiConfig, cwd: PathBuf) -> Self {
        Self {
            command: config.command.clone(),
            model: config.model.clone(),
            timeout: config.timeout(),
            cwd,
        }
    }
}

#[async_trait]
impl CommitMessageGenerator for ClaudeCli {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<CommitMessage> {
        let prompt = build_prompt(request);
        let mut args = vec!["--print"];
        if let Some(model) = &self.model {
            args.extend(["--model", model.as_str()]);
        }
        debug!(
            command = %self.command,
            model = ?self.model,
            bytes = prompt.len(),
            "generating commit message"
        );

        let output = run_with_input(&self.command, &args, &self.cwd, &prompt, self.timeout)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        if !output.success {
            return Err(Error::Generation(best_error_line(&output.stderr)));
        }

        parse_commit_message(&output.stdout)
            .ok_or_else(|| Error::Generation("empty response".to_string()))
    }
}
