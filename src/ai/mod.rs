//! Commit message generation between the submit phases
//!
//! The generator sees the branch diff and answers with free text: the first
//! line becomes the PR title, the remainder the body.

mod claude;

pub use claude::ClaudeCli;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Diffs above this many bytes are cut before prompting
pub const MAX_DIFF_BYTES: usize = 200_000;

/// Input to a commit message generator
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Diff of the branch against its parent
    pub diff: &'a str,
    /// Branch being submitted
    pub branch: &'a str,
    /// Its parent branch
    pub parent: &'a str,
}

/// A title and body pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    /// First line
    pub title: String,
    /// Everything after the first line, trimmed
    pub body: String,
}

impl CommitMessage {
    /// Join back into commit message text
    pub fn to_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{}", self.title, self.body)
        }
    }
}

/// Produces commit messages from diffs
#[async_trait]
pub trait CommitMessageGenerator: Send + Sync {
    /// Generate a message for the request
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<CommitMessage>;
}

/// Split free text into title and body.
///
/// Leading blank lines and a surrounding Markdown code fence are ignored.
/// Returns `None` when there is no non-blank line.
pub fn parse_commit_message(text: &str) -> Option<CommitMessage> {
    let mut lines: Vec<&str> = text.trim().lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
        if lines.last().is_some_and(|l| l.trim() == "```") {
            lines.pop();
        }
    }

    let mut rest = lines.into_iter().skip_while(|l| l.trim().is_empty());
    let title = rest.next()?.trim().to_string();
    let body = rest.collect::<Vec<_>>().join("\n").trim().to_string();
    Some(CommitMessage { title, body })
}

/// Build the prompt sent to the generator
pub(crate) fn build_prompt(request: GenerationRequest<'_>) -> String {
    let diff = truncate_at_char_boundary(request.diff, MAX_DIFF_BYTES);
    let truncated = if diff.len() < request.diff.len() {
        "\n[diff truncated]\n"
    } else {
        ""
    };
    format!(
        "Write a commit message for the changes on branch `{branch}` relative to `{parent}`.\n\
         Answer with the message only. The first line is a concise summary of at most 72 \
         characters. After a blank line, describe what changed and why.\n\n\
         ```diff\n{diff}{truncated}```\n",
        branch = request.branch,
        parent = request.parent,
    )
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
