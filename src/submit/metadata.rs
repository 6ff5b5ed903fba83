//! PR body footer, issue reference, and Graphite links

use crate::types::PlatformConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Directory holding implementation handoff files
pub const IMPL_DIR: &str = ".impl";

/// Issue reference file inside [`IMPL_DIR`]
pub const ISSUE_FILE: &str = "issue.json";

/// Commit message used when committing uncommitted changes before submit
pub const PLACEHOLDER_COMMIT_MESSAGE: &str = "WIP: Prepare for PR submission";

/// Contents of `.impl/issue.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueReference {
    /// Issue the branch implements
    pub issue_number: u64,
    /// Web URL of the issue
    #[serde(default)]
    pub issue_url: Option<String>,
}

/// Read `<worktree>/.impl/issue.json`; missing or malformed means no issue
pub async fn read_issue_reference(worktree: &Path) -> Option<IssueReference> {
    let path = worktree.join(IMPL_DIR).join(ISSUE_FILE);
    let raw = tokio::fs::read_to_string(&path).await.ok()?;
    match serde_json::from_str(&raw) {
        Ok(issue) => Some(issue),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring malformed issue reference");
            None
        }
    }
}

/// Deterministic footer appended to commit messages and PR bodies
pub fn build_footer(branch: Option<&str>, issue_number: Option<u64>) -> String {
    let mut lines = vec!["---".to_string()];
    if let Some(branch) = branch {
        lines.push(format!("To check out this branch locally: `gt get {branch}`"));
    }
    if let Some(n) = issue_number {
        lines.push(String::new());
        lines.push(format!("Closes #{n}"));
    }
    lines.join("\n")
}

/// PR body: footer first, then the supplied body
pub fn compose_body(footer: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        footer.to_string()
    } else {
        format!("{footer}\n\n{body}")
    }
}

/// Full commit message: title, footer, body
pub fn compose_commit_message(title: &str, footer: &str, body: &str) -> String {
    format!("{}\n\n{}", title.trim(), compose_body(footer, body))
}

/// Graphite web URL for a PR
pub fn graphite_url(config: &PlatformConfig, pr_number: u64) -> String {
    format!(
        "https://app.graphite.dev/github/pr/{}/{}/{pr_number}",
        config.owner, config.repo
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_footer_with_issue() {
        assert_eq!(
            build_footer(Some("feat-a"), Some(42)),
            "---\nTo check out this branch locally: `gt get feat-a`\n\nCloses #42"
        );
    }

    #[test]
    fn test_footer_without_issue_or_branch() {
        assert_eq!(build_footer(None, None), "---");
        assert!(!build_footer(Some("x"), None).contains("Closes"));
    }

    #[test]
    fn test_commit_message_layout() {
        let msg = compose_commit_message("Add thing", "---", "Details\n");
        assert_eq!(msg, "Add thing\n\n---\n\nDetails");
        assert_eq!(compose_commit_message("T", "---", "  "), "T\n\n---");
    }

    #[test]
    fn test_graphite_url() {
        let config = PlatformConfig {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            host: None,
        };
        assert_eq!(
            graphite_url(&config, 7),
            "https://app.graphite.dev/github/pr/acme/widgets/7"
        );
    }

    #[tokio::test]
    async fn test_issue_reference_read() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_issue_reference(dir.path()).await, None);

        std::fs::create_dir(dir.path().join(IMPL_DIR)).unwrap();
        let file = dir.path().join(IMPL_DIR).join(ISSUE_FILE);
        std::fs::write(&file, "{ broken").unwrap();
        assert_eq!(read_issue_reference(dir.path()).await, None);

        std::fs::write(&file, r#"{"issue_number": 12, "issue_url": "https://x/12"}"#).unwrap();
        let issue = read_issue_reference(dir.path()).await.unwrap();
        assert_eq!(issue.issue_number, 12);
        assert_eq!(issue.issue_url.as_deref(), Some("https://x/12"));
    }
}
