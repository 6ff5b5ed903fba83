//! Tagged phase results
//!
//! Every submit phase returns `Result<T, PhaseError<K>>` where `K` is the
//! closed set of failure kinds for that phase. Both sides serialise to a
//! single JSON object carrying a `success` flag.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A classified phase failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseError<K> {
    /// Failure kind, serialised in `snake_case`
    pub error_type: K,
    /// Human-readable explanation with a remediation hint where one exists
    pub message: String,
    /// Structured context (branch names, counts, tool output)
    pub details: BTreeMap<String, Value>,
}

impl<K> PhaseError<K> {
    /// Error with no details
    pub fn new(error_type: K, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a detail entry
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Re-tag into a wider kind set
    pub fn widen<J: From<K>>(self) -> PhaseError<J> {
        PhaseError {
            error_type: J::from(self.error_type),
            message: self.message,
            details: self.details,
        }
    }
}

impl<K: fmt::Display> fmt::Display for PhaseError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl<K: fmt::Debug + fmt::Display> std::error::Error for PhaseError<K> {}

/// Failure kinds of the prepare phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreAnalysisErrorKind {
    /// Graphite is not authenticated
    GtNotAuthenticated,
    /// GitHub is not authenticated
    GhNotAuthenticated,
    /// Current branch could not be determined
    NoBranch,
    /// Parent branch could not be determined
    NoParent,
    /// Branch has no commits ahead of its parent
    NoCommits,
    /// The branch conflicts with its parent
    PrHasConflicts,
    /// `gt squash` hit a conflict
    SquashConflict,
    /// `gt squash` failed otherwise
    SquashFailed,
    /// Committing uncommitted changes failed
    CommitFailed,
}

impl PreAnalysisErrorKind {
    /// Wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GtNotAuthenticated => "gt_not_authenticated",
            Self::GhNotAuthenticated => "gh_not_authenticated",
            Self::NoBranch => "no_branch",
            Self::NoParent => "no_parent",
            Self::NoCommits => "no_commits",
            Self::PrHasConflicts => "pr_has_conflicts",
            Self::SquashConflict => "squash_conflict",
            Self::SquashFailed => "squash_failed",
            Self::CommitFailed => "commit_failed",
        }
    }
}

/// Failure kinds of the submit phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostAnalysisErrorKind {
    /// Amending the commit message failed
    AmendFailed,
    /// Restack during submit hit a conflict
    SubmitConflict,
    /// Parent was merged but its commits are not in trunk
    SubmitMergedParent,
    /// Remote branch diverged
    SubmitDiverged,
    /// `gt submit` exceeded its deadline
    SubmitTimeout,
    /// `gt submit` failed otherwise
    SubmitFailed,
    /// `gt submit` exited 0 without pushing anything
    SubmitEmptyParent,
}

impl PostAnalysisErrorKind {
    /// Wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AmendFailed => "amend_failed",
            Self::SubmitConflict => "submit_conflict",
            Self::SubmitMergedParent => "submit_merged_parent",
            Self::SubmitDiverged => "submit_diverged",
            Self::SubmitTimeout => "submit_timeout",
            Self::SubmitFailed => "submit_failed",
            Self::SubmitEmptyParent => "submit_empty_parent",
        }
    }
}

/// Failure kinds of the combined flows (preflight and one-shot submit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitErrorKind {
    /// The diff could not be produced or written
    DiffFailed,
    /// A prepare-phase failure
    #[serde(untagged)]
    Prepare(PreAnalysisErrorKind),
    /// A submit-phase failure
    #[serde(untagged)]
    Submit(PostAnalysisErrorKind),
}

impl SubmitErrorKind {
    /// Wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare(kind) => kind.as_str(),
            Self::Submit(kind) => kind.as_str(),
            Self::DiffFailed => "diff_failed",
        }
    }
}

impl From<PreAnalysisErrorKind> for SubmitErrorKind {
    fn from(kind: PreAnalysisErrorKind) -> Self {
        Self::Prepare(kind)
    }
}

impl From<PostAnalysisErrorKind> for SubmitErrorKind {
    fn from(kind: PostAnalysisErrorKind) -> Self {
        Self::Submit(kind)
    }
}

/// Failure kinds of the finalize phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeErrorKind {
    /// Updating the PR title or body failed
    PrUpdateFailed,
}

impl FinalizeErrorKind {
    /// Wire name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrUpdateFailed => "pr_update_failed",
        }
    }
}

macro_rules! display_via_as_str {
    ($($kind:ty),*) => {$(
        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

display_via_as_str!(
    PreAnalysisErrorKind,
    PostAnalysisErrorKind,
    SubmitErrorKind,
    FinalizeErrorKind
);

/// Outcome of the prepare phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreAnalysisResult {
    /// Branch being submitted
    pub branch_name: String,
    /// Its parent in the stack
    pub parent_branch: String,
    /// Commits ahead of the parent before squashing
    pub commit_count: usize,
    /// Whether the commits were squashed into one
    pub squashed: bool,
    /// Whether a placeholder commit was created for uncommitted changes
    pub had_uncommitted_changes: bool,
    /// Open PR already associated with the branch
    pub existing_pr_number: Option<u64>,
    /// Summary line
    pub message: String,
}

/// Outcome of the submit phase.
///
/// `pr_number` is `None` when the PR never became visible; the push still
/// happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostAnalysisResult {
    /// Branch that was submitted
    pub branch_name: String,
    /// PR number, once visible
    pub pr_number: Option<u64>,
    /// PR web URL
    pub pr_url: Option<String>,
    /// PR title as set by this run
    pub pr_title: Option<String>,
    /// Graphite web URL for the PR
    pub graphite_url: Option<String>,
    /// Issue closed by the PR, from `.impl/issue.json`
    pub issue_number: Option<u64>,
    /// Summary line
    pub message: String,
    /// Soft degradations that did not fail the phase
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Outcome of the preflight phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightResult {
    /// Branch that was submitted
    pub branch_name: String,
    /// Its parent in the stack
    pub parent_branch: String,
    /// Commits ahead of the parent before squashing
    pub commit_count: usize,
    /// Whether the commits were squashed
    pub squashed: bool,
    /// Whether a placeholder commit was created
    pub had_uncommitted_changes: bool,
    /// PR number, once visible
    pub pr_number: Option<u64>,
    /// PR web URL
    pub pr_url: Option<String>,
    /// Graphite web URL for the PR
    pub graphite_url: Option<String>,
    /// Issue closed by the PR
    pub issue_number: Option<u64>,
    /// File the branch diff was written to
    pub diff_file: PathBuf,
    /// Summary line
    pub message: String,
    /// Soft degradations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Outcome of the finalize phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeResult {
    /// PR that was updated
    pub pr_number: u64,
    /// Title that was set
    pub pr_title: String,
    /// Graphite web URL for the PR
    pub graphite_url: String,
    /// Issue closed by the PR
    pub issue_number: Option<u64>,
    /// Whether the local commit message was amended too
    pub amended: bool,
    /// Summary line
    pub message: String,
    /// Soft degradations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    success: bool,
    #[serde(flatten)]
    body: &'a T,
}

/// Render a phase outcome as the single JSON object the CLI prints
pub fn to_json<T: Serialize, K: Serialize>(
    outcome: &Result<T, PhaseError<K>>,
) -> serde_json::Result<String> {
    match outcome {
        Ok(body) => serde_json::to_string(&Envelope {
            success: true,
            body,
        }),
        Err(err) => serde_json::to_string(&Envelope {
            success: false,
            body: err,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_json_shape() {
        let outcome: Result<PreAnalysisResult, _> = Err(PhaseError::new(
            PreAnalysisErrorKind::GtNotAuthenticated,
            "Run `gt auth`",
        )
        .with_detail("branch", "feat"));

        let json: Value = serde_json::from_str(&to_json(&outcome).unwrap()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_type"], "gt_not_authenticated");
        assert_eq!(json["message"], "Run `gt auth`");
        assert_eq!(json["details"]["branch"], "feat");
    }

    #[test]
    fn test_success_json_shape() {
        let outcome: Result<PostAnalysisResult, PhaseError<PostAnalysisErrorKind>> =
            Ok(PostAnalysisResult {
                branch_name: "feat".to_string(),
                pr_number: None,
                pr_url: None,
                pr_title: None,
                graphite_url: None,
                issue_number: None,
                message: "pushed".to_string(),
                warnings: Vec::new(),
            });

        let json: Value = serde_json::from_str(&to_json(&outcome).unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["branch_name"], "feat");
        assert!(json["pr_number"].is_null());
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_widened_kinds_keep_wire_names() {
        let err = PhaseError::new(PostAnalysisErrorKind::SubmitEmptyParent, "empty")
            .widen::<SubmitErrorKind>();
        assert_eq!(err.error_type.as_str(), "submit_empty_parent");
        assert_eq!(
            serde_json::to_value(err.error_type).unwrap(),
            "submit_empty_parent"
        );
        assert_eq!(
            serde_json::to_value(SubmitErrorKind::DiffFailed).unwrap(),
            "diff_failed"
        );
        assert_eq!(
            serde_json::to_value(SubmitErrorKind::Prepare(PreAnalysisErrorKind::NoCommits))
                .unwrap(),
            "no_commits"
        );
    }
}
