//! Classification of `gt` output by known phrases
//!
//! Graphite reports most failures only as human-readable text. Every phrase
//! stackpilot reacts to lives in the tables below; when Graphite rewords a
//! message, this is the only file to update.
//!
//! Matching is a case-insensitive substring search over combined stdout and
//! stderr. Tables are ordered: the first matching row wins.

use crate::types::CommandOutput;

/// Failure classes of a `gt submit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFailure {
    /// Rebase conflict while restacking
    Conflict,
    /// Parent was merged but its commits are not in trunk yet
    MergedParent,
    /// Remote branch diverged from the local one
    Diverged,
    /// The call exceeded its deadline
    Timeout,
    /// Anything else
    Generic,
    /// Exit status was success, but nothing was pushed
    EmptyParent,
}

/// Failure classes of a `gt squash` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquashFailure {
    /// Squash hit a conflict
    Conflict,
    /// Anything else
    Generic,
}

const SUBMIT_FAILURE_TABLE: &[(&[&str], SubmitFailure)] = &[
    (&["conflict"], SubmitFailure::Conflict),
    (
        &[
            "merged but the merged commits are not contained",
            "not contained in trunk",
        ],
        SubmitFailure::MergedParent,
    ),
    (
        &["updated remotely", "must sync", "diverged"],
        SubmitFailure::Diverged,
    ),
];

/// Phrases `gt submit` prints when it exits 0 without pushing anything
const EMPTY_SUBMIT_MARKERS: &[&str] = &["nothing to submit!", "does not introduce any changes"];

const SQUASH_FAILURE_TABLE: &[(&[&str], SquashFailure)] =
    &[(&["conflict"], SquashFailure::Conflict)];

fn lookup<T: Copy>(table: &[(&[&str], T)], text: &str) -> Option<T> {
    let haystack = text.to_lowercase();
    table
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|p| haystack.contains(p)))
        .map(|(_, class)| *class)
}

/// Classify a finished `gt submit`.
///
/// Returns `None` only for a genuine success. A zero exit status whose output
/// carries an empty-submit marker is still a failure.
pub fn classify_submit(output: &CommandOutput) -> Option<SubmitFailure> {
    let combined = output.combined();
    if output.success {
        let lowered = combined.to_lowercase();
        return EMPTY_SUBMIT_MARKERS
            .iter()
            .any(|m| lowered.contains(m))
            .then_some(SubmitFailure::EmptyParent);
    }
    Some(lookup(SUBMIT_FAILURE_TABLE, &combined).unwrap_or(SubmitFailure::Generic))
}

/// Classify a failed `gt squash`
pub fn classify_squash(output: &CommandOutput) -> SquashFailure {
    lookup(SQUASH_FAILURE_TABLE, &output.combined()).unwrap_or(SquashFailure::Generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn succeeded(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_success_is_unclassified() {
        assert_eq!(classify_submit(&succeeded("Pushed feat-a")), None);
    }

    #[test]
    fn test_nothing_to_submit_on_success_is_empty_parent() {
        assert_eq!(
            classify_submit(&succeeded("Nothing to submit!")),
            Some(SubmitFailure::EmptyParent)
        );
        assert_eq!(
            classify_submit(&succeeded("feat-b does not introduce any changes")),
            Some(SubmitFailure::EmptyParent)
        );
    }

    #[test]
    fn test_conflict_wins_over_later_rows() {
        let out = failed("CONFLICT in foo.rs; branch must sync with remote");
        assert_eq!(classify_submit(&out), Some(SubmitFailure::Conflict));
    }

    #[test]
    fn test_merged_parent_before_diverged() {
        let out = failed(
            "parent was merged but the merged commits are not contained in trunk; must sync",
        );
        assert_eq!(classify_submit(&out), Some(SubmitFailure::MergedParent));
    }

    #[test]
    fn test_diverged_phrases() {
        assert_eq!(
            classify_submit(&failed("Branch feat-a has been updated remotely")),
            Some(SubmitFailure::Diverged)
        );
        assert_eq!(
            classify_submit(&failed("You must sync first")),
            Some(SubmitFailure::Diverged)
        );
    }

    #[test]
    fn test_unknown_failure_is_generic() {
        assert_eq!(
            classify_submit(&failed("fatal: unable to access remote")),
            Some(SubmitFailure::Generic)
        );
    }

    #[test]
    fn test_phrase_in_stdout_counts() {
        let out = CommandOutput {
            success: false,
            stdout: "Merge conflict detected".to_string(),
            stderr: "exit 1".to_string(),
        };
        assert_eq!(classify_submit(&out), Some(SubmitFailure::Conflict));
    }

    #[test]
    fn test_squash_classification() {
        assert_eq!(
            classify_squash(&failed("Hit a Conflict while squashing")),
            SquashFailure::Conflict
        );
        assert_eq!(classify_squash(&failed("not a branch")), SquashFailure::Generic);
    }
}
