//! Landing planning - pure functions
//!
//! No I/O happens here. The caller gathers the stack and PR data; these
//! functions decide the landing order and which preconditions fail.

use crate::land::{LandErrorKind, LandingFailure};
use crate::types::{MergeStateStatus, MergeStatus, Mergeable, PrState, PullRequestRef};
use crate::worktree::WorktreeRegistry;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One PR to land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingPlanEntry {
    /// Head branch
    pub branch: String,
    /// PR number
    pub pr_number: u64,
    /// PR title (for display)
    pub title: String,
}

impl fmt::Display for LandingPlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PR #{}): {}", self.branch, self.pr_number, self.title)
    }
}

/// Ordered landing plan, trunk-adjacent branch first.
///
/// Computed once before landing starts and never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingPlan {
    /// Trunk every entry lands into
    pub trunk: String,
    /// Entries, bottom of stack first
    pub entries: Vec<LandingPlanEntry>,
}

impl LandingPlan {
    /// Branch names in landing order
    pub fn branches(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.branch.as_str())
    }

    /// Entries after position `index`
    pub fn remaining_after(&self, index: usize) -> &[LandingPlanEntry] {
        self.entries.get(index + 1..).unwrap_or_default()
    }
}

/// Build the plan from the trunk-to-branch chain and the PR found per branch.
///
/// `chain` starts with trunk. Every non-trunk branch needs an open PR.
pub fn build_landing_plan<S: std::hash::BuildHasher>(
    chain: &[String],
    prs: &HashMap<String, Option<PullRequestRef>, S>,
) -> Result<LandingPlan, LandingFailure> {
    let Some((trunk, branches)) = chain.split_first() else {
        return Err(LandingFailure::new(
            LandErrorKind::EmptyPlan,
            "no branches to land",
        ));
    };
    if branches.is_empty() {
        return Err(LandingFailure::new(
            LandErrorKind::EmptyPlan,
            format!("nothing between '{trunk}' and the current branch"),
        ));
    }

    let entries = branches
        .iter()
        .map(|branch| match prs.get(branch).and_then(Option::as_ref) {
            None => Err(LandingFailure::new(
                LandErrorKind::NoPullRequest,
                format!("'{branch}' has no pull request. Submit it first"),
            )
            .on_branch(branch)),
            Some(pr) if pr.state != PrState::Open => Err(LandingFailure::new(
                LandErrorKind::PrNotOpen,
                format!("PR #{} for '{branch}' is {}", pr.number, pr.state),
            )
            .on_branch(branch)),
            Some(pr) => Ok(LandingPlanEntry {
                branch: branch.clone(),
                pr_number: pr.number,
                title: pr.title.clone(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LandingPlan {
        trunk: trunk.clone(),
        entries,
    })
}

/// Plan branches checked out in a worktree other than `current_worktree`
pub fn find_worktree_conflicts(
    plan: &LandingPlan,
    registry: &WorktreeRegistry,
    current_worktree: &Path,
) -> Vec<(String, PathBuf)> {
    plan.branches()
        .filter_map(|branch| {
            registry
                .find_worktree_for_branch(branch)
                .filter(|path| *path != current_worktree)
                .map(|path| (branch.to_string(), path.to_path_buf()))
        })
        .collect()
}

/// Verdict of the merge gate on one mergeability reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeGate {
    /// Safe to merge
    Ready,
    /// GitHub is still computing
    Pending,
    /// Cannot merge; the string is the remediation
    Blocked(&'static str),
}

/// Decide whether a PR with `status` may be merged
pub const fn merge_gate(status: MergeStatus) -> MergeGate {
    if matches!(status.mergeable, Mergeable::Conflicting) {
        return MergeGate::Blocked("the PR has merge conflicts; resolve them and restack");
    }
    match status.merge_state_status {
        MergeStateStatus::Dirty => {
            MergeGate::Blocked("the PR has merge conflicts; resolve them and restack")
        }
        MergeStateStatus::Blocked => {
            MergeGate::Blocked("required reviews or status checks are missing")
        }
        MergeStateStatus::Behind => {
            MergeGate::Blocked("the branch is behind its base; update it and retry")
        }
        MergeStateStatus::Unstable => MergeGate::Blocked("status checks are failing"),
        MergeStateStatus::Unknown => MergeGate::Pending,
        MergeStateStatus::Clean => match status.mergeable {
            Mergeable::Unknown => MergeGate::Pending,
            _ => MergeGate::Ready,
        },
    }
}
