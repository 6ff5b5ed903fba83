//! Test data factories for stackpilot types

#![allow(dead_code)]

use stackpilot::types::{
    BranchNode, MergeStateStatus, MergeStatus, Mergeable, PlatformConfig, PrState,
    PullRequestRef, WorktreeBinding,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// Repository coordinates used by every fake
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
        host: None,
    }
}

/// An open, clean PR for `branch` targeting `base`
pub fn make_pr(number: u64, branch: &str, base: &str) -> PullRequestRef {
    PullRequestRef {
        number,
        url: format!("https://github.com/acme/widgets/pull/{number}"),
        state: PrState::Open,
        base_branch: base.to_string(),
        head_branch: branch.to_string(),
        title: format!("Change on {branch}"),
        mergeable: Mergeable::Mergeable,
        merge_state_status: MergeStateStatus::Clean,
        is_draft: false,
    }
}

/// Mergeability reading
pub const fn status(mergeable: Mergeable, merge_state_status: MergeStateStatus) -> MergeStatus {
    MergeStatus {
        mergeable,
        merge_state_status,
    }
}

/// Still being computed
pub const fn unknown() -> MergeStatus {
    status(Mergeable::Unknown, MergeStateStatus::Unknown)
}

/// Ready to merge
pub const fn clean() -> MergeStatus {
    status(Mergeable::Mergeable, MergeStateStatus::Clean)
}

/// Graphite metadata from `(branch, parent)` pairs; `trunk` has no parent
pub fn make_branches(trunk: &str, links: &[(&str, &str)]) -> HashMap<String, BranchNode> {
    let mut branches = HashMap::new();
    branches.insert(
        trunk.to_string(),
        BranchNode {
            name: trunk.to_string(),
            parent: None,
            children: Vec::new(),
            is_trunk: true,
            commit_sha: None,
        },
    );
    for (name, parent) in links {
        branches.insert(
            (*name).to_string(),
            BranchNode {
                name: (*name).to_string(),
                parent: Some((*parent).to_string()),
                children: Vec::new(),
                is_trunk: false,
                commit_sha: Some(format!("{name}_sha")),
            },
        );
    }
    for (name, parent) in links {
        if let Some(node) = branches.get_mut(*parent) {
            node.children.push((*name).to_string());
        }
    }
    for node in branches.values_mut() {
        node.children.sort();
    }
    branches
}

/// A worktree binding
pub fn worktree(path: &str, branch: Option<&str>, is_root: bool) -> WorktreeBinding {
    WorktreeBinding {
        path: PathBuf::from(path),
        branch: branch.map(ToString::to_string),
        is_root,
    }
}
