//! Shared fake repository state
//!
//! Every mock collaborator reads and writes the same [`World`], so a merge on
//! the fake GitHub is visible to the fake `gt restack`, and the call log
//! records the order operations happened in across all of them.

#![allow(dead_code)]

use stackpilot::error::{Error, Result};
use stackpilot::types::{
    BranchNode, CommandOutput, MergeStatus, PrState, PullRequestRef, WorktreeBinding,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle shared by every mock
#[derive(Clone, Default)]
pub struct Shared(Arc<Mutex<World>>);

impl Shared {
    pub fn new(world: World) -> Self {
        Self(Arc::new(Mutex::new(world)))
    }

    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap()
    }

    /// Copy of the call log
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Index of the first call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.lock().calls.iter().position(|c| c.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

/// Fake repository, Graphite metadata, and GitHub state
pub struct World {
    /// Branch checked out where commands run
    pub current_branch: Option<String>,
    /// Uncommitted changes present
    pub dirty: bool,
    /// Commits between the branch and its parent
    pub commits_ahead: usize,
    /// Local merge-tree reports a conflict
    pub local_conflict: bool,
    /// Output of `git diff parent...HEAD`
    pub diff: String,
    /// Last message passed to amend
    pub amended_message: Option<String>,
    /// `git worktree list`
    pub worktrees: Vec<WorktreeBinding>,

    /// Graphite metadata
    pub branches: HashMap<String, BranchNode>,
    /// `gt` is authenticated
    pub gt_authenticated: bool,
    /// Output of `gt squash`
    pub squash_output: CommandOutput,
    /// Output of `gt submit`
    pub submit_output: CommandOutput,
    /// `gt submit` opens a PR for the current branch when none exists
    pub submit_opens_pr: bool,
    /// `gt restack` reports success without changing metadata
    pub restack_noop: bool,

    /// Error for `gh` auth, if unauthenticated
    pub gh_auth_error: Option<String>,
    /// PRs keyed by head branch
    pub prs: HashMap<String, PullRequestRef>,
    /// PR bodies set through metadata updates
    pub pr_bodies: HashMap<u64, String>,
    /// Scripted mergeability readings; the PR's own fields once drained
    pub merge_statuses: HashMap<u64, VecDeque<MergeStatus>>,
    /// PR lookups that still report nothing (eventual consistency)
    pub hidden_lookups: usize,
    /// Diff returned by the PR diff endpoint
    pub pr_diff: Option<String>,
    /// Next PR number handed out
    pub next_pr: u64,

    /// Operations that fail, keyed by call-log entry
    pub failures: HashSet<String>,
    /// Every mutating or observable call, in order
    pub calls: Vec<String>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            current_branch: None,
            dirty: false,
            commits_ahead: 1,
            local_conflict: false,
            diff: "diff --git a/src/lib.rs b/src/lib.rs\n+fn added() {}\n".to_string(),
            amended_message: None,
            worktrees: Vec::new(),
            branches: HashMap::new(),
            gt_authenticated: true,
            squash_output: succeeded(""),
            submit_output: succeeded("Pushed branch"),
            submit_opens_pr: false,
            restack_noop: false,
            gh_auth_error: None,
            prs: HashMap::new(),
            pr_bodies: HashMap::new(),
            merge_statuses: HashMap::new(),
            hidden_lookups: 0,
            pr_diff: None,
            next_pr: 100,
            failures: HashSet::new(),
            calls: Vec::new(),
        }
    }
}

/// Successful command output
pub fn succeeded(stdout: &str) -> CommandOutput {
    CommandOutput {
        success: true,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// Failed command output
pub fn failed(stderr: &str) -> CommandOutput {
    CommandOutput {
        success: false,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

impl World {
    /// Record `call`, failing if it was marked to fail
    pub fn record(&mut self, call: String) -> Result<()> {
        let fails = self.failures.contains(&call);
        self.calls.push(call.clone());
        if fails {
            return Err(Error::Internal(format!("injected failure: {call}")));
        }
        Ok(())
    }

    /// Make the call-log entry `call` fail
    pub fn fail_on(&mut self, call: &str) {
        self.failures.insert(call.to_string());
    }

    pub fn pr_by_number(&self, number: u64) -> Option<&PullRequestRef> {
        self.prs.values().find(|pr| pr.number == number)
    }

    pub fn pr_by_number_mut(&mut self, number: u64) -> Option<&mut PullRequestRef> {
        self.prs.values_mut().find(|pr| pr.number == number)
    }

    /// Bind `branch` to the worktree at `path`
    pub fn set_worktree_branch(&mut self, path: &Path, branch: &str) {
        if let Some(binding) = self.worktrees.iter_mut().find(|w| w.path == path) {
            binding.branch = Some(branch.to_string());
        }
    }

    /// What `gt sync` + `gt restack` do to the metadata: branches whose PR
    /// merged are deleted and their children move onto the merged branch's
    /// parent.
    pub fn restack(&mut self) {
        if self.restack_noop {
            return;
        }
        let merged: Vec<String> = self
            .prs
            .values()
            .filter(|pr| pr.state == PrState::Merged)
            .map(|pr| pr.head_branch.clone())
            .filter(|b| self.branches.contains_key(b))
            .collect();

        for name in merged {
            let Some(node) = self.branches.remove(&name) else {
                continue;
            };
            for child in self.branches.values_mut() {
                if child.parent.as_deref() == Some(name.as_str()) {
                    child.parent.clone_from(&node.parent);
                }
            }
        }
        self.rebuild_children();
    }

    /// Recompute children lists from parent links, sorted by name
    pub fn rebuild_children(&mut self) {
        let links: Vec<(String, String)> = self
            .branches
            .values()
            .filter_map(|n| n.parent.clone().map(|p| (p, n.name.clone())))
            .collect();
        for node in self.branches.values_mut() {
            node.children.clear();
        }
        for (parent, child) in links {
            if let Some(node) = self.branches.get_mut(&parent) {
                node.children.push(child);
            }
        }
        for node in self.branches.values_mut() {
            node.children.sort();
        }
    }
}
