//! Mock collaborators over a shared [`World`]
//!
//! These manually implement the collaborator traits rather than using a
//! mocking crate, so one scripted state can back git, Graphite, and GitHub at
//! once.

#![allow(dead_code)]

use super::fixtures::make_pr;
use super::world::Shared;
use async_trait::async_trait;
use stackpilot::ai::{CommitMessage, CommitMessageGenerator, GenerationRequest};
use stackpilot::error::{Error, Result};
use stackpilot::git::GitOps;
use stackpilot::graphite::StackTool;
use stackpilot::platform::PlatformService;
use stackpilot::progress::{Phase, ProgressCallback, PushStatus};
use stackpilot::retry::Clock;
use stackpilot::types::{
    BranchNode, CommandOutput, GitRemote, MergeMethod, MergeResult, MergeStateStatus, MergeStatus,
    Mergeable, PlatformConfig, PrState, PullRequestRef, WorktreeBinding,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Fake git over the shared world
pub struct MockGit(pub Shared);

#[async_trait]
impl GitOps for MockGit {
    async fn repository_root(&self, cwd: &Path) -> Result<PathBuf> {
        Ok(cwd.to_path_buf())
    }

    async fn current_branch(&self, _cwd: &Path) -> Result<Option<String>> {
        Ok(self.0.lock().current_branch.clone())
    }

    async fn has_uncommitted_changes(&self, _cwd: &Path) -> Result<bool> {
        Ok(self.0.lock().dirty)
    }

    async fn stage_all(&self, _cwd: &Path) -> Result<()> {
        self.0.lock().record("git add".to_string())
    }

    async fn commit(&self, _cwd: &Path, message: &str) -> Result<()> {
        let mut world = self.0.lock();
        world.record(format!("git commit {message}"))?;
        world.dirty = false;
        world.commits_ahead += 1;
        Ok(())
    }

    async fn amend_commit_message(&self, _cwd: &Path, message: &str) -> Result<()> {
        let mut world = self.0.lock();
        world.record("git amend".to_string())?;
        world.amended_message = Some(message.to_string());
        Ok(())
    }

    async fn count_commits_ahead(&self, _cwd: &Path, _base: &str) -> Result<usize> {
        Ok(self.0.lock().commits_ahead)
    }

    async fn has_merge_conflicts(&self, _cwd: &Path, base: &str, head: &str) -> Result<bool> {
        let mut world = self.0.lock();
        world.record(format!("git merge-tree {base} {head}"))?;
        Ok(world.local_conflict)
    }

    async fn diff_against(&self, _cwd: &Path, base: &str) -> Result<String> {
        let mut world = self.0.lock();
        world.record(format!("git diff {base}"))?;
        Ok(world.diff.clone())
    }

    async fn list_worktrees(&self, _cwd: &Path) -> Result<Vec<WorktreeBinding>> {
        Ok(self.0.lock().worktrees.clone())
    }

    async fn checkout(&self, cwd: &Path, branch: &str) -> Result<()> {
        let mut world = self.0.lock();
        world.record(format!("checkout {branch} @ {}", cwd.display()))?;
        world.set_worktree_branch(cwd, branch);
        world.current_branch = Some(branch.to_string());
        Ok(())
    }

    async fn fetch(&self, _cwd: &Path, remote: &str, branch: &str) -> Result<()> {
        self.0.lock().record(format!("fetch {remote} {branch}"))
    }

    async fn pull_ff_only(&self, cwd: &Path, remote: &str, branch: &str) -> Result<()> {
        self.0
            .lock()
            .record(format!("pull {remote} {branch} @ {}", cwd.display()))
    }

    async fn remotes(&self, _cwd: &Path) -> Result<Vec<GitRemote>> {
        Ok(vec![GitRemote {
            name: "origin".to_string(),
            url: "git@github.com:acme/widgets.git".to_string(),
        }])
    }
}

/// Fake `gt` over the shared world
pub struct MockStackTool(pub Shared);

#[async_trait]
impl StackTool for MockStackTool {
    async fn check_auth(&self, _cwd: &Path) -> Result<()> {
        let mut world = self.0.lock();
        world.record("gt auth".to_string())?;
        if world.gt_authenticated {
            Ok(())
        } else {
            Err(Error::Auth("no authToken in Graphite user config".to_string()))
        }
    }

    async fn all_branches(&self, _cwd: &Path) -> Result<HashMap<String, BranchNode>> {
        Ok(self.0.lock().branches.clone())
    }

    async fn squash(&self, _cwd: &Path) -> Result<CommandOutput> {
        let mut world = self.0.lock();
        world.record("gt squash".to_string())?;
        let output = world.squash_output.clone();
        if output.success {
            world.commits_ahead = 1;
        }
        Ok(output)
    }

    async fn restack(&self, _cwd: &Path) -> Result<()> {
        let mut world = self.0.lock();
        world.record("gt restack".to_string())?;
        world.restack();
        Ok(())
    }

    async fn submit_stack(
        &self,
        _cwd: &Path,
        publish: bool,
        restack: bool,
        _timeout: Duration,
    ) -> Result<CommandOutput> {
        let mut world = self.0.lock();
        world.record(format!("gt submit publish={publish} restack={restack}"))?;
        let output = world.submit_output.clone();
        if output.success && world.submit_opens_pr {
            if let Some(branch) = world.current_branch.clone() {
                if !world.prs.contains_key(&branch) {
                    let parent = world
                        .branches
                        .get(&branch)
                        .and_then(|n| n.parent.clone())
                        .unwrap_or_else(|| "main".to_string());
                    let number = world.next_pr;
                    world.next_pr += 1;
                    world.prs.insert(branch.clone(), make_pr(number, &branch, &parent));
                }
            }
        }
        Ok(output)
    }

    async fn submit_branch(&self, cwd: &Path, branch: &str) -> Result<()> {
        self.0
            .lock()
            .record(format!("gt push {branch} @ {}", cwd.display()))
    }
}

/// Fake GitHub over the shared world
pub struct MockPlatformService {
    world: Shared,
    config: PlatformConfig,
}

impl MockPlatformService {
    pub fn new(world: Shared, config: PlatformConfig) -> Self {
        Self { world, config }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn check_auth(&self) -> Result<String> {
        match &self.world.lock().gh_auth_error {
            Some(e) => Err(Error::Auth(e.clone())),
            None => Ok("octocat".to_string()),
        }
    }

    async fn find_pr_for_branch(&self, branch: &str) -> Result<Option<PullRequestRef>> {
        let mut world = self.world.lock();
        world.record(format!("find_pr {branch}"))?;
        if world.hidden_lookups > 0 {
            world.hidden_lookups -= 1;
            return Ok(None);
        }
        // Like GitHub's list endpoint, lookups carry no mergeability
        Ok(world.prs.get(branch).map(|pr| PullRequestRef {
            mergeable: Mergeable::Unknown,
            merge_state_status: MergeStateStatus::Unknown,
            ..pr.clone()
        }))
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestRef> {
        self.world
            .lock()
            .pr_by_number(pr_number)
            .cloned()
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))
    }

    async fn get_pr_base(&self, pr_number: u64) -> Result<String> {
        let mut world = self.world.lock();
        world.record(format!("get_base #{pr_number}"))?;
        world
            .pr_by_number(pr_number)
            .map(|pr| pr.base_branch.clone())
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<()> {
        let mut world = self.world.lock();
        world.record(format!("update_base #{pr_number} {new_base}"))?;
        let pr = world
            .pr_by_number_mut(pr_number)
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))?;
        pr.base_branch = new_base.to_string();
        Ok(())
    }

    async fn get_merge_status(&self, pr_number: u64) -> Result<MergeStatus> {
        let mut world = self.world.lock();
        world.record(format!("merge_status #{pr_number}"))?;
        if let Some(status) = world
            .merge_statuses
            .get_mut(&pr_number)
            .and_then(std::collections::VecDeque::pop_front)
        {
            return Ok(status);
        }
        world
            .pr_by_number(pr_number)
            .map(|pr| MergeStatus {
                mergeable: pr.mergeable,
                merge_state_status: pr.merge_state_status,
            })
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))
    }

    async fn update_pr_metadata(&self, pr_number: u64, title: &str, body: &str) -> Result<()> {
        let mut world = self.world.lock();
        world.record(format!("update_pr #{pr_number}"))?;
        let pr = world
            .pr_by_number_mut(pr_number)
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))?;
        pr.title = title.to_string();
        world.pr_bodies.insert(pr_number, body.to_string());
        Ok(())
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        let mut world = self.world.lock();
        world.record(format!("merge #{pr_number} {method}"))?;
        let pr = world
            .pr_by_number_mut(pr_number)
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))?;
        pr.state = PrState::Merged;
        Ok(MergeResult {
            merged: true,
            sha: Some(format!("merge_{pr_number}")),
            message: None,
        })
    }

    async fn get_pr_diff(&self, pr_number: u64) -> Result<String> {
        let mut world = self.world.lock();
        world.record(format!("pr_diff #{pr_number}"))?;
        world
            .pr_diff
            .clone()
            .ok_or_else(|| Error::Platform("diff unavailable".to_string()))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

/// Records every sleep instead of waiting
#[derive(Default)]
pub struct FakeClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Records progress events as strings
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("warning: ").map(ToString::to_string))
            .collect()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_phase(&self, phase: Phase) {
        self.push(format!("phase: {phase:?}"));
    }

    async fn on_branch_push(&self, branch: &str, status: PushStatus) {
        self.push(format!("push {branch}: {status}"));
    }

    async fn on_pr_merged(&self, branch: &str, pr_number: u64) {
        self.push(format!("merged {branch} #{pr_number}"));
    }

    async fn on_pr_updated(&self, branch: &str, pr: &PullRequestRef) {
        self.push(format!("updated {branch} #{}", pr.number));
    }

    async fn on_warning(&self, message: &str) {
        self.push(format!("warning: {message}"));
    }

    async fn on_message(&self, message: &str) {
        self.push(format!("message: {message}"));
    }
}

/// Commit message generator returning a fixed result
pub struct StubGenerator(pub std::result::Result<CommitMessage, String>);

#[async_trait]
impl CommitMessageGenerator for StubGenerator {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<CommitMessage> {
        self.0.clone().map_err(Error::Generation)
    }
}
