//! Landing execution - effectful operations
//!
//! Takes a [`LandingPlan`] and lands it one branch at a time. Every step
//! re-reads the state it depends on right before acting.

use crate::land::plan::{LandingPlan, LandingPlanEntry, MergeGate, merge_gate};
use crate::land::{LandContext, LandErrorKind, LandOptions, LandingFailure, LandingOutcome};
use crate::progress::{Phase, PushStatus};
use crate::retry::{Attempt, RetryPolicy, with_retry};
use crate::stack::StackView;
use crate::types::{MergeMethod, MergeStatus, PrState};
use crate::worktree::WorktreeRegistry;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

type StepResult<T = ()> = Result<T, LandingFailure>;

/// Land every entry of `plan`, bottom first.
///
/// Stops at the first failure; branches merged before it are listed in the
/// outcome.
pub async fn execute_landing(
    ctx: &LandContext<'_>,
    plan: &LandingPlan,
    options: &LandOptions,
) -> LandingOutcome {
    let mut outcome = LandingOutcome::default();

    for (index, entry) in plan.entries.iter().enumerate() {
        ctx.progress.on_phase(Phase::Landing).await;
        ctx.progress
            .on_message(&format!(
                "[{}/{}] {entry}",
                index + 1,
                plan.entries.len()
            ))
            .await;

        match land_one(ctx, plan, index, entry, options).await {
            Ok(()) => outcome.merged.push(entry.branch.clone()),
            Err(LandFailureAt::BeforeMerge(failure)) => {
                outcome.failure = Some(failure);
                return outcome;
            }
            Err(LandFailureAt::AfterMerge(failure)) => {
                outcome.merged.push(entry.branch.clone());
                outcome.failure = Some(failure);
                return outcome;
            }
        }
    }

    ctx.progress.on_phase(Phase::Complete).await;
    outcome
}

/// Failure of one branch's landing, split by whether its PR got merged
enum LandFailureAt {
    BeforeMerge(LandingFailure),
    AfterMerge(LandingFailure),
}

async fn land_one(
    ctx: &LandContext<'_>,
    plan: &LandingPlan,
    index: usize,
    entry: &LandingPlanEntry,
    options: &LandOptions,
) -> Result<(), LandFailureAt> {
    let branch = entry.branch.as_str();
    let trunk = plan.trunk.as_str();

    checkout(ctx, branch)
        .await
        .map_err(LandFailureAt::BeforeMerge)?;
    verify_parent_is_trunk(ctx, branch, trunk)
        .await
        .map_err(LandFailureAt::BeforeMerge)?;
    ensure_pr_base(ctx, branch, entry.pr_number, trunk)
        .await
        .map_err(LandFailureAt::BeforeMerge)?;
    wait_until_mergeable(ctx, branch, entry.pr_number)
        .await
        .map_err(LandFailureAt::BeforeMerge)?;
    merge(ctx, entry).await.map_err(LandFailureAt::BeforeMerge)?;

    // Upstack as recorded before restack reparents it
    let upstack = StackView::load(ctx.stack_tool, ctx.worktree)
        .await
        .map(|stack| stack.descendants(branch))
        .map_err(|e| {
            LandFailureAt::AfterMerge(
                LandingFailure::new(LandErrorKind::StackIntegrity, e.to_string()).on_branch(branch),
            )
        })?;

    sync_trunk(ctx, trunk)
        .await
        .map_err(LandFailureAt::AfterMerge)?;

    let remaining: Vec<String> = plan
        .remaining_after(index)
        .iter()
        .map(|e| e.branch.clone())
        .collect();
    let targets = if options.down { remaining } else { upstack };
    if !targets.is_empty() {
        propagate(ctx, branch, trunk, &targets)
            .await
            .map_err(LandFailureAt::AfterMerge)?;
    }
    Ok(())
}

/// Step 1: check out the branch in this worktree unless it already is
async fn checkout(ctx: &LandContext<'_>, branch: &str) -> StepResult {
    let registry = load_registry(ctx, LandErrorKind::CheckoutFailed).await?;
    if registry.find_worktree_for_branch(branch) == Some(ctx.worktree) {
        debug!(branch, "already checked out");
        return Ok(());
    }
    ctx.git.checkout(ctx.worktree, branch).await.map_err(|e| {
        LandingFailure::new(LandErrorKind::CheckoutFailed, e.to_string()).on_branch(branch)
    })
}

/// Step 2: the parent must be trunk right now
async fn verify_parent_is_trunk(ctx: &LandContext<'_>, branch: &str, trunk: &str) -> StepResult {
    let integrity = |message: String| {
        LandingFailure::new(LandErrorKind::StackIntegrity, message).on_branch(branch)
    };
    let stack = StackView::load(ctx.stack_tool, ctx.worktree)
        .await
        .map_err(|e| integrity(e.to_string()))?;

    match stack.get_parent(branch) {
        Some(parent) if parent == trunk => Ok(()),
        Some(parent) => Err(integrity(format!(
            "stack integrity broken: parent of '{branch}' is '{parent}', expected '{trunk}'. \
             An earlier restack did not complete; run `gt restack` and check the stack"
        ))),
        None => Err(integrity(format!(
            "stack integrity broken: '{branch}' has no parent in Graphite's metadata"
        ))),
    }
}

/// Step 3: point the PR at `expected_base` before merging
async fn ensure_pr_base(
    ctx: &LandContext<'_>,
    branch: &str,
    pr_number: u64,
    expected_base: &str,
) -> StepResult {
    let platform = ctx.platform;
    let progress = ctx.progress;
    with_retry(
        &RetryPolicy::base_update(),
        ctx.clock,
        ctx.progress,
        &format!("Verifying base of PR #{pr_number}"),
        |_| async move {
            let current = platform
                .get_pr_base(pr_number)
                .await
                .map_err(|e| Attempt::Transient(e.to_string()))?;
            if current == expected_base {
                return Ok(());
            }
            progress
                .on_message(&format!(
                    "PR #{pr_number} targets '{current}', retargeting to '{expected_base}'"
                ))
                .await;
            platform
                .update_pr_base(pr_number, expected_base)
                .await
                .map_err(|e| Attempt::Transient(e.to_string()))?;
            let updated = platform
                .get_pr_base(pr_number)
                .await
                .map_err(|e| Attempt::Transient(e.to_string()))?;
            if updated == expected_base {
                Ok(())
            } else {
                Err(Attempt::Transient(format!(
                    "base still '{updated}' after update"
                )))
            }
        },
    )
    .await
    .map_err(|e: String| {
        LandingFailure::new(
            LandErrorKind::BaseUpdateFailed,
            format!("could not set the base of PR #{pr_number} to '{expected_base}': {e}"),
        )
        .on_branch(branch)
    })
}

enum GateError {
    Pending(MergeStatus),
    Host(String),
    Blocked(MergeStatus, &'static str),
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(status) => write!(
                f,
                "mergeability still being computed ({:?}/{})",
                status.mergeable, status.merge_state_status
            ),
            Self::Host(e) => write!(f, "{e}"),
            Self::Blocked(status, remediation) => {
                write!(f, "{}: {remediation}", status.merge_state_status)
            }
        }
    }
}

/// Step 4: retry while GitHub reports UNKNOWN; any other blocker is fatal
async fn wait_until_mergeable(ctx: &LandContext<'_>, branch: &str, pr_number: u64) -> StepResult {
    let platform = ctx.platform;
    let gate = with_retry(
        &RetryPolicy::mergeability(),
        ctx.clock,
        ctx.progress,
        &format!("Checking mergeability of PR #{pr_number}"),
        |_| async move {
            let status = platform
                .get_merge_status(pr_number)
                .await
                .map_err(|e| Attempt::Transient(GateError::Host(e.to_string())))?;
            match merge_gate(status) {
                MergeGate::Ready => Ok(()),
                MergeGate::Pending => Err(Attempt::Transient(GateError::Pending(status))),
                MergeGate::Blocked(remediation) => {
                    Err(Attempt::Permanent(GateError::Blocked(status, remediation)))
                }
            }
        },
    )
    .await;

    gate.map_err(|e| {
        let (kind, message) = match e {
            GateError::Blocked(..) => (
                LandErrorKind::MergeBlocked,
                format!("PR #{pr_number} cannot be merged: {e}"),
            ),
            GateError::Pending(_) => (
                LandErrorKind::MergeabilityUnknown,
                format!("PR #{pr_number} cannot be merged yet: {e}. Try again shortly"),
            ),
            GateError::Host(_) => (
                LandErrorKind::MergeabilityUnknown,
                format!("GitHub API error reading PR #{pr_number}: {e}"),
            ),
        };
        LandingFailure::new(kind, message).on_branch(branch)
    })
}

/// Step 5: squash-merge
async fn merge(ctx: &LandContext<'_>, entry: &LandingPlanEntry) -> StepResult {
    let failed = |message: String| {
        LandingFailure::new(LandErrorKind::MergeFailed, message).on_branch(&entry.branch)
    };
    let result = ctx
        .platform
        .merge_pr(entry.pr_number, MergeMethod::Squash)
        .await
        .map_err(|e| failed(e.to_string()))?;
    if !result.merged {
        return Err(failed(
            result
                .message
                .unwrap_or_else(|| format!("GitHub did not merge PR #{}", entry.pr_number)),
        ));
    }
    info!(branch = %entry.branch, pr = entry.pr_number, sha = ?result.sha, "merged");
    ctx.progress
        .on_pr_merged(&entry.branch, entry.pr_number)
        .await;
    Ok(())
}

/// Step 6: fast-forward trunk wherever it is checked out
async fn sync_trunk(ctx: &LandContext<'_>, trunk: &str) -> StepResult {
    ctx.progress.on_phase(Phase::SyncingTrunk).await;
    let failed = |message: String| {
        LandingFailure::new(LandErrorKind::TrunkSyncFailed, message).on_branch(trunk)
    };

    let registry = load_registry(ctx, LandErrorKind::TrunkSyncFailed).await?;
    ctx.git
        .fetch(ctx.worktree, ctx.remote, trunk)
        .await
        .map_err(|e| failed(e.to_string()))?;

    let dir = if let Some(path) = registry.find_worktree_for_branch(trunk) {
        path.to_path_buf()
    } else {
        let root = root_dir(ctx, &registry);
        ctx.git
            .checkout(&root, trunk)
            .await
            .map_err(|e| failed(e.to_string()))?;
        root
    };
    debug!(trunk, dir = %dir.display(), "pulling trunk");
    ctx.git
        .pull_ff_only(&dir, ctx.remote, trunk)
        .await
        .map_err(|e| failed(e.to_string()))
}

/// Step 7: restack, then force-push each target and correct its PR base
async fn propagate(
    ctx: &LandContext<'_>,
    landed: &str,
    trunk: &str,
    targets: &[String],
) -> StepResult {
    ctx.progress.on_phase(Phase::Propagating).await;

    ctx.stack_tool.restack(ctx.worktree).await.map_err(|e| {
        LandingFailure::new(
            LandErrorKind::RestackFailed,
            format!("restack after landing '{landed}' failed: {e}. Run `gt restack` and resolve"),
        )
        .on_branch(landed)
    })?;

    let stack = StackView::load(ctx.stack_tool, ctx.worktree)
        .await
        .map_err(|e| LandingFailure::new(LandErrorKind::StackIntegrity, e.to_string()))?;

    for branch in targets {
        let registry = load_registry(ctx, LandErrorKind::PushFailed).await?;
        let dir = registry.dir_for_branch(branch, &root_dir(ctx, &registry));

        ctx.progress.on_branch_push(branch, PushStatus::Started).await;
        if let Err(e) = ctx.stack_tool.submit_branch(&dir, branch).await {
            let message = e.to_string();
            ctx.progress
                .on_branch_push(branch, PushStatus::Failed(message.clone()))
                .await;
            return Err(LandingFailure::new(LandErrorKind::PushFailed, message).on_branch(branch));
        }
        ctx.progress.on_branch_push(branch, PushStatus::Success).await;

        let Some(expected) = stack.get_parent(branch) else {
            debug!(branch, "no parent after restack, skipping base check");
            continue;
        };
        update_pushed_base(ctx, branch, expected, trunk).await?;
    }
    Ok(())
}

/// After a force-push, retarget the branch's open PR if its base is stale.
///
/// A PR already targeting trunk stays there; the pre-merge guard checks it
/// again on the branch's own turn.
async fn update_pushed_base(
    ctx: &LandContext<'_>,
    branch: &str,
    expected: &str,
    trunk: &str,
) -> StepResult {
    let pr = ctx.platform.find_pr_for_branch(branch).await.map_err(|e| {
        LandingFailure::new(LandErrorKind::BaseUpdateFailed, e.to_string()).on_branch(branch)
    })?;
    let Some(pr) = pr.filter(|pr| pr.state == PrState::Open) else {
        debug!(branch, "no open PR, nothing to retarget");
        return Ok(());
    };
    if pr.base_branch == expected || pr.base_branch == trunk {
        return Ok(());
    }
    ensure_pr_base(ctx, branch, pr.number, expected).await?;
    let mut updated = pr;
    updated.base_branch = expected.to_string();
    ctx.progress.on_pr_updated(branch, &updated).await;
    Ok(())
}

async fn load_registry(ctx: &LandContext<'_>, kind: LandErrorKind) -> StepResult<WorktreeRegistry> {
    WorktreeRegistry::load(ctx.git, ctx.worktree)
        .await
        .map_err(|e| LandingFailure::new(kind, format!("could not list worktrees: {e}")))
}

fn root_dir(ctx: &LandContext<'_>, registry: &WorktreeRegistry) -> PathBuf {
    registry.root().unwrap_or(ctx.worktree).to_path_buf()
}
