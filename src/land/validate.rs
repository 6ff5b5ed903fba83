//! Landing preconditions, checked once before any mutation

use crate::land::plan::{LandingPlan, build_landing_plan, find_worktree_conflicts};
use crate::land::{LandContext, LandErrorKind, LandingFailure};
use crate::progress::Phase;
use crate::stack::StackView;
use crate::worktree::WorktreeRegistry;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

/// Validate preconditions and build the landing plan.
///
/// Order: Graphite enabled, on a branch, clean tree, not on trunk, tracked,
/// every plan branch has an open PR, and no plan branch is checked out in
/// another worktree.
pub async fn prepare_landing(ctx: &LandContext<'_>) -> Result<LandingPlan, LandingFailure> {
    ctx.progress.on_phase(Phase::Validating).await;

    if !ctx.graphite_enabled {
        return Err(LandingFailure::new(
            LandErrorKind::GraphiteDisabled,
            "Graphite integration is disabled. Set `[graphite] enabled = true`",
        ));
    }

    let branch = ctx
        .git
        .current_branch(ctx.worktree)
        .await
        .map_err(|e| LandingFailure::new(LandErrorKind::DetachedHead, e.to_string()))?
        .ok_or_else(|| {
            LandingFailure::new(
                LandErrorKind::DetachedHead,
                "HEAD is detached. Check out the top branch of the stack to land",
            )
        })?;

    let dirty = ctx
        .git
        .has_uncommitted_changes(ctx.worktree)
        .await
        .map_err(|e| LandingFailure::new(LandErrorKind::UncommittedChanges, e.to_string()))?;
    if dirty {
        return Err(LandingFailure::new(
            LandErrorKind::UncommittedChanges,
            "The working tree has uncommitted changes. Commit or stash them first",
        ));
    }

    let stack = StackView::load(ctx.stack_tool, ctx.worktree)
        .await
        .map_err(|e| LandingFailure::new(LandErrorKind::StackIntegrity, e.to_string()))?;

    if stack.is_trunk(&branch) {
        return Err(LandingFailure::new(
            LandErrorKind::OnTrunk,
            format!("'{branch}' is trunk. Check out the top branch of the stack to land"),
        ));
    }

    let chain = stack
        .get_stack(&branch, false)
        .map_err(|e| {
            LandingFailure::new(LandErrorKind::StackIntegrity, e.to_string()).on_branch(&branch)
        })?
        .ok_or_else(|| {
            LandingFailure::new(
                LandErrorKind::UntrackedBranch,
                format!("'{branch}' is not tracked by Graphite. Run `gt track`"),
            )
            .on_branch(&branch)
        })?;
    debug!(?chain, "stack to land");

    let mut prs = HashMap::new();
    for name in chain.iter().skip(1) {
        let pr = ctx.platform.find_pr_for_branch(name).await.map_err(|e| {
            LandingFailure::new(
                LandErrorKind::NoPullRequest,
                format!("could not look up the PR: {e}"),
            )
            .on_branch(name)
        })?;
        prs.insert(name.clone(), pr);
    }
    let plan = build_landing_plan(&chain, &prs)?;

    let registry = WorktreeRegistry::load(ctx.git, ctx.worktree)
        .await
        .map_err(|e| LandingFailure::new(LandErrorKind::WorktreeConflict, e.to_string()))?;
    let conflicts = find_worktree_conflicts(&plan, &registry, ctx.worktree);
    if !conflicts.is_empty() {
        let mut message = String::from(
            "Stack branches are checked out in other worktrees. \
             Consolidate worktrees before landing:",
        );
        for (branch, path) in &conflicts {
            let _ = write!(message, "\n  {branch} -> {}", path.display());
        }
        return Err(LandingFailure::new(LandErrorKind::WorktreeConflict, message));
    }

    Ok(plan)
}
