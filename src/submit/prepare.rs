//! Prepare phase: everything before the commit message exists

use crate::classify::{SquashFailure, classify_squash};
use crate::progress::Phase;
use crate::stack::StackView;
use crate::submit::metadata::PLACEHOLDER_COMMIT_MESSAGE;
use crate::submit::outcome::{PhaseError, PreAnalysisErrorKind as Kind, PreAnalysisResult};
use crate::submit::SubmitContext;
use crate::types::{MergeStateStatus, MergeStatus, Mergeable, PrState, PullRequestRef};
use tracing::{debug, warn};

type PrepareResult<T> = Result<T, PhaseError<Kind>>;

/// Run the prepare phase.
///
/// Fails fast on missing auth before touching the working tree. Uncommitted
/// changes are committed with a placeholder message. Two or more commits
/// ahead of the parent are squashed into one.
pub async fn execute_pre_analysis(ctx: &SubmitContext<'_>) -> PrepareResult<PreAnalysisResult> {
    let cwd = ctx.worktree;

    ctx.progress.on_phase(Phase::Authenticating).await;
    check_auth(ctx).await?;

    ctx.progress.on_phase(Phase::Preparing).await;
    let had_uncommitted_changes = commit_stray_changes(ctx).await?;

    let branch = ctx
        .git
        .current_branch(cwd)
        .await
        .map_err(|e| PhaseError::new(Kind::NoBranch, e.to_string()))?
        .ok_or_else(|| {
            PhaseError::new(
                Kind::NoBranch,
                "HEAD is detached. Check out the branch to submit",
            )
        })?;

    let parent = resolve_parent(ctx, &branch).await?;
    debug!(%branch, %parent, "resolved branch");

    let existing_pr = check_conflicts(ctx, &branch, &parent).await?;

    let commit_count = ctx
        .git
        .count_commits_ahead(cwd, &parent)
        .await
        .map_err(|e| {
            PhaseError::new(Kind::NoCommits, format!("could not count commits: {e}"))
                .with_detail("branch", branch.as_str())
                .with_detail("parent", parent.as_str())
        })?;
    if commit_count == 0 {
        return Err(PhaseError::new(
            Kind::NoCommits,
            format!("'{branch}' has no commits ahead of '{parent}'"),
        )
        .with_detail("branch", branch.as_str())
        .with_detail("parent", parent.as_str()));
    }

    let squashed = if commit_count >= 2 {
        squash(ctx, &branch, commit_count).await?;
        true
    } else {
        false
    };

    let message = if squashed {
        format!("Squashed {commit_count} commits on '{branch}'")
    } else {
        format!("'{branch}' has a single commit")
    };

    Ok(PreAnalysisResult {
        branch_name: branch,
        parent_branch: parent,
        commit_count,
        squashed,
        had_uncommitted_changes,
        existing_pr_number: existing_pr.map(|pr| pr.number),
        message,
    })
}

async fn check_auth(ctx: &SubmitContext<'_>) -> PrepareResult<()> {
    if let Err(e) = ctx.stack_tool.check_auth(ctx.worktree).await {
        return Err(PhaseError::new(
            Kind::GtNotAuthenticated,
            "Graphite is not authenticated. Run `gt auth --token <token>`",
        )
        .with_detail("error", e.to_string()));
    }
    if let Err(e) = ctx.platform.check_auth().await {
        return Err(PhaseError::new(
            Kind::GhNotAuthenticated,
            "GitHub is not authenticated. Run `gh auth login` or set GITHUB_TOKEN",
        )
        .with_detail("error", e.to_string()));
    }
    Ok(())
}

async fn commit_stray_changes(ctx: &SubmitContext<'_>) -> PrepareResult<bool> {
    let cwd = ctx.worktree;
    let commit_failed = |e: crate::error::Error| PhaseError::new(Kind::CommitFailed, e.to_string());

    if !ctx.git.has_uncommitted_changes(cwd).await.map_err(commit_failed)? {
        return Ok(false);
    }
    ctx.progress
        .on_message("Committing uncommitted changes")
        .await;
    ctx.git.stage_all(cwd).await.map_err(commit_failed)?;
    ctx.git
        .commit(cwd, PLACEHOLDER_COMMIT_MESSAGE)
        .await
        .map_err(commit_failed)?;
    Ok(true)
}

async fn resolve_parent(ctx: &SubmitContext<'_>, branch: &str) -> PrepareResult<String> {
    let no_parent = |message: String| {
        PhaseError::new(Kind::NoParent, message).with_detail("branch", branch)
    };

    let stack = StackView::load(ctx.stack_tool, ctx.worktree)
        .await
        .map_err(|e| no_parent(format!("could not read stack metadata: {e}")))?;

    if !stack.is_tracked(branch) {
        return Err(no_parent(format!(
            "'{branch}' is not tracked by Graphite. Run `gt track`"
        )));
    }
    stack
        .get_parent(branch)
        .map(ToString::to_string)
        .ok_or_else(|| no_parent(format!("'{branch}' has no parent branch")))
}

/// Conflict pre-check. Returns the branch's open PR, if any.
///
/// With an open PR, GitHub's view decides; `UNKNOWN` proceeds with a warning.
/// Without one, a local merge-tree dry run against the parent decides.
async fn check_conflicts(
    ctx: &SubmitContext<'_>,
    branch: &str,
    parent: &str,
) -> PrepareResult<Option<PullRequestRef>> {
    let conflict = |source: &str| {
        PhaseError::new(
            Kind::PrHasConflicts,
            format!("'{branch}' conflicts with '{parent}'. Rebase with `gt restack` and resolve"),
        )
        .with_detail("branch", branch)
        .with_detail("parent", parent)
        .with_detail("detected_by", source)
    };

    let open_pr = match ctx.platform.find_pr_for_branch(branch).await {
        Ok(pr) => pr.filter(|pr| pr.state == PrState::Open),
        Err(e) => {
            warn!(branch, error = %e, "PR lookup failed, using local conflict check");
            None
        }
    };

    if let Some(pr) = open_pr {
        // PR listings omit mergeability; only the single-PR read carries it
        let status = match ctx.platform.get_merge_status(pr.number).await {
            Ok(status) => status,
            Err(e) => {
                warn!(branch, pr = pr.number, error = %e, "mergeability read failed");
                MergeStatus {
                    mergeable: Mergeable::Unknown,
                    merge_state_status: MergeStateStatus::Unknown,
                }
            }
        };
        if status.mergeable == Mergeable::Conflicting
            || status.merge_state_status == MergeStateStatus::Dirty
        {
            return Err(conflict("github").with_detail("pr_number", pr.number));
        }
        if status.mergeable == Mergeable::Unknown {
            ctx.progress
                .on_warning(&format!(
                    "GitHub has not computed mergeability for PR #{} yet, proceeding",
                    pr.number
                ))
                .await;
        }
        return Ok(Some(pr));
    }

    match ctx.git.has_merge_conflicts(ctx.worktree, parent, branch).await {
        Ok(true) => Err(conflict("merge-tree")),
        Ok(false) => Ok(None),
        Err(e) => {
            warn!(branch, error = %e, "local conflict check failed");
            ctx.progress
                .on_warning(&format!("Could not check for conflicts locally: {e}"))
                .await;
            Ok(None)
        }
    }
}

async fn squash(ctx: &SubmitContext<'_>, branch: &str, commit_count: usize) -> PrepareResult<()> {
    ctx.progress
        .on_message(&format!("Squashing {commit_count} commits"))
        .await;

    let output = ctx
        .stack_tool
        .squash(ctx.worktree)
        .await
        .map_err(|e| {
            PhaseError::new(Kind::SquashFailed, e.to_string()).with_detail("branch", branch)
        })?;
    if output.success {
        return Ok(());
    }

    let (kind, message) = match classify_squash(&output) {
        SquashFailure::Conflict => (
            Kind::SquashConflict,
            format!("Squashing '{branch}' hit a conflict. Resolve it and retry"),
        ),
        SquashFailure::Generic => (Kind::SquashFailed, format!("Squashing '{branch}' failed")),
    };
    Err(PhaseError::new(kind, message)
        .with_detail("branch", branch)
        .with_detail("output", output.combined().trim()))
}
