//! Submit, preflight, finalize, and the one-shot flow

use crate::ai::{CommitMessage, CommitMessageGenerator, GenerationRequest, parse_commit_message};
use crate::classify::{SubmitFailure, classify_submit};
use crate::error::Error;
use crate::progress::{Phase, ProgressCallback};
use crate::retry::{Attempt, RetryPolicy, with_retry};
use crate::submit::metadata::{
    build_footer, compose_body, compose_commit_message, graphite_url, read_issue_reference,
};
use crate::submit::outcome::{
    FinalizeErrorKind, FinalizeResult, PhaseError, PostAnalysisErrorKind as Kind,
    PostAnalysisResult, PreflightResult, SubmitErrorKind,
};
use crate::submit::prepare::execute_pre_analysis;
use crate::submit::{SubmitContext, SubmitFlow};
use crate::types::{PrState, PullRequestRef};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

const PR_NOT_VISIBLE: &str = "Branch was pushed, but the PR did not become visible; \
                              PR metadata could not be finalized";

/// Run the submit phase with a caller-supplied commit message.
///
/// The first line of `commit_message` becomes the PR title, the rest its
/// body.
pub async fn execute_post_analysis(
    ctx: &SubmitContext<'_>,
    commit_message: &str,
) -> Result<PostAnalysisResult, PhaseError<Kind>> {
    let message = parse_commit_message(commit_message)
        .ok_or_else(|| PhaseError::new(Kind::AmendFailed, "commit message is empty"))?;
    let branch = current_branch(ctx)
        .await
        .map_err(|e| PhaseError::new(Kind::SubmitFailed, e))?;
    publish(ctx, SubmitFlow::TwoPhase, &branch, Some(&message)).await
}

/// Prepare, push, and write the branch diff for a later [`execute_finalize`].
///
/// The diff comes from the PR when it is visible, otherwise from git, and is
/// written to `<scratch>/stackpilot-<session_id>.diff`.
pub async fn execute_preflight(
    ctx: &SubmitContext<'_>,
    session_id: &str,
) -> Result<PreflightResult, PhaseError<SubmitErrorKind>> {
    let diff_path = diff_file_path(ctx, session_id)?;

    let prepared = execute_pre_analysis(ctx)
        .await
        .map_err(PhaseError::widen::<SubmitErrorKind>)?;
    let published = publish(ctx, SubmitFlow::ThreePhase, &prepared.branch_name, None)
        .await
        .map_err(PhaseError::widen::<SubmitErrorKind>)?;

    let diff = match published.pr_number {
        Some(number) => match ctx.platform.get_pr_diff(number).await {
            Ok(diff) => Ok(diff),
            Err(e) => {
                warn!(pr_number = number, error = %e, "PR diff unavailable, using local diff");
                ctx.git
                    .diff_against(ctx.worktree, &prepared.parent_branch)
                    .await
            }
        },
        None => {
            ctx.git
                .diff_against(ctx.worktree, &prepared.parent_branch)
                .await
        }
    }
    .map_err(|e| PhaseError::new(SubmitErrorKind::DiffFailed, e.to_string()))?;

    tokio::fs::write(&diff_path, &diff).await.map_err(|e| {
        PhaseError::new(
            SubmitErrorKind::DiffFailed,
            format!("could not write {}: {e}", diff_path.display()),
        )
    })?;
    debug!(path = %diff_path.display(), bytes = diff.len(), "wrote diff");

    Ok(PreflightResult {
        branch_name: prepared.branch_name,
        parent_branch: prepared.parent_branch,
        commit_count: prepared.commit_count,
        squashed: prepared.squashed,
        had_uncommitted_changes: prepared.had_uncommitted_changes,
        pr_number: published.pr_number,
        pr_url: published.pr_url,
        graphite_url: published.graphite_url,
        issue_number: published.issue_number,
        diff_file: diff_path,
        message: published.message,
        warnings: published.warnings,
    })
}

/// Set the PR title and body, then amend the local commit to match.
///
/// Only the PR update can fail the phase; the amend is best effort.
pub async fn execute_finalize(
    ctx: &SubmitContext<'_>,
    pr_number: u64,
    title: &str,
    body: &str,
) -> Result<FinalizeResult, PhaseError<FinalizeErrorKind>> {
    ctx.progress.on_phase(Phase::Finalizing).await;
    let mut warnings = Vec::new();

    let branch = current_branch(ctx).await.ok();
    let issue_number = read_issue_reference(ctx.worktree)
        .await
        .map(|i| i.issue_number);
    let footer = build_footer(branch.as_deref(), issue_number);

    ctx.platform
        .update_pr_metadata(pr_number, title.trim(), &compose_body(&footer, body))
        .await
        .map_err(|e| {
            PhaseError::new(
                FinalizeErrorKind::PrUpdateFailed,
                format!("could not update PR #{pr_number}: {e}"),
            )
            .with_detail("pr_number", pr_number)
        })?;

    let commit_message = compose_commit_message(title, &footer, body);
    let amended = match ctx
        .git
        .amend_commit_message(ctx.worktree, &commit_message)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            let warning = format!("PR updated, but amending the local commit failed: {e}");
            ctx.progress.on_warning(&warning).await;
            warnings.push(warning);
            false
        }
    };

    ctx.progress.on_phase(Phase::Complete).await;
    Ok(FinalizeResult {
        pr_number,
        pr_title: title.trim().to_string(),
        graphite_url: graphite_url(ctx.platform.config(), pr_number),
        issue_number,
        amended,
        message: format!("Updated PR #{pr_number}"),
        warnings,
    })
}

/// Prepare, generate a message, and submit in one run.
///
/// A generator failure does not stop the push; the result then carries no
/// PR metadata and an `ai_generation_failed` warning.
pub async fn execute_submit(
    ctx: &SubmitContext<'_>,
    generator: &dyn CommitMessageGenerator,
) -> Result<PostAnalysisResult, PhaseError<SubmitErrorKind>> {
    let prepared = execute_pre_analysis(ctx)
        .await
        .map_err(PhaseError::widen::<SubmitErrorKind>)?;

    ctx.progress.on_message("Generating commit message").await;
    let generated = match ctx
        .git
        .diff_against(ctx.worktree, &prepared.parent_branch)
        .await
    {
        Ok(diff) => {
            generator
                .generate(GenerationRequest {
                    diff: &diff,
                    branch: &prepared.branch_name,
                    parent: &prepared.parent_branch,
                })
                .await
        }
        Err(e) => Err(Error::Generation(format!("could not read diff: {e}"))),
    };

    let (message, warning) = match generated {
        Ok(message) => (Some(message), None),
        Err(e) => {
            let warning = format!("ai_generation_failed: {e}");
            ctx.progress.on_warning(&warning).await;
            (None, Some(warning))
        }
    };

    let mut result = publish(
        ctx,
        SubmitFlow::OneShot,
        &prepared.branch_name,
        message.as_ref(),
    )
    .await
    .map_err(PhaseError::widen::<SubmitErrorKind>)?;
    result.warnings.extend(warning);
    Ok(result)
}

/// Shared push path of every flow: amend, submit, poll, update metadata
async fn publish(
    ctx: &SubmitContext<'_>,
    flow: SubmitFlow,
    branch: &str,
    message: Option<&CommitMessage>,
) -> Result<PostAnalysisResult, PhaseError<Kind>> {
    let issue_number = read_issue_reference(ctx.worktree)
        .await
        .map(|i| i.issue_number);
    let footer = build_footer(Some(branch), issue_number);

    if flow.amends_before_push() {
        if let Some(message) = message {
            let text = compose_commit_message(&message.title, &footer, &message.body);
            ctx.git
                .amend_commit_message(ctx.worktree, &text)
                .await
                .map_err(|e| {
                    PhaseError::new(Kind::AmendFailed, e.to_string()).with_detail("branch", branch)
                })?;
        }
    }

    submit_stack(ctx, branch).await?;

    ctx.progress.on_phase(Phase::WaitingForPr).await;
    let mut warnings = Vec::new();
    let Some(pr) = wait_for_pr(ctx, branch).await else {
        ctx.progress.on_warning(PR_NOT_VISIBLE).await;
        return Ok(PostAnalysisResult {
            branch_name: branch.to_string(),
            pr_number: None,
            pr_url: None,
            pr_title: None,
            graphite_url: None,
            issue_number,
            message: PR_NOT_VISIBLE.to_string(),
            warnings: vec![PR_NOT_VISIBLE.to_string()],
        });
    };

    let mut pr_title = None;
    if flow.amends_before_push() {
        if let Some(message) = message {
            ctx.progress.on_phase(Phase::Finalizing).await;
            let body = compose_body(&footer, &message.body);
            match ctx
                .platform
                .update_pr_metadata(pr.number, &message.title, &body)
                .await
            {
                Ok(()) => {
                    ctx.progress.on_pr_updated(branch, &pr).await;
                    pr_title = Some(message.title.clone());
                }
                Err(e) => {
                    let warning = format!(
                        "PR #{} exists, but updating its title/body failed: {e}",
                        pr.number
                    );
                    warn!(pr_number = pr.number, error = %e, "PR metadata update failed");
                    ctx.progress.on_warning(&warning).await;
                    warnings.push(warning);
                }
            }
        }
    }

    ctx.progress.on_phase(Phase::Complete).await;
    Ok(PostAnalysisResult {
        branch_name: branch.to_string(),
        pr_number: Some(pr.number),
        pr_url: Some(pr.url.clone()),
        pr_title,
        graphite_url: Some(graphite_url(ctx.platform.config(), pr.number)),
        issue_number,
        message: format!("Submitted '{branch}' as PR #{}", pr.number),
        warnings,
    })
}

async fn submit_stack(ctx: &SubmitContext<'_>, branch: &str) -> Result<(), PhaseError<Kind>> {
    ctx.progress.on_phase(Phase::Submitting).await;

    let submitted = with_ticker(
        ctx.stack_tool.submit_stack(
            ctx.worktree,
            true,
            true,
            ctx.options.submit_timeout,
        ),
        ctx.options.ticker_interval,
        ctx.progress,
    )
    .await;

    let failure = match submitted {
        Ok(output) => classify_submit(&output).map(|class| (class, output.combined())),
        Err(Error::CommandTimeout { seconds, .. }) => Some((
            SubmitFailure::Timeout,
            format!("gt submit timed out after {seconds}s"),
        )),
        Err(e) => Some((SubmitFailure::Generic, e.to_string())),
    };

    let Some((class, output)) = failure else {
        return Ok(());
    };
    let (kind, message) = match class {
        SubmitFailure::Conflict => (
            Kind::SubmitConflict,
            "Restack hit a conflict. Resolve it with `gt restack` and retry".to_string(),
        ),
        SubmitFailure::MergedParent => (
            Kind::SubmitMergedParent,
            "The parent branch was merged but its commits are not in trunk yet. Run `gt sync`"
                .to_string(),
        ),
        SubmitFailure::Diverged => (
            Kind::SubmitDiverged,
            "The remote branch has diverged. Run `gt sync` and retry".to_string(),
        ),
        SubmitFailure::Timeout => (Kind::SubmitTimeout, output.clone()),
        SubmitFailure::EmptyParent => (
            Kind::SubmitEmptyParent,
            "Nothing was submitted: a branch in the stack has no changes. \
             Its parent may already be merged; run `gt sync`"
                .to_string(),
        ),
        SubmitFailure::Generic => (Kind::SubmitFailed, "gt submit failed".to_string()),
    };
    Err(PhaseError::new(kind, message)
        .with_detail("branch", branch)
        .with_detail("output", output.trim()))
}

/// Poll until an open PR for `branch` is visible
async fn wait_for_pr(ctx: &SubmitContext<'_>, branch: &str) -> Option<PullRequestRef> {
    let platform = ctx.platform;
    with_retry(
        &RetryPolicy::pr_visibility(),
        ctx.clock,
        ctx.progress,
        "Waiting for PR",
        |_| async move {
            match platform.find_pr_for_branch(branch).await {
                Ok(Some(pr)) if pr.state == PrState::Open => Ok(pr),
                Ok(_) => Err(Attempt::Transient(format!("no open PR for '{branch}' yet"))),
                Err(e) => Err(Attempt::Transient(e.to_string())),
            }
        },
    )
    .await
    .inspect_err(|e: &String| debug!(branch, error = %e, "PR never became visible"))
    .ok()
}

/// Drive `future` to completion, emitting elapsed-time markers meanwhile.
///
/// The ticker lives inside this call and stops with it.
async fn with_ticker<F: Future>(
    future: F,
    interval: Duration,
    progress: &dyn ProgressCallback,
) -> F::Output {
    tokio::pin!(future);
    let started = Instant::now();
    let mut ticker = interval_at(started + interval, interval);
    loop {
        tokio::select! {
            output = &mut future => return output,
            _ = ticker.tick() => {
                let elapsed = started.elapsed().as_secs();
                progress.on_message(&format!("{elapsed}s: {}", ticker_label(elapsed))).await;
            }
        }
    }
}

const fn ticker_label(elapsed_secs: u64) -> &'static str {
    match elapsed_secs {
        0..20 => "pushing",
        20..60 => "creating PR",
        _ => "still waiting on gt submit",
    }
}

async fn current_branch(ctx: &SubmitContext<'_>) -> Result<String, String> {
    match ctx.git.current_branch(ctx.worktree).await {
        Ok(Some(branch)) => Ok(branch),
        Ok(None) => Err("HEAD is detached".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn diff_file_path(
    ctx: &SubmitContext<'_>,
    session_id: &str,
) -> Result<PathBuf, PhaseError<SubmitErrorKind>> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !session_id.contains("..");
    if !valid {
        return Err(PhaseError::new(
            SubmitErrorKind::DiffFailed,
            format!("invalid session id {session_id:?}"),
        ));
    }
    Ok(ctx
        .options
        .scratch_dir
        .join(format!("stackpilot-{session_id}.diff")))
}
