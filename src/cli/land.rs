//! Land command - merge the stack below the current branch, bottom first

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, bullet, check, cross, spinner_style};
use anstream::eprintln;
use dialoguer::Confirm;
use indicatif::ProgressBar;
use stackpilot::error::{Error, Result};
use stackpilot::land::{LandOptions, LandingOutcome, LandingPlan, execute_landing, prepare_landing};
use stackpilot::worktree::WorktreeRegistry;
use std::path::Path;
use std::time::Duration;

/// Run the land command.
///
/// Returns whether every planned branch landed (or nothing was attempted).
pub async fn run_land(path: &Path, options: LandOptions) -> Result<bool> {
    let ctx = CommandContext::new(path).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message("Validating stack...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let quiet = CliProgress::quiet();
    let plan = match prepare_landing(&ctx.land(&quiet)).await {
        Ok(plan) => plan,
        Err(failure) => {
            spinner.finish_and_clear();
            eprintln!("{} {}", cross(), failure.kind.to_string().error());
            eprintln!("  {}", failure.message);
            return Ok(false);
        }
    };
    spinner.finish_with_message(format!("{} Stack validated", check()));

    let registry = WorktreeRegistry::load(&ctx.git, &ctx.worktree).await?;
    report_plan(&plan, &registry);

    if options.dry_run {
        eprintln!("{}", "Dry run: nothing was merged".muted());
        return Ok(true);
    }

    if !options.force
        && !Confirm::new()
            .with_prompt(format!("Land {} PR(s)?", plan.entries.len()))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
    {
        eprintln!("{}", "Aborted".muted());
        return Ok(true);
    }
    eprintln!();

    let progress = CliProgress::verbose();
    let outcome = execute_landing(&ctx.land(&progress), &plan, &options).await;
    report_outcome(&outcome);
    Ok(outcome.is_success())
}

fn report_plan(plan: &LandingPlan, registry: &WorktreeRegistry) {
    eprintln!(
        "{} {} into {}:",
        "Landing".emphasis(),
        format!("{} PR(s)", plan.entries.len()).accent(),
        plan.trunk.accent()
    );
    for (position, entry) in plan.entries.iter().enumerate() {
        let pr_num = format!("#{}", entry.pr_number);
        eprintln!(
            "  {} {}. {} {} {}",
            bullet(),
            position + 1,
            entry.branch.accent(),
            pr_num.accent(),
            entry.title.muted()
        );
        if let Some(dir) = registry.find_worktree_for_branch(&entry.branch) {
            eprintln!("       {}", format!("checked out in {}", dir.display()).muted());
        }
    }
    eprintln!();
}

fn report_outcome(outcome: &LandingOutcome) {
    eprintln!();
    if !outcome.merged.is_empty() {
        eprintln!(
            "{} Merged: {}",
            check(),
            outcome.merged.join(", ").success()
        );
    }
    match &outcome.failure {
        None => eprintln!("{}", "Stack landed".success()),
        Some(failure) => {
            eprintln!("{} {}", cross(), failure.to_string().error());
            if outcome.merged.is_empty() {
                eprintln!("  {}", "Nothing was merged".muted());
            } else {
                eprintln!(
                    "  {}",
                    "Merged PRs stay merged; fix the problem and re-run land-stack".muted()
                );
            }
        }
    }
}
