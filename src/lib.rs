//! stackpilot - submit and land stacked branches
//!
//! Orchestrates three independently mutable stores (the local git worktrees,
//! Graphite's stacked-branch metadata, and GitHub pull requests) through two
//! workflows:
//!
//! - [`submit`]: prepare a single branch, push it as a PR, and finalize the
//!   PR metadata once GitHub makes it visible.
//! - [`land`]: merge a stack of PRs bottom-up, re-validating stack integrity
//!   and PR bases before every merge.

pub mod ai;
pub mod auth;
pub mod classify;
pub mod config;
pub mod error;
pub mod git;
pub mod graphite;
pub mod land;
pub mod platform;
mod process;
pub mod progress;
pub mod retry;
pub mod stack;
pub mod submit;
pub mod types;
pub mod worktree;
