//! Shared test utilities

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod mocks;
pub mod world;

pub use fixtures::{clean, github_config, make_branches, make_pr, status, unknown, worktree};
pub use mocks::{
    FakeClock, MockGit, MockPlatformService, MockStackTool, RecordingProgress, StubGenerator,
};
pub use world::{Shared, World, failed, succeeded};

use stackpilot::land::LandContext;
use stackpilot::submit::{SubmitContext, SubmitOptions};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Every collaborator wired to one fake world, plus a real scratch directory
pub struct Harness {
    pub world: Shared,
    pub git: MockGit,
    pub stack_tool: MockStackTool,
    pub platform: MockPlatformService,
    pub clock: FakeClock,
    pub progress: RecordingProgress,
    pub options: SubmitOptions,
    pub worktree: PathBuf,
    pub remote: String,
    _temp: TempDir,
}

impl Harness {
    pub fn new(world: World) -> Self {
        let temp = TempDir::new().unwrap();
        let shared = Shared::new(world);
        let worktree = temp.path().join("repo");
        std::fs::create_dir_all(&worktree).unwrap();
        let scratch = temp.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();

        Self {
            git: MockGit(shared.clone()),
            stack_tool: MockStackTool(shared.clone()),
            platform: MockPlatformService::new(shared.clone(), github_config()),
            world: shared,
            clock: FakeClock::default(),
            progress: RecordingProgress::default(),
            options: SubmitOptions {
                submit_timeout: Duration::from_secs(120),
                ticker_interval: Duration::from_secs(10),
                scratch_dir: scratch,
            },
            worktree,
            remote: "origin".to_string(),
            _temp: temp,
        }
    }

    pub fn submit_ctx(&self) -> SubmitContext<'_> {
        SubmitContext {
            worktree: &self.worktree,
            git: &self.git,
            stack_tool: &self.stack_tool,
            platform: &self.platform,
            clock: &self.clock,
            progress: &self.progress,
            options: &self.options,
        }
    }

    pub fn land_ctx(&self) -> LandContext<'_> {
        LandContext {
            worktree: &self.worktree,
            remote: &self.remote,
            graphite_enabled: true,
            git: &self.git,
            stack_tool: &self.stack_tool,
            platform: &self.platform,
            clock: &self.clock,
            progress: &self.progress,
        }
    }
}
