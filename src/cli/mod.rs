//! CLI commands
//!
//! Command implementations for the `stackpilot` binary.

mod context;
mod land;
mod progress;
mod style;
mod submit;

pub use land::run_land;
pub use progress::CliProgress;
pub use submit::{SubmitCommand, run_submit};
