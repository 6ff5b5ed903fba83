//! Subprocess plumbing shared by the git, gt, and claude collaborators

use crate::error::{Error, Result};
use crate::types::CommandOutput;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

fn command(program: &str, args: &[&str], cwd: &Path) -> Command {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command
}

fn capture(output: &std::process::Output) -> CommandOutput {
    CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Run a program to completion, capturing its output
pub(crate) async fn run(program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    debug!(program, ?args, cwd = %cwd.display(), "running");
    let output = command(program, args, cwd)
        .output()
        .await
        .map_err(|source| Error::Spawn {
            program: program.to_string(),
            source,
        })?;
    let captured = capture(&output);
    debug!(program, success = captured.success, "finished");
    Ok(captured)
}

/// Run a program, killing it if it outlives `timeout`
pub(crate) async fn run_with_timeout(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandOutput> {
    tokio::time::timeout(timeout, run(program, args, cwd))
        .await
        .map_err(|_| Error::CommandTimeout {
            program: program.to_string(),
            seconds: timeout.as_secs(),
        })?
}

/// Run a program with `input` on stdin, killing it if it outlives `timeout`
pub(crate) async fn run_with_input(
    program: &str,
    args: &[&str],
    cwd: &Path,
    input: &str,
    timeout: Duration,
) -> Result<CommandOutput> {
    debug!(program, ?args, "running with stdin");
    let spawn_error = |source| Error::Spawn {
        program: program.to_string(),
        source,
    };

    let mut cmd = command(program, args, cwd);
    cmd.stdin(Stdio::piped());
    let mut child = cmd.spawn().map_err(spawn_error)?;

    let work = async {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await.map_err(spawn_error)?;
            // Dropping stdin closes the pipe so the child sees EOF
        }
        child.wait_with_output().await.map_err(spawn_error)
    };

    let output = tokio::time::timeout(timeout, work)
        .await
        .map_err(|_| Error::CommandTimeout {
            program: program.to_string(),
            seconds: timeout.as_secs(),
        })??;
    Ok(capture(&output))
}

/// Pick the most informative line from a failed command's stderr
pub(crate) fn best_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .find(|line| {
            let lower = line.to_ascii_lowercase();
            lower.starts_with("error:") || lower.starts_with("fatal:")
        })
        .or_else(|| lines.last())
        .map_or_else(|| "unknown error".to_string(), |line| (*line).to_string())
}
