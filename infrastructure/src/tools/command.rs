//! Shared external command runner for the docker/kubectl handlers

use dockhand_domain::ToolError;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Maximum combined output size retained (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Captured result of an external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    /// Combined stdout and stderr, truncated at [`MAX_OUTPUT_SIZE`]
    pub output: String,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last `lines` lines of output, for error details
    pub fn tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.output.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Run an external command with a timeout, capturing combined output
///
/// A non-zero exit code is not an error here; callers decide what it means
/// for their tool. Spawn failures and timeouts are.
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, ToolError> {
    let start = Instant::now();

    let child = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(error)) => {
            return Err(ToolError::execution_failed(format!(
                "Failed to spawn {}: {}",
                program, error
            )))
        }
        Err(_) => {
            return Err(ToolError::timeout(format!(
                "{} after {} seconds",
                program,
                timeout.as_secs()
            )))
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut combined = String::new();
    if !stdout.is_empty() {
        combined.push_str(&stdout);
    }
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(&stderr);
    }

    if combined.len() > MAX_OUTPUT_SIZE {
        combined.truncate(MAX_OUTPUT_SIZE);
        combined.push_str("\n... (output truncated)");
    }

    Ok(CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        output: combined,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
