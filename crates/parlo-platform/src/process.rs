//! Run-to-completion process execution.
//!
//! Used for short-lived queries such as `espeak-ng --voices`. Long-running
//! children that must be killable (speech, audio players) are managed by
//! the command hosts directly.

use std::time::Duration;

use async_trait::async_trait;

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a command and captures its output.
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Run `command` with `args`, killing it if it exceeds `timeout`.
    async fn run(
        &self,
        command: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, Box<dyn std::error::Error + Send + Sync>>;
}

/// [`tokio::process`] implementation.
pub struct NativeProcessSpawner;

#[async_trait]
impl ProcessSpawner for NativeProcessSpawner {
    async fn run(
        &self,
        command: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, Box<dyn std::error::Error + Send + Sync>> {
        let child = tokio::process::Command::new(command)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| format!("'{command}' timed out after {}ms", timeout.as_millis()))??;

        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
