//! Supervised external optimizer subprocess.
//!
//! An optimizer command is a filter: the image buffer is written to its
//! standard input (then the pipe is closed), and the optimized image is
//! read back from its standard output. One process is spawned per transform
//! attempt.
//!
//! Supervision collapses every way the subprocess can misbehave into the
//! single stage-failure kind: spawn errors, non-zero exit, a hang past the
//! timeout, output past the buffer bound, and an exit with no output at
//! all.

use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::TransformError;

/// Default wall-clock budget for one optimizer run.
pub const DEFAULT_OPTIMIZER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on accumulated optimizer output: 64MB.
pub const DEFAULT_OPTIMIZER_OUTPUT_BYTES: usize = 64 * 1024 * 1024;

const STAGE: &str = "optimize";

/// A configured external optimizer invocation.
#[derive(Debug, Clone)]
pub struct OptimizerCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl OptimizerCommand {
    /// Parse a whitespace-separated command line, e.g. `svgo -i - -o -`.
    ///
    /// Returns `None` for an empty command line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            timeout: DEFAULT_OPTIMIZER_TIMEOUT,
            max_output_bytes: DEFAULT_OPTIMIZER_OUTPUT_BYTES,
        })
    }

    /// Override the wall-clock budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the output buffer bound.
    pub fn with_max_output(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    /// The program this command runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the optimizer over `input`, returning its standard output.
    pub async fn run(&self, input: &[u8]) -> Result<Bytes, TransformError> {
        debug!(program = %self.program, bytes = input.len(), "running optimizer");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TransformError::stage(STAGE, format!("failed to spawn {}: {}", self.program, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransformError::stage(STAGE, "optimizer stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransformError::stage(STAGE, "optimizer stdout unavailable"))?;

        // Feed stdin and drain stdout concurrently so neither pipe can fill
        // and wedge the child. A write error here means the child stopped
        // reading; the exit status and output checks below classify that.
        let feed = async move {
            let _ = stdin.write_all(input).await;
            let _ = stdin.shutdown().await;
        };
        let drain = async move {
            let mut buffer = Vec::new();
            let mut bounded = stdout.take(self.max_output_bytes as u64 + 1);
            bounded
                .read_to_end(&mut buffer)
                .await
                .map(move |_| buffer)
        };

        let run = async {
            let ((), output) = tokio::join!(feed, drain);
            let status = child.wait().await;
            (status, output)
        };

        let (status, output) = match timeout(self.timeout, run).await {
            Ok(result) => result,
            Err(_) => {
                return Err(TransformError::stage(
                    STAGE,
                    format!(
                        "{} timed out after {}ms",
                        self.program,
                        self.timeout.as_millis()
                    ),
                ));
            }
        };

        let status = status.map_err(|e| {
            TransformError::stage(STAGE, format!("failed to reap {}: {}", self.program, e))
        })?;
        let output = output.map_err(|e| {
            TransformError::stage(STAGE, format!("failed to read {} output: {}", self.program, e))
        })?;

        if !status.success() {
            return Err(TransformError::stage(
                STAGE,
                format!("{} exited with {}", self.program, status),
            ));
        }
        if output.is_empty() {
            return Err(TransformError::stage(
                STAGE,
                format!("{} produced no output", self.program),
            ));
        }
        if output.len() > self.max_output_bytes {
            return Err(TransformError::stage(
                STAGE,
                format!(
                    "{} output exceeded {} bytes",
                    self.program, self.max_output_bytes
                ),
            ));
        }

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Tests
// =============================================================================
