//! Bounded subprocess execution
//!
//! Every external process gets a hard deadline. The child is spawned with
//! `kill_on_drop`, so when the deadline passes and the pending wait is
//! dropped, the process is killed rather than left running.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// What to run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,

    /// Written to the child's stdin, which is then closed
    pub stdin: Option<String>,

    pub timeout: Duration,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            stdin: None,
            timeout,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// Exit code; `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to run '{command}': {message}")]
    Io { command: String, message: String },

    #[error("'{command}' did not finish within {timeout:?} and was killed")]
    Timeout { command: String, timeout: Duration },
}

/// Run a process to completion or until its timeout expires
pub async fn run_process(spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
    let command_line = spec.display();
    let start = Instant::now();

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }

    tracing::debug!(command = %command_line, timeout = ?spec.timeout, "Spawning process");
    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(spec.program.display().to_string())
        } else {
            ProcessError::Io {
                command: command_line.clone(),
                message: e.to_string(),
            }
        }
    })?;

    // Feed stdin from a separate task so a child that writes before it
    // finishes reading cannot deadlock us
    if let (Some(input), Some(mut stdin)) = (spec.stdin.clone(), child.stdin.take()) {
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                tracing::debug!(error = %e, "Child closed stdin early");
            }
        });
    }

    let output = match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| ProcessError::Io {
            command: command_line.clone(),
            message: e.to_string(),
        })?,
        Err(_) => {
            tracing::warn!(
                command = %command_line,
                timeout = ?spec.timeout,
                "Process timed out, killing it"
            );
            return Err(ProcessError::Timeout {
                command: command_line,
                timeout: spec.timeout,
            });
        }
    };

    let output = ProcessOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration: start.elapsed(),
    };

    tracing::debug!(
        command = %command_line,
        exit_code = ?output.exit_code,
        duration_ms = output.duration.as_millis() as u64,
        "Process finished"
    );

    Ok(output)
}
