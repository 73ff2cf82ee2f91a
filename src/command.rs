// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! External command execution (kubectl, helm) behind a mockable runner.

use std::fmt;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status and captured streams of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, trimmed
    pub fn combined(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error("`{command}` exited with {status}: {output}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },
}

/// Executes external commands (allows substituting a fake in tests)
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run to completion and capture output; a non-zero exit is not an error here
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;
}

/// Run a command and turn a non-zero exit into [`CommandError::Failed`]
pub async fn run_checked<R: CommandRunner>(
    runner: &R,
    invocation: &Invocation,
) -> Result<CommandOutput, CommandError> {
    let output = runner.run(invocation).await?;

    if !output.success() {
        let status = match output.code {
            Some(code) => format!("exit code {}", code),
            None => "a signal".to_string(),
        };
        return Err(CommandError::Failed {
            command: invocation.to_string(),
            status,
            output: output.combined(),
        });
    }

    let stdout = output.stdout.trim();
    if !stdout.is_empty() {
        info!("{}: {}", invocation.program(), stdout);
    }
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        warn!("{}: {}", invocation.program(), stderr);
    }
    Ok(output)
}

/// Runs commands as child processes, killing them after a timeout
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.arguments())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(command = %invocation, "Executing command");

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                command: invocation.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(CommandError::TimedOut {
                    command: invocation.to_string(),
                    timeout: self.timeout,
                })
            }
        };

        Ok(CommandOutput::from(output))
    }
}
