//! External command execution
//!
//! Every remote call goes through a [`CommandRunner`] so the gcloud and mysql
//! clients can be exercised against canned output in tests.

use crate::config::SecretString;
use crate::domain::GatewayError;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::process::Command;

/// A command line to execute
///
/// Secrets travel through `env` and never through `args`, so the argument
/// vector is safe to log.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,

    /// Arguments
    pub args: Vec<String>,

    /// Extra environment variables
    pub env: Vec<(String, SecretString)>,
}

impl CommandSpec {
    /// Creates a command with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Appends one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds a secret environment variable
    pub fn secret_env(mut self, key: impl Into<String>, value: SecretString) -> Self {
        self.env.push((key.into(), value));
        self
    }

    /// Program and arguments joined for log output
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code (`None` when terminated by a signal)
    pub code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts a non-zero exit into [`GatewayError::CommandFailed`]
    pub fn into_result(self, program: &str) -> Result<Self, GatewayError> {
        if self.success() {
            Ok(self)
        } else {
            Err(GatewayError::CommandFailed {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Executes external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion and captures its output
    ///
    /// A non-zero exit is *not* an error at this level; only failing to start
    /// or to finish in time is.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, GatewayError>;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Creates a runner that kills commands running longer than `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, GatewayError> {
        tracing::debug!(command = %spec.display(), "Running command");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args).kill_on_drop(true);
        for (key, value) in &spec.env {
            let value: &str = value.expose_secret().as_ref();
            command.env(key, value);
        }

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| GatewayError::Timeout {
                program: spec.program.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| GatewayError::Spawn {
                program: spec.program.clone(),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
