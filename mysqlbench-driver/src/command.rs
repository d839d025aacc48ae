use mysqlbench_common::{BenchError, Result};
use std::future::Future;
use std::path::PathBuf;
use tokio::process::Command;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Turn a non-zero exit into [`BenchError::CommandFailed`].
pub fn check_status(command: &str, output: CommandOutput) -> Result<CommandOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(BenchError::CommandFailed {
            command: command.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Runs commands on the machine driving the benchmark.
pub trait CommandRunner: Send + Sync {
    /// Run `argv` to completion, whatever its exit status.
    fn run_unchecked(&self, argv: &[String]) -> impl Future<Output = Result<CommandOutput>> + Send;

    fn run(&self, argv: &[String]) -> impl Future<Output = Result<CommandOutput>> + Send {
        async move {
            let output = self.run_unchecked(argv).await?;
            check_status(&argv.join(" "), output)
        }
    }
}

/// Executes commands on the client machine.
pub trait RemoteShell: Send + Sync {
    fn run_unchecked(&self, command: &str) -> impl Future<Output = Result<CommandOutput>> + Send;

    fn run(&self, command: &str) -> impl Future<Output = Result<CommandOutput>> + Send {
        async move {
            let output = self.run_unchecked(command).await?;
            check_status(command, output)
        }
    }
}

/// Spawns local processes through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRunner;

impl CommandRunner for LocalRunner {
    async fn run_unchecked(&self, argv: &[String]) -> Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BenchError::Spawn("empty command line".to_string()))?;
        tracing::debug!("Running: {}", argv.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| BenchError::Spawn(format!("{program}: {e}")))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

/// Remote execution over `ssh`, issued through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct SshShell<R> {
    runner: R,
    pub host: String,
    pub user: Option<String>,
    pub key: Option<PathBuf>,
}

impl<R: CommandRunner> SshShell<R> {
    pub fn new(runner: R, host: impl Into<String>) -> Self {
        Self { runner, host: host.into(), user: None, key: None }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_key(mut self, key: Option<PathBuf>) -> Self {
        self.key = key;
        self
    }

    /// Full local command line that runs `command` on the remote host.
    pub fn ssh_argv(&self, command: &str) -> Vec<String> {
        let mut argv: Vec<String> = ["ssh", "-o", "BatchMode=yes", "-o", "StrictHostKeyChecking=no"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(key) = &self.key {
            argv.push("-i".to_string());
            argv.push(key.display().to_string());
        }
        argv.push(match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        });
        argv.push(command.to_string());
        argv
    }
}

impl<R: CommandRunner> RemoteShell for SshShell<R> {
    async fn run_unchecked(&self, command: &str) -> Result<CommandOutput> {
        self.runner.run_unchecked(&self.ssh_argv(command)).await
    }
}
