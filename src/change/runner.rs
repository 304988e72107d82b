//! Execution of external programs for command changes.
use async_trait::async_trait;
use color_eyre::eyre::WrapErr;
use log::*;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

use crate::result::Result;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub args: Vec<String>,
    /// Added to the inherited environment.
    pub env: Vec<(String, String)>,
    pub dir: PathBuf,
}

impl CommandSpec {
    /// Command line as it would be typed in a shell, for logging.
    pub fn command_line(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.args.iter().map(|a| a.as_str()))
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// Captured result of a finished program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, -1 when the process was terminated by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the program to completion. Only failures to start the process are
    /// errors; a non-zero exit is reported through [`CommandOutput`].
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput>;
}

/// Runs programs as child processes.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        info!("running {} in {}", spec.command_line(), spec.dir.display());

        let output = tokio::process::Command::new(&spec.name)
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&spec.dir)
            .output()
            .await
            .wrap_err_with(|| {
                format!("failed to execute command `{}`", spec.command_line())
            })?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!("command output: {}", result.stdout.trim_end());

        Ok(result)
    }
}
