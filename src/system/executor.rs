//! External command execution.

use std::process::Stdio;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::error_handling::CommandError;

/// Exit code and combined output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, -1 when the process was killed by a signal
    pub exit_code: i32,
    /// Standard output followed by standard error
    pub output: String,
}

impl CommandOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs package manager commands.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `program` with `args` and waits for it to finish.
    ///
    /// A non-zero exit code isn't an error here; callers decide what a
    /// failure means.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Spawn` when the program couldn't be started.
    async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError>;
}

/// Runs commands on the host with the C locale, so their output can be matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        debug!("Executing external command: {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        // Killed by a signal
        let exit_code = output.status.code().unwrap_or(-1);
        debug!("{} exited with code {}", program, exit_code);
        Ok(CommandOutput {
            exit_code,
            output: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_captures_output_and_exit_code() {
        let output = SystemExecutor
            .execute("sh", &["-c", "echo out; echo err >&2; exit 3"])
            .await
            .expect("sh should be available");
        assert_eq!(output.exit_code, 3);
        assert!(!output.success());
        assert!(output.output.contains("out"));
        assert!(output.output.contains("err"));
    }

    #[tokio::test]
    async fn test_execute_missing_program() {
        let err = SystemExecutor
            .execute("definitely-not-a-real-program-xyz", &[])
            .await
            .expect_err("program doesn't exist");
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
