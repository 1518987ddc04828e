//! Command execution abstraction for testability.
//!
//! This module provides a trait-based abstraction over subprocess execution,
//! allowing unit tests to mock `which`, `apt-get`, `whois` and `ufw` calls
//! without actually running them. Every call carries its own deadline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[cfg(test)]
use mockall::automock;

/// Output from command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// The exit code, if available
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Short human-readable reason for a failed run
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        match (stderr.is_empty(), self.code) {
            (false, _) => stderr.to_string(),
            (true, Some(code)) => format!("exit status {}", code),
            (true, None) => "terminated by signal".to_string(),
        }
    }
}

/// Trait for command execution, allowing dependency injection for testing.
///
/// The real implementation spawns actual processes; tests use the generated
/// `MockCommandExecutor` to script their behavior.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command and wait for it, at most `timeout`.
    ///
    /// A command that runs but exits non-zero is `Ok` with `success == false`.
    /// `Err` means the command could not be spawned or ran past its deadline.
    async fn execute(&self, cmd: &str, args: &[String], timeout: Duration) -> Result<CommandOutput>;
}

/// Real implementation of CommandExecutor that runs actual system commands.
#[derive(Debug, Clone, Default)]
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    /// Create a new RealCommandExecutor
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for RealCommandExecutor {
    async fn execute(&self, cmd: &str, args: &[String], timeout: Duration) -> Result<CommandOutput> {
        // kill_on_drop: an expired deadline drops the future and reaps the child
        let child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| anyhow::anyhow!("{} timed out after {:?}", cmd, timeout))?
            .with_context(|| format!("Failed to execute {}", cmd))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Helper function to convert a slice of &str to Vec<String>.
///
/// This is needed because mockall has issues with lifetimes in `&[&str]`,
/// so we use `&[String]` in the trait signature instead.
pub fn args_to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    const SHORT: Duration = Duration::from_secs(5);

    #[test]
    fn test_args_to_strings() {
        let args = args_to_strings(&["insert", "1", "deny"]);
        assert_eq!(args, vec!["insert", "1", "deny"]);
    }

    #[test]
    fn test_args_to_strings_empty() {
        let args = args_to_strings(&[]);
        assert!(args.is_empty());
    }

    #[test]
    fn test_command_output_default() {
        let output = CommandOutput::default();
        assert!(output.stdout.is_empty());
        assert!(output.stderr.is_empty());
        assert!(!output.success);
        assert!(output.code.is_none());
    }

    #[test]
    fn test_failure_reason_prefers_stderr() {
        let output = failure_output("  ERROR: Could not find a profile\n");
        assert_eq!(output.failure_reason(), "ERROR: Could not find a profile");

        let output = CommandOutput {
            code: Some(100),
            ..CommandOutput::default()
        };
        assert_eq!(output.failure_reason(), "exit status 100");
        assert_eq!(CommandOutput::default().failure_reason(), "terminated by signal");
    }

    #[tokio::test]
    async fn test_real_command_executor_execute_echo() {
        let executor = RealCommandExecutor::new();
        let args = args_to_strings(&["-n", "hello"]);
        let output = executor.execute("echo", &args, SHORT).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "hello");
    }

    #[tokio::test]
    async fn test_real_command_executor_execute_failure() {
        let executor = RealCommandExecutor::new();
        let args = args_to_strings(&["--invalid-flag"]);
        // ls --invalid-flag runs, it just fails
        let output = executor.execute("ls", &args, SHORT).await.unwrap();
        assert!(!output.success);
        assert!(output.code.is_some());
    }

    #[tokio::test]
    async fn test_real_command_executor_missing_binary() {
        let executor = RealCommandExecutor::new();
        let result = executor
            .execute("/nonexistent/ufwblock-test-binary", &[], SHORT)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_real_command_executor_timeout() {
        let executor = RealCommandExecutor::new();
        let args = args_to_strings(&["5"]);
        let started = std::time::Instant::now();
        let result = executor
            .execute("sleep", &args, Duration::from_millis(100))
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_mock_command_executor() {
        let mut mock = MockCommandExecutor::new();

        mock.expect_execute()
            .withf(|cmd, args, _| cmd == "ufw" && args_eq(args, &["reload"]))
            .times(1)
            .returning(|_, _, _| Ok(success_output("Firewall reloaded\n")));

        let args = args_to_strings(&["reload"]);
        let output = mock.execute("ufw", &args, SHORT).await.unwrap();
        assert_eq!(output.stdout, "Firewall reloaded\n");
        assert!(output.success);
    }
}
