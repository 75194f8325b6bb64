//! External command execution
//!
//! Every build, scan, deploy and source-control action goes through the
//! [`CommandExecutor`] trait. A non-zero exit is reported in the
//! [`CommandOutput`], not as an error; callers decide with
//! [`CommandOutput::check`] whether failure is fatal for them.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

use crate::error::CommandError;

/// A program invocation: argv, extra environment and an optional time budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout: None,
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl std::fmt::Display for Command {
    /// Shell-like rendering for logs; arguments with spaces or quotes are single-quoted
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .argv()
            .into_iter()
            .map(|part| {
                if part.is_empty() || part.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
                    format!("'{}'", part.replace('\'', r"'\''"))
                } else {
                    part.to_string()
                }
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`CommandError::Failed`]
    pub fn check(self, command: &Command) -> Result<CommandOutput, CommandError> {
        if self.success() {
            Ok(self)
        } else {
            Err(CommandError::Failed {
                command: command.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Capability to run external commands
///
/// Implementations must block (asynchronously) until the command exits or
/// its timeout elapses.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs a command and captures its output
    ///
    /// # Returns
    /// The output for any exit status; errors only when the command could
    /// not be started or timed out
    async fn run(&self, command: &Command) -> Result<CommandOutput, CommandError>;

    /// Runs a command and treats a non-zero exit as an error
    async fn run_checked(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        self.run(command).await?.check(command)
    }
}

/// Runs commands as local child processes
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    working_dir: Option<PathBuf>,
    default_timeout: Option<Duration>,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every command from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Budget for commands that do not carry their own timeout
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        debug!("Running: {}", command);

        let mut process = tokio::process::Command::new(&command.program);
        process
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            process.current_dir(dir);
        }

        let output = process.output();
        let result = match command.timeout.or(self.default_timeout) {
            Some(timeout) => tokio::time::timeout(timeout, output).await.map_err(|_| {
                CommandError::TimedOut {
                    command: command.to_string(),
                    timeout,
                }
            })?,
            None => output.await,
        };

        let output = result.map_err(|source| CommandError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", command.program, stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", command.program, stderr.trim());
        }
        debug!("{} exited with code {}", command.program, exit_code);

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_arguments() {
        let command = Command::new("kubectl")
            .args(["patch", "deployment", "orders"])
            .arg("-p")
            .arg(r#"{"spec": 1}"#);
        assert_eq!(
            command.to_string(),
            r#"kubectl patch deployment orders -p '{"spec": 1}'"#
        );

        let command = Command::new("sh").arg("-c").arg("echo 'hi'");
        assert_eq!(command.to_string(), r#"sh -c 'echo '\''hi'\'''"#);
    }

    #[test]
    fn test_check_maps_non_zero_exit() {
        let command = Command::new("false");
        let output = CommandOutput {
            exit_code: 2,
            stdout: String::new(),
            stderr: "boom\n".to_string(),
        };

        match output.check(&command) {
            Err(CommandError::Failed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shell_executor_captures_output() {
        let executor = ShellExecutor::new();
        let command = Command::new("sh")
            .arg("-c")
            .arg("echo out; echo err >&2; echo $SLIPWAY_TEST")
            .env("SLIPWAY_TEST", "value");

        let output = executor.run(&command).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "out\nvalue\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_shell_executor_reports_exit_code() {
        let executor = ShellExecutor::new();
        let command = Command::new("sh").arg("-c").arg("exit 3");

        let output = executor.run(&command).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert!(executor.run_checked(&command).await.is_err());
    }

    #[tokio::test]
    async fn test_shell_executor_times_out() {
        let executor = ShellExecutor::new();
        let command = Command::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(100));

        let err = executor.run(&command).await.unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_shell_executor_default_timeout() {
        let executor =
            ShellExecutor::new().with_default_timeout(Some(Duration::from_millis(100)));
        let err = executor
            .run(&Command::new("sleep").arg("5"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_shell_executor_missing_program() {
        let executor = ShellExecutor::new();
        let err = executor
            .run(&Command::new("slipway-no-such-binary"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
