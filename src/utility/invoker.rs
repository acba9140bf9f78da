//! Subprocess execution for the external utility
//!
//! The `Invoke` trait is the seam the device manager talks through, so
//! tests can substitute a recording mock. The real implementation runs
//! the configured utility binary, optionally under sudo, with piped
//! streams and a hard timeout.

use crate::config::schema::UtilityConfig;
use crate::error::{RxdError, RxdResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Captured result of one utility invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Process exit code; -1 when the process was killed by a signal
    pub exit_code: i32,
    /// Captured stdout, split into lines
    pub stdout: Vec<String>,
    /// Captured stderr, split into lines
    pub stderr: Vec<String>,
}

impl Invocation {
    /// Whether the utility reported success
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout joined with single spaces, the form used in envelopes
    pub fn stdout_joined(&self) -> String {
        self.stdout.join(" ")
    }

    /// Stderr joined with single spaces, for diagnostics
    pub fn stderr_joined(&self) -> String {
        self.stderr.join(" ")
    }
}

/// Abstract utility invocation interface
#[async_trait]
pub trait Invoke: Send + Sync {
    /// Run the utility with the given argument vector.
    ///
    /// Blocks the calling task until the process exits or the timeout
    /// fires; the timeout kills the process and surfaces as
    /// [`RxdError::Timeout`].
    async fn invoke(&self, args: &[String], limit: Duration) -> RxdResult<Invocation>;
}

/// Runs the real device-management utility as a subprocess
pub struct RapidDiskInvoker {
    program: String,
    sudo_prefix: Vec<String>,
}

impl RapidDiskInvoker {
    /// Build an invoker from the deployment's utility configuration
    pub fn new(config: &UtilityConfig) -> Self {
        let sudo_prefix = if config.sudo {
            vec![
                "sudo".to_string(),
                "-u".to_string(),
                config.sudo_user.clone(),
            ]
        } else {
            Vec::new()
        };

        Self {
            program: config.path.clone(),
            sudo_prefix,
        }
    }

    fn command_line(&self, args: &[String]) -> (String, Vec<String>) {
        let mut tokens: Vec<String> = self.sudo_prefix.clone();
        tokens.push(self.program.clone());
        tokens.extend(args.iter().cloned());

        let program = tokens.remove(0);
        (program, tokens)
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Invoke for RapidDiskInvoker {
    async fn invoke(&self, args: &[String], limit: Duration) -> RxdResult<Invocation> {
        let (program, tokens) = self.command_line(args);
        debug!("Executing: {} {:?}", program, tokens);

        let child = Command::new(&program)
            .args(&tokens)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must take the
            // process down with it.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RxdError::command_failed(format!("{program} {tokens:?}"), e))?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| RxdError::command_failed(format!("{program} {tokens:?}"), e))?
            }
            Err(_) => {
                warn!(
                    "Utility invocation exceeded {}s and was killed: {} {:?}",
                    limit.as_secs(),
                    program,
                    tokens
                );
                return Err(RxdError::Timeout {
                    timeout_secs: limit.as_secs(),
                });
            }
        };

        let invocation = Invocation {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: split_lines(&output.stdout),
            stderr: split_lines(&output.stderr),
        };

        debug!(
            "Utility exited with code {} ({} stdout lines)",
            invocation.exit_code,
            invocation.stdout.len()
        );
        Ok(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sudo: bool) -> UtilityConfig {
        UtilityConfig {
            path: "/sbin/rapiddisk".to_string(),
            sudo,
            sudo_user: "root".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn command_line_with_sudo() {
        let invoker = RapidDiskInvoker::new(&config(true));
        let (program, tokens) = invoker.command_line(&["--short-list".to_string()]);
        assert_eq!(program, "sudo");
        assert_eq!(tokens, vec!["-u", "root", "/sbin/rapiddisk", "--short-list"]);
    }

    #[test]
    fn command_line_without_sudo() {
        let invoker = RapidDiskInvoker::new(&config(false));
        let (program, tokens) = invoker.command_line(&["--short-list".to_string()]);
        assert_eq!(program, "/sbin/rapiddisk");
        assert_eq!(tokens, vec!["--short-list"]);
    }

    #[test]
    fn invocation_joins() {
        let inv = Invocation {
            exit_code: 0,
            stdout: vec!["Attached device rxd0".to_string(), "of size 64".to_string()],
            stderr: vec![],
        };
        assert!(inv.success());
        assert_eq!(inv.stdout_joined(), "Attached device rxd0 of size 64");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn invoke_captures_output() {
        let invoker = RapidDiskInvoker {
            program: "/bin/echo".to_string(),
            sudo_prefix: Vec::new(),
        };
        let inv = invoker
            .invoke(&["rxd0:64".to_string()], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(inv.exit_code, 0);
        assert_eq!(inv.stdout, vec!["rxd0:64"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn invoke_times_out_and_kills() {
        let invoker = RapidDiskInvoker {
            program: "/bin/sleep".to_string(),
            sudo_prefix: Vec::new(),
        };
        let err = invoker
            .invoke(&["10".to_string()], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, RxdError::Timeout { .. }));
    }

    #[tokio::test]
    async fn invoke_missing_binary_is_command_failed() {
        let invoker = RapidDiskInvoker {
            program: "/nonexistent/rapiddisk".to_string(),
            sudo_prefix: Vec::new(),
        };
        let err = invoker
            .invoke(&["--short-list".to_string()], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RxdError::CommandFailed { .. }));
    }
}
