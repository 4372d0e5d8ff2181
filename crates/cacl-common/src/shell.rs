//! Shell command execution utilities for the ACL manager daemon.
//!
//! This module provides safe shell command execution with proper quoting
//! to prevent command injection attacks.
//!
//! # Example
//!
//! ```ignore
//! use cacl_common::shell::{self, IPTABLES_CMD, shellquote};
//!
//! let src = "10.0.0.1/32";
//! let cmd = format!("{} -A INPUT -s {} -j ACCEPT", IPTABLES_CMD, shellquote(src));
//! let result = shell::exec(&cmd).await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{CaclError, CaclResult};

/// Path to the `iptables` command for IPv4 packet filtering.
pub const IPTABLES_CMD: &str = "/sbin/iptables";

/// Path to the `ip6tables` command for IPv6 packet filtering.
pub const IP6TABLES_CMD: &str = "/sbin/ip6tables";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// Wraps the string in double quotes and escapes the characters that keep
/// special meaning inside double quotes: `$`, `` ` ``, `"`, `\`, and newline.
///
/// # Example
///
/// ```
/// use cacl_common::shell::shellquote;
///
/// assert_eq!(shellquote("10.0.0.1/32"), "\"10.0.0.1/32\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// The combined stdout output.
    pub stdout: String,
    /// The combined stderr output.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a shell command asynchronously.
///
/// The command runs through `/bin/sh -c` so compiled command lines may use
/// shell syntax. The returned [`ExecResult`] carries the exit status; a
/// non-zero exit is reported to the caller, not raised as an error, since
/// the executor's policy is best-effort continuation.
pub async fn exec(cmd: &str) -> CaclResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CaclError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, exit_code = exit_code, "Command succeeded");
    } else {
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command failed"
        );
    }

    Ok(result)
}

/// Executes a shell command and converts a non-zero exit into an error.
pub async fn exec_or_throw(cmd: &str) -> CaclResult<String> {
    let result = exec(cmd).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(CaclError::ShellCommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}
