//! Error types for the control-plane ACL manager.
//!
//! All errors implement `std::error::Error` via `thiserror`. Validation and
//! execution problems are recovered locally by the daemon; only startup
//! preconditions and an unreachable config store are fatal.

use std::io;
use thiserror::Error;

/// Result type alias for daemon operations.
pub type CaclResult<T> = Result<T, CaclError>;

/// Errors that can occur during daemon operations.
#[derive(Debug, Error)]
pub enum CaclError {
    /// Failed to execute a shell command (spawn error).
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Config store operation failed.
    #[error("Config store operation failed: {operation}: {message}")]
    Database {
        /// The operation that failed (e.g., "keys", "hgetall", "psubscribe").
        operation: String,
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Daemon started without the required privilege.
    #[error("Insufficient privilege: {message}")]
    Privilege {
        /// Error message.
        message: String,
    },
}

impl CaclError {
    /// Creates a config store error.
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a privilege error.
    pub fn privilege(message: impl Into<String>) -> Self {
        Self::Privilege {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error() {
        let err = CaclError::database("hgetall", "Connection refused");
        assert_eq!(
            err.to_string(),
            "Config store operation failed: hgetall: Connection refused"
        );
    }

    #[test]
    fn test_invalid_config_error() {
        let err = CaclError::invalid_config("PRIORITY", "not an integer");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for PRIORITY: not an integer"
        );
    }

    #[test]
    fn test_shell_command_failed() {
        let err = CaclError::ShellCommandFailed {
            command: "/sbin/iptables -A INPUT -j ACCEPT".to_string(),
            exit_code: 2,
            output: "iptables: No chain/target/match by that name".to_string(),
        };
        assert!(err.to_string().contains("iptables -A INPUT"));
        assert!(err.to_string().contains("exit code 2"));
    }

    #[test]
    fn test_privilege_error() {
        let err = CaclError::privilege("must run as root");
        assert_eq!(err.to_string(), "Insufficient privilege: must run as root");
    }
}
