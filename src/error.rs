//! Error types for rxdiskd
//!
//! All modules use `RxdResult<T>` as their return type. The seven
//! operation-facing variants form a closed taxonomy; everything else is
//! ambient (IO, config, serialization) and surfaces as an internal wire
//! code.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rxdiskd operations
pub type RxdResult<T> = Result<T, RxdError>;

/// All errors that can occur in rxdiskd
#[derive(Error, Debug)]
pub enum RxdError {
    // Operation taxonomy
    #[error("Invalid argument: {message}")]
    InvalidArgument { code: i32, message: String },

    #[error("Not found: {message}")]
    NotFound { code: i32, message: String },

    #[error("Already exists: {message}")]
    AlreadyExists { code: i32, message: String },

    #[error("Device busy: {message}")]
    Busy { code: i32, message: String },

    #[error("Utility did not exit within {timeout_secs}s and was killed")]
    Timeout { timeout_secs: u64 },

    #[error("Malformed utility output: {0}")]
    MalformedOutput(String),

    #[error("Internal error: {message}")]
    Internal { code: i32, message: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed to spawn: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl RxdError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command spawn failure
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Invalid argument detected locally (before any subprocess runs)
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            code: wire::INVALID_ARGUMENT,
            message: message.into(),
        }
    }

    /// Target identifier absent, detected locally
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            code: wire::NOT_FOUND,
            message: message.into(),
        }
    }

    /// Unclassified failure, detected locally
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: wire::INTERNAL,
            message: message.into(),
        }
    }

    /// The non-zero `errorCode` carried on the wire envelope.
    ///
    /// Utility-derived variants carry the utility's own exit code;
    /// locally detected failures use the errno-style defaults from
    /// [`wire`].
    pub fn wire_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { code, .. }
            | Self::NotFound { code, .. }
            | Self::AlreadyExists { code, .. }
            | Self::Busy { code, .. }
            | Self::Internal { code, .. } => *code,
            Self::Timeout { .. } => wire::TIMEOUT,
            Self::MalformedOutput(_) => wire::MALFORMED_OUTPUT,
            _ => wire::INTERNAL,
        }
    }
}

/// Default wire codes for failures detected locally. Utility-derived
/// errors override these with the exit code the utility reported.
pub mod wire {
    pub const INTERNAL: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const BUSY: i32 = 16;
    pub const ALREADY_EXISTS: i32 = 17;
    pub const INVALID_ARGUMENT: i32 = 22;
    pub const MALFORMED_OUTPUT: i32 = 74;
    pub const TIMEOUT: i32 = 124;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RxdError::not_found("rxd9");
        assert!(err.to_string().contains("rxd9"));
    }

    #[test]
    fn wire_code_defaults() {
        assert_eq!(RxdError::invalid_argument("size").wire_code(), 22);
        assert_eq!(RxdError::not_found("rxd9").wire_code(), 2);
        assert_eq!(RxdError::Timeout { timeout_secs: 30 }.wire_code(), 124);
        assert_eq!(
            RxdError::MalformedOutput("no colon".to_string()).wire_code(),
            74
        );
    }

    #[test]
    fn wire_code_prefers_utility_exit_code() {
        let err = RxdError::Busy {
            code: 240,
            message: "rxd0 is mapped".to_string(),
        };
        assert_eq!(err.wire_code(), 240);
    }
}
