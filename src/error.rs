use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;
use crate::security::validator::ValidationError;

/// The closed set of failure categories a gateway call can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    SecurityRejection,
    RepositoryNotFound,
    Timeout,
    BufferOverflow,
    ProcessFailure,
    UnknownFailure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "invalid-input",
            ErrorCategory::SecurityRejection => "security-rejection",
            ErrorCategory::RepositoryNotFound => "repository-not-found",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::BufferOverflow => "buffer-overflow",
            ErrorCategory::ProcessFailure => "process-failure",
            ErrorCategory::UnknownFailure => "unknown-failure",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can end a gateway call
///
/// These carry structured fields all the way to the outer boundary. The
/// `Display` impl is meant for logs; user-facing text comes from
/// [`crate::error_translation::OutcomeRenderer`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Security rejection: {0}")]
    SecurityRejection(ValidationError),

    #[error("Repository not found: {requested}")]
    RepositoryNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("Command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Command output exceeded {limit_bytes} bytes")]
    BufferOverflow { limit_bytes: usize },

    #[error("Process failed: {message}")]
    ProcessFailure {
        message: String,
        exit_code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("Unknown failure: {0}")]
    UnknownFailure(String),
}

impl GatewayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::InvalidInput(_) => ErrorCategory::InvalidInput,
            GatewayError::SecurityRejection(_) => ErrorCategory::SecurityRejection,
            GatewayError::RepositoryNotFound { .. } => ErrorCategory::RepositoryNotFound,
            GatewayError::Timeout { .. } => ErrorCategory::Timeout,
            GatewayError::BufferOverflow { .. } => ErrorCategory::BufferOverflow,
            GatewayError::ProcessFailure { .. } => ErrorCategory::ProcessFailure,
            GatewayError::UnknownFailure(_) => ErrorCategory::UnknownFailure,
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        match err {
            // Malformed input is not a security decision
            ValidationError::EmptyCommand | ValidationError::CommandTooLong { .. } => {
                GatewayError::InvalidInput(err.to_string())
            }
            ValidationError::DisallowedSubcommand(_)
            | ValidationError::DangerousArguments
            | ValidationError::DisallowedEnvironment => GatewayError::SecurityRejection(err),
        }
    }
}

/// Top-level application error that wraps all module-specific errors
///
/// Used by the binary. Gateway calls themselves never surface this type; it
/// covers startup concerns such as loading configuration.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
