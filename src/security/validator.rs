use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use crate::security::{
    ALLOWED_EXTRA_ENV, ALLOWED_GIT_SUBCOMMANDS, BLOCKED_ARGUMENTS, BLOCKED_SHORT_OPTIONS,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No command provided")]
    EmptyCommand,

    #[error("Command too long (maximum {max} characters)")]
    CommandTooLong { max: usize },

    #[error("Git subcommand not allowed: {0}")]
    DisallowedSubcommand(String),

    // Deliberately does not say which argument matched
    #[error("Command contains potentially dangerous arguments")]
    DangerousArguments,

    #[error("Extra environment may only carry author identity")]
    DisallowedEnvironment,
}

impl ValidationError {
    /// Stable name of the rule that fired, for audit records
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::EmptyCommand => "empty-command",
            ValidationError::CommandTooLong { .. } => "command-too-long",
            ValidationError::DisallowedSubcommand(_) => "disallowed-subcommand",
            ValidationError::DangerousArguments => "dangerous-arguments",
            ValidationError::DisallowedEnvironment => "disallowed-environment",
        }
    }
}

/// Who is asking for an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationTrust {
    /// The checkpoint workflow, supplying pre-built argument vectors
    Internal,
    /// Anything coming from the agent-facing surface
    External,
}

impl InvocationTrust {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationTrust::Internal => "internal",
            InvocationTrust::External => "external",
        }
    }
}

pub struct CommandValidator {
    allowed_subcommands: HashSet<&'static str>,
    blocked_arguments: Vec<String>,
}

impl CommandValidator {
    pub fn new() -> Self {
        let allowed_subcommands = ALLOWED_GIT_SUBCOMMANDS.iter().copied().collect();

        let blocked_arguments = BLOCKED_ARGUMENTS
            .iter()
            .map(|pattern| pattern.to_lowercase())
            .collect();

        Self {
            allowed_subcommands,
            blocked_arguments,
        }
    }

    /// Validate an argument vector for the given trust level
    ///
    /// The dangerous-argument check runs first and for every caller.
    /// Internal callers skip only the subcommand allowlist.
    pub fn validate(&self, argv: &[String], trust: InvocationTrust) -> Result<(), ValidationError> {
        let Some(subcommand) = argv.first() else {
            return Err(ValidationError::EmptyCommand);
        };

        self.check_dangerous_arguments(argv)?;

        if trust == InvocationTrust::External && !self.check_subcommand(subcommand) {
            return Err(ValidationError::DisallowedSubcommand(subcommand.clone()));
        }

        Ok(())
    }

    /// Enforce the raw input length limit for external command strings
    pub fn check_length(&self, command: &str, max_chars: usize) -> Result<(), ValidationError> {
        if command.chars().count() > max_chars {
            return Err(ValidationError::CommandTooLong { max: max_chars });
        }
        Ok(())
    }

    /// Extra environment may only set author identity variables
    pub fn check_environment(&self, env: &BTreeMap<String, String>) -> Result<(), ValidationError> {
        if env.keys().all(|key| is_allowed_env(key)) {
            Ok(())
        } else {
            Err(ValidationError::DisallowedEnvironment)
        }
    }

    /// Check if subcommand is in allowlist
    fn check_subcommand(&self, subcommand: &str) -> bool {
        self.allowed_subcommands.contains(subcommand)
    }

    fn check_dangerous_arguments(&self, argv: &[String]) -> Result<(), ValidationError> {
        if argv.iter().any(|token| self.is_blocked(token)) {
            return Err(ValidationError::DangerousArguments);
        }
        Ok(())
    }

    fn is_blocked(&self, token: &str) -> bool {
        if BLOCKED_SHORT_OPTIONS.iter().any(|option| token.starts_with(option)) {
            return true;
        }

        let token = token.to_lowercase();
        self.blocked_arguments.iter().any(|pattern| {
            token == *pattern
                || token
                    .strip_prefix(pattern.as_str())
                    .is_some_and(|rest| rest.starts_with('='))
        })
    }
}

pub fn is_allowed_env(key: &str) -> bool {
    ALLOWED_EXTRA_ENV.contains(&key)
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new()
    }
}
