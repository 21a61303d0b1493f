use crate::error::{GatewayError, GatewayResult};
use crate::security::{ValidationError, ALLOWED_GIT_SUBCOMMANDS};

/// Shown instead of an empty string when a command succeeds silently
pub const EMPTY_OUTPUT_PLACEHOLDER: &str = "(no output)";

/// Turns gateway outcomes into the text returned to callers
///
/// This is the only place failure categories become prose.
pub struct OutcomeRenderer;

impl OutcomeRenderer {
    pub fn render(outcome: &GatewayResult<String>) -> String {
        match outcome {
            Ok(output) => Self::render_output(output),
            Err(error) => Self::render_error(error),
        }
    }

    pub fn render_output(output: &str) -> String {
        if output.is_empty() {
            EMPTY_OUTPUT_PLACEHOLDER.to_string()
        } else {
            output.to_string()
        }
    }

    pub fn render_error(error: &GatewayError) -> String {
        match error {
            GatewayError::InvalidInput(reason) => format!("Error: {}", reason),

            GatewayError::SecurityRejection(rejection) => Self::render_rejection(rejection),

            GatewayError::RepositoryNotFound {
                requested,
                available,
            } => {
                let hint = if available.is_empty() {
                    "No repositories are configured.".to_string()
                } else {
                    format!("Available repositories: {}", available.join(", "))
                };
                format!(
                    "Error: Repository '{}' not found or has no shadow store.\n{}",
                    requested, hint
                )
            }

            GatewayError::Timeout { timeout_ms } => {
                format!("Error: Command timed out after {}ms.", timeout_ms)
            }

            GatewayError::BufferOverflow { limit_bytes } => format!(
                "Error: Command output exceeded the limit of {} bytes. Narrow the query, for example with -n or a path.",
                limit_bytes
            ),

            GatewayError::ProcessFailure {
                message,
                stderr,
                stdout,
                ..
            } => {
                let mut text = format!("Error: {}", message);
                if !stderr.is_empty() {
                    text.push_str("\n\nError output:\n");
                    text.push_str(stderr);
                }
                if !stdout.is_empty() {
                    text.push_str("\n\nPartial output:\n");
                    text.push_str(stdout);
                }
                text
            }

            GatewayError::UnknownFailure(raw) => format!("Error: Unexpected failure: {}", raw),
        }
    }

    fn render_rejection(rejection: &ValidationError) -> String {
        match rejection {
            ValidationError::DisallowedSubcommand(subcommand) => format!(
                "Error: Command '{}' is not allowed. Only read-only commands are permitted: {}",
                subcommand,
                ALLOWED_GIT_SUBCOMMANDS.join(", ")
            ),
            ValidationError::DangerousArguments => {
                "Error: Command contains potentially dangerous arguments and was rejected.".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_output_placeholder() {
        assert_eq!(OutcomeRenderer::render(&Ok(String::new())), "(no output)");
    }

    #[test]
    fn test_output_verbatim() {
        let output = "abc123 first\n".to_string();
        assert_eq!(OutcomeRenderer::render(&Ok(output.clone())), output);
        // Whitespace is real output
        assert_eq!(OutcomeRenderer::render_output("\n"), "\n");
    }

    #[test]
    fn test_render_disallowed_subcommand() {
        let error = GatewayError::SecurityRejection(ValidationError::DisallowedSubcommand(
            "commit".to_string(),
        ));
        let text = OutcomeRenderer::render_error(&error);
        assert!(text.contains("'commit' is not allowed"));
        assert!(text.contains("log"));
    }

    #[test]
    fn test_render_dangerous_arguments_hides_pattern() {
        let error = GatewayError::SecurityRejection(ValidationError::DangerousArguments);
        let text = OutcomeRenderer::render_error(&error);
        assert!(text.contains("dangerous arguments"));
        assert!(!text.contains("--"));
    }

    #[test]
    fn test_render_timeout_includes_value() {
        let text = OutcomeRenderer::render_error(&GatewayError::Timeout { timeout_ms: 10000 });
        assert!(text.contains("10000ms"));
    }

    #[test]
    fn test_render_buffer_overflow() {
        let text = OutcomeRenderer::render_error(&GatewayError::BufferOverflow { limit_bytes: 2048 });
        assert!(text.contains("2048 bytes"));
    }

    #[test]
    fn test_render_process_failure_labels_streams() {
        let error = GatewayError::ProcessFailure {
            message: "Command 'git show nope' failed with exit code 128".to_string(),
            exit_code: Some(128),
            stderr: "fatal: bad object nope".to_string(),
            stdout: "partial".to_string(),
        };
        let text = OutcomeRenderer::render_error(&error);
        assert!(text.starts_with("Error: Command 'git show nope' failed with exit code 128"));
        assert!(text.contains("Error output:\nfatal: bad object nope"));
        assert!(text.contains("Partial output:\npartial"));
    }

    #[test]
    fn test_render_process_failure_omits_empty_streams() {
        let error = GatewayError::ProcessFailure {
            message: "failed".to_string(),
            exit_code: Some(1),
            stderr: String::new(),
            stdout: String::new(),
        };
        assert_eq!(OutcomeRenderer::render_error(&error), "Error: failed");
    }

    #[test]
    fn test_render_repository_not_found() {
        let error = GatewayError::RepositoryNotFound {
            requested: "nope".to_string(),
            available: vec!["app".to_string(), "site".to_string()],
        };
        let text = OutcomeRenderer::render_error(&error);
        assert!(text.contains("'nope'"));
        assert!(text.contains("app, site"));

        let error = GatewayError::RepositoryNotFound {
            requested: "nope".to_string(),
            available: Vec::new(),
        };
        assert!(OutcomeRenderer::render_error(&error).contains("No repositories are configured"));
    }

    #[test]
    fn test_render_unknown() {
        let text = OutcomeRenderer::render_error(&GatewayError::UnknownFailure("boom".to_string()));
        assert_eq!(text, "Error: Unexpected failure: boom");
    }

    #[test]
    fn test_render_invalid_input() {
        let error: GatewayError = ValidationError::EmptyCommand.into();
        assert_eq!(OutcomeRenderer::render_error(&error), "Error: No command provided");
    }
}
