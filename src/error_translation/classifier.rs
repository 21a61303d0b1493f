use crate::config::GatewaySettings;
use crate::error::GatewayError;
use crate::git::executor::{FailedRun, InvocationFailure};

/// Maps invocation failures onto the gateway's failure categories
///
/// Checks run in a fixed order and stop at the first match: timeout, output
/// limit, structured process failure, then unknown.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    timeout_ms: u64,
    max_output_bytes: usize,
}

impl FailureClassifier {
    pub fn new(timeout_ms: u64, max_output_bytes: usize) -> Self {
        Self {
            timeout_ms,
            max_output_bytes,
        }
    }

    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self::new(settings.timeout_ms, settings.max_output_bytes)
    }

    pub fn classify(&self, failure: InvocationFailure) -> GatewayError {
        match failure {
            InvocationFailure::TimedOut => GatewayError::Timeout {
                timeout_ms: self.timeout_ms,
            },
            InvocationFailure::OutputLimitExceeded => GatewayError::BufferOverflow {
                limit_bytes: self.max_output_bytes,
            },
            InvocationFailure::Failed(run) if is_structured(&run) => GatewayError::ProcessFailure {
                message: run.message,
                exit_code: run.exit_code,
                stderr: run.stderr,
                stdout: run.stdout,
            },
            InvocationFailure::Failed(run) => GatewayError::UnknownFailure(run.message),
            InvocationFailure::Other(raw) => GatewayError::UnknownFailure(raw),
        }
    }
}

fn is_structured(run: &FailedRun) -> bool {
    run.exit_code.is_some() || !run.stderr.is_empty() || !run.stdout.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn classifier() -> FailureClassifier {
        FailureClassifier::new(7000, 512)
    }

    fn failed(exit_code: Option<i32>, stderr: &str, stdout: &str) -> InvocationFailure {
        InvocationFailure::Failed(FailedRun {
            message: "Command 'git log' failed".to_string(),
            exit_code,
            stderr: stderr.to_string(),
            stdout: stdout.to_string(),
        })
    }

    #[test]
    fn test_timeout_carries_configured_value() {
        let err = classifier().classify(InvocationFailure::TimedOut);
        assert!(matches!(err, GatewayError::Timeout { timeout_ms: 7000 }));
    }

    #[test]
    fn test_output_limit() {
        let err = classifier().classify(InvocationFailure::OutputLimitExceeded);
        assert!(matches!(err, GatewayError::BufferOverflow { limit_bytes: 512 }));
    }

    #[test]
    fn test_exit_code_alone_is_structured() {
        let err = classifier().classify(failed(Some(128), "", ""));
        assert_eq!(err.category(), ErrorCategory::ProcessFailure);
    }

    #[test]
    fn test_stderr_alone_is_structured() {
        let err = classifier().classify(failed(None, "fatal: bad revision", ""));
        match err {
            GatewayError::ProcessFailure { stderr, exit_code, .. } => {
                assert_eq!(stderr, "fatal: bad revision");
                assert_eq!(exit_code, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_partial_output_alone_is_structured() {
        let err = classifier().classify(failed(None, "", "abc123 partial"));
        assert_eq!(err.category(), ErrorCategory::ProcessFailure);
    }

    #[test]
    fn test_bare_failure_is_unknown() {
        let err = classifier().classify(failed(None, "", ""));
        assert_eq!(err.category(), ErrorCategory::UnknownFailure);
    }

    #[test]
    fn test_other_is_unknown() {
        let err = classifier().classify(InvocationFailure::Other("spawn failed".to_string()));
        match err {
            GatewayError::UnknownFailure(raw) => assert_eq!(raw, "spawn failed"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
