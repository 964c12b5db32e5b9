//! Error types for the script sandbox.
//!
//! These errors never reach callers of `execute`: the result normalizer folds
//! every variant into an [`ExecutionResult`](crate::ExecutionResult).

use thiserror::Error;

/// Errors that can occur while preparing or running a script.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The execution exceeded the configured wall-clock budget.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Failed to set up the engine realm or the sandbox bindings.
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(#[source] anyhow::Error),

    /// The worker running the engine died before producing an outcome.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The script threw (or its top-level promise rejected).
    #[error("{message}")]
    ScriptException {
        /// The error constructor name (e.g., "TypeError"), when known.
        error_type: Option<String>,
        /// The error message, or the stringified thrown value.
        message: String,
        /// Stack trace if the engine provided one, otherwise the stringified error.
        trace: String,
    },

    /// The top-level promise was still pending with nothing left to run.
    #[error("script never settled: top-level promise is still pending with no scheduled work")]
    Unsettled,

    /// Transpilation produced no JavaScript.
    #[error("Compilation failed to produce output")]
    EmptyEmit,

    /// The transpiler rejected a program that passed type checking.
    #[error("transpilation failed: {0}")]
    Transpile(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SandboxError {
    /// Build a script exception from the rendered `Name: message` form.
    ///
    /// Falls back to treating the whole rendering as the message.
    pub fn from_script_stderr(stderr: &str) -> Self {
        parse_script_exception(stderr).unwrap_or_else(|| SandboxError::ScriptException {
            error_type: None,
            message: stderr.trim().to_string(),
            trace: stderr.to_string(),
        })
    }

    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SandboxError::Timeout(_))
    }

    /// Check if this error was raised by the script itself.
    pub fn is_script_exception(&self) -> bool {
        matches!(self, SandboxError::ScriptException { .. })
    }

    /// The message reported in a runtime failure's `error` field.
    pub fn message(&self) -> String {
        match self {
            SandboxError::ScriptException { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// The text reported in a runtime failure's `stderr` field.
    pub fn trace(&self) -> String {
        match self {
            SandboxError::ScriptException { trace, .. } => trace.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Parse a rendered JavaScript error (`TypeError: x is not a function`).
///
/// Only the first line is inspected; following lines are kept as the trace.
/// Returns `None` if the text does not start with an error constructor name.
pub fn parse_script_exception(stderr: &str) -> Option<SandboxError> {
    let stderr = stderr.trim();
    let first_line = stderr.lines().next()?.trim();

    let (head, message) = match first_line.find(':') {
        Some(colon) => (&first_line[..colon], first_line[colon + 1..].trim()),
        None => (first_line, ""),
    };

    if !looks_like_error_name(head) {
        return None;
    }

    Some(SandboxError::ScriptException {
        error_type: Some(head.to_string()),
        message: message.to_string(),
        trace: stderr.to_string(),
    })
}

/// Check if a word looks like a JavaScript error constructor name.
fn looks_like_error_name(word: &str) -> bool {
    if word.is_empty() || word.contains(char::is_whitespace) {
        return false;
    }

    let starts_upper = word
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false);
    if !starts_upper || !word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }

    word == "Error" || word.ends_with("Error") || word == "InternalError"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_exception() {
        let result = parse_script_exception("TypeError: x is not a function");

        if let Some(SandboxError::ScriptException {
            error_type,
            message,
            trace,
        }) = result
        {
            assert_eq!(error_type.as_deref(), Some("TypeError"));
            assert_eq!(message, "x is not a function");
            assert_eq!(trace, "TypeError: x is not a function");
        } else {
            panic!("Expected ScriptException");
        }
    }

    #[test]
    fn test_parse_exception_with_trace() {
        let stderr = "ReferenceError: fetch is not defined\n    at <anonymous>:2:5";

        match parse_script_exception(stderr) {
            Some(SandboxError::ScriptException {
                error_type, trace, ..
            }) => {
                assert_eq!(error_type.as_deref(), Some("ReferenceError"));
                assert!(trace.contains("at <anonymous>"));
            }
            _ => panic!("Expected ScriptException"),
        }
    }

    #[test]
    fn test_parse_exception_no_message() {
        match parse_script_exception("RangeError") {
            Some(SandboxError::ScriptException {
                error_type,
                message,
                ..
            }) => {
                assert_eq!(error_type.as_deref(), Some("RangeError"));
                assert!(message.is_empty());
            }
            _ => panic!("Expected ScriptException"),
        }
    }

    #[test]
    fn test_parse_rejects_plain_values() {
        assert!(parse_script_exception("").is_none());
        assert!(parse_script_exception("   ").is_none());
        assert!(parse_script_exception("oops: something").is_none());
        assert!(parse_script_exception("Line 1, Column 7: nope").is_none());
    }

    #[test]
    fn test_from_script_stderr_fallback() {
        let err = SandboxError::from_script_stderr("42");
        assert!(err.is_script_exception());
        assert_eq!(err.message(), "42");
        assert_eq!(err.trace(), "42");
    }

    #[test]
    fn test_error_helpers() {
        let timeout = SandboxError::Timeout(std::time::Duration::from_secs(5));
        assert!(timeout.is_timeout());
        assert!(!timeout.is_script_exception());
        assert_eq!(timeout.message(), "execution timed out after 5s");

        assert_eq!(
            SandboxError::EmptyEmit.message(),
            "Compilation failed to produce output"
        );
    }
}
