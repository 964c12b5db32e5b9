//! Execution results and the normalizer that produces them.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{parse_script_exception, SandboxError};
use crate::sandbox::io::OutputCapture;

/// Error text of every compile failure.
pub const TYPE_CHECK_FAILED: &str = "Type checking failed";

/// A type-checker error with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    /// Rendered message, including any chained detail lines.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Line {}, Column {}: {}", self.line, self.column, self.message)
    }
}

/// Outcome of one `execute` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The script completed; `result` is its resolved value.
    Success {
        /// Resolved value of the script, as JSON.
        result: Value,
        /// Newline-joined `console.log` / `console.info` output.
        stdout: String,
        /// Newline-joined `console.error` / `console.warn` output.
        stderr: String,
    },
    /// The TypeScript checker rejected the source; nothing was evaluated.
    CompileFailure {
        /// Always [`TYPE_CHECK_FAILED`].
        error: String,
        /// Error diagnostics in checker order.
        diagnostics: Vec<Diagnostic>,
        /// The formatted diagnostics, newline-joined.
        stderr: String,
    },
    /// The script threw, rejected, or the runtime failed around it.
    RuntimeFailure {
        /// The error message.
        error: String,
        /// Stack trace when available, otherwise the stringified error.
        stderr: String,
    },
}

impl ExecutionResult {
    /// Check if the execution completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Check if the TypeScript checker rejected the source.
    pub fn is_compile_failure(&self) -> bool {
        matches!(self, ExecutionResult::CompileFailure { .. })
    }

    /// The resolved value, on success.
    pub fn result(&self) -> Option<&Value> {
        match self {
            ExecutionResult::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Captured stdout. Failures carry none.
    pub fn stdout(&self) -> &str {
        match self {
            ExecutionResult::Success { stdout, .. } => stdout.as_str(),
            _ => "",
        }
    }

    /// Captured stderr, or the failure trace.
    pub fn stderr(&self) -> &str {
        match self {
            ExecutionResult::Success { stderr, .. }
            | ExecutionResult::CompileFailure { stderr, .. }
            | ExecutionResult::RuntimeFailure { stderr, .. } => stderr.as_str(),
        }
    }

    /// The error message of a failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::CompileFailure { error, .. }
            | ExecutionResult::RuntimeFailure { error, .. } => Some(error.as_str()),
        }
    }

    /// Diagnostics of a compile failure; empty otherwise.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ExecutionResult::CompileFailure { diagnostics, .. } => diagnostics.as_slice(),
            _ => &[],
        }
    }

    /// Error constructor name of a runtime failure (e.g. "ReferenceError").
    pub fn error_kind(&self) -> Option<String> {
        match self {
            ExecutionResult::RuntimeFailure { stderr, .. } => match parse_script_exception(stderr)
            {
                Some(SandboxError::ScriptException { error_type, .. }) => error_type,
                _ => None,
            },
            _ => None,
        }
    }

    /// Serialize to the JSON shape consumed by callers.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Serialize)]
struct ResultShape<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a [Diagnostic]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<&'a str>,
    stderr: &'a str,
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shape = match self {
            ExecutionResult::Success {
                result,
                stdout,
                stderr,
            } => ResultShape {
                success: true,
                result: Some(result),
                error: None,
                diagnostics: None,
                stdout: Some(stdout.as_str()),
                stderr,
            },
            ExecutionResult::CompileFailure {
                error,
                diagnostics,
                stderr,
            } => ResultShape {
                success: false,
                result: None,
                error: Some(error.as_str()),
                diagnostics: Some(diagnostics.as_slice()),
                stdout: None,
                stderr,
            },
            ExecutionResult::RuntimeFailure { error, stderr } => ResultShape {
                success: false,
                result: None,
                error: Some(error.as_str()),
                diagnostics: None,
                stdout: None,
                stderr,
            },
        };
        shape.serialize(serializer)
    }
}

/// What happened inside a runtime before normalization.
#[derive(Debug)]
pub enum Outcome {
    /// The script settled with a value.
    Completed(Value),
    /// The checker produced error diagnostics.
    Rejected(Vec<Diagnostic>),
    /// Anything else: thrown errors, timeouts, internal failures.
    Failed(SandboxError),
}

/// Map an outcome onto exactly one result shape.
pub fn normalize(outcome: Outcome, capture: &OutputCapture) -> ExecutionResult {
    match outcome {
        Outcome::Completed(result) => ExecutionResult::Success {
            result,
            stdout: capture.stdout(),
            stderr: capture.stderr(),
        },
        Outcome::Rejected(diagnostics) => {
            let stderr = diagnostics
                .iter()
                .map(Diagnostic::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            ExecutionResult::CompileFailure {
                error: TYPE_CHECK_FAILED.to_string(),
                diagnostics,
                stderr,
            }
        }
        Outcome::Failed(err) => ExecutionResult::RuntimeFailure {
            error: err.message(),
            stderr: err.trace(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::io::Stream;
    use serde_json::json;

    #[test]
    fn test_success_carries_joined_output() {
        let capture = OutputCapture::new();
        capture.push(Stream::Stdout, "a");
        capture.push(Stream::Stdout, "b");
        capture.push(Stream::Stderr, "warned");

        let result = normalize(Outcome::Completed(json!(2)), &capture);
        assert!(result.is_success());
        assert_eq!(result.result(), Some(&json!(2)));
        assert_eq!(result.stdout(), "a\nb");
        assert_eq!(result.stderr(), "warned");
    }

    #[test]
    fn test_compile_failure_formats_stderr() {
        let diagnostics = vec![
            Diagnostic {
                line: 1,
                column: 7,
                message: "Type 'string' is not assignable to type 'number'.".into(),
            },
            Diagnostic {
                line: 3,
                column: 1,
                message: "Cannot assign to 'x' because it is a constant.".into(),
            },
        ];
        let result = normalize(Outcome::Rejected(diagnostics), &OutputCapture::new());

        assert!(result.is_compile_failure());
        assert_eq!(result.error(), Some(TYPE_CHECK_FAILED));
        assert_eq!(result.diagnostics().len(), 2);
        assert_eq!(
            result.stderr(),
            "Line 1, Column 7: Type 'string' is not assignable to type 'number'.\n\
             Line 3, Column 1: Cannot assign to 'x' because it is a constant."
        );
    }

    #[test]
    fn test_runtime_failure_from_script_exception() {
        let err = SandboxError::ScriptException {
            error_type: Some("Error".into()),
            message: "boom".into(),
            trace: "Error: boom".into(),
        };
        let result = normalize(Outcome::Failed(err), &OutputCapture::new());

        assert_eq!(result.error(), Some("boom"));
        assert_eq!(result.stderr(), "Error: boom");
        assert_eq!(result.error_kind().as_deref(), Some("Error"));
        assert_eq!(result.stdout(), "");
    }

    #[test]
    fn test_internal_failure_message() {
        let result = normalize(Outcome::Failed(SandboxError::EmptyEmit), &OutputCapture::new());
        assert_eq!(result.error(), Some("Compilation failed to produce output"));
        assert_eq!(result.error_kind(), None);
    }

    #[test]
    fn test_json_shapes() {
        let capture = OutputCapture::new();
        capture.push(Stream::Stdout, "hi");

        let success = normalize(Outcome::Completed(json!(2)), &capture).to_json();
        assert_eq!(
            success,
            json!({"success": true, "result": 2, "stdout": "hi", "stderr": ""})
        );

        let failure = ExecutionResult::RuntimeFailure {
            error: "boom".into(),
            stderr: "Error: boom".into(),
        }
        .to_json();
        assert_eq!(
            failure,
            json!({"success": false, "error": "boom", "stderr": "Error: boom"})
        );

        let compile = normalize(
            Outcome::Rejected(vec![Diagnostic {
                line: 1,
                column: 7,
                message: "m".into(),
            }]),
            &capture,
        )
        .to_json();
        assert_eq!(compile["diagnostics"][0]["line"], json!(1));
        assert_eq!(compile["error"], json!(TYPE_CHECK_FAILED));
        assert!(compile.get("stdout").is_none());
    }
}
