//! TypeScript runtime: type-check, transpile, then run in the JavaScript sandbox.

pub mod checker;
pub mod diagnostics;
pub mod executor;
pub mod globals;
pub mod options;
pub mod project;
pub mod transpile;
pub mod types;

use crate::error::{Result, SandboxError};
use crate::sandbox::result::Diagnostic;

pub use checker::check;
pub use executor::TypeScriptRuntime;
pub use options::CompilerOptions;
pub use project::{CompilationSlot, VirtualProject};
pub use transpile::transpile;

/// What compiling one source produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Compilation {
    /// Type checking passed; the emitted JavaScript.
    Emitted(String),
    /// Type checking failed with these error diagnostics.
    Rejected(Vec<Diagnostic>),
}

/// Check and, if clean, transpile `source`.
pub fn compile(source: &str, options: &CompilerOptions) -> Result<Compilation> {
    let diagnostics = check(source, options);
    if !diagnostics.is_empty() {
        return Ok(Compilation::Rejected(diagnostics));
    }

    let javascript = transpile(source, options)?;
    if javascript.trim().is_empty() {
        return Err(SandboxError::EmptyEmit);
    }
    Ok(Compilation::Emitted(javascript))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_clean_source() {
        let compiled = compile("const n: number = 2; console.log(n);", &CompilerOptions::default());
        assert!(matches!(compiled, Ok(Compilation::Emitted(js)) if js.contains("console.log(n)")));
    }

    #[test]
    fn test_compile_rejects_type_errors() {
        match compile("const x: number = 'oops';", &CompilerOptions::default()) {
            Ok(Compilation::Rejected(diagnostics)) => assert_eq!(diagnostics[0].line, 1),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_compile_empty_emit() {
        let compiled = compile("type Only = string;", &CompilerOptions::default());
        assert!(matches!(compiled, Err(SandboxError::EmptyEmit)));
    }
}
