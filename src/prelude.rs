//! Prelude module for convenient imports.

pub use crate::error::{Result, SandboxError};
pub use crate::runtime::{runtime_for, Language, ScriptRuntime};
pub use crate::sandbox::{
    config::SandboxConfig,
    executor::JavaScriptRuntime,
    result::{Diagnostic, ExecutionResult},
};
pub use crate::typescript::{CompilerOptions, TypeScriptRuntime};
