//! Language selection over the two runtimes.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::SandboxError;
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::executor::JavaScriptRuntime;
use crate::sandbox::result::ExecutionResult;
use crate::typescript::TypeScriptRuntime;

/// Source languages the sandbox can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
}

impl Language {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "js" | "javascript" => Ok(Language::JavaScript),
            "ts" | "typescript" => Ok(Language::TypeScript),
            other => Err(SandboxError::Config(format!("unsupported language: {}", other))),
        }
    }
}

/// A runtime that executes source text of one language.
#[async_trait]
pub trait ScriptRuntime: Send {
    /// The language this runtime accepts.
    fn language(&self) -> Language;

    /// Execute `code`; never fails, every error is folded into the result.
    async fn execute(&mut self, code: &str) -> ExecutionResult;
}

#[async_trait]
impl ScriptRuntime for JavaScriptRuntime {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    async fn execute(&mut self, code: &str) -> ExecutionResult {
        JavaScriptRuntime::execute(self, code).await
    }
}

#[async_trait]
impl ScriptRuntime for TypeScriptRuntime {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    async fn execute(&mut self, code: &str) -> ExecutionResult {
        TypeScriptRuntime::execute(self, code).await
    }
}

/// Build the runtime for `language`.
pub fn runtime_for(language: Language, config: SandboxConfig) -> Box<dyn ScriptRuntime> {
    match language {
        Language::JavaScript => Box::new(JavaScriptRuntime::with_config(config)),
        Language::TypeScript => Box::new(TypeScriptRuntime::with_config(config)),
    }
}
