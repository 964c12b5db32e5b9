//! The TypeScript runtime.

use tracing::{debug, instrument};

use crate::error::SandboxError;
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::io::OutputCapture;
use crate::sandbox::result::{normalize, ExecutionResult, Outcome};
use crate::sandbox::script;
use crate::typescript::options::CompilerOptions;
use crate::typescript::project::VirtualProject;
use crate::typescript::{compile, Compilation};

/// A sandboxed TypeScript execution environment.
///
/// Each call registers the source as the project's only file, type-checks
/// it, and runs the emitted JavaScript the same way
/// [`JavaScriptRuntime`](crate::JavaScriptRuntime) does. Type errors are
/// reported as diagnostics and nothing is evaluated. The file is removed
/// before `execute` returns, whatever the outcome.
pub struct TypeScriptRuntime {
    config: SandboxConfig,
    options: CompilerOptions,
    project: VirtualProject,
    capture: OutputCapture,
}

impl TypeScriptRuntime {
    /// Create a runtime with default sandbox and compiler settings.
    pub fn new() -> Self {
        Self::with_options(SandboxConfig::default(), CompilerOptions::default())
    }

    /// Create a runtime with the given sandbox configuration.
    pub fn with_config(config: SandboxConfig) -> Self {
        Self::with_options(config, CompilerOptions::default())
    }

    /// Create a runtime with explicit sandbox and compiler settings.
    pub fn with_options(config: SandboxConfig, options: CompilerOptions) -> Self {
        Self {
            config,
            options,
            project: VirtualProject::new(),
            capture: OutputCapture::new(),
        }
    }

    /// The sandbox configuration used to run emitted JavaScript.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// The compiler options applied when checking and transpiling.
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// The in-memory project. Empty whenever no call is in flight.
    pub fn project(&self) -> &VirtualProject {
        &self.project
    }

    /// Type-check, transpile and execute TypeScript code.
    #[instrument(skip(self, code), fields(code_len = code.len()))]
    pub async fn execute(&mut self, code: &str) -> ExecutionResult {
        self.capture.reset();

        let outcome = {
            let slot = self.project.open_slot(&self.options.file_name, code);
            let source = slot.source().to_string();
            let options = self.options.clone();

            let compiled = tokio::task::spawn_blocking(move || compile(&source, &options)).await;
            match compiled {
                Ok(Ok(Compilation::Emitted(javascript))) => {
                    debug!(emitted_len = javascript.len(), "type check passed");
                    script::run(&javascript, &self.config, &self.capture).await
                }
                Ok(Ok(Compilation::Rejected(diagnostics))) => {
                    debug!(count = diagnostics.len(), "type check failed");
                    Outcome::Rejected(diagnostics)
                }
                Ok(Err(err)) => Outcome::Failed(err),
                Err(e) => Outcome::Failed(SandboxError::ExecutionFailed(format!(
                    "compiler panicked: {}",
                    e
                ))),
            }
        };

        let result = normalize(outcome, &self.capture);
        if matches!(result, ExecutionResult::RuntimeFailure { .. }) {
            self.capture = OutputCapture::new();
        }
        result
    }
}

impl Default for TypeScriptRuntime {
    fn default() -> Self {
        Self::new()
    }
}
