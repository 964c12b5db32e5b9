//! JavaScript runtime: executes untrusted JavaScript in the sandbox.

use tracing::{debug, instrument};

use crate::sandbox::config::SandboxConfig;
use crate::sandbox::io::OutputCapture;
use crate::sandbox::result::{normalize, ExecutionResult, Outcome};
use crate::sandbox::script;

/// A sandboxed JavaScript execution environment.
///
/// Each [`execute`](Self::execute) call evaluates the source in a fresh
/// realm, so nothing a script defines is visible to the next call. The
/// instance owns the output capture, and `&mut self` keeps calls from
/// overlapping.
pub struct JavaScriptRuntime {
    config: SandboxConfig,
    capture: OutputCapture,
}

impl JavaScriptRuntime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SandboxConfig::default())
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: SandboxConfig) -> Self {
        Self {
            config,
            capture: OutputCapture::new(),
        }
    }

    /// The configuration this runtime was built with.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute JavaScript code in the sandbox.
    ///
    /// The code is the body of an async function: it may `await` and
    /// `return`. The returned value is converted to JSON; every failure is
    /// reported as [`ExecutionResult::RuntimeFailure`].
    #[instrument(skip(self, code), fields(code_len = code.len()))]
    pub async fn execute(&mut self, code: &str) -> ExecutionResult {
        self.capture.reset();

        let outcome = script::run(code, &self.config, &self.capture).await;
        let result = normalize(outcome, &self.capture);
        debug!(success = result.is_success(), "javascript execution finished");

        if matches!(result, ExecutionResult::RuntimeFailure { .. }) {
            self.detach_capture();
        }
        result
    }

    /// Swap in fresh buffers so a worker abandoned on timeout cannot write
    /// into the next call's output.
    fn detach_capture(&mut self) {
        self.capture = OutputCapture::new();
    }
}

impl Default for JavaScriptRuntime {
    fn default() -> Self {
        Self::new()
    }
}
