//! # Script Sandbox
//!
//! Run untrusted JavaScript and TypeScript snippets inside the host process.
//!
//! Code is evaluated by an embedded JavaScript engine (Boa) in a fresh realm
//! per call. TypeScript is type-checked and transpiled with oxc before it
//! reaches the engine. Every call returns an [`ExecutionResult`]; errors are
//! never raised to the caller.
//!
//! - **Whitelisted globals**: only `console`, timers, `Date`, `Math`, `JSON`
//!   and the core value types are visible; everything else is a
//!   `ReferenceError`
//! - **Output capture**: `console` writes to per-call stdout/stderr buffers
//! - **Strict mode**: every snippet runs as a strict async function body
//! - **Time limits**: a wall-clock budget per call plus engine loop and
//!   recursion limits
//! - **Type checking**: TypeScript errors come back as positioned diagnostics
//!
//! ## Example
//!
//! ```rust,no_run
//! use script_sandbox_rs::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SandboxConfig::builder()
//!         .timeout(Duration::from_secs(5))
//!         .build();
//!
//!     let mut runtime = JavaScriptRuntime::with_config(config);
//!     let result = runtime.execute("console.log('hi'); return 1 + 1;").await;
//!
//!     assert!(result.is_success());
//!     assert_eq!(result.stdout(), "hi");
//!
//!     let mut typescript = TypeScriptRuntime::new();
//!     let result = typescript.execute("const x: number = 'oops';").await;
//!     assert!(result.is_compile_failure());
//! }
//! ```
//!
//! ## Security Model
//!
//! 1. **Fresh realm per call**: nothing a script defines survives the call
//! 2. **Pruned global object**: host-capable identifiers do not exist
//! 3. **Bounded execution**: timeouts cancel the call; loop limits stop
//!    synchronous spins on the worker thread
//! 4. **No evaluation on type errors**: a rejected TypeScript source never runs

pub mod error;
pub mod prelude;
pub mod runtime;
pub mod sandbox;
pub mod typescript;

// Re-export main types at crate root for convenience
pub use error::{Result, SandboxError};
pub use runtime::{runtime_for, Language, ScriptRuntime};
pub use sandbox::config::{SandboxConfig, SandboxConfigBuilder};
pub use sandbox::executor::JavaScriptRuntime;
pub use sandbox::io::OutputCapture;
pub use sandbox::result::{Diagnostic, ExecutionResult, TYPE_CHECK_FAILED};
pub use typescript::{CompilerOptions, TypeScriptRuntime};
