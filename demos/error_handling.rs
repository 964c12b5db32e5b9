//! Example demonstrating error handling patterns.
//!
//! `execute` never returns `Err`; this example shows how to tell the
//! failure shapes apart:
//! - Thrown JavaScript errors
//! - Rejected promises and values that are not errors
//! - TypeScript diagnostics
//! - Internal failures (timeouts, empty emit)
//!
//! Run with: cargo run --example error_handling

use std::time::Duration;
use script_sandbox_rs::error::parse_script_exception;
use script_sandbox_rs::prelude::*;

#[tokio::main]
async fn main() {
    println!("=== Error Handling Example ===\n");

    let config = SandboxConfig::builder()
        .timeout(Duration::from_secs(5))
        .build();
    let mut javascript = JavaScriptRuntime::with_config(config.clone());
    let mut typescript = TypeScriptRuntime::with_config(config);

    // Example 1: TypeError
    println!("--- Test 1: TypeError ---");
    {
        let result = javascript.execute("const value = null; return value.length;").await;

        if !result.is_success() {
            println!("error: {}", result.error().unwrap_or_default());
            println!("stderr: {}", result.stderr());

            if let Some(SandboxError::ScriptException {
                error_type,
                message,
                trace,
            }) = parse_script_exception(result.stderr())
            {
                println!("\nParsed exception:");
                println!("  Type: {:?}", error_type);
                println!("  Message: {}", message);
                println!("  Trace lines: {}", trace.lines().count());
            }
        }
    }
    println!();

    // Example 2: ReferenceError from a blocked global
    println!("--- Test 2: ReferenceError ---");
    {
        let result = javascript.execute("return document.title;").await;
        println!("kind: {:?}", result.error_kind());
        println!("error: {:?}", result.error());
    }
    println!();

    // Example 3: Rejected promise
    println!("--- Test 3: Rejected promise ---");
    {
        let code = "await new Promise((_, reject) => setTimeout(() => reject(new RangeError('too far')), 10));";
        let result = javascript.execute(code).await;
        println!("kind: {:?}", result.error_kind());
        println!("error: {:?}", result.error());
    }
    println!();

    // Example 4: Throwing something that is not an Error
    println!("--- Test 4: Thrown plain value ---");
    {
        let result = javascript.execute("throw { code: 42 };").await;
        println!("error: {:?}", result.error());
        println!("kind: {:?}", result.error_kind());
    }
    println!();

    // Example 5: Custom error class
    println!("--- Test 5: Custom Error ---");
    {
        let code = r#"
class ValidationError extends Error {
    constructor(message) {
        super(message);
        this.name = 'ValidationError';
    }
}
throw new ValidationError('This is a custom error with details');
"#;
        let result = javascript.execute(code).await;
        println!("kind: {:?}", result.error_kind());
        println!("error: {:?}", result.error());
    }
    println!();

    // Example 6: TypeScript diagnostics
    println!("--- Test 6: TypeScript diagnostics ---");
    {
        let result = typescript
            .execute("function square(n: number): number { return n * n; }\nsquare('4');\nsquare();")
            .await;

        if result.is_compile_failure() {
            println!("error: {}", result.error().unwrap_or_default());
            for diagnostic in result.diagnostics() {
                println!("  line {}, column {}: {}", diagnostic.line, diagnostic.column, diagnostic.message);
            }
        }
    }
    println!();

    // Example 7: Internal failures
    println!("--- Test 7: Internal failures ---");
    {
        let result = typescript.execute("type Nothing = never;").await;
        println!("empty emit: {:?}", result.error());

        let result = javascript.execute("await new Promise(() => {});").await;
        println!("unsettled: {:?}", result.error());
    }
    println!();

    // Example 8: Recovery after errors
    println!("--- Test 8: Recovery after errors ---");
    {
        let result = javascript.execute("return 'still working';").await;
        println!("result: {:?}", result.result());
        println!("JSON: {}", result.to_json());
    }

    println!("\n=== Error Handling Example Complete ===");
}
