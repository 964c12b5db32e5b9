//! Basic example of executing JavaScript in the sandbox.
//!
//! Run with: cargo run --example basic_execution

use std::time::Duration;
use script_sandbox_rs::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Configure the sandbox
    let config = SandboxConfig::builder()
        .timeout(Duration::from_secs(5))
        .build();

    println!("Creating runtime with config: {:?}", config);
    let mut runtime = JavaScriptRuntime::with_config(config);

    // Return a value
    println!("\n=== Test 1: Simple arithmetic ===");
    let result = runtime.execute("console.log('hi'); return 1 + 1;").await;
    println!("success: {}", result.is_success());
    println!("result: {:?}", result.result());
    println!("stdout: {}", result.stdout());

    // Loop with output
    println!("\n=== Test 2: Loop execution ===");
    let code = r#"
for (let i = 0; i < 5; i++) {
    console.log(`Count: ${i}`);
}
return { done: true };
"#;
    let result = runtime.execute(code).await;
    println!("stdout:\n{}", result.stdout());
    println!("result: {:?}", result.result());

    // Await a timer
    println!("\n=== Test 3: Async code ===");
    let code = r#"
const greeting = await new Promise(resolve => setTimeout(() => resolve('hello later'), 20));
console.log(greeting);
return greeting.length;
"#;
    let result = runtime.execute(code).await;
    println!("stdout: {}", result.stdout());
    println!("result: {:?}", result.result());

    // A thrown error
    println!("\n=== Test 4: Thrown error ===");
    let result = runtime.execute("throw new Error('test error');").await;
    println!("error: {:?}", result.error());
    println!("stderr: {}", result.stderr());

    // The JSON shape handed to callers
    println!("\n=== Test 5: JSON result ===");
    let result = runtime.execute("console.warn('careful'); return [1, 2, 3];").await;
    println!("{}", result.to_json());
}
