//! Example demonstrating resource limiting capabilities.
//!
//! This example shows how to configure and handle:
//! - Timeouts for long-running code
//! - Engine loop iteration limits
//! - Recursion limits
//!
//! Run with: cargo run --example resource_limits

use std::time::{Duration, Instant};
use script_sandbox_rs::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Resource Limits Example ===\n");

    // Example 1: Timeout protection
    println!("--- Test 1: Timeout Protection ---");
    {
        let config = SandboxConfig::builder()
            .timeout(Duration::from_millis(500)) // Short timeout
            .build();
        let mut runtime = JavaScriptRuntime::with_config(config);

        println!("Awaiting a timer that never fires in time with a 500ms timeout...");
        let start = Instant::now();
        let result = runtime
            .execute("await new Promise(r => setTimeout(r, 60000));")
            .await;
        println!("error: {:?} after {:?}", result.error(), start.elapsed());
    }
    println!();

    // Example 2: Loop iteration limit
    println!("--- Test 2: Loop Iteration Limit ---");
    {
        let config = SandboxConfig::builder()
            .no_timeout()
            .loop_iteration_limit(1_000_000)
            .build();
        let mut runtime = JavaScriptRuntime::with_config(config);

        println!("Executing an infinite loop with no timeout and a 1M iteration limit...");
        let result = runtime.execute("while (true) {}").await;
        println!("error: {:?}", result.error());

        let result = runtime
            .execute("let n = 0; for (let i = 0; i < 500000; i++) n += i; return n;")
            .await;
        println!("bounded loop result: {:?}", result.result());
    }
    println!();

    // Example 3: Recursion limit
    println!("--- Test 3: Recursion Limit ---");
    {
        let config = SandboxConfig::builder()
            .timeout(Duration::from_secs(5))
            .recursion_limit(256)
            .build();
        let mut runtime = JavaScriptRuntime::with_config(config);

        let result = runtime
            .execute("function depth(n) { return n === 0 ? 0 : 1 + depth(n - 1); } return depth(100);")
            .await;
        println!("depth(100): {:?}", result.result());

        let result = runtime
            .execute("function depth(n) { return n === 0 ? 0 : 1 + depth(n - 1); } return depth(10000);")
            .await;
        println!("depth(10000) error: {:?}", result.error());
    }
    println!();

    // Example 4: Interval throttling
    println!("--- Test 4: Minimum Timer Interval ---");
    {
        let config = SandboxConfig::builder()
            .timeout(Duration::from_secs(5))
            .min_timer_interval(Duration::from_millis(20))
            .build();
        let mut runtime = JavaScriptRuntime::with_config(config);

        let start = Instant::now();
        let code = r#"
let ticks = 0;
await new Promise(resolve => {
    const id = setInterval(() => {
        if (++ticks === 5) { clearInterval(id); resolve(); }
    }, 0);
});
return ticks;
"#;
        let result = runtime.execute(code).await;
        println!(
            "5 zero-delay ticks took {:?} (result {:?})",
            start.elapsed(),
            result.result()
        );
    }

    println!("\n=== Resource Limits Example Complete ===");
}
