//! Example of concurrent execution with one runtime per task.
//!
//! A runtime runs one call at a time (`execute` takes `&mut self`), so
//! concurrent work uses separate runtimes. Each evaluation runs on tokio's
//! blocking pool, so the tasks below overlap.
//!
//! Run with: cargo run --example concurrent_execution

use std::time::{Duration, Instant};
use script_sandbox_rs::prelude::*;

#[tokio::main]
async fn main() {
    println!("=== Concurrent Execution Example ===\n");

    let config = SandboxConfig::builder()
        .timeout(Duration::from_secs(10))
        .build();

    // (name, language, code, description)
    let tasks = vec![
        (
            "Task 1",
            Language::JavaScript,
            "return Array.from({ length: 100 }, (_, i) => i * i).reduce((a, b) => a + b, 0);",
            "Sum of squares",
        ),
        (
            "Task 2",
            Language::JavaScript,
            "let n = 0; for (let x = 0; x < 1000; x++) if (x % 3 === 0) n++; return n;",
            "Count divisible by 3",
        ),
        (
            "Task 3",
            Language::TypeScript,
            "const letters: string[] = [];\nfor (let i = 0; i < 50; i++) letters.push(String.fromCharCode(65 + (i % 26)));\nconsole.log(letters.join(''));",
            "Generate letters",
        ),
        (
            "Task 4",
            Language::JavaScript,
            "await new Promise(r => setTimeout(r, 50)); return Math.max(...Array.from({ length: 101 }, (_, i) => i * (100 - i)));",
            "Maximum product after a delay",
        ),
    ];

    println!("Starting {} concurrent tasks...\n", tasks.len());
    let start = Instant::now();

    // Spawn all tasks concurrently
    let mut handles = Vec::new();
    for (name, language, code, description) in tasks {
        let config = config.clone();
        let handle = tokio::spawn(async move {
            let mut runtime = runtime_for(language, config);
            let started = Instant::now();
            let result = runtime.execute(code).await;
            (name, language, description, result, started.elapsed())
        });
        handles.push(handle);
    }

    // Collect results
    println!("Results:");
    println!("{:-<60}", "");
    for handle in handles {
        match handle.await {
            Ok((name, language, description, result, duration)) => {
                let output = match result.result() {
                    Some(value) if !value.is_null() => value.to_string(),
                    _ => result.stdout().to_string(),
                };
                println!(
                    "{} [{}]: {} = {} (took {:?})",
                    name, language, description, output, duration
                );
                if let Some(error) = result.error() {
                    println!("  error: {}", error);
                }
            }
            Err(e) => {
                println!("Join error: {}", e);
            }
        }
    }
    println!("{:-<60}", "");

    let total_time = start.elapsed();
    println!("\nTotal wall-clock time: {:?}", total_time);
    println!("(Tasks ran concurrently, so total time < sum of individual times)");
}
