//! Example of type-checking and running TypeScript.
//!
//! Run with: cargo run --example typescript_execution

use std::time::Duration;
use script_sandbox_rs::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SandboxConfig::builder()
        .timeout(Duration::from_secs(5))
        .build();
    let mut runtime = TypeScriptRuntime::with_config(config);

    println!("=== Test 1: Clean program ===");
    let code = r#"
interface Item { name: string; price: number }

function total(items: Item[]): number {
    return items.reduce((sum, item) => sum + item.price, 0);
}

const cart: Item[] = [{ name: 'pen', price: 2 }, { name: 'book', price: 12 }];
console.log(`total: ${total(cart)}`);
export const count = cart.length;
"#;
    let result = runtime.execute(code).await;
    println!("success: {}", result.is_success());
    println!("stdout: {}", result.stdout());

    println!("\n=== Test 2: Type errors ===");
    let code = r#"
const limit: number = 'ten';
function greet(name: string): string {
    return `hi ${name}`;
}
greet(42);
limit = 11;
"#;
    let result = runtime.execute(code).await;
    println!("error: {:?}", result.error());
    for diagnostic in result.diagnostics() {
        println!("  {}", diagnostic);
    }

    println!("\n=== Test 3: Chained diagnostic ===");
    let result = runtime
        .execute("let words = ['a', 'b'];\nlet ids: number[] = words;")
        .await;
    println!("stderr:\n{}", result.stderr());

    println!("\n=== Test 4: Runtime error after a clean compile ===");
    let result = runtime
        .execute("const parts: string[] = [];\nconsole.log(parts[0].length);")
        .await;
    println!("error: {:?}", result.error());

    println!(
        "\nFiles left in the virtual project: {}",
        runtime.project().file_count()
    );
}
