//! Benchmarks for the script sandbox.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use script_sandbox_rs::prelude::*;
use script_sandbox_rs::typescript::{check, compile};
use std::time::Duration;
use tokio::runtime::Runtime;

fn bench_config() -> SandboxConfig {
    SandboxConfig::builder()
        .timeout(Duration::from_secs(30))
        .build()
}

/// Benchmark JavaScript execution. Every call builds a fresh realm.
fn bench_javascript(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut runtime = JavaScriptRuntime::with_config(bench_config());

    let mut group = c.benchmark_group("javascript");

    group.bench_function("simple_return", |b| {
        b.iter(|| {
            let result = rt.block_on(runtime.execute("console.log('hi'); return 1 + 1;"));
            black_box(result)
        });
    });

    group.bench_function("loop_1000", |b| {
        b.iter(|| {
            let result = rt.block_on(
                runtime.execute("let sum = 0; for (let i = 0; i < 1000; i++) sum += i; return sum;"),
            );
            black_box(result)
        });
    });

    group.bench_function("json_roundtrip", |b| {
        b.iter(|| {
            let result = rt.block_on(runtime.execute(
                "const data = Array.from({ length: 100 }, (_, i) => ({ i, s: 'x' + i }));\n\
                 return JSON.parse(JSON.stringify(data)).length;",
            ));
            black_box(result)
        });
    });

    group.finish();
}

/// Benchmark the timer loop with short delays.
fn bench_timers(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut runtime = JavaScriptRuntime::with_config(bench_config());

    let mut group = c.benchmark_group("timers");
    group.sample_size(20);

    for count in [1usize, 10, 50].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("zero_delay", count), count, |b, &count| {
            let code = format!(
                "let fired = 0;\n\
                 await new Promise(resolve => {{\n\
                     for (let i = 0; i < {count}; i++) setTimeout(() => {{ if (++fired === {count}) resolve(); }}, 0);\n\
                 }});\n\
                 return fired;"
            );
            b.iter(|| black_box(rt.block_on(runtime.execute(&code))));
        });
    }

    group.finish();
}

/// Benchmark the TypeScript pipeline stage by stage.
fn bench_typescript(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut runtime = TypeScriptRuntime::with_config(bench_config());
    let options = CompilerOptions::default();
    let source = "interface Point { x: number; y: number }\n\
                  function norm(p: Point): number { return Math.sqrt(p.x * p.x + p.y * p.y); }\n\
                  const points: Point[] = [{ x: 3, y: 4 }, { x: 6, y: 8 }];\n\
                  console.log(points.map(norm).join(','));";

    let mut group = c.benchmark_group("typescript");

    group.bench_function("check", |b| {
        b.iter(|| black_box(check(source, &options)));
    });

    group.bench_function("compile", |b| {
        b.iter(|| black_box(compile(source, &options).unwrap()));
    });

    group.bench_function("execute", |b| {
        b.iter(|| black_box(rt.block_on(runtime.execute(source))));
    });

    group.bench_function("execute_type_error", |b| {
        b.iter(|| black_box(rt.block_on(runtime.execute("const x: number = 'oops';"))));
    });

    group.finish();
}

/// Benchmark independent runtimes running side by side.
fn bench_concurrent_execution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("concurrent");
    group.sample_size(10);

    for concurrency in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(*concurrency as u64));
        group.bench_with_input(
            BenchmarkId::new("executions", concurrency),
            concurrency,
            |b, &concurrency| {
                b.iter(|| {
                    rt.block_on(async {
                        let mut handles = Vec::new();

                        for _ in 0..concurrency {
                            let handle = tokio::spawn(async move {
                                let mut runtime = JavaScriptRuntime::with_config(bench_config());
                                runtime.execute("return 1 + 1;").await
                            });
                            handles.push(handle);
                        }

                        for handle in handles {
                            let result = handle.await.unwrap();
                            black_box(result);
                        }
                    });
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_javascript,
    bench_timers,
    bench_typescript,
    bench_concurrent_execution,
);

criterion_main!(benches);
