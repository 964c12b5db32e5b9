//! Script invocation on the engine worker.
//!
//! Every call gets a fresh realm. The user's source becomes the body of an
//! async function whose parameters are the sandbox bindings; the function is
//! called once and its promise is driven to completion by firing jobs and
//! timers on this thread.

use boa_engine::{
    builtins::promise::PromiseState, object::builtins::JsPromise, Context, JsError,
    JsObject, JsString, JsValue, Source,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{parse_script_exception, Result, SandboxError};
use crate::sandbox::bindings::{build_sandbox, SandboxBindings};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::io::{OutputCapture, Stream};
use crate::sandbox::limits::{ContextLimitsExt, ExecutionBudget};
use crate::sandbox::result::Outcome;
use crate::sandbox::timers::TimerQueue;

/// Directive prepended to every script body.
const STRICT_PROLOGUE: &str = "\"use strict\";\n";

/// Run `code` on a blocking worker and wait for it under the configured timeout.
///
/// On timeout the worker's budget is cancelled and the worker is abandoned.
/// It stops at its next timer boundary or when a loop trips the iteration
/// limit; the engine cannot be interrupted otherwise, so straight-line work
/// below that limit keeps the blocking thread busy until it completes.
pub async fn run(code: &str, config: &SandboxConfig, capture: &OutputCapture) -> Outcome {
    let budget = ExecutionBudget::start(config.timeout);

    let code = code.to_string();
    let worker_config = config.clone();
    let worker_capture = capture.clone();
    let worker_budget = budget.clone();
    let handle = tokio::task::spawn_blocking(move || {
        evaluate(&code, &worker_config, &worker_capture, &worker_budget)
    });

    let joined = match config.timeout {
        Some(timeout) => tokio::select! {
            joined = handle => joined,
            _ = tokio::time::sleep(timeout) => {
                budget.cancel();
                warn!(?timeout, "script exceeded its time budget");
                return Outcome::Failed(SandboxError::Timeout(timeout));
            }
        },
        None => handle.await,
    };

    let result = match joined {
        Ok(inner) => inner,
        Err(e) => Err(SandboxError::ExecutionFailed(format!("task panicked: {}", e))),
    };

    match result {
        Ok(value) => Outcome::Completed(value),
        Err(err) if err.is_timeout() => {
            warn!(error = %err, "script stopped by its budget");
            Outcome::Failed(err)
        }
        Err(err) => {
            debug!(error = %err, script_exception = err.is_script_exception(), "script failed");
            Outcome::Failed(err)
        }
    }
}

/// Evaluate `code` to completion on the current thread.
pub fn evaluate(
    code: &str,
    config: &SandboxConfig,
    capture: &OutputCapture,
    budget: &ExecutionBudget,
) -> Result<Value> {
    let mut context = Context::default();
    context.configure_limits(config);

    let timers = TimerQueue::new(config.min_timer_interval);
    let bindings = build_sandbox(&mut context, capture, &timers).map_err(|e| {
        SandboxError::RuntimeInit(anyhow::anyhow!("failed to build sandbox: {}", e))
    })?;

    let function = compile_body(&mut context, &bindings, code)?;
    let returned = function
        .call(&JsValue::undefined(), bindings.values(), &mut context)
        .map_err(|e| describe_error(e, &mut context))?;

    let promise = returned
        .as_object()
        .cloned()
        .and_then(|object| JsPromise::from_object(object).ok())
        .ok_or_else(|| {
            SandboxError::ExecutionFailed("script function did not return a promise".into())
        })?;

    let value = settle(&promise, &timers, capture, budget, &mut context)?;
    Ok(to_json(&value, bindings.stringify(), &mut context))
}

/// Build the async function `(…bindings) => { "use strict"; code }`.
///
/// The body is handed to the realm's own `AsyncFunction` constructor, so it is
/// parsed as a function body on its own and cannot close the wrapper early.
fn compile_body(
    context: &mut Context,
    bindings: &SandboxBindings,
    code: &str,
) -> Result<JsObject> {
    let constructor = context
        .eval(Source::from_bytes("(async function () {}).constructor"))
        .map_err(|e| SandboxError::RuntimeInit(anyhow::anyhow!("{}", e)))?;
    let constructor = constructor.as_callable().cloned().ok_or_else(|| {
        SandboxError::RuntimeInit(anyhow::anyhow!("AsyncFunction constructor is unavailable"))
    })?;

    let mut args: Vec<JsValue> = bindings
        .names()
        .iter()
        .map(|name| JsValue::from(JsString::from(*name)))
        .collect();
    args.push(JsValue::from(JsString::from(format!(
        "{STRICT_PROLOGUE}{code}"
    ))));

    let function = constructor
        .call(&JsValue::undefined(), &args, context)
        .map_err(|e| describe_error(e, context))?;
    function.as_callable().cloned().ok_or_else(|| {
        SandboxError::ExecutionFailed("script body did not compile to a function".into())
    })
}

/// Drive the top-level promise until it settles.
fn settle(
    promise: &JsPromise,
    timers: &TimerQueue,
    capture: &OutputCapture,
    budget: &ExecutionBudget,
    context: &mut Context,
) -> Result<JsValue> {
    loop {
        context.run_jobs();

        match promise.state() {
            PromiseState::Fulfilled(value) => return Ok(value),
            PromiseState::Rejected(reason) => return Err(describe_value(&reason, context)),
            PromiseState::Pending => {}
        }

        let Some(due) = timers.next_due() else {
            return Err(SandboxError::Unsettled);
        };
        if !budget.sleep_until(due) {
            return Err(SandboxError::Timeout(budget.timeout().unwrap_or_default()));
        }

        if let Some(timer) = timers.pop_due() {
            if let Err(err) = timer.fire(context) {
                let err = describe_error(err, context);
                capture.push(Stream::Stderr, format!("Uncaught {}", err.trace()));
            }
        }
    }
}

/// Convert an engine error into a script exception.
pub fn describe_error(err: JsError, context: &mut Context) -> SandboxError {
    if let Some(value) = err.as_opaque() {
        return describe_value(value, context);
    }
    // Runtime limit errors must not be materialized into script values.
    let rendered = err.to_string();
    SandboxError::from_script_stderr(&rendered)
}

/// Convert a thrown or rejected value into a script exception.
pub fn describe_value(value: &JsValue, context: &mut Context) -> SandboxError {
    let rendered = match value.to_string(context) {
        Ok(s) => s.to_std_string_escaped(),
        Err(_) => value.display().to_string(),
    };

    let Some(object) = value.as_object().cloned() else {
        return exception(rendered.clone(), rendered);
    };

    let message = string_property(&object, "message", context).unwrap_or_else(|| rendered.clone());
    let trace = string_property(&object, "stack", context)
        .filter(|stack| !stack.is_empty())
        .unwrap_or(rendered);
    exception(message, trace)
}

fn string_property(object: &JsObject, key: &str, context: &mut Context) -> Option<String> {
    let value = object.get(JsString::from(key), context).ok()?;
    value.as_string().map(JsString::to_std_string_escaped)
}

fn exception(message: String, trace: String) -> SandboxError {
    let error_type = match parse_script_exception(&trace) {
        Some(SandboxError::ScriptException { error_type, .. }) => error_type,
        _ => None,
    };
    SandboxError::ScriptException {
        error_type,
        message,
        trace,
    }
}

/// Convert a settled value to JSON with the realm's original `JSON.stringify`.
///
/// `undefined`, functions and symbols become `null`; values `JSON.stringify`
/// refuses (cycles, BigInt) fall back to their display string.
fn to_json(value: &JsValue, stringify: &JsObject, context: &mut Context) -> Value {
    if value.is_undefined() {
        return Value::Null;
    }

    match stringify.call(&JsValue::undefined(), &[value.clone()], context) {
        Ok(json) => match json.as_string() {
            Some(text) => serde_json::from_str(&text.to_std_string_escaped())
                .unwrap_or_else(|_| Value::String(value.display().to_string())),
            None => Value::Null,
        },
        Err(_) => Value::String(value.display().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn eval(code: &str) -> (Result<Value>, OutputCapture) {
        let config = SandboxConfig::builder()
            .timeout(Duration::from_secs(5))
            .build();
        let capture = OutputCapture::new();
        let budget = ExecutionBudget::start(config.timeout);
        (evaluate(code, &config, &capture, &budget), capture)
    }

    #[test]
    fn test_returns_value() {
        let (result, capture) = eval("console.log('hi'); return 1 + 1;");
        assert_eq!(result.unwrap(), json!(2));
        assert_eq!(capture.stdout(), "hi");
    }

    #[test]
    fn test_no_return_is_null() {
        let (result, _) = eval("const x = 1;");
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn test_objects_become_json() {
        let (result, _) = eval("return { a: [1, 'two', null], b: true };");
        assert_eq!(result.unwrap(), json!({"a": [1, "two", null], "b": true}));
    }

    #[test]
    fn test_functions_become_null() {
        let (result, _) = eval("return () => 1;");
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn test_thrown_error_message() {
        let (result, _) = eval("throw new Error('boom');");
        match result {
            Err(SandboxError::ScriptException {
                error_type,
                message,
                trace,
            }) => {
                assert_eq!(error_type.as_deref(), Some("Error"));
                assert_eq!(message, "boom");
                assert!(trace.contains("boom"));
            }
            other => panic!("expected script exception, got {:?}", other),
        }
    }

    #[test]
    fn test_thrown_string() {
        let (result, _) = eval("throw 'plain';");
        let err = result.unwrap_err();
        assert_eq!(err.message(), "plain");
    }

    #[test]
    fn test_await_timer() {
        let (result, _) = eval(
            "const v = await new Promise(resolve => setTimeout(() => resolve(7), 5)); return v;",
        );
        assert_eq!(result.unwrap(), json!(7));
    }

    #[test]
    fn test_interval_cleared() {
        let (result, capture) = eval(
            "let n = 0;
             await new Promise(resolve => {
                 const id = setInterval(() => {
                     n += 1;
                     console.log('tick ' + n);
                     if (n === 3) { clearInterval(id); resolve(); }
                 }, 1);
             });
             return n;",
        );
        assert_eq!(result.unwrap(), json!(3));
        assert_eq!(capture.stdout(), "tick 1\ntick 2\ntick 3");
    }

    #[test]
    fn test_never_settling_promise() {
        let (result, _) = eval("await new Promise(() => {});");
        assert!(matches!(result, Err(SandboxError::Unsettled)));
    }

    #[test]
    fn test_uncaught_timer_error_goes_to_stderr() {
        let (result, capture) = eval(
            "setTimeout(() => { throw new Error('late'); }, 1);
             await new Promise(resolve => setTimeout(resolve, 5));
             return 'done';",
        );
        assert_eq!(result.unwrap(), json!("done"));
        assert!(capture.stderr().starts_with("Uncaught "));
        assert!(capture.stderr().contains("late"));
    }

    #[test]
    fn test_body_cannot_escape_wrapper() {
        let (result, _) = eval("}); (function () {");
        assert!(matches!(result, Err(SandboxError::ScriptException { .. })));
    }

    #[test]
    fn test_loop_limit_stops_busy_loop() {
        let config = SandboxConfig::builder()
            .loop_iteration_limit(1_000)
            .build();
        let capture = OutputCapture::new();
        let budget = ExecutionBudget::unbounded();

        let result = evaluate("while (true) {}", &config, &capture, &budget);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_times_out_on_pending_timers() {
        let config = SandboxConfig::builder()
            .timeout(Duration::from_millis(50))
            .build();
        let capture = OutputCapture::new();

        let outcome = run(
            "await new Promise(resolve => setTimeout(resolve, 10000));",
            &config,
            &capture,
        )
        .await;
        assert!(matches!(outcome, Outcome::Failed(SandboxError::Timeout(_))));
    }
}
