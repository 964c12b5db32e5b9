//! Sandbox environment: the whitelisted globals visible to untrusted code.

use boa_engine::{
    js_string,
    object::{builtins::JsArray, FunctionObjectBuilder, ObjectInitializer},
    Context, JsNativeError, JsObject, JsResult, JsString,
    JsValue, NativeFunction, Source,
};
use boa_gc::{Finalize, Trace};

use crate::sandbox::io::{OutputCapture, Stream};
use crate::sandbox::timers::TimerQueue;

/// Engine intrinsics passed through to user code unchanged.
pub const INTRINSIC_BINDINGS: &[&str] = &[
    "Date",
    "Math",
    "JSON",
    "Object",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Symbol",
    "BigInt",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "Promise",
    "RegExp",
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "ReferenceError",
    "EvalError",
    "URIError",
    "AggregateError",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
];

/// Bindings implemented by the sandbox itself.
pub const HOST_BINDINGS: &[&str] = &[
    "console",
    "setTimeout",
    "clearTimeout",
    "setInterval",
    "clearInterval",
];

/// Non-configurable value properties of the global object.
const GLOBAL_CONSTANTS: &[&str] = &["undefined", "NaN", "Infinity"];

/// Removes every own property of the global object that is not listed.
const PRUNE_GLOBALS: &str = r#"(function (g, keep) {
    var names = Object.getOwnPropertyNames(g);
    for (var i = 0; i < names.length; i++) {
        if (keep.indexOf(names[i]) === -1) {
            delete g[names[i]];
        }
    }
})"#;

/// The whitelisted identifiers and their values for one execution.
///
/// Built fresh per call and never reused, so nothing a script does to a
/// binding survives into the next call.
pub struct SandboxBindings {
    names: Vec<&'static str>,
    values: Vec<JsValue>,
    stringify: JsObject,
}

impl SandboxBindings {
    /// Binding names, in parameter order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Binding values, positionally matched to [`names`](Self::names).
    pub fn values(&self) -> &[JsValue] {
        &self.values
    }

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Option<&JsValue> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| &self.values[i])
    }

    /// The realm's original `JSON.stringify`, captured before user code runs.
    pub fn stringify(&self) -> &JsObject {
        &self.stringify
    }
}

/// Build the sandbox for one execution.
///
/// Reads the whitelisted intrinsics, wires `console` to `capture` and the
/// timer functions to `timers`, then strips everything else off the global
/// object so unlisted identifiers raise `ReferenceError`.
pub fn build_sandbox(
    context: &mut Context,
    capture: &OutputCapture,
    timers: &TimerQueue,
) -> JsResult<SandboxBindings> {
    let global = context.global_object();

    let mut names = Vec::with_capacity(HOST_BINDINGS.len() + INTRINSIC_BINDINGS.len());
    let mut values = Vec::with_capacity(names.capacity());

    for name in INTRINSIC_BINDINGS {
        let value = global.get(JsString::from(*name), context)?;
        names.push(*name);
        values.push(value);
    }

    let stringify = global
        .get(js_string!("JSON"), context)?
        .as_object()
        .map(|json| json.get(js_string!("stringify"), context))
        .transpose()?
        .and_then(|f| f.as_callable().cloned())
        .ok_or_else(|| JsNativeError::typ().with_message("JSON.stringify is unavailable"))?;

    let console = build_console(context, capture, &stringify);
    let host_values = [
        JsValue::from(console),
        function_value(context, timers.set_timeout_fn(), "setTimeout", 2),
        function_value(context, timers.clear_fn(), "clearTimeout", 1),
        function_value(context, timers.set_interval_fn(), "setInterval", 2),
        function_value(context, timers.clear_fn(), "clearInterval", 1),
    ];
    for (name, value) in HOST_BINDINGS.iter().zip(host_values) {
        names.push(*name);
        values.push(value);
    }

    prune_globals(context, &global)?;

    Ok(SandboxBindings {
        names,
        values,
        stringify,
    })
}

fn prune_globals(context: &mut Context, global: &JsObject) -> JsResult<()> {
    let keep: Vec<JsValue> = INTRINSIC_BINDINGS
        .iter()
        .chain(GLOBAL_CONSTANTS)
        .map(|name| JsValue::from(JsString::from(*name)))
        .collect();
    let keep = JsArray::from_iter(keep, context);

    let prune = context.eval(Source::from_bytes(PRUNE_GLOBALS))?;
    let prune = prune
        .as_callable()
        .ok_or_else(|| JsNativeError::typ().with_message("global pruning is not callable"))?;
    prune.call(
        &JsValue::undefined(),
        &[JsValue::from(global.clone()), JsValue::from(keep)],
        context,
    )?;
    Ok(())
}

fn function_value(
    context: &mut Context,
    function: NativeFunction,
    name: &str,
    length: usize,
) -> JsValue {
    FunctionObjectBuilder::new(context.realm(), function)
        .name(JsString::from(name))
        .length(length)
        .constructor(false)
        .build()
        .into()
}

#[derive(Trace, Finalize)]
struct ConsoleWriter {
    #[unsafe_ignore_trace]
    capture: OutputCapture,
    #[unsafe_ignore_trace]
    stream: Stream,
    stringify: JsObject,
}

impl ConsoleWriter {
    fn write(&self, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let parts: Vec<String> = args
            .iter()
            .map(|arg| format_console_arg(arg, &self.stringify, context))
            .collect();
        self.capture.push(self.stream, parts.join(" "));
        Ok(JsValue::undefined())
    }
}

fn build_console(context: &mut Context, capture: &OutputCapture, stringify: &JsObject) -> JsObject {
    let writer = |stream| {
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, writer: &ConsoleWriter, context| writer.write(args, context),
            ConsoleWriter {
                capture: capture.clone(),
                stream,
                stringify: stringify.clone(),
            },
        )
    };

    ObjectInitializer::new(context)
        .function(writer(Stream::Stdout), js_string!("log"), 0)
        .function(writer(Stream::Stdout), js_string!("info"), 0)
        .function(writer(Stream::Stdout), js_string!("debug"), 0)
        .function(writer(Stream::Stderr), js_string!("error"), 0)
        .function(writer(Stream::Stderr), js_string!("warn"), 0)
        .build()
}

/// Render one console argument: strings verbatim, objects as JSON,
/// everything else through `String()`.
pub fn format_console_arg(value: &JsValue, stringify: &JsObject, context: &mut Context) -> String {
    if let Some(s) = value.as_string() {
        return s.to_std_string_escaped();
    }

    if value.is_object() && !value.is_callable() {
        if let Ok(json) = stringify.call(&JsValue::undefined(), &[value.clone()], context) {
            if let Some(s) = json.as_string() {
                return s.to_std_string_escaped();
            }
        }
        return value.display().to_string();
    }

    match value.to_string(context) {
        Ok(s) => s.to_std_string_escaped(),
        Err(_) => value.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sandbox(context: &mut Context, capture: &OutputCapture) -> SandboxBindings {
        let timers = TimerQueue::new(Duration::from_millis(1));
        build_sandbox(context, capture, &timers).unwrap()
    }

    #[test]
    fn test_bindings_cover_whitelist() {
        let mut context = Context::default();
        let capture = OutputCapture::new();
        let bindings = sandbox(&mut context, &capture);

        assert_eq!(
            bindings.names().len(),
            INTRINSIC_BINDINGS.len() + HOST_BINDINGS.len()
        );
        assert_eq!(bindings.names().len(), bindings.values().len());
        assert!(bindings.get("console").is_some_and(JsValue::is_object));
        assert!(bindings.get("setTimeout").is_some_and(JsValue::is_callable));
        assert!(bindings.get("Math").is_some_and(JsValue::is_object));
        assert!(bindings.get("fetch").is_none());
        assert!(bindings.get("eval").is_none());
    }

    #[test]
    fn test_globals_are_pruned() {
        let mut context = Context::default();
        let capture = OutputCapture::new();
        let _bindings = sandbox(&mut context, &capture);

        let kept = context
            .eval(Source::from_bytes("typeof Math + ' ' + typeof eval + ' ' + typeof Reflect"))
            .unwrap();
        assert_eq!(
            kept.as_string().unwrap().to_std_string_escaped(),
            "object undefined undefined"
        );
    }

    #[test]
    fn test_console_writes_joined_lines() {
        let mut context = Context::default();
        let capture = OutputCapture::new();
        let bindings = sandbox(&mut context, &capture);

        let console = bindings.get("console").unwrap().as_object().unwrap().clone();
        let log = console.get(js_string!("log"), &mut context).unwrap();
        let warn = console.get(js_string!("warn"), &mut context).unwrap();

        log.as_callable()
            .unwrap()
            .call(
                &JsValue::undefined(),
                &[JsValue::from(js_string!("sum")), JsValue::from(3)],
                &mut context,
            )
            .unwrap();
        warn.as_callable()
            .unwrap()
            .call(&JsValue::undefined(), &[JsValue::from(true)], &mut context)
            .unwrap();

        assert_eq!(capture.stdout(), "sum 3");
        assert_eq!(capture.stderr(), "true");
    }

    #[test]
    fn test_build_does_not_touch_capture() {
        let mut context = Context::default();
        let capture = OutputCapture::new();
        let _bindings = sandbox(&mut context, &capture);
        assert!(capture.is_empty());
    }
}
