//! Ambient declarations: the global names tsc's default `lib` and `dom`
//! libraries declare, and the members of the built-in types the checker can
//! type.

use std::rc::Rc;

use crate::typescript::diagnostics::{MessageChain, CANNOT_FIND_NAME, CANNOT_FIND_NODE_NAME};
use crate::typescript::types::{Library, Signature, Ty};

/// Value globals declared by the ECMAScript library files.
const ECMASCRIPT: &[&str] = &[
    "AggregateError", "Array", "ArrayBuffer", "Atomics", "BigInt", "BigInt64Array",
    "BigUint64Array", "Boolean", "DataView", "Date", "Error", "EvalError", "FinalizationRegistry",
    "Float32Array", "Float64Array", "Function", "Infinity", "Int16Array", "Int32Array",
    "Int8Array", "Intl", "JSON", "Map", "Math", "NaN", "Number", "Object", "Promise", "Proxy",
    "RangeError", "ReferenceError", "Reflect", "RegExp", "Set", "SharedArrayBuffer", "String",
    "Symbol", "SyntaxError", "TypeError", "URIError", "Uint16Array", "Uint32Array", "Uint8Array",
    "Uint8ClampedArray", "WeakMap", "WeakRef", "WeakSet", "arguments", "decodeURI",
    "decodeURIComponent", "encodeURI", "encodeURIComponent", "escape", "eval", "globalThis",
    "isFinite", "isNaN", "parseFloat", "parseInt", "undefined", "unescape",
];

/// Value globals declared by the DOM library. Declared for the type checker
/// only; the sandbox does not provide most of them at run time.
const DOM: &[&str] = &[
    "AbortController", "AbortSignal", "Blob", "BroadcastChannel", "CustomEvent", "DOMException",
    "Document", "Element", "Event", "EventTarget", "File", "FileReader", "FormData", "Headers",
    "HTMLElement", "Image", "MessageChannel", "MessageEvent", "MutationObserver", "Node",
    "Performance", "ReadableStream", "Request", "Response", "TextDecoder", "TextEncoder", "URL",
    "URLSearchParams", "WebAssembly", "WebSocket", "Window", "Worker", "WritableStream",
    "XMLHttpRequest", "alert", "atob", "btoa", "caches", "cancelAnimationFrame", "clearInterval",
    "clearTimeout", "close", "closed", "confirm", "console", "createImageBitmap", "crypto",
    "customElements", "devicePixelRatio", "document", "event", "external", "fetch", "focus",
    "frames", "getComputedStyle", "history", "indexedDB", "innerHeight", "innerWidth", "isSecureContext",
    "length", "localStorage", "location", "matchMedia", "name", "navigator", "onerror", "onload",
    "onmessage", "open", "opener", "origin", "outerHeight", "outerWidth", "parent", "performance",
    "postMessage", "print", "prompt", "queueMicrotask", "reportError", "requestAnimationFrame",
    "screen", "scroll", "scrollBy", "scrollTo", "scrollX", "scrollY", "self", "sessionStorage",
    "setInterval", "setTimeout", "status", "stop", "structuredClone", "top", "visualViewport",
    "window",
];

/// Names only `@types/node` declares.
const NODE: &[&str] = &[
    "Buffer", "__dirname", "__filename", "exports", "global", "module", "process", "require",
];

/// How tsc's default libraries treat an otherwise unresolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambient {
    /// Declared by the default libraries.
    Declared,
    /// Declared only by the Node type definitions.
    NodeOnly,
    /// Declared nowhere.
    Missing,
}

/// Classify a name that no declaration in the source resolves.
pub fn ambient(name: &str) -> Ambient {
    if ECMASCRIPT.contains(&name) || DOM.contains(&name) {
        Ambient::Declared
    } else if NODE.contains(&name) {
        Ambient::NodeOnly
    } else {
        Ambient::Missing
    }
}

/// Message for a reference to an undeclared name, or `None` if it is declared.
pub fn unresolved_message(name: &str) -> Option<(u32, MessageChain)> {
    match ambient(name) {
        Ambient::Declared => None,
        Ambient::NodeOnly => Some((
            CANNOT_FIND_NODE_NAME,
            MessageChain::new(format!(
                "Cannot find name '{}'. Do you need to install type definitions for node? Try `npm i --save-dev @types/node`.",
                name
            )),
        )),
        Ambient::Missing => Some((
            CANNOT_FIND_NAME,
            MessageChain::new(format!("Cannot find name '{}'.", name)),
        )),
    }
}

/// Type of a library global the checker can reason about.
pub fn global_type(name: &str) -> Ty {
    match name {
        "Math" => Ty::Library(Library::Math),
        "JSON" => Ty::Library(Library::Json),
        "console" => Ty::Library(Library::Console),
        "NaN" | "Infinity" => Ty::Number,
        "undefined" => Ty::Undefined,
        "parseInt" | "parseFloat" | "Number" | "setTimeout" | "setInterval" => method(Ty::Number),
        "isNaN" | "isFinite" | "Boolean" => method(Ty::Boolean),
        "String" | "encodeURI" | "encodeURIComponent" | "decodeURI" | "decodeURIComponent"
        | "btoa" | "atob" => method(Ty::String),
        "clearTimeout" | "clearInterval" | "queueMicrotask" => method(Ty::Void),
        _ => Ty::Any,
    }
}

/// Result of looking a property up on a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// The property exists with this type.
    Known(Ty),
    /// The type is fully known and has no such property.
    Missing,
    /// The checker cannot tell.
    Unknown,
}

/// Look up property `name` on a value of type `receiver`.
pub fn member(receiver: &Ty, name: &str) -> Member {
    let known = match receiver {
        Ty::String => string_member(name),
        Ty::Number => number_member(name),
        Ty::Boolean => match name {
            "valueOf" => Some(method(Ty::Boolean)),
            _ => None,
        },
        Ty::BigInt => match name {
            "valueOf" => Some(method(Ty::BigInt)),
            "toString" | "toLocaleString" => Some(method(Ty::String)),
            _ => None,
        },
        Ty::Array(element) => array_member(element, name),
        Ty::Library(library) => library_member(*library, name),
        Ty::Record(shape) => shape.property(name).map(|property| property.read_type()),
        Ty::Object => None,
        _ => return Member::Unknown,
    };
    match known.or_else(|| object_member(name)) {
        Some(ty) => Member::Known(ty),
        None => Member::Missing,
    }
}

/// A library method: any arguments, fixed return type.
fn method(ret: Ty) -> Ty {
    Ty::Function(Rc::new(Signature {
        params: Vec::new(),
        rest: Some(Ty::Any),
        ret,
    }))
}

fn maybe(ty: Ty) -> Ty {
    Ty::union([ty, Ty::Undefined])
}

/// Members every object inherits from `Object.prototype`.
fn object_member(name: &str) -> Option<Ty> {
    match name {
        "constructor" => Some(Ty::Any),
        "hasOwnProperty" | "isPrototypeOf" | "propertyIsEnumerable" => Some(method(Ty::Boolean)),
        "toString" | "toLocaleString" => Some(method(Ty::String)),
        "valueOf" => Some(method(Ty::Any)),
        _ => None,
    }
}

fn string_member(name: &str) -> Option<Ty> {
    let ty = match name {
        "length" => Ty::Number,
        "at" => method(maybe(Ty::String)),
        "codePointAt" => method(maybe(Ty::Number)),
        "charCodeAt" | "indexOf" | "lastIndexOf" | "localeCompare" | "search" => method(Ty::Number),
        "endsWith" | "includes" | "startsWith" | "isWellFormed" => method(Ty::Boolean),
        "split" => method(Ty::Array(Box::new(Ty::String))),
        "match" | "matchAll" => method(Ty::Any),
        "charAt" | "concat" | "normalize" | "padEnd" | "padStart" | "repeat" | "replace"
        | "replaceAll" | "slice" | "substr" | "substring" | "toLocaleLowerCase"
        | "toLocaleUpperCase" | "toLowerCase" | "toUpperCase" | "toWellFormed" | "trim"
        | "trimEnd" | "trimLeft" | "trimRight" | "trimStart" | "valueOf" => method(Ty::String),
        _ => return None,
    };
    Some(ty)
}

fn number_member(name: &str) -> Option<Ty> {
    match name {
        "toExponential" | "toFixed" | "toPrecision" => Some(method(Ty::String)),
        "valueOf" => Some(method(Ty::Number)),
        _ => None,
    }
}

fn array_member(element: &Ty, name: &str) -> Option<Ty> {
    let same = || Ty::Array(Box::new(element.clone()));
    let ty = match name {
        "length" => Ty::Number,
        "at" | "find" | "findLast" | "pop" | "shift" => method(maybe(element.clone())),
        "findIndex" | "findLastIndex" | "indexOf" | "lastIndexOf" | "push" | "unshift" => {
            method(Ty::Number)
        }
        "every" | "includes" | "some" => method(Ty::Boolean),
        "forEach" => method(Ty::Void),
        "join" => method(Ty::String),
        "concat" | "copyWithin" | "fill" | "filter" | "reverse" | "slice" | "sort" | "splice"
        | "toReversed" | "toSorted" | "toSpliced" | "with" => method(same()),
        "map" | "flat" | "flatMap" => method(Ty::Array(Box::new(Ty::Any))),
        "entries" | "keys" | "reduce" | "reduceRight" | "values" => method(Ty::Any),
        _ => return None,
    };
    Some(ty)
}

fn library_member(library: Library, name: &str) -> Option<Ty> {
    match library {
        Library::Math => match name {
            "E" | "LN10" | "LN2" | "LOG10E" | "LOG2E" | "PI" | "SQRT1_2" | "SQRT2" => Some(Ty::Number),
            "abs" | "acos" | "acosh" | "asin" | "asinh" | "atan" | "atan2" | "atanh" | "cbrt"
            | "ceil" | "clz32" | "cos" | "cosh" | "exp" | "expm1" | "floor" | "fround" | "hypot"
            | "imul" | "log" | "log10" | "log1p" | "log2" | "max" | "min" | "pow" | "random"
            | "round" | "sign" | "sin" | "sinh" | "sqrt" | "tan" | "tanh" | "trunc" => {
                Some(method(Ty::Number))
            }
            _ => None,
        },
        Library::Json => match name {
            "parse" => Some(method(Ty::Any)),
            "stringify" => Some(method(Ty::String)),
            _ => None,
        },
        Library::Console => match name {
            "assert" | "clear" | "count" | "countReset" | "debug" | "dir" | "dirxml" | "error"
            | "group" | "groupCollapsed" | "groupEnd" | "info" | "log" | "table" | "time"
            | "timeEnd" | "timeLog" | "timeStamp" | "trace" | "warn" => Some(method(Ty::Void)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn return_type(ty: Ty) -> Ty {
        match ty {
            Ty::Function(signature) => signature.ret.clone(),
            other => panic!("expected a method, got {}", other),
        }
    }

    #[test]
    fn test_ambient_names() {
        assert_eq!(ambient("Math"), Ambient::Declared);
        assert_eq!(ambient("fetch"), Ambient::Declared);
        assert_eq!(ambient("require"), Ambient::NodeOnly);
        assert_eq!(ambient("notDeclaredAnywhere"), Ambient::Missing);
        assert!(unresolved_message("window").is_none());
    }

    #[test]
    fn test_primitive_members() {
        match member(&Ty::Number, "toFixed") {
            Member::Known(ty) => assert_eq!(return_type(ty), Ty::String),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(member(&Ty::String, "length"), Member::Known(Ty::Number));
        assert_eq!(member(&Ty::String, "notAMethod"), Member::Missing);
        assert!(matches!(member(&Ty::Boolean, "toString"), Member::Known(_)));
    }

    #[test]
    fn test_array_members_follow_element_type() {
        let names = Ty::Array(Box::new(Ty::String));
        match member(&names, "pop") {
            Member::Known(ty) => {
                assert_eq!(return_type(ty), Ty::union([Ty::String, Ty::Undefined]))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(member(&names, "size"), Member::Missing);
    }

    #[test]
    fn test_library_members() {
        let math = global_type("Math");
        assert!(matches!(member(&math, "max"), Member::Known(_)));
        assert_eq!(member(&math, "PI"), Member::Known(Ty::Number));
        assert_eq!(member(&math, "maximum"), Member::Missing);
        assert_eq!(member(&Ty::Any, "anything"), Member::Unknown);
    }
}
