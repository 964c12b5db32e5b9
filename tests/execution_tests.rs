//! End-to-end behaviour of both runtimes.

use std::time::Duration;

use proptest::prelude::*;
use script_sandbox_rs::prelude::*;
use serde_json::json;

fn test_config() -> SandboxConfig {
    SandboxConfig::builder()
        .timeout(Duration::from_secs(5))
        .build()
}

#[tokio::test]
async fn test_javascript_value_and_stdout() {
    let mut runtime = JavaScriptRuntime::with_config(test_config());
    let result = runtime.execute("console.log('hi'); return 1+1;").await;

    assert!(result.is_success());
    assert_eq!(result.result(), Some(&json!(2)));
    assert_eq!(result.stdout(), "hi");
}

#[tokio::test]
async fn test_javascript_thrown_error() {
    let mut runtime = JavaScriptRuntime::with_config(test_config());
    let result = runtime.execute("throw new Error('boom')").await;

    assert!(!result.is_success());
    assert_eq!(result.error(), Some("boom"));
    assert!(result.diagnostics().is_empty());
}

#[tokio::test]
async fn test_typescript_type_mismatch() {
    let mut runtime = TypeScriptRuntime::with_config(test_config());
    let result = runtime.execute("const x: number = 'oops';").await;

    assert!(result.is_compile_failure());
    let diagnostic = &result.diagnostics()[0];
    assert_eq!(diagnostic.line, 1);
    assert!(diagnostic.message.contains("not assignable to type 'number'"));
}

#[tokio::test]
async fn test_typescript_rejects_before_running() {
    let mut runtime = TypeScriptRuntime::with_config(test_config());
    for (body, expected) in [
        (
            "const n: number = Math.max(1, 2).toFixed(2);",
            "Type 'string' is not assignable to type 'number'.",
        ),
        (
            "const u: { a: number } = { a: 'x' };",
            "Type 'string' is not assignable to type 'number'.",
        ),
        (
            "const s = 'x';\ns.notAMethod();",
            "Property 'notAMethod' does not exist on type 'string'.",
        ),
        (
            "const v: number = notDeclaredAnywhere;",
            "Cannot find name 'notDeclaredAnywhere'.",
        ),
    ] {
        let code = format!("console.log('ran');\n{}", body);
        let result = runtime.execute(&code).await;

        assert!(result.is_compile_failure(), "{:?}", result);
        assert_eq!(result.stdout(), "", "{}", body);
        assert_eq!(result.diagnostics().len(), 1, "{}", body);
        assert_eq!(result.diagnostics()[0].message, expected);
        assert!(result.diagnostics()[0].line >= 2);
    }
}

#[tokio::test]
async fn test_typescript_interfaces_and_library_calls_run() {
    let mut runtime = TypeScriptRuntime::with_config(test_config());
    let code = "interface Point { x: number; y: number }\n\
                const origin: Point = { x: 3, y: 4 };\n\
                const distance: number = Math.hypot(origin.x, origin.y);\n\
                console.log(distance.toFixed(1), JSON.stringify(origin));";
    let result = runtime.execute(code).await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(result.stdout(), "5.0 {\"x\":3,\"y\":4}");
}

#[tokio::test]
async fn test_typescript_exports_run() {
    let mut runtime = TypeScriptRuntime::with_config(test_config());
    let result = runtime
        .execute("console.log('typed'); export const y = 5;")
        .await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(result.stdout(), "typed");
}

#[tokio::test]
async fn test_unlisted_identifier_is_reference_error() {
    let mut runtime = JavaScriptRuntime::with_config(test_config());
    let result = runtime.execute("return localStorage.getItem('token');").await;

    assert!(!result.is_success());
    assert_eq!(result.error_kind().as_deref(), Some("ReferenceError"));
    assert!(result.error().unwrap_or_default().contains("localStorage"));
}

#[tokio::test]
async fn test_console_formatting() {
    let mut runtime = JavaScriptRuntime::with_config(test_config());
    let result = runtime
        .execute("console.log('n', 1, true, null, undefined, {a: [1]}); console.info([1, 'x']);")
        .await;

    assert_eq!(
        result.stdout(),
        "n 1 true null undefined {\"a\":[1]}\n[1,\"x\"]"
    );
}

#[tokio::test]
async fn test_rejected_promise_is_runtime_failure() {
    let mut runtime = JavaScriptRuntime::with_config(test_config());
    let result = runtime
        .execute("await Promise.reject(new TypeError('nope'));")
        .await;

    assert_eq!(result.error(), Some("nope"));
    assert_eq!(result.error_kind().as_deref(), Some("TypeError"));
}

#[tokio::test]
async fn test_pending_forever_is_reported() {
    let mut runtime = JavaScriptRuntime::with_config(test_config());
    let result = runtime.execute("await new Promise(() => {});").await;

    assert!(!result.is_success());
    assert!(result.error().unwrap_or_default().contains("never settled"));
}

#[tokio::test]
async fn test_background_timers_are_dropped() {
    let mut runtime = JavaScriptRuntime::with_config(test_config());
    let result = runtime
        .execute("setTimeout(() => console.log('late'), 50); return 'early';")
        .await;

    assert_eq!(result.result(), Some(&json!("early")));
    assert_eq!(result.stdout(), "");
}

#[tokio::test]
async fn test_result_json_shapes() {
    let mut javascript = JavaScriptRuntime::with_config(test_config());
    let success = javascript.execute("console.log('hi'); return [1];").await.to_json();
    assert_eq!(
        success,
        json!({"success": true, "result": [1], "stdout": "hi", "stderr": ""})
    );

    let mut typescript = TypeScriptRuntime::with_config(test_config());
    let failure = typescript.execute("let s: string = 1;").await.to_json();
    assert_eq!(failure["success"], json!(false));
    assert_eq!(failure["error"], json!("Type checking failed"));
    assert_eq!(failure["diagnostics"][0]["line"], json!(1));
    assert_eq!(failure["diagnostics"][0]["column"], json!(5));
    assert_eq!(
        failure["stderr"],
        json!("Line 1, Column 5: Type 'number' is not assignable to type 'string'.")
    );
}

#[tokio::test]
async fn test_runtime_for_language_names() {
    for (name, code) in [("javascript", "return 1;"), ("ts", "const n: number = 1; console.log(n);")] {
        let language: Language = name.parse().unwrap();
        let mut runtime = runtime_for(language, test_config());
        let result = runtime.execute(code).await;
        assert!(result.is_success(), "{}: {:?}", name, result);
    }
}

#[tokio::test]
async fn test_typescript_project_empty_after_every_outcome() {
    let mut runtime = TypeScriptRuntime::with_config(test_config());
    for code in [
        "console.log('ok');",
        "const bad: boolean = 'no';",
        "throw new Error('runtime');",
        "type OnlyTypes = number;",
    ] {
        runtime.execute(code).await;
        assert_eq!(runtime.project().file_count(), 0, "after {:?}", code);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn stdout_joins_logged_lines(lines in proptest::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..6)) {
        let code: String = lines
            .iter()
            .map(|line| format!("console.log({});\n", serde_json::to_string(line).unwrap()))
            .collect();

        let result = tokio_test::block_on(async {
            JavaScriptRuntime::with_config(test_config()).execute(&code).await
        });
        prop_assert!(result.is_success());
        prop_assert_eq!(result.stdout(), lines.join("\n"));
    }

    #[test]
    fn thrown_message_is_reported(message in "[a-zA-Z0-9 ]{1,24}") {
        let code = format!("throw new RangeError({});", serde_json::to_string(&message).unwrap());

        let result = tokio_test::block_on(async {
            JavaScriptRuntime::with_config(test_config()).execute(&code).await
        });
        prop_assert_eq!(result.error(), Some(message.as_str()));
    }

    #[test]
    fn type_errors_never_evaluate(value in "[a-z]{1,8}") {
        let code = format!(
            "console.log('ran');\nconst n: number = {};",
            serde_json::to_string(&value).unwrap()
        );

        let result = tokio_test::block_on(async {
            TypeScriptRuntime::with_config(test_config()).execute(&code).await
        });
        prop_assert!(result.is_compile_failure());
        prop_assert!(!result.diagnostics().is_empty());
        prop_assert_eq!(result.stdout(), "");
    }
}
