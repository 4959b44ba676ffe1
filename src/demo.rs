// ext-fuzzing/src/demo.rs
//! Built-in instrumented demo target module
//!
//! A small module exercising every resolution shape the harness supports:
//! free functions, a namespace, an async function that goes through the
//! stubbed fetch capability, a panicking function, and a constructible type
//! with a static member and instance methods. The binary runs against it
//! and the integration tests drive the full executor loop through it.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::instrumentation::coverage::CoverageSession;
use crate::isolation::TargetEnv;
use crate::target::{async_fn, method_fn, namespace, sync_fn, Export, TargetModule, TypeDescriptor};

/// Source id for the arithmetic/type exports
pub const CALCULATOR_SRC: &str = "demo://ext-fuzz-calculator";
/// Source id for the text namespace
pub const TEXT_SRC: &str = "demo://ext-fuzz-text";
/// Source id for the network-touching export
pub const CLIENT_SRC: &str = "demo://ext-fuzz-client";

struct CounterState {
    value: i64,
}

/// Build the demo module against a coverage session and target environment
pub fn build(session: &CoverageSession, env: &Arc<TargetEnv>) -> TargetModule {
    session.register_source(
        CALCULATOR_SRC,
        &["add", "div", "boom", "origin", "increment", "value"],
    );
    session.register_source(TEXT_SRC, &["upper", "trim"]);
    session.register_source(CLIENT_SRC, &["fetchStatus"]);

    let add_session = session.clone();
    let div_session = session.clone();
    let boom_session = session.clone();
    let origin_session = session.clone();
    let increment_session = session.clone();
    let value_session = session.clone();
    let upper_session = session.clone();
    let trim_session = session.clone();
    let fetch_session = session.clone();
    let fetch_env = Arc::clone(env);

    TargetModule::new()
        .export(
            "add",
            sync_fn(move |args| {
                add_session.record_call(CALCULATOR_SRC, "add");
                let (a, b) = two_numbers(args)?;
                Ok(json!(a + b))
            }),
        )
        .export(
            "div",
            sync_fn(move |args| {
                div_session.record_call(CALCULATOR_SRC, "div");
                let (a, b) = two_numbers(args)?;
                if b == 0.0 {
                    return Err("div: division by zero".to_string());
                }
                Ok(json!(a / b))
            }),
        )
        .export(
            "boom",
            sync_fn(move |_args| {
                boom_session.record_call(CALCULATOR_SRC, "boom");
                panic!("boom: intentional failure");
            }),
        )
        .export(
            "text",
            namespace(vec![
                (
                    "upper",
                    sync_fn(move |args| {
                        upper_session.record_call(TEXT_SRC, "upper");
                        let s = one_string(args)?;
                        Ok(json!(s.to_uppercase()))
                    }),
                ),
                (
                    "trim",
                    sync_fn(move |args| {
                        trim_session.record_call(TEXT_SRC, "trim");
                        let s = one_string(args)?;
                        Ok(json!(s.trim()))
                    }),
                ),
            ]),
        )
        .export(
            "fetchStatus",
            async_fn(move |_args| {
                fetch_session.record_call(CLIENT_SRC, "fetchStatus");
                let http = fetch_env.http();
                let base = fetch_env
                    .config("baseUrl")
                    .unwrap_or("http://127.0.0.1:8080")
                    .to_string();
                async move {
                    let response = http.fetch(&format!("{}/api/v1/health", base));
                    if !response.ok {
                        return Err(format!("health check failed with {}", response.status));
                    }
                    Ok(json!({ "status": response.status, "body": response.json() }))
                }
            }),
        )
        .export(
            "Counter",
            Export::Type(
                TypeDescriptor::constructible(|| CounterState { value: 0 })
                    .static_member(
                    "origin",
                    sync_fn(move |_args| {
                        origin_session.record_call(CALCULATOR_SRC, "origin");
                        Ok(json!(0))
                    }),
                )
                .method(
                    "increment",
                    counter_method(increment_session, "increment", |state| {
                        state.value += 1;
                        json!(state.value)
                    }),
                )
                .method(
                    "value",
                    counter_method(value_session, "value", |state| json!(state.value)),
                ),
            ),
        )
}

fn counter_method(
    session: CoverageSession,
    name: &'static str,
    f: impl Fn(&mut CounterState) -> Value + Send + Sync + 'static,
) -> crate::target::MethodFn {
    method_fn(move |state: &mut CounterState, _args| {
        session.record_call(CALCULATOR_SRC, name);
        Ok(f(state))
    })
}

fn two_numbers(args: &[Value]) -> Result<(f64, f64), String> {
    let a = args
        .first()
        .and_then(Value::as_f64)
        .ok_or_else(|| "expected two numeric arguments".to_string())?;
    let b = args
        .get(1)
        .and_then(Value::as_f64)
        .ok_or_else(|| "expected two numeric arguments".to_string())?;
    Ok((a, b))
}

fn one_string(args: &[Value]) -> Result<&str, String> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| "expected a string argument".to_string())
}
