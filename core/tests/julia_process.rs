//! Tests against a real `julia` on `PATH` (or `JLEXT_JULIA`).
//!
//! Run with `cargo test -p jlext-core -- --ignored`.

use jlext_core::julia::JuliaProcess;
use jlext_core::{Error, Interpreter, FunctionParts, JuliaFunction, JuliaModule, Runtime, RuntimeOptions, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn runtime() -> Arc<Runtime> {
    Arc::new(Runtime::new(RuntimeOptions::from_env()))
}

#[test]
#[ignore = "needs a Julia installation"]
fn evaluates_and_round_trips_values() {
    let runtime = runtime();
    assert_eq!(runtime.eval("1 + 1").unwrap(), Value::Int(2));
    assert_eq!(runtime.eval("sqrt(4.0)").unwrap(), Value::Float(2.0));
    assert_eq!(runtime.eval("(1, \"a\")").unwrap(), Value::Tuple(vec![Value::Int(1), Value::Str("a".into())]));
    assert_eq!(runtime.eval("nothing").unwrap(), Value::Nothing);
    assert!(runtime.eval("NaN").unwrap().as_float().unwrap().is_nan());
    assert_eq!(
        runtime.convert("Float64", &Value::Int(3)).unwrap(),
        Value::Float(3.0)
    );

    let text = "say \"$x\"\n\\";
    assert_eq!(
        runtime.call("identity", (text,)).unwrap(),
        Value::Str(text.to_string())
    );
}

#[test]
#[ignore = "needs a Julia installation"]
fn user_output_does_not_break_the_protocol() {
    let runtime = runtime();
    runtime.exec("println(\"hello from Julia\")").unwrap();
    assert_eq!(runtime.eval("40 + 2").unwrap(), Value::Int(42));
}

#[test]
#[ignore = "needs a Julia installation"]
fn exceptions_are_reported_verbatim() {
    let runtime = runtime();
    match runtime.eval("undefined_name_for_jlext") {
        Err(Error::Julia(err)) => assert_eq!(err.kind, "UndefVarError"),
        other => panic!("unexpected result: {other:?}"),
    }
    // The process keeps serving after an error.
    assert_eq!(runtime.eval("2 * 3").unwrap(), Value::Int(6));
}

#[test]
#[ignore = "needs a Julia installation"]
fn functions_and_modules() {
    let runtime = runtime();
    let add = JuliaFunction::new(
        Arc::clone(&runtime),
        FunctionParts {
            host_name: "add".to_string(),
            params: vec!["x".to_string(), "y".to_string()],
            source: "return x + y".to_string(),
            ..FunctionParts::default()
        },
    );
    assert_eq!(add.call((3, 4)).unwrap(), Value::Int(7));
    assert_eq!(
        add.map([(3, 4), (5, 6)]).unwrap(),
        vec![Value::Int(7), Value::Int(11)]
    );

    let la = JuliaModule::new(Arc::clone(&runtime), "LinearAlgebra").unwrap();
    assert_eq!(la.call("norm", (vec![3.0, 4.0],)).unwrap(), Value::Float(5.0));
    assert!(matches!(la.get("_hidden"), Err(Error::AttributeNotFound { .. })));
}

#[test]
#[ignore = "needs a Julia installation"]
fn dropped_handles_leave_the_object_table() {
    let julia = JuliaProcess::spawn(&RuntimeOptions::from_env()).unwrap();
    let count = "length(__jlext__.objects)";

    let dict = julia.eval("Dict(:a => 1)").unwrap();
    assert!(dict.as_handle().is_some());
    let copy = dict.clone();
    assert_eq!(julia.eval(count).unwrap(), Value::Int(1));

    drop(dict);
    assert_eq!(julia.pending_releases(), 0);
    drop(copy);
    assert_eq!(julia.pending_releases(), 1);
    assert_eq!(julia.eval(count).unwrap(), Value::Int(0));
    assert_eq!(julia.pending_releases(), 0);
}

#[test]
fn missing_executable_is_a_startup_error() {
    let runtime = Runtime::new(RuntimeOptions {
        julia: "/nonexistent/jlext/julia".into(),
        ..RuntimeOptions::default()
    });
    assert!(matches!(runtime.eval("1"), Err(Error::RuntimeInit { .. })));
    assert!(!runtime.is_ready());
}
