use super::*;
use crate::error::JuliaError;
use crate::testing::StubInterpreter;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

fn runtime_with(stub: &StubInterpreter) -> Runtime {
    Runtime::with_connector(&RuntimeOptions::default(), stub.connector())
}

#[test]
fn starts_lazily() {
    let stub = StubInterpreter::new();
    let runtime = runtime_with(&stub);
    assert!(!runtime.is_ready());
    assert_eq!(stub.connects(), 0);

    stub.expression("1 + 1", Value::Int(2));
    assert_eq!(runtime.eval("1 + 1").unwrap(), Value::Int(2));
    assert!(runtime.is_ready());
    assert_eq!(stub.connects(), 1);
}

#[test]
fn starts_once_under_contention() {
    crate::test_utils::init_test_logging();
    let stub = StubInterpreter::new();
    stub.expression("x", Value::Int(1));
    let runtime = Arc::new(runtime_with(&stub));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            std::thread::spawn(move || runtime.eval("x").unwrap())
        })
        .collect();
    for thread in threads {
        assert_eq!(thread.join().unwrap(), Value::Int(1));
    }
    assert_eq!(stub.connects(), 1);
}

#[test]
fn failed_start_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let stub = StubInterpreter::new();
    stub.expression("ok", Value::Bool(true));
    let connect = stub.connector();
    let counter = Arc::clone(&attempts);
    let runtime = Runtime::with_connector(&RuntimeOptions::default(), move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(Error::RuntimeInit {
                message: "julia not found".to_string(),
            });
        }
        connect()
    });

    let err = runtime.eval("ok").unwrap_err();
    assert!(matches!(err, Error::RuntimeInit { .. }));
    assert!(!runtime.is_ready());

    assert_eq!(runtime.eval("ok").unwrap(), Value::Bool(true));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn eval_cached_memoizes_exact_text() {
    let stub = StubInterpreter::new();
    stub.expression("sum(1:100)", Value::Int(5050))
        .expression("sum(1:100) ", Value::Int(5050));
    let runtime = runtime_with(&stub);

    assert_eq!(runtime.eval_cached("sum(1:100)").unwrap(), Value::Int(5050));
    assert_eq!(runtime.eval_cached("sum(1:100)").unwrap(), Value::Int(5050));
    assert_eq!(stub.evals(), 1);

    // Different text, different entry.
    assert_eq!(runtime.eval_cached("sum(1:100) ").unwrap(), Value::Int(5050));
    assert_eq!(stub.evals(), 2);
}

#[test]
fn eval_cached_does_not_cache_errors() {
    let stub = StubInterpreter::new();
    let runtime = runtime_with(&stub);

    assert!(runtime.eval_cached("undefined_thing").is_err());
    stub.expression("undefined_thing", Value::Int(3));
    assert_eq!(runtime.eval_cached("undefined_thing").unwrap(), Value::Int(3));
}

#[test]
fn eval_cache_evicts_least_recently_used() {
    let stub = StubInterpreter::new();
    stub.expression("a", Value::Int(1))
        .expression("b", Value::Int(2))
        .expression("c", Value::Int(3));
    let options = RuntimeOptions {
        eval_cache_capacity: 2,
        ..RuntimeOptions::default()
    };
    let runtime = Runtime::with_connector(&options, stub.connector());

    runtime.eval_cached("a").unwrap();
    runtime.eval_cached("b").unwrap();
    runtime.eval_cached("a").unwrap();
    runtime.eval_cached("c").unwrap();
    assert_eq!(stub.evals(), 3);

    // `b` was evicted, `a` survived.
    runtime.eval_cached("a").unwrap();
    assert_eq!(stub.evals(), 3);
    runtime.eval_cached("b").unwrap();
    assert_eq!(stub.evals(), 4);
}

#[test]
fn call_by_name_resolves_once() {
    let stub = StubInterpreter::new();
    stub.implement("x + y", |args| {
        let (x, y) = (args[0].as_int().unwrap(), args[1].as_int().unwrap());
        Ok(Value::Int(x + y))
    });
    let runtime = runtime_with(&stub);
    runtime.exec("plus(x, y) = x + y").unwrap();

    assert_eq!(runtime.call("plus", (3, 4)).unwrap(), Value::Int(7));
    assert_eq!(runtime.call("plus", (5, 6)).unwrap(), Value::Int(11));
    // One definition and one resolution.
    assert_eq!(stub.evals(), 2);
    assert_eq!(stub.calls(), 2);
}

#[test]
fn calling_plain_data_is_rejected() {
    let stub = StubInterpreter::new();
    stub.expression("answer", Value::Int(42));
    let runtime = runtime_with(&stub);

    let err = runtime.call("answer", ()).unwrap_err();
    assert!(matches!(err, Error::NotCallable(Value::Int(42))));
    assert_eq!(stub.calls(), 0);
}

#[test]
fn julia_errors_pass_through_unchanged() {
    let stub = StubInterpreter::new();
    stub.implement("throw(DomainError(x))", |_| {
        Err(Error::Julia(JuliaError::new("DomainError", "DomainError with -1")))
    });
    let runtime = runtime_with(&stub);
    runtime.exec("check(x) = throw(DomainError(x))").unwrap();

    match runtime.call("check", (-1,)) {
        Err(Error::Julia(err)) => {
            assert_eq!(err, JuliaError::new("DomainError", "DomainError with -1"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn undefined_names_surface_as_julia_errors() {
    let stub = StubInterpreter::new();
    let runtime = runtime_with(&stub);
    let err = runtime.call("nope", ()).unwrap_err();
    match err {
        Error::Julia(err) => assert_eq!(err.kind, "UndefVarError"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn convert_and_new_module() {
    let stub = StubInterpreter::new();
    let runtime = runtime_with(&stub);

    assert_eq!(
        runtime.convert("Float64", &Value::Int(3)).unwrap(),
        Value::Float(3.0)
    );
    let module = runtime.new_module("Scratch").unwrap();
    assert_eq!(module.as_handle().map(|h| &*h.type_name), Some("Module"));
}

#[test]
fn dropped_handles_are_released_with_the_next_request() {
    let stub = StubInterpreter::new();
    stub.module_member("LinearAlgebra", "I", Value::Bool(true));
    let runtime = runtime_with(&stub);

    let module = runtime.eval("LinearAlgebra").unwrap();
    let copy = module.clone();
    assert_eq!(stub.live_handles(), 1);

    drop(module);
    runtime.exec("using LinearAlgebra").unwrap();
    assert_eq!(stub.live_handles(), 1);

    drop(copy);
    assert_eq!(stub.released(), 0);
    runtime.exec("using LinearAlgebra").unwrap();
    assert_eq!(stub.released(), 1);
    assert_eq!(stub.live_handles(), 0);
}

#[test]
fn evicted_cache_entries_release_their_handles() {
    let stub = StubInterpreter::new();
    stub.module_member("LinearAlgebra", "I", Value::Bool(true))
        .module_member("Statistics", "mean", Value::Nothing);
    let options = RuntimeOptions {
        eval_cache_capacity: 1,
        ..RuntimeOptions::default()
    };
    let runtime = Runtime::with_connector(&options, stub.connector());

    runtime.eval_cached("LinearAlgebra").unwrap();
    runtime.eval_cached("Statistics").unwrap();
    assert_eq!(stub.live_handles(), 2);

    runtime.exec("using Statistics").unwrap();
    assert_eq!(stub.released(), 1);
    assert_eq!(stub.live_handles(), 1);
}

#[test]
fn debug_output() {
    let stub = StubInterpreter::new();
    let runtime = runtime_with(&stub);
    assert_eq!(
        format!("{runtime:?}"),
        "Runtime { ready: false, cached_expressions: 0, cached_functions: 0, .. }"
    );
}
