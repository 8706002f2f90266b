use criterion::{Criterion, black_box, criterion_group, criterion_main};
use jlext_core::testing::StubInterpreter;
use jlext_core::{FunctionParts, JuliaFunction, Runtime, RuntimeOptions, Value};
use std::sync::Arc;

fn fib(n: i64) -> i64 {
    if n <= 1 { n } else { fib(n - 1) + fib(n - 2) }
}

fn setup() -> (StubInterpreter, JuliaFunction) {
    let stub = StubInterpreter::new();
    stub.implement("return fib(n)", |args| {
        Ok(Value::Int(fib(args[0].as_int().unwrap_or_default())))
    });
    stub.expression("sqrt(2.0)", Value::Float(2f64.sqrt()));
    let runtime = Arc::new(Runtime::with_connector(
        &RuntimeOptions::default(),
        stub.connector(),
    ));
    let function = JuliaFunction::new(
        runtime,
        FunctionParts {
            host_name: "fib".to_string(),
            params: vec!["n".to_string()],
            source: "return fib(n)".to_string(),
            ..FunctionParts::default()
        },
    );
    (stub, function)
}

fn bench_dispatch(c: &mut Criterion) {
    let (_stub, function) = setup();
    function.call((1,)).unwrap_or(Value::Nothing);

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("single_calls_x100", |b| {
        b.iter(|| {
            for n in 0..100 {
                black_box(function.call((black_box(n % 10),)).unwrap_or(Value::Nothing));
            }
        })
    });
    group.bench_function("map_x100", |b| {
        b.iter(|| {
            let batch: Vec<(i64,)> = (0..100).map(|n| (n % 10,)).collect();
            black_box(function.map(batch).unwrap_or_default())
        })
    });
    group.finish();
}

fn bench_eval_cache(c: &mut Criterion) {
    let (_stub, function) = setup();
    let runtime = function.runtime();
    c.bench_function("eval_cached_hit", |b| {
        b.iter(|| black_box(runtime.eval_cached(black_box("sqrt(2.0)")).unwrap_or(Value::Nothing)))
    });
}

criterion_group!(benches, bench_dispatch, bench_eval_cache);
criterion_main!(benches);
