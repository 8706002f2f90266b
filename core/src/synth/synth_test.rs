//! Unit tests for function synthesis.

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn wraps_statements_in_a_signature() {
    let function = build_function("f", &["a", "b"], "return a + b");
    assert_eq!(function.source, "function f(a, b)\n    return a + b\nend");
    assert_eq!(function.name, "f");
    assert!(!function.passthrough);
}

#[test]
fn wraps_multiline_bodies_one_level_deep() {
    let body = "if n <= 1\n    return n\nend\n\nreturn fib(n - 1) + fib(n - 2)";
    let function = build_function("fib", &["n".to_string()], body);
    assert_eq!(
        function.source,
        "function fib(n)\n    if n <= 1\n        return n\n    end\n\n    return fib(n - 1) + fib(n - 2)\nend"
    );
}

#[test]
fn no_parameters() {
    let function = build_function("answer", &[] as &[&str], "42");
    assert_eq!(function.source, "function answer()\n    42\nend");
}

#[test]
fn complete_long_form_passes_through_unchanged() {
    let source = "function my_norm(v)\n    return sqrt(sum(abs2, v))\nend";
    let function = build_function("_jlext_norm", &["v"], source);
    assert_eq!(function.source, source);
    assert_eq!(function.name, "my_norm");
    assert!(function.passthrough);
}

#[test]
fn complete_short_form_passes_through_unchanged() {
    let source = "sq(x) = x^2";
    let function = build_function("_jlext_sq", &["x"], source);
    assert_eq!(function.source, source);
    assert_eq!(function.name, "sq");
}

#[test]
fn short_form_with_types_and_where_clause() {
    assert!(is_complete_definition("scale(v::Vector{T}, k::T) where T = v .* k"));
    assert!(is_complete_definition("half(x)::Float64 = x / 2"));
    assert!(is_complete_definition("Base.length(s::Stack) = s.n"));
}

#[test]
fn qualified_long_form_reports_last_segment() {
    let function = build_function("fallback", &["io", "x"], "function Base.show(io, x)\nend");
    assert_eq!(function.name, "show");
}

#[test]
fn comparisons_are_not_definitions() {
    assert!(!is_complete_definition("f(x) == 3"));
    assert!(!is_complete_definition("f(x) >= 3"));
    assert!(!is_complete_definition("f(x) <= 3"));
    assert!(!is_complete_definition("f(x) != 3"));
    assert!(!is_complete_definition("f(x) => 3"));
}

#[test]
fn assignments_and_calls_are_statements() {
    assert!(!is_complete_definition("y = f(x)\nreturn y"));
    assert!(!is_complete_definition("a[i] = 3"));
    assert!(!is_complete_definition("A(x).field = 3"));
    assert!(!is_complete_definition("println(x)"));
    assert!(!is_complete_definition("functional = 1"));
}

#[test]
fn leading_comments_are_skipped() {
    let body = "# function that doubles x\nreturn 2x";
    let function = build_function("double", &["x"], body);
    assert!(!function.passthrough);
    assert_eq!(
        function.source,
        "function double(x)\n    # function that doubles x\n    return 2x\nend"
    );

    let source = "#= helper =#\n# more\nfunction triple(x)\n    3x\nend";
    assert!(is_complete_definition(source));
    assert_eq!(build_function("t", &["x"], source).name, "triple");
}

#[test]
fn nested_block_comments() {
    assert!(is_complete_definition("#= a #= b =# c =# f(x) = 1"));
    assert!(!is_complete_definition("#= unterminated function f(x) = 1"));
}

#[test]
fn anonymous_long_form_keeps_requested_name() {
    let function = build_function("anon", &["x"], "function (x)\n    x\nend");
    assert!(function.passthrough);
    assert_eq!(function.name, "anon");
}

#[test]
fn map_helper() {
    let map = build_map_function("_jlext_fib");
    assert_eq!(map.name, "_jlext_fib__map");
    assert_eq!(
        map.source,
        "_jlext_fib__map(args_list) = [Base.invokelatest(_jlext_fib, a...) for a in args_list]"
    );
    // The helper is itself a short-form definition.
    assert!(is_complete_definition(&map.source));
}
