//! Unit tests for source extraction.

use super::*;
use pretty_assertions::assert_eq;

fn extract(text: &str) -> Result<String, ExtractionError> {
    HostFunction::parse(text)?.source()
}

#[test]
fn literal_body_is_the_source() {
    let source = extract(
        r#"
        fn add(x: i64, y: i64) -> i64 {
            "return x + y"
        }
        "#,
    )
    .unwrap();
    assert_eq!(source, "return x + y");
}

#[test]
fn literal_body_is_dedented_and_trimmed() {
    let source = extract(
        r#"
        fn fib(n: i64) -> i64 {
            "
            if n <= 1
                return n
            end
            return fib(n - 1) + fib(n - 2)
            "
        }
        "#,
    )
    .unwrap();
    assert_eq!(
        source,
        "if n <= 1\n    return n\nend\nreturn fib(n - 1) + fib(n - 2)"
    );
}

#[test]
fn literal_statement_with_semicolon() {
    let source = extract(r#"fn f() { "sqrt(2.0)"; }"#).unwrap();
    assert_eq!(source, "sqrt(2.0)");
}

#[test]
fn raw_string_literal() {
    let source = extract(
        r###"
        fn greet(name: String) -> String {
            r#"return "hello, $(name)""#
        }
        "###,
    )
    .unwrap();
    assert_eq!(source, r#"return "hello, $(name)""#);
}

#[test]
fn literal_followed_by_noop() {
    assert_eq!(extract(r#"fn f() { "1 + 1"; () }"#).unwrap(), "1 + 1");
    assert_eq!(extract(r#"fn f() { "1 + 1"; {} }"#).unwrap(), "1 + 1");
}

#[test]
fn terminal_return_after_other_statements() {
    let source = extract(
        r#"
        /// Scale a vector.
        fn scale(v: Vec<f64>, k: f64) -> Vec<f64> {
            let _unused = 1;
            return "
                return v .* k
            ";
        }
        "#,
    )
    .unwrap();
    assert_eq!(source, "return v .* k");
}

#[test]
fn terminal_return_after_doc_literal_and_statements() {
    let source = extract(
        r#"
        fn f(x: f64) -> f64 {
            "this literal is documentation";
            let _y = 2;
            return "x * 2"
        }
        "#,
    )
    .unwrap();
    assert_eq!(source, "x * 2");
}

#[test]
fn earlier_identical_return_is_accepted() {
    let source = extract(
        r#"
        fn f(flag: bool) -> i64 {
            if flag {
                return "42";
            }
            return "42";
        }
        "#,
    )
    .unwrap();
    assert_eq!(source, "42");
}

#[test]
fn earlier_conflicting_return_is_rejected() {
    let err = extract(
        r#"
        fn pick(flag: bool) -> i64 {
            if flag {
                return "1";
            }
            return "2";
        }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ExtractionError::Body { ref function, .. } if function == "pick"));
    assert!(err.to_string().contains("earlier `return`"));
}

#[test]
fn returns_inside_closures_do_not_count() {
    let source = extract(
        r#"
        fn f() -> i64 {
            let _g = || { return "ignored"; };
            return "1 + 2";
        }
        "#,
    )
    .unwrap();
    assert_eq!(source, "1 + 2");
}

#[test]
fn computed_body_is_rejected() {
    let err = extract(r#"fn add(x: i64) -> i64 { format!("return {}", 1) }"#).unwrap_err();
    assert_eq!(
        err,
        ExtractionError::Body {
            function: "add".to_string(),
            reason: "use a string literal body or end the body with `return \"...\"`"
                .to_string(),
        }
    );
}

#[test]
fn computed_return_is_rejected() {
    let err = extract(r#"fn f() -> String { return concat!("a", "b"); }"#).unwrap_err();
    assert!(err.to_string().contains("does not return a string literal"));
    assert!(err.to_string().contains("`f`"));
}

#[test]
fn literal_followed_by_code_is_rejected() {
    let err = extract(r#"fn f() { "x + 1"; let _a = 1; }"#).unwrap_err();
    assert!(err.to_string().contains("may only be followed by `()`"));
}

#[test]
fn empty_body_is_rejected() {
    let err = extract("fn f() {}").unwrap_err();
    assert!(err.to_string().contains("body is empty"));
}

#[test]
fn not_a_function_is_a_parse_error() {
    assert!(matches!(
        extract("struct S;"),
        Err(ExtractionError::Parse { .. })
    ));
}

#[test]
fn parameters_and_docs_are_recorded() {
    let function = HostFunction::parse(
        r#"
        /// Mandelbrot escape time.
        ///
        /// Returns the iteration count.
        fn mandelbrot(c_re: f64, mut c_im: f64, max_iter: i64) -> i64 {
            "return max_iter"
        }
        "#,
    )
    .unwrap();

    assert_eq!(function.name, "mandelbrot");
    assert_eq!(function.params, vec!["c_re", "c_im", "max_iter"]);
    assert_eq!(
        function.doc.as_deref(),
        Some("Mandelbrot escape time.\n\nReturns the iteration count.")
    );
}

#[test]
fn destructured_parameter_is_rejected() {
    let err = HostFunction::parse(r#"fn f((a, b): (i64, i64)) -> i64 { "a + b" }"#).unwrap_err();
    assert_eq!(
        err,
        ExtractionError::Parameter {
            function: "f".to_string(),
            parameter: "(..)".to_string(),
        }
    );
}

#[test]
fn nested_definition_text_parses() {
    // As copied out of an `impl` block or a test module.
    let text = "        fn inner(x: i64) -> i64 {\n            \"x + 1\"\n        }\n";
    assert_eq!(extract(text).unwrap(), "x + 1");
}

#[test]
fn raw_identifiers_lose_their_prefix() {
    let function = HostFunction::parse(r#"fn r#type(r#match: i64) -> i64 { "return match" }"#).unwrap();
    assert_eq!(function.name, "type");
    assert_eq!(function.params, vec!["match"]);
    assert_eq!(function.source().unwrap(), "return match");
}
