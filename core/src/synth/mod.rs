//! Building complete Julia function definitions.
//!
//! Extracted source is either a bare sequence of statements, which gets wrapped
//! in `function name(params) ... end`, or already a complete definition, which
//! passes through byte-for-byte. Julia syntax is never validated here; mistakes
//! surface when the runtime first evaluates the text.
//!
//! Recognizing a complete definition is a textual check, not a parse. Leading
//! blank lines and comments are skipped first, so a body that opens with
//! `# function docs` is still treated as statements.

#[cfg(test)]
mod synth_test;

use crate::source::indent;
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Indentation of a wrapped body.
const BODY_INDENT: &str = "    ";

/// `function name(` long-form header. The name may be qualified
/// (`Base.show`) or an operator in parentheses, which we do not track.
static LONG_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^function\s+(?:([A-Za-z_][A-Za-z0-9_!]*(?:\.[A-Za-z_][A-Za-z0-9_!]*)*)\s*[({])?")
        .unwrap_or_else(|err| unreachable!("invalid long-form pattern: {err}"))
});

/// `name(params) = expr` on the first line. The `=` must be a plain
/// assignment, not `==`, `=>`, `<=`, `>=` or `!=`.
static SHORT_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_!]*(?:\.[A-Za-z_][A-Za-z0-9_!]*)*)(?:\{[^\n]*\})?\([^\n]*\)(?:\s*where\s[^\n=]*)?(?:\s*::\s*[^\n=]+)?\s*=(?:[^=>]|$)")
        .unwrap_or_else(|err| unreachable!("invalid short-form pattern: {err}"))
});

/// A complete Julia function definition ready to be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedFunction {
    /// The name `source` defines, when it could be determined.
    pub name: String,
    /// The full definition.
    pub source: String,
    /// Whether `source` was supplied complete by the author.
    pub passthrough: bool,
}

/// Build a complete definition of `name(params...)` from extracted `source`.
///
/// A complete definition in `source` is returned unchanged, not renamed; the
/// returned `name` is then the one the author defined (falling back to `name`
/// when the header does not reveal it).
pub fn build_function(name: &str, params: &[impl AsRef<str>], source: &str) -> SynthesizedFunction {
    if let Some(defined) = complete_definition(source) {
        return SynthesizedFunction {
            name: defined.unwrap_or(name).to_string(),
            source: source.to_string(),
            passthrough: true,
        };
    }

    let params = params
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    let body = indent(source, BODY_INDENT);
    SynthesizedFunction {
        name: name.to_string(),
        source: format!("function {name}({params})\n{body}\nend"),
        passthrough: false,
    }
}

/// Name of the batch helper generated for `target`.
pub fn map_name(target: &str) -> String {
    format!("{target}__map")
}

/// The batch helper: applies `target` to every argument tuple of a vector,
/// entirely inside Julia.
pub fn build_map_function(target: &str) -> SynthesizedFunction {
    let name = map_name(target);
    let source =
        format!("{name}(args_list) = [Base.invokelatest({target}, a...) for a in args_list]");
    SynthesizedFunction {
        name,
        source,
        passthrough: false,
    }
}

/// Whether `source` already is a complete definition.
pub fn is_complete_definition(source: &str) -> bool {
    complete_definition(source).is_some()
}

/// `Some(defined_name)` when `source` is a complete definition.
fn complete_definition(source: &str) -> Option<Option<&str>> {
    let code = skip_comments(source);
    if let Some(caps) = LONG_FORM.captures(code) {
        return Some(caps.get(1).map(|m| last_segment(m.as_str())));
    }
    SHORT_FORM
        .captures(code)
        .map(|caps| caps.get(1).map(|m| last_segment(m.as_str())))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Skip leading whitespace, `# ...` line comments and `#= ... =#` block
/// comments (which nest in Julia).
fn skip_comments(mut code: &str) -> &str {
    loop {
        code = code.trim_start();
        if let Some(rest) = code.strip_prefix("#=") {
            code = skip_block_comment(rest);
        } else if code.starts_with('#') {
            code = match code.find('\n') {
                Some(pos) => &code[pos + 1..],
                None => "",
            };
        } else {
            return code;
        }
    }
}

fn skip_block_comment(mut rest: &str) -> &str {
    let mut depth = 1usize;
    while depth > 0 {
        let open = rest.find("#=");
        let close = rest.find("=#");
        match (open, close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                rest = &rest[o + 2..];
            }
            (_, Some(c)) => {
                depth -= 1;
                rest = &rest[c + 2..];
            }
            (_, None) => return "",
        }
    }
    rest
}
