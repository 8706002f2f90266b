//! Recovering Julia source from Rust function definitions.
//!
//! A host function is an ordinary Rust `fn` item whose body carries the Julia
//! code as a string literal. Three body shapes are accepted, checked in order:
//!
//! 1. The whole body is one string literal:
//!    `fn add(x: i64, y: i64) -> i64 { "return x + y" }`
//! 2. A string literal followed by a single no-op (`()` or `{}`).
//! 3. The final statement is `return "<julia>"`, so the body may hold other
//!    Rust statements before it. An earlier `return` of anything other than
//!    the same literal makes the body ambiguous and is rejected.
//!
//! The extracted literal is dedented and trimmed. Definition text handed to
//! [`HostFunction::parse`] is dedented before parsing, so functions copied out
//! of a nested scope parse the same as top-level ones.

pub mod text;

#[cfg(test)]
mod extract_test;

use crate::error::ExtractionError;
use syn::ext::IdentExt;
use syn::visit::Visit;
use syn::{Attribute, Block, Expr, ExprLit, FnArg, ItemFn, Lit, LitStr, Meta, Pat, Signature, Stmt};

pub use text::{dedent, indent};

/// A parsed host function definition.
#[derive(Debug, Clone)]
pub struct HostFunction {
    /// The Rust function name.
    pub name: String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// Joined `///` documentation, if any.
    pub doc: Option<String>,
    item: ItemFn,
}

impl HostFunction {
    /// Parse Rust source text holding exactly one `fn` item.
    pub fn parse(text: &str) -> Result<Self, ExtractionError> {
        let normalized = dedent(text);
        let item: ItemFn = syn::parse_str(&normalized).map_err(|err| ExtractionError::Parse {
            message: err.to_string(),
        })?;
        Self::from_item(item)
    }

    /// Wrap an already parsed `fn` item.
    pub fn from_item(item: ItemFn) -> Result<Self, ExtractionError> {
        let name = item.sig.ident.unraw().to_string();
        let params = param_names(&item.sig)?;
        let doc = doc_comment(&item.attrs);
        Ok(Self {
            name,
            params,
            doc,
            item,
        })
    }

    pub fn item(&self) -> &ItemFn {
        &self.item
    }

    /// The embedded Julia source of this function.
    pub fn source(&self) -> Result<String, ExtractionError> {
        extract_source(self)
    }
}

/// Extract the Julia source from a host function.
pub fn extract_source(function: &HostFunction) -> Result<String, ExtractionError> {
    extract_from_block(&function.name, &function.item.block)
}

/// Extract the Julia source from a `fn` item, as the attribute macro sees it.
pub fn extract_from_item(item: &ItemFn) -> Result<String, ExtractionError> {
    extract_from_block(&item.sig.ident.unraw().to_string(), &item.block)
}

/// Parameter names of `sig`, in order.
pub fn param_names(sig: &Signature) -> Result<Vec<String>, ExtractionError> {
    let unsupported = |parameter: String| ExtractionError::Parameter {
        function: sig.ident.unraw().to_string(),
        parameter,
    };

    sig.inputs
        .iter()
        .map(|input| match input {
            FnArg::Receiver(_) => Err(unsupported("self".to_string())),
            FnArg::Typed(typed) => match &*typed.pat {
                Pat::Ident(ident) if ident.subpat.is_none() => Ok(ident.ident.unraw().to_string()),
                other => Err(unsupported(quote_pat(other))),
            },
        })
        .collect()
}

/// The `///` doc comment lines of `attrs`, joined.
pub fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(lit), ..
                }) => Some(lit.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').unwrap_or(&line).to_string())
        .collect();

    let doc = lines.join("\n").trim().to_string();
    (!doc.is_empty()).then_some(doc)
}

fn extract_from_block(function: &str, block: &Block) -> Result<String, ExtractionError> {
    let fail = |reason: &str| ExtractionError::Body {
        function: function.to_string(),
        reason: reason.to_string(),
    };

    let stmts = &block.stmts;
    let Some((first, rest)) = stmts.split_first() else {
        return Err(fail("the body is empty"));
    };

    // Style 1 and style 2: a leading literal, optionally followed by one no-op.
    if let Some(lit) = string_literal(first) {
        if rest.is_empty() || (rest.len() == 1 && is_noop(&rest[0])) {
            return Ok(clean(lit));
        }
    }

    // Style 3: `return "..."` as the final statement.
    let (last, earlier) = stmts.split_last().ok_or_else(|| fail("the body is empty"))?;
    match returned(last) {
        Some(Some(lit)) => {
            let value = lit.value();
            let mut returns = Returns::default();
            for stmt in earlier {
                returns.visit_stmt(stmt);
            }
            if returns.all_match(&value) {
                Ok(clean(lit))
            } else {
                Err(fail(
                    "an earlier `return` does not return the same string literal as the final one",
                ))
            }
        }
        Some(None) => Err(fail("the final `return` does not return a string literal")),
        None if string_literal(first).is_some() => Err(fail(
            "a leading string literal may only be followed by `()`",
        )),
        None => Err(fail(
            "use a string literal body or end the body with `return \"...\"`",
        )),
    }
}

fn clean(lit: &LitStr) -> String {
    dedent(&lit.value()).trim().to_string()
}

fn literal_of(expr: &Expr) -> Option<&LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Some(lit),
        Expr::Paren(paren) => literal_of(&paren.expr),
        Expr::Group(group) => literal_of(&group.expr),
        _ => None,
    }
}

fn string_literal(stmt: &Stmt) -> Option<&LitStr> {
    match stmt {
        Stmt::Expr(expr, _) => literal_of(expr),
        _ => None,
    }
}

fn is_noop(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(Expr::Tuple(tuple), _) => tuple.elems.is_empty(),
        Stmt::Expr(Expr::Block(block), _) => block.label.is_none() && block.block.stmts.is_empty(),
        _ => false,
    }
}

/// `Some(Some(lit))` for `return "..."`, `Some(None)` for any other return.
fn returned(stmt: &Stmt) -> Option<Option<&LitStr>> {
    match stmt {
        Stmt::Expr(Expr::Return(ret), _) => Some(ret.expr.as_deref().and_then(literal_of)),
        _ => None,
    }
}

/// Collects the `return` expressions of a function body, skipping closures
/// and nested items whose returns belong to someone else.
#[derive(Default)]
struct Returns {
    literals: Vec<String>,
    other: usize,
}

impl Returns {
    fn all_match(&self, value: &str) -> bool {
        self.other == 0 && self.literals.iter().all(|lit| lit == value)
    }
}

impl<'ast> Visit<'ast> for Returns {
    fn visit_expr_return(&mut self, ret: &'ast syn::ExprReturn) {
        match ret.expr.as_deref().and_then(literal_of) {
            Some(lit) => self.literals.push(lit.value()),
            None => self.other += 1,
        }
    }

    fn visit_expr_closure(&mut self, _: &'ast syn::ExprClosure) {}

    fn visit_item(&mut self, _: &'ast syn::Item) {}
}

fn quote_pat(pat: &Pat) -> String {
    match pat {
        Pat::Tuple(_) => "(..)".to_string(),
        Pat::Struct(s) => format!("{} {{ .. }}", path_name(&s.path)),
        Pat::TupleStruct(s) => format!("{}(..)", path_name(&s.path)),
        Pat::Wild(_) => "_".to_string(),
        Pat::Reference(_) => "&..".to_string(),
        Pat::Ident(ident) => ident.ident.to_string(),
        _ => "pattern".to_string(),
    }
}

fn path_name(path: &syn::Path) -> String {
    path.segments
        .last()
        .map_or_else(String::new, |segment| segment.ident.to_string())
}
