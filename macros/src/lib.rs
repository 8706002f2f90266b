//! Procedural macros for jlext.
//!
//! This crate provides the `#[julia]` attribute macro, which turns a Rust
//! function whose body is Julia source into a typed wrapper around a
//! [`JuliaFunction`](https://docs.rs/jlext) on the global runtime.

extern crate proc_macro;

use proc_macro::TokenStream;

mod julia_fn;

/// Define a Julia function with a Rust signature.
///
/// The body must be Julia code in one of the accepted styles: a single string
/// literal, a string literal followed by `()` or `{}`, or statements ending in
/// `return "..."`. The code is extracted at compile time; an unsupported body is
/// a compile error pointing at it.
///
/// # Example
///
/// ```ignore
/// use jlext::julia;
///
/// /// Adds two integers in Julia.
/// #[julia]
/// fn add(x: i64, y: i64) -> i64 {
///     "return x + y"
/// }
///
/// assert_eq!(add(3, 4)?, 7);
/// assert_eq!(add::map(vec![(3, 4), (5, 6)])?, vec![7, 11]);
/// assert!(add::function().is_compiled());
/// ```
///
/// This generates:
/// - `fn add(x: i64, y: i64) -> jlext::Result<i64>`, calling into Julia
/// - a module `add` with `function()`, the lazily built
///   `&'static JuliaFunction`, and `map(batch)`, one round trip for a whole
///   batch of argument tuples
///
/// # Attributes
///
/// - `name`: the Julia function name (string literal), used as-is. Without it
///   a unique `_jlext_{fn name}` name is generated.
///
/// # Parameters
///
/// Parameters must be plain identifiers whose types convert into
/// `jlext::Value`; the return type must implement `jlext::FromValue`.
#[proc_macro_attribute]
pub fn julia(attr: TokenStream, item: TokenStream) -> TokenStream {
    julia_fn::julia_impl(attr, item)
}
