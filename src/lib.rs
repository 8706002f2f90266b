//! jlext - Julia functions authored inside Rust
//!
//! # Overview
//!
//! Write the body of a Rust function in Julia and call it like any other
//! function. The Julia code is compiled into a shared, lazily started Julia
//! process the first time the function is called; later calls go straight to
//! the compiled function.
//!
//! # Quick Start
//!
//! ```ignore
//! use jlext::julia;
//!
//! /// Naive Fibonacci, in Julia.
//! #[julia]
//! fn fib(n: i64) -> i64 {
//!     "
//!     n <= 1 && return n
//!     return fib(n - 1) + fib(n - 2)
//!     "
//! }
//!
//! assert_eq!(fib(20)?, 6765);
//!
//! // One round trip for the whole batch.
//! assert_eq!(fib::map(vec![(10,), (20,), (30,)])?, vec![55, 6765, 832040]);
//! ```
//!
//! # Accepted bodies
//!
//! - a single string literal holding Julia statements, or a complete Julia
//!   definition (`function name(...) ... end` or `name(...) = ...`)
//! - a string literal followed by `()` or `{}`
//! - any statements ending in `return "..."`, as long as every earlier
//!   `return` returns the same literal
//!
//! Anything else is a compile error.
//!
//! # Without the macro
//!
//! ```ignore
//! use jlext::{JuliaModule, define, julia_eval, julia_exec};
//!
//! let add = define(r#"fn add(x: i64, y: i64) -> i64 { "return x + y" }"#)?;
//! assert_eq!(add.call((3, 4))?, 7.into());
//!
//! julia_exec("using LinearAlgebra")?;
//! let la = JuliaModule::open("LinearAlgebra")?;
//! assert_eq!(la.call("norm", (vec![3.0, 4.0],))?, 5.0.into());
//! assert_eq!(julia_eval("sum(1:100)")?, 5050.into());
//! ```
//!
//! # Configuration
//!
//! The global runtime reads `JLEXT_JULIA` (the executable, default `julia`),
//! `JLEXT_PROJECT` (passed as `--project=`) and `JLEXT_JULIA_ARGS` (extra
//! whitespace-separated arguments). Call [`Runtime::install_global`] before
//! first use to choose a runtime yourself.

extern crate self as jlext;

// Re-export public API from jlext_core
pub use jlext_core::api::{FunctionParts, JuliaFunction, JuliaModule, define, define_named, julia_eval, julia_exec};
pub use jlext_core::runtime::{Interpreter, Runtime};
pub use jlext_core::{RuntimeOptions, source};

// Re-export values and conversions
pub use jlext_core::value::{FromValue, Handle, IntoArgs, ReleaseQueue, Value};

// Re-export errors
pub use jlext_core::error::{Error, ExtractionError, JuliaError, Result};

// Re-export the attribute macro
pub use jlext_macros::julia;

/// Support for code generated by `#[julia]`. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
