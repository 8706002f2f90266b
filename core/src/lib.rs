//! Core of jlext: write Julia functions inside Rust and call them like native ones.
//!
//! The pieces, leaf-first:
//!
//! - [`source`]: recovers the Julia source embedded in a Rust `fn` body.
//! - [`synth`]: turns extracted source into a complete Julia definition.
//! - [`names`]: process-wide unique naming for synthesized functions.
//! - [`runtime`]: the lazily started interpreter and its caches.
//! - [`julia`]: the `julia` child-process backend.
//! - [`api`]: compiled function wrappers, module proxies and the global helpers.
//!
//! # Example
//!
//! ```ignore
//! use jlext_core::api::{define, julia_eval};
//!
//! let add = define(r#"
//!     fn add(x: i64, y: i64) -> i64 {
//!         "return x + y"
//!     }
//! "#)?;
//!
//! assert_eq!(add.call((3, 4))?, 7.into());
//! assert_eq!(add.map([(3, 4), (5, 6)])?, vec![7.into(), 11.into()]);
//! assert_eq!(julia_eval("sum(1:100)")?, 5050.into());
//! ```

pub mod api;
pub mod error;
pub mod julia;
pub mod lru;
pub mod names;
pub mod options;
pub mod runtime;
pub mod source;
pub mod synth;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{FunctionParts, JuliaFunction, JuliaModule};
pub use error::{Error, ExtractionError, JuliaError, Result};
pub use options::RuntimeOptions;
pub use runtime::{Interpreter, Runtime};
pub use value::{FromValue, Handle, IntoArgs, ReleaseQueue, Value};
