//! Public API: compiled function wrappers, module proxies and helpers bound to
//! the global runtime.
//!
//! # Example
//!
//! ```ignore
//! use jlext_core::api::{define, julia_eval, julia_exec, JuliaModule};
//!
//! let add = define(r#"
//!     /// Adds two numbers in Julia.
//!     fn add(x: i64, y: i64) -> i64 {
//!         "return x + y"
//!     }
//! "#)?;
//! assert_eq!(add.call((3, 4))?, 7.into());
//!
//! julia_exec("using LinearAlgebra")?;
//! let la = JuliaModule::open("LinearAlgebra")?;
//! let _ = la.get("norm")?;
//! assert_eq!(julia_eval("1 + 1")?, 2.into());
//! ```

pub mod function;
pub mod module;


pub use function::{FunctionParts, JuliaFunction};
pub use module::JuliaModule;

use crate::error::Result;
use crate::runtime::Runtime;
use crate::source::HostFunction;
use crate::value::Value;
use std::sync::Arc;

/// Define a Julia function from Rust source text on the global runtime.
///
/// `host_source` holds one `fn` item whose body is Julia code in one of the
/// accepted styles. Extraction errors are reported here; Julia errors on the
/// first call.
pub fn define(host_source: &str) -> Result<JuliaFunction> {
    let host = HostFunction::parse(host_source)?;
    JuliaFunction::from_host(Arc::clone(Runtime::global()), &host, None)
}

/// [`define`] under an explicit Julia name, used as-is.
pub fn define_named(host_source: &str, name: &str) -> Result<JuliaFunction> {
    let host = HostFunction::parse(host_source)?;
    JuliaFunction::from_host(Arc::clone(Runtime::global()), &host, Some(name))
}

/// Evaluate a Julia expression on the global runtime, memoized on its text.
pub fn julia_eval(code: &str) -> Result<Value> {
    Runtime::global().eval_cached(code)
}

/// Execute Julia statements on the global runtime. Never cached.
pub fn julia_exec(code: &str) -> Result<()> {
    Runtime::global().exec(code)
}
