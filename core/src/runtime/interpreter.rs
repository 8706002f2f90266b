//! The embedded interpreter seam.

use crate::error::Result;
use crate::value::{Handle, Value};

/// The primitives a Julia backend must provide.
///
/// Everything the [`Runtime`](super::Runtime) does is expressed through these
/// calls. Values pass through unchanged; converting them to and from Julia is
/// the backend's business.
///
/// Implementations must be usable from several threads; a backend that can
/// only serve one request at a time serializes internally.
pub trait Interpreter: Send + Sync {
    /// Evaluate Julia source (an expression or a sequence of statements) in
    /// `Main` and return the value of the last one.
    fn eval(&self, code: &str) -> Result<Value>;

    /// Call an embedded callable with positional arguments.
    fn call(&self, callee: &Handle, args: &[Value]) -> Result<Value>;

    /// Resolve `name` on an embedded object, typically a module member.
    fn get_attr(&self, target: &Handle, name: &str) -> Result<Value>;

    /// Convert `value` to the Julia type named by `ty`.
    fn convert(&self, ty: &str, value: &Value) -> Result<Value>;

    /// Create a fresh, empty module called `name`.
    fn new_module(&self, name: &str) -> Result<Value>;
}

impl<T: Interpreter + ?Sized> Interpreter for Box<T> {
    fn eval(&self, code: &str) -> Result<Value> {
        (**self).eval(code)
    }

    fn call(&self, callee: &Handle, args: &[Value]) -> Result<Value> {
        (**self).call(callee, args)
    }

    fn get_attr(&self, target: &Handle, name: &str) -> Result<Value> {
        (**self).get_attr(target, name)
    }

    fn convert(&self, ty: &str, value: &Value) -> Result<Value> {
        (**self).convert(ty, value)
    }

    fn new_module(&self, name: &str) -> Result<Value> {
        (**self).new_module(name)
    }
}
