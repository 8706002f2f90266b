//! Julia functions callable from Rust.
//!
//! A [`JuliaFunction`] holds a synthesized definition and compiles it on first
//! use: the definition and its batch helper are evaluated in the runtime, both
//! are resolved to handles, and the wrapper switches to calling those handles
//! directly. The switch happens once and is never undone.

use crate::error::{Error, Result};
use crate::names::{reserve, unique_name};
use crate::runtime::Runtime;
use crate::source::HostFunction;
use crate::synth::{build_function, build_map_function};
use crate::value::{FromValue, IntoArgs, Value};
use core::fmt;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

/// Everything needed to build a [`JuliaFunction`].
#[derive(Debug, Clone, Default)]
pub struct FunctionParts {
    /// Name of the Rust function the code was written in.
    pub host_name: String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// Extracted Julia source: statements or a complete definition.
    pub source: String,
    /// Julia name to define. A unique one derived from `host_name` when absent.
    pub name: Option<String>,
    /// Documentation carried over from the Rust function.
    pub doc: Option<String>,
}

/// What calls do in the current state of a wrapper.
trait Dispatch: Send + Sync {
    fn call(&self, function: &JuliaFunction, args: &[Value]) -> Result<Value>;

    fn map(&self, function: &JuliaFunction, batch: Value) -> Result<Value>;

    fn is_compiled(&self) -> bool;
}

/// Compile first, then delegate to the compiled state.
struct Uncompiled;

impl Dispatch for Uncompiled {
    fn call(&self, function: &JuliaFunction, args: &[Value]) -> Result<Value> {
        function.compile()?.call(function, args)
    }

    fn map(&self, function: &JuliaFunction, batch: Value) -> Result<Value> {
        function.compile()?.map(function, batch)
    }

    fn is_compiled(&self) -> bool {
        false
    }
}

/// Handles of the defined function and its batch helper.
struct Compiled {
    function: Value,
    batch: Value,
}

impl Dispatch for Compiled {
    fn call(&self, function: &JuliaFunction, args: &[Value]) -> Result<Value> {
        function.runtime.call_value(&self.function, args)
    }

    fn map(&self, function: &JuliaFunction, batch: Value) -> Result<Value> {
        function.runtime.call_value(&self.batch, &[batch])
    }

    fn is_compiled(&self) -> bool {
        true
    }
}

/// A Julia function bound to a runtime, compiled on first call.
///
/// # Example
///
/// ```ignore
/// use jlext_core::{FunctionParts, JuliaFunction, Runtime};
/// use std::sync::Arc;
///
/// let fib = JuliaFunction::new(
///     Arc::clone(Runtime::global()),
///     FunctionParts {
///         host_name: "fib".to_string(),
///         params: vec!["n".to_string()],
///         source: "n <= 1 && return n\nreturn fib(n - 1) + fib(n - 2)".to_string(),
///         ..FunctionParts::default()
///     },
/// );
///
/// assert_eq!(fib.call((10,))?, 55.into());
/// assert_eq!(fib.map([(10,), (20,)])?, vec![55.into(), 6765.into()]);
/// ```
pub struct JuliaFunction {
    runtime: Arc<Runtime>,
    host_name: String,
    julia_name: String,
    params: Vec<String>,
    doc: Option<String>,
    source: String,
    dispatch: RwLock<Arc<dyn Dispatch>>,
    compile_lock: Mutex<()>,
}

impl JuliaFunction {
    /// Synthesize the definition described by `parts`. Nothing is sent to
    /// Julia until the first call.
    pub fn new(runtime: Arc<Runtime>, parts: FunctionParts) -> Self {
        let requested = match parts.name {
            Some(name) => name,
            None => unique_name(&parts.host_name),
        };
        let synthesized = build_function(&requested, parts.params.as_slice(), &parts.source);
        reserve(&synthesized.name);
        debug!(
            host = %parts.host_name,
            julia = %synthesized.name,
            passthrough = synthesized.passthrough,
            "synthesized Julia function"
        );

        Self {
            runtime,
            host_name: parts.host_name,
            julia_name: synthesized.name,
            params: parts.params,
            doc: parts.doc,
            source: synthesized.source,
            dispatch: RwLock::new(Arc::new(Uncompiled)),
            compile_lock: Mutex::new(()),
        }
    }

    /// Build a wrapper from a parsed Rust function, optionally under an
    /// explicit Julia `name`.
    pub fn from_host(runtime: Arc<Runtime>, host: &HostFunction, name: Option<&str>) -> Result<Self> {
        let source = host.source()?;
        Ok(Self::new(
            runtime,
            FunctionParts {
                host_name: host.name.clone(),
                params: host.params.clone(),
                source,
                name: name.map(str::to_string),
                doc: host.doc.clone(),
            },
        ))
    }

    /// Name of the Rust function this was written in.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Name of the function in Julia's `Main`.
    pub fn julia_name(&self) -> &str {
        &self.julia_name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// The complete Julia definition.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn is_compiled(&self) -> bool {
        self.current().is_compiled()
    }

    /// Call the function with positional arguments.
    pub fn call(&self, args: impl IntoArgs) -> Result<Value> {
        self.current().call(self, &args.into_args())
    }

    /// [`JuliaFunction::call`], converting the result.
    pub fn call_as<T: FromValue>(&self, args: impl IntoArgs) -> Result<T> {
        T::from_value(self.call(args)?)
    }

    /// Apply the function to every argument tuple of `batch` in one round
    /// trip. Results come back in input order; any failure fails the whole
    /// batch.
    pub fn map<I>(&self, batch: I) -> Result<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: IntoArgs,
    {
        let tuples = batch
            .into_iter()
            .map(|args| Value::Tuple(args.into_args()))
            .collect();
        match self.current().map(self, Value::Array(tuples))? {
            Value::Array(results) => Ok(results),
            other => Err(Error::conversion("array", &other)),
        }
    }

    /// [`JuliaFunction::map`], converting each result.
    pub fn map_as<T, I>(&self, batch: I) -> Result<Vec<T>>
    where
        T: FromValue,
        I: IntoIterator,
        I::Item: IntoArgs,
    {
        self.map(batch)?.into_iter().map(T::from_value).collect()
    }

    fn current(&self) -> Arc<dyn Dispatch> {
        Arc::clone(&self.dispatch.read())
    }

    fn compile(&self) -> Result<Arc<dyn Dispatch>> {
        let _guard = self.compile_lock.lock();
        let current = self.current();
        if current.is_compiled() {
            return Ok(current);
        }

        debug!(name = %self.julia_name, "compiling Julia function");
        self.runtime.exec(&self.source)?;
        let function = self.runtime.eval(&self.julia_name)?;
        let helper = build_map_function(&self.julia_name);
        self.runtime.exec(&helper.source)?;
        let batch = self.runtime.eval(&helper.name)?;

        let compiled: Arc<dyn Dispatch> = Arc::new(Compiled { function, batch });
        *self.dispatch.write() = Arc::clone(&compiled);
        debug!(name = %self.julia_name, "Julia function compiled");
        Ok(compiled)
    }
}

impl fmt::Display for JuliaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<JuliaFunction {}>", self.julia_name)
    }
}

impl fmt::Debug for JuliaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
