//! The runtime bridge: one lazily started Julia interpreter and its caches.
//!
//! A [`Runtime`] is cheap to build. The interpreter behind it starts on the
//! first operation that needs it, exactly once even when many threads race to
//! trigger it. If starting fails, nothing is remembered and the next operation
//! tries again.
//!
//! Two caches sit in front of the interpreter:
//!
//! - the expression cache behind [`Runtime::eval_cached`], keyed on exact
//!   source text;
//! - the function cache behind [`Runtime::resolve`] and [`Runtime::call`],
//!   mapping a fully-qualified Julia name to its handle.
//!
//! Both are bounded LRU maps. Their locks are never held while Julia runs, so a
//! key missed by two threads at once is evaluated twice and the last result
//! wins.
//!
//! # Example
//!
//! ```ignore
//! use jlext_core::{Runtime, RuntimeOptions};
//!
//! let runtime = Runtime::new(RuntimeOptions::from_env());
//! runtime.exec("using LinearAlgebra")?;
//! let n = runtime.call("LinearAlgebra.norm", (vec![3.0, 4.0],))?;
//! assert_eq!(n, 5.0.into());
//! ```

mod interpreter;

#[cfg(test)]
mod runtime_test;

pub use interpreter::Interpreter;

use crate::error::{Error, Result};
use crate::julia::JuliaProcess;
use crate::lru::LruCache;
use crate::options::RuntimeOptions;
use crate::value::{Handle, IntoArgs, Value};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Starts an interpreter. Called again after a failed start.
pub type Connector = Box<dyn Fn() -> Result<Box<dyn Interpreter>> + Send + Sync>;

static GLOBAL: OnceCell<Arc<Runtime>> = OnceCell::new();

/// A lazily started Julia interpreter.
pub struct Runtime {
    connector: Connector,
    interpreter: OnceCell<Box<dyn Interpreter>>,
    eval_cache: Mutex<LruCache<String, Value>>,
    functions: Mutex<LruCache<String, Value>>,
}

impl Runtime {
    /// A runtime backed by a `julia` child process.
    pub fn new(options: RuntimeOptions) -> Self {
        let spawn_options = options.clone();
        Self::with_connector(&options, move || {
            let process = JuliaProcess::spawn(&spawn_options)?;
            Ok(Box::new(process) as Box<dyn Interpreter>)
        })
    }

    /// A runtime whose interpreter comes from `connector`.
    ///
    /// Only the cache capacities of `options` apply.
    pub fn with_connector<F>(options: &RuntimeOptions, connector: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Interpreter>> + Send + Sync + 'static,
    {
        Self {
            connector: Box::new(connector),
            interpreter: OnceCell::new(),
            eval_cache: Mutex::new(LruCache::new(options.eval_cache_capacity)),
            functions: Mutex::new(LruCache::new(options.resolve_cache_capacity)),
        }
    }

    /// The process-wide runtime, configured from the environment on first use
    /// unless [`Runtime::install_global`] ran before.
    pub fn global() -> &'static Arc<Runtime> {
        GLOBAL.get_or_init(|| Arc::new(Runtime::new(RuntimeOptions::from_env())))
    }

    /// Make `runtime` the process-wide runtime.
    ///
    /// Fails with [`Error::GlobalRuntimeInstalled`] once a global runtime
    /// exists, whether installed or created by [`Runtime::global`].
    pub fn install_global(runtime: Runtime) -> Result<&'static Arc<Runtime>> {
        GLOBAL
            .try_insert(Arc::new(runtime))
            .map_err(|_| Error::GlobalRuntimeInstalled)
    }

    /// Whether the interpreter has been started.
    pub fn is_ready(&self) -> bool {
        self.interpreter.get().is_some()
    }

    fn interpreter(&self) -> Result<&dyn Interpreter> {
        let interpreter = self.interpreter.get_or_try_init(|| {
            debug!("starting Julia interpreter");
            let started = (self.connector)();
            match &started {
                Ok(_) => debug!("Julia interpreter ready"),
                Err(err) => debug!(error = %err, "Julia interpreter failed to start"),
            }
            started
        })?;
        Ok(&**interpreter)
    }

    /// Evaluate Julia source and return the value of its last expression.
    pub fn eval(&self, code: &str) -> Result<Value> {
        let interpreter = self.interpreter()?;
        trace!(code, "eval");
        interpreter.eval(code)
    }

    /// Execute Julia statements for their side effects.
    pub fn exec(&self, code: &str) -> Result<()> {
        self.eval(code).map(drop)
    }

    /// [`Runtime::eval`] memoized on the exact text of `code`.
    ///
    /// Side effects of `code` happen only on the first evaluation.
    pub fn eval_cached(&self, code: &str) -> Result<Value> {
        if let Some(value) = self.eval_cache.lock().get(code) {
            trace!(code, "eval cache hit");
            return Ok(value);
        }
        let value = self.eval(code)?;
        self.eval_cache.lock().insert(code.to_string(), value.clone());
        Ok(value)
    }

    /// Resolve a fully-qualified Julia name, caching the handle.
    pub fn resolve(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.functions.lock().get(name) {
            trace!(name, "function cache hit");
            return Ok(value);
        }
        let value = self.eval(name)?;
        self.functions.lock().insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Call the Julia function called `name`.
    pub fn call(&self, name: &str, args: impl IntoArgs) -> Result<Value> {
        let callee = self.resolve(name)?;
        self.call_value(&callee, &args.into_args())
    }

    /// Call an embedded callable held by a [`Value`].
    pub fn call_value(&self, callee: &Value, args: &[Value]) -> Result<Value> {
        match callee {
            Value::Handle(handle) => self.call_handle(handle, args),
            other => Err(Error::NotCallable(other.clone())),
        }
    }

    /// Call an embedded callable.
    pub fn call_handle(&self, callee: &Handle, args: &[Value]) -> Result<Value> {
        let interpreter = self.interpreter()?;
        trace!(callee = callee.id, args = args.len(), "call");
        interpreter.call(callee, args)
    }

    /// Resolve `name` on an embedded object.
    pub fn get_attr(&self, target: &Handle, name: &str) -> Result<Value> {
        let interpreter = self.interpreter()?;
        trace!(target = target.id, name, "getproperty");
        interpreter.get_attr(target, name)
    }

    /// Convert `value` to the Julia type `ty`.
    pub fn convert(&self, ty: &str, value: &Value) -> Result<Value> {
        self.interpreter()?.convert(ty, value)
    }

    /// Create a fresh module called `name`.
    pub fn new_module(&self, name: &str) -> Result<Value> {
        self.interpreter()?.new_module(name)
    }
}

impl core::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runtime")
            .field("ready", &self.is_ready())
            .field("cached_expressions", &self.eval_cache.lock().len())
            .field("cached_functions", &self.functions.lock().len())
            .finish_non_exhaustive()
    }
}
