//! An in-process stand-in for Julia, for tests and benchmarks.
//!
//! [`StubInterpreter`] understands just enough of the text this crate sends to
//! Julia to behave like it: long- and short-form definitions, the batch
//! helper, `using`, bare names and module members. Function bodies are not
//! interpreted; each body text is bound to a Rust closure registered with
//! [`StubInterpreter::implement`]. Every primitive call is counted so tests can
//! assert how many boundary crossings an operation made.
//!
//! Like the driver running inside `julia`, every handle handed back to the host
//! gets a fresh id that is forgotten once the host drops it and makes another
//! request.
//!
//! ```
//! use jlext_core::testing::StubInterpreter;
//! use jlext_core::{Runtime, RuntimeOptions, Value};
//!
//! let stub = StubInterpreter::new();
//! stub.expression("sqrt(4.0)", Value::Float(2.0));
//! let runtime = Runtime::with_connector(&RuntimeOptions::default(), stub.connector());
//!
//! assert_eq!(runtime.eval_cached("sqrt(4.0)").unwrap(), Value::Float(2.0));
//! assert_eq!(runtime.eval_cached("sqrt(4.0)").unwrap(), Value::Float(2.0));
//! assert_eq!(stub.evals(), 1);
//! ```

use crate::error::{Error, JuliaError, Result};
use crate::runtime::Interpreter;
use crate::source::dedent;
use crate::value::{Handle, ReleaseQueue, Value};
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex_lite::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Implementation of a stubbed Julia function.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

static LONG_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^function\s+([A-Za-z_][A-Za-z0-9_!]*)\(([^)]*)\)\n(.*)\nend$")
        .unwrap_or_else(|err| unreachable!("{err}"))
});

static MAP_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([A-Za-z_][A-Za-z0-9_!]*)\(args_list\) = \[Base\.invokelatest\(([A-Za-z_][A-Za-z0-9_!]*), a\.\.\.\) for a in args_list\]$",
    )
    .unwrap_or_else(|err| unreachable!("{err}"))
});

static SHORT_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_!]*)\(([^)]*)\)\s*=\s*(.+)$")
        .unwrap_or_else(|err| unreachable!("{err}"))
});

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_!]*$").unwrap_or_else(|err| unreachable!("{err}"))
});

/// A scripted, call-counting [`Interpreter`].
#[derive(Clone, Default)]
pub struct StubInterpreter {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    releases: ReleaseQueue,
    connects: AtomicUsize,
    evals: AtomicUsize,
    calls: AtomicUsize,
    attrs: AtomicUsize,
    converts: AtomicUsize,
}

#[derive(Default)]
struct State {
    bodies: HashMap<String, NativeFn>,
    expressions: HashMap<String, Value>,
    packages: HashMap<String, HashMap<String, Value>>,
    module_handles: HashMap<String, Handle>,
    globals: HashMap<String, Value>,
    objects: HashMap<u64, Object>,
    last_id: u64,
    exported: usize,
    released: usize,
    evaluated: Vec<String>,
}

#[derive(Clone)]
enum Object {
    Function(NativeFn),
    Module(String),
}

impl State {
    /// Keep `object` for the life of the stub.
    fn store(&mut self, object: Object, type_name: &str) -> Handle {
        self.last_id += 1;
        self.objects.insert(self.last_id, object);
        Handle::new(self.last_id, type_name)
    }

    fn object(&self, handle: &Handle) -> Result<Object> {
        self.objects
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| julia_error("KeyError", format!("no object #{}", handle.id)))
    }

    /// Re-issue every handle in `value` under a new id owned by the host.
    fn export(&mut self, value: Value, releases: &ReleaseQueue) -> Value {
        match value {
            Value::Handle(handle) => match self.objects.get(&handle.id).cloned() {
                Some(object) => {
                    self.last_id += 1;
                    self.objects.insert(self.last_id, object);
                    self.exported += 1;
                    Value::Handle(Handle::owned(self.last_id, handle.type_name, releases))
                }
                None => Value::Handle(handle),
            },
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.export(item, releases))
                    .collect(),
            ),
            Value::Tuple(items) => Value::Tuple(
                items
                    .into_iter()
                    .map(|item| self.export(item, releases))
                    .collect(),
            ),
            other => other,
        }
    }

    fn release(&mut self, ids: Vec<u64>) {
        for id in ids {
            if self.objects.remove(&id).is_some() {
                self.released += 1;
            }
        }
    }

    fn module_handle(&mut self, name: &str) -> Handle {
        if let Some(handle) = self.module_handles.get(name) {
            return handle.clone();
        }
        let handle = self.store(Object::Module(name.to_string()), "Module");
        self.module_handles.insert(name.to_string(), handle.clone());
        handle
    }

    fn bind_function(&mut self, name: &str, function: NativeFn) -> Value {
        let handle = Value::Handle(self.store(Object::Function(function), "Function"));
        self.globals.insert(name.to_string(), handle.clone());
        handle
    }
}

fn julia_error(kind: &str, message: impl Into<String>) -> Error {
    Error::Julia(JuliaError::new(kind, message))
}

fn arguments(tuple: &Value) -> Vec<Value> {
    match tuple {
        Value::Tuple(items) | Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

impl StubInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a Julia function body (or short-form right-hand side) to `f`.
    ///
    /// Long-form bodies are matched after dedenting, so register them the way
    /// they were written before synthesis.
    pub fn implement<F>(&self, body: &str, f: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.inner
            .state
            .lock()
            .bodies
            .insert(body.trim().to_string(), Arc::new(f));
        self
    }

    /// Make `eval(code)` return `value`.
    pub fn expression(&self, code: &str, value: Value) -> &Self {
        self.inner
            .state
            .lock()
            .expressions
            .insert(code.to_string(), value);
        self
    }

    /// Make `using {module}` succeed and expose `member` on it.
    pub fn module_member(&self, module: &str, member: &str, value: Value) -> &Self {
        self.inner
            .state
            .lock()
            .packages
            .entry(module.to_string())
            .or_default()
            .insert(member.to_string(), value);
        self
    }

    /// Expose a callable `member` on `module`.
    pub fn module_function<F>(&self, module: &str, member: &str, f: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let handle = {
            let mut state = self.inner.state.lock();
            Value::Handle(state.store(Object::Function(Arc::new(f)), "Function"))
        };
        self.module_member(module, member, handle)
    }

    /// A connector for [`Runtime::with_connector`](crate::Runtime::with_connector)
    /// that hands out this stub.
    pub fn connector(&self) -> impl Fn() -> Result<Box<dyn Interpreter>> + Send + Sync + use<> {
        let stub = self.clone();
        move || {
            stub.inner.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(stub.clone()) as Box<dyn Interpreter>)
        }
    }

    /// How many times the connector started this stub.
    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Number of `eval` requests.
    pub fn evals(&self) -> usize {
        self.inner.evals.load(Ordering::SeqCst)
    }

    /// Number of `call` requests.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Number of `get_attr` requests.
    pub fn attr_lookups(&self) -> usize {
        self.inner.attrs.load(Ordering::SeqCst)
    }

    /// Number of `convert` requests.
    pub fn converts(&self) -> usize {
        self.inner.converts.load(Ordering::SeqCst)
    }

    /// Every text passed to `eval`, in order.
    pub fn evaluated(&self) -> Vec<String> {
        self.inner.state.lock().evaluated.clone()
    }

    /// Handles given to the host that have not been released yet.
    pub fn live_handles(&self) -> usize {
        let state = self.inner.state.lock();
        state.exported - state.released
    }

    /// Handles the host dropped and a later request released.
    pub fn released(&self) -> usize {
        self.inner.state.lock().released
    }

    /// How many evaluated texts defined a function called `name`.
    pub fn definitions_of(&self, name: &str) -> usize {
        let state = self.inner.state.lock();
        state
            .evaluated
            .iter()
            .filter(|code| {
                LONG_FORM
                    .captures(code.trim())
                    .or_else(|| SHORT_FORM.captures(code.trim()))
                    .and_then(|caps| caps.get(1))
                    .is_some_and(|m| m.as_str() == name)
            })
            .count()
    }

    /// Lock the state, applying releases queued since the last request.
    fn begin(&self) -> parking_lot::MutexGuard<'_, State> {
        let released = self.inner.releases.take();
        let mut state = self.inner.state.lock();
        state.release(released);
        state
    }

    fn reply(&self, state: &mut State, result: Result<Value>) -> Result<Value> {
        result.map(|value| state.export(value, &self.inner.releases))
    }

    fn define_long(&self, state: &mut State, name: &str, body: &str) -> Result<Value> {
        let body = dedent(body);
        let function = state.bodies.get(body.trim()).cloned().ok_or_else(|| {
            julia_error("ErrorException", format!("no stub implementation for body of `{name}`"))
        })?;
        state.bind_function(name, function);
        Ok(Value::Nothing)
    }

    fn define_map(&self, state: &mut State, name: &str, target: &str) -> Result<Value> {
        let target = match state.globals.get(target) {
            Some(Value::Handle(handle)) => match state.object(handle)? {
                Object::Function(function) => function,
                Object::Module(_) => return Err(julia_error("MethodError", "not a function")),
            },
            _ => return Err(julia_error("UndefVarError", format!("`{target}` not defined"))),
        };
        let batch: NativeFn = Arc::new(move |args: &[Value]| {
            let list = args
                .first()
                .and_then(Value::as_slice)
                .ok_or_else(|| julia_error("MethodError", "expected a vector of tuples"))?;
            list.iter()
                .map(|tuple| target(&arguments(tuple)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        });
        state.bind_function(name, batch);
        Ok(Value::Nothing)
    }
}

impl Interpreter for StubInterpreter {
    fn eval(&self, code: &str) -> Result<Value> {
        self.inner.evals.fetch_add(1, Ordering::SeqCst);
        let mut state = self.begin();
        state.evaluated.push(code.to_string());
        let result = self.eval_locked(&mut state, code);
        self.reply(&mut state, result)
    }

    fn call(&self, callee: &Handle, args: &[Value]) -> Result<Value> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let object = self.begin().object(callee)?;
        let result = match object {
            Object::Function(function) => function(args),
            Object::Module(name) => Err(julia_error(
                "MethodError",
                format!("objects of type Module are not callable ({name})"),
            )),
        };
        self.reply(&mut self.inner.state.lock(), result)
    }

    fn get_attr(&self, target: &Handle, name: &str) -> Result<Value> {
        self.inner.attrs.fetch_add(1, Ordering::SeqCst);
        let mut state = self.begin();
        let result = match state.object(target)? {
            Object::Module(module) => state
                .packages
                .get(&module)
                .and_then(|members| members.get(name))
                .cloned()
                .ok_or_else(|| julia_error("UndefVarError", format!("`{name}` not defined in `{module}`"))),
            Object::Function(_) => Err(julia_error(
                "ErrorException",
                format!("type Function has no field {name}"),
            )),
        };
        self.reply(&mut state, result)
    }

    fn convert(&self, ty: &str, value: &Value) -> Result<Value> {
        self.inner.converts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.begin();
        let result = match (ty, value) {
            #[allow(clippy::cast_precision_loss)]
            ("Float64", Value::Int(v)) => Ok(Value::Float(*v as f64)),
            #[allow(clippy::cast_possible_truncation)]
            ("Int64", Value::Float(v)) if v.fract() == 0.0 => Ok(Value::Int(*v as i64)),
            ("Int64", Value::Float(v)) => Err(julia_error("InexactError", format!("Int64({v})"))),
            (_, other) => Ok(other.clone()),
        };
        self.reply(&mut state, result)
    }

    fn new_module(&self, name: &str) -> Result<Value> {
        let mut state = self.begin();
        state.packages.entry(name.to_string()).or_default();
        let handle = state.store(Object::Module(name.to_string()), "Module");
        self.reply(&mut state, Ok(Value::Handle(handle)))
    }
}

impl StubInterpreter {
    fn eval_locked(&self, state: &mut State, code: &str) -> Result<Value> {
        if let Some(value) = state.expressions.get(code) {
            return Ok(value.clone());
        }

        let code = code.trim();
        if let Some(module) = code.strip_prefix("using ") {
            let module = module.trim();
            return if state.packages.contains_key(module) {
                Ok(Value::Nothing)
            } else {
                Err(julia_error(
                    "ArgumentError",
                    format!("Package {module} not found in current path."),
                ))
            };
        }
        if let Some(caps) = LONG_FORM.captures(code) {
            let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let body = caps.get(3).map_or("", |m| m.as_str()).to_string();
            return self.define_long(state, &name, &body);
        }
        if let Some(caps) = MAP_FORM.captures(code) {
            let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let target = caps.get(2).map_or("", |m| m.as_str()).to_string();
            return self.define_map(state, &name, &target);
        }
        if let Some(caps) = SHORT_FORM.captures(code) {
            let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let rhs = caps.get(3).map_or("", |m| m.as_str()).to_string();
            return self.define_long(state, &name, &rhs);
        }
        if IDENTIFIER.is_match(code) {
            if let Some(value) = state.globals.get(code) {
                return Ok(value.clone());
            }
            if state.packages.contains_key(code) {
                return Ok(Value::Handle(state.module_handle(code)));
            }
        }
        Err(julia_error("UndefVarError", format!("`{code}` not defined")))
    }
}
