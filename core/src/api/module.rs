//! Proxies for Julia modules.

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::value::{Handle, IntoArgs, Value};
use core::fmt;
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex_lite::Regex;
use std::sync::Arc;
use tracing::{debug, trace};

static MODULE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .unwrap_or_else(|err| unreachable!("invalid module path pattern: {err}"))
});

/// A Julia module brought into scope with `using`.
///
/// Members are looked up once and kept for the life of the proxy; module
/// contents are assumed not to change underneath it. Names starting with `_`
/// are never looked up.
///
/// ```ignore
/// use jlext_core::JuliaModule;
///
/// let la = JuliaModule::open("LinearAlgebra")?;
/// assert_eq!(la.call("norm", (vec![3.0, 4.0],))?, 5.0.into());
/// ```
pub struct JuliaModule {
    runtime: Arc<Runtime>,
    name: String,
    module: Handle,
    members: Mutex<HashMap<String, Value>>,
}

impl JuliaModule {
    /// Open `name` on the global runtime.
    pub fn open(name: &str) -> Result<Self> {
        Self::new(Arc::clone(Runtime::global()), name)
    }

    /// Run `using {name}` and resolve the module object.
    pub fn new(runtime: Arc<Runtime>, name: &str) -> Result<Self> {
        if !MODULE_PATH.is_match(name) {
            return Err(Error::InvalidModuleName(name.to_string()));
        }

        debug!(module = name, "opening Julia module");
        runtime.exec(&format!("using {name}"))?;
        let module = match runtime.eval(name)? {
            Value::Handle(handle) => handle,
            other => return Err(Error::conversion("module", &other)),
        };

        Ok(Self {
            runtime,
            name: name.to_string(),
            module,
            members: Mutex::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle of the module object.
    pub fn handle(&self) -> &Handle {
        &self.module
    }

    /// Look up a member of the module.
    pub fn get(&self, name: &str) -> Result<Value> {
        if name.starts_with('_') {
            return Err(Error::AttributeNotFound {
                module: self.name.clone(),
                name: name.to_string(),
            });
        }
        if let Some(value) = self.members.lock().get(name) {
            trace!(module = %self.name, name, "module member cache hit");
            return Ok(value.clone());
        }

        let value = self.runtime.get_attr(&self.module, name)?;
        self.members.lock().insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Call the member function `name`.
    pub fn call(&self, name: &str, args: impl IntoArgs) -> Result<Value> {
        let function = self.get(name)?;
        self.runtime.call_value(&function, &args.into_args())
    }
}

impl fmt::Display for JuliaModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<JuliaModule {}>", self.name)
    }
}

impl fmt::Debug for JuliaModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
