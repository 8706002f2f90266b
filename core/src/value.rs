//! Values crossing the Rust/Julia boundary.
//!
//! Plain data (numbers, strings, vectors, tuples) travels by value. Anything
//! else Julia hands back (functions, modules, matrices, structs) stays on the
//! Julia side and is represented here by an opaque [`Handle`].

use crate::error::{Error, Result};
use core::fmt;
use core::hash::{Hash, Hasher};
use parking_lot::Mutex;
use std::sync::Arc;

/// Largest argument count accepted by [`IntoArgs`] tuples.
pub const MAX_ARITY: usize = 12;

/// Reference to an object living inside the embedded runtime.
///
/// Clones share ownership. A handle built with [`Handle::owned`] queues its id
/// on a [`ReleaseQueue`] when the last clone is dropped, and the backend tells
/// the runtime to forget the object with its next request. Handles built with
/// [`Handle::new`] are never released.
#[derive(Clone)]
pub struct Handle {
    /// Backend-assigned identifier.
    pub id: u64,
    /// Julia type name, for display only.
    pub type_name: Arc<str>,
    owner: Option<Arc<Owner>>,
}

struct Owner {
    id: u64,
    releases: ReleaseQueue,
}

impl Drop for Owner {
    fn drop(&mut self) {
        self.releases.push(self.id);
    }
}

impl Handle {
    /// A handle that is never released.
    pub fn new(id: u64, type_name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            owner: None,
        }
    }

    /// A handle whose id goes to `releases` once the last clone is dropped.
    pub fn owned(id: u64, type_name: impl Into<Arc<str>>, releases: &ReleaseQueue) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            owner: Some(Arc::new(Owner {
                id,
                releases: releases.clone(),
            })),
        }
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.type_name == other.type_name
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.type_name.hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Ids of dropped handles, waiting to be released by their backend.
#[derive(Clone, Default)]
pub struct ReleaseQueue {
    ids: Arc<Mutex<Vec<u64>>>,
}

impl ReleaseQueue {
    fn push(&self, id: u64) {
        self.ids.lock().push(id);
    }

    /// Take every queued id, oldest first.
    pub fn take(&self) -> Vec<u64> {
        core::mem::take(&mut *self.ids.lock())
    }

    /// Put ids back after a request that could not carry them.
    pub fn restore(&self, ids: Vec<u64>) {
        let mut queued = self.ids.lock();
        let newer = core::mem::replace(&mut *queued, ids);
        queued.extend(newer);
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ReleaseQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// A value on the host side of the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Handle(Handle),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nothing => "nothing",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
            Value::Handle(_) => "handle",
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Value::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Elements of an array or tuple.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            Value::Nothing => write!(f, "nothing"),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{:?}", value),
            Value::Str(value) => write!(f, "{:?}", value),
            Value::Array(items) => {
                write!(f, "[")?;
                seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Handle(handle) => write!(f, "<{} #{}>", handle.type_name, handle.id),
        }
    }
}

// ============================================================================
// Host -> Value
// ============================================================================

macro_rules! from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Int(i64::from(value))
            }
        })*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nothing
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Value::Handle(value)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nothing, Into::into)
    }
}

// ============================================================================
// Value -> Host
// ============================================================================

/// Conversion of a returned [`Value`] into a host type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(value) => Ok(value),
            other => Err(Error::conversion("int", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| Error::conversion("i32", &Value::Int(wide)))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(value) => Ok(value),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(value) => Ok(value as f64),
            other => Err(Error::conversion("float", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(value) => Ok(value),
            other => Err(Error::conversion("bool", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(value) => Ok(value),
            other => Err(Error::conversion("string", &other)),
        }
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Nothing => Ok(()),
            other => Err(Error::conversion("nothing", &other)),
        }
    }
}

impl FromValue for Handle {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Handle(handle) => Ok(handle),
            other => Err(Error::conversion("handle", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) | Value::Tuple(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            other => Err(Error::conversion("array", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Nothing => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ============================================================================
// Argument lists
// ============================================================================

/// A positional argument list for one call.
pub trait IntoArgs {
    fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for Vec<Value> {
    fn into_args(self) -> Vec<Value> {
        self
    }
}

impl IntoArgs for &[Value] {
    fn into_args(self) -> Vec<Value> {
        self.to_vec()
    }
}

impl<const N: usize> IntoArgs for [Value; N] {
    fn into_args(self) -> Vec<Value> {
        self.into()
    }
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! tuple_args {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }

        impl<$($name: Into<Value>),+> From<($($name,)+)> for Value {
            #[allow(non_snake_case)]
            fn from(tuple: ($($name,)+)) -> Self {
                let ($($name,)+) = tuple;
                Value::Tuple(vec![$($name.into()),+])
            }
        }

        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            #[allow(non_snake_case)]
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Tuple(items) | Value::Array(items) => {
                        let mut items = items.into_iter();
                        $(
                            let $name = $name::from_value(
                                items.next().ok_or_else(|| Error::Conversion {
                                    expected: "longer tuple",
                                    found: "shorter tuple".to_string(),
                                })?,
                            )?;
                        )+
                        if items.next().is_some() {
                            return Err(Error::Conversion {
                                expected: "shorter tuple",
                                found: "longer tuple".to_string(),
                            });
                        }
                        Ok(($($name,)+))
                    }
                    other => Err(Error::conversion("tuple", &other)),
                }
            }
        }
    };
}

tuple_args!(A);
tuple_args!(A, B);
tuple_args!(A, B, C);
tuple_args!(A, B, C, D);
tuple_args!(A, B, C, D, E);
tuple_args!(A, B, C, D, E, F);
tuple_args!(A, B, C, D, E, F, G);
tuple_args!(A, B, C, D, E, F, G, H);
tuple_args!(A, B, C, D, E, F, G, H, I);
tuple_args!(A, B, C, D, E, F, G, H, I, J);
tuple_args!(A, B, C, D, E, F, G, H, I, J, K);
tuple_args!(A, B, C, D, E, F, G, H, I, J, K, L);
