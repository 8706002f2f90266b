//! Error types for jlext.
//!
//! Everything a caller can see is an [`Error`]. Errors raised by Julia itself
//! arrive as [`Error::Julia`] carrying the exception type and message exactly as
//! the interpreter reported them; nothing here retries, translates or swallows
//! them.

use crate::value::Value;
use miette::Diagnostic;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Public error type for all jlext operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The host function body does not match an accepted authoring style.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The Julia runtime could not be started.
    #[error("failed to start Julia runtime: {message}")]
    RuntimeInit { message: String },

    /// An exception raised by Julia while compiling or running code.
    #[error(transparent)]
    Julia(#[from] JuliaError),

    /// A module proxy lookup for a reserved (`_`-prefixed) name.
    #[error("module `{module}` has no attribute `{name}`")]
    AttributeNotFound { module: String, name: String },

    /// A module path that is not a dotted sequence of identifiers.
    #[error("invalid Julia module name `{0}`")]
    InvalidModuleName(String),

    /// Attempted to call a value that is not an embedded object.
    #[error("value is not callable: {0}")]
    NotCallable(Value),

    /// A returned value could not be converted to the requested host type.
    #[error("expected {expected}, found {found}")]
    Conversion {
        expected: &'static str,
        found: String,
    },

    /// The interpreter sent something the backend could not understand.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Reading from or writing to the interpreter failed.
    #[error("I/O error talking to Julia: {0}")]
    Io(#[from] std::io::Error),

    /// `Runtime::install_global` was called after the global runtime existed.
    #[error("the global runtime is already installed")]
    GlobalRuntimeInstalled,
}

impl Error {
    pub(crate) fn conversion(expected: &'static str, found: &Value) -> Self {
        Error::Conversion {
            expected,
            found: found.kind().to_string(),
        }
    }
}

/// An exception raised inside Julia, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct JuliaError {
    /// The exception type, e.g. `UndefVarError`.
    pub kind: String,
    /// The rendered exception message.
    pub message: String,
}

impl JuliaError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Failure to recover Julia source from a host function definition.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ExtractionError {
    /// The definition text is not a single Rust `fn` item.
    #[error("cannot parse host function: {message}")]
    #[diagnostic(code(jlext::extract::parse))]
    Parse { message: String },

    /// A parameter that is not a plain identifier (`self`, tuples, ...).
    #[error("function `{function}` has an unsupported parameter `{parameter}`")]
    #[diagnostic(
        code(jlext::extract::parameter),
        help("parameters must be plain identifiers, e.g. `x: f64`")
    )]
    Parameter { function: String, parameter: String },

    /// The body matches none of the accepted styles.
    #[error("cannot extract Julia code from function `{function}`: {reason}")]
    #[diagnostic(
        code(jlext::extract::body),
        help("use a string literal as the whole body, or end the body with `return \"...\"`")
    )]
    Body { function: String, reason: String },
}
