//! Callable values.

use super::value::Value;
use crate::error::Result;
use std::sync::Arc;

/// A native (Rust) function body.
pub type NativeFunction = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Something a script can call.
#[derive(Clone)]
pub enum Callable {
    /// A native Rust function
    Native {
        /// The function name
        name: String,
        /// The native function body
        func: NativeFunction,
    },
    /// A module's `require`. `owner` is the filename of the module the
    /// binding was created for; calls load on that module's behalf no matter
    /// where the reference is called from.
    Require {
        /// Filename of the requesting module
        owner: String,
    },
}

impl Callable {
    /// Wraps a closure as a native function value.
    pub fn native<F>(name: impl Into<String>, func: F) -> Value
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(Callable::Native {
            name: name.into(),
            func: Arc::new(func),
        }))
    }

    /// A `require` bound to the module at `owner`.
    pub fn require(owner: impl Into<String>) -> Value {
        Value::Function(Arc::new(Callable::Require {
            owner: owner.into(),
        }))
    }

    /// The function name, as shown by `inspect`.
    pub fn name(&self) -> &str {
        match self {
            Callable::Native { name, .. } => name,
            Callable::Require { .. } => "require",
        }
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Native { name, .. } => write!(f, "NativeFunction({})", name),
            Callable::Require { owner } => write!(f, "Require({})", owner),
        }
    }
}
