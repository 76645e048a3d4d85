//! Variable bindings for a running module.

use super::value::Value;
use crate::ast::VariableKind;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

/// The module scope: wrapper parameters plus top-level declarations.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: FxHashMap<String, Binding>,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a wrapper parameter (mutable, like a function parameter).
    pub fn bind_parameter(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(
            name.into(),
            Binding {
                value,
                mutable: true,
            },
        );
    }

    /// Declares a variable. Redeclaring a `const` is an error.
    pub fn declare(&mut self, name: &str, kind: VariableKind, value: Value) -> Result<()> {
        if let Some(existing) = self.bindings.get(name) {
            if !existing.mutable || kind != VariableKind::Var {
                return Err(Error::type_error(format!(
                    "Identifier '{}' has already been declared",
                    name
                )));
            }
        }
        self.bindings.insert(
            name.to_string(),
            Binding {
                value,
                mutable: kind != VariableKind::Const,
            },
        );
        Ok(())
    }

    /// Looks up a binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).map(|b| b.value.clone())
    }

    /// Assigns to a binding. Returns `Ok(false)` if the name is unbound.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<bool> {
        match self.bindings.get_mut(name) {
            Some(binding) if !binding.mutable => {
                Err(Error::type_error("Assignment to constant variable."))
            }
            Some(binding) => {
                binding.value = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
