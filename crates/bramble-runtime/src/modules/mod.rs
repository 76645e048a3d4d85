// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in modules
//!
//! Built-ins are looked up by name before any path resolution. They never
//! touch the filesystem or the module registry, and every `require` of the
//! same name returns the same exports.

pub mod path;

use bramble_script::{ObjectRef, Value};
use std::collections::HashMap;

/// Reserved specifier names and their exports
#[derive(Debug, Clone, Default)]
pub struct BuiltinModules {
    modules: HashMap<String, Value>,
}

impl BuiltinModules {
    /// An empty set: every specifier goes through resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// `path`, plus `process` and `console` taken from `globals` when present.
    pub fn standard(globals: &ObjectRef) -> Self {
        let mut builtins = Self::new();
        builtins.register("path", path::create_module());
        for name in ["process", "console"] {
            if let Some(exports) = globals.get(name) {
                builtins.register(name, exports);
            }
        }
        builtins
    }

    /// Registers (or replaces) a built-in
    pub fn register(&mut self, name: impl Into<String>, exports: Value) {
        self.modules.insert(name.into(), exports);
    }

    /// Get a built-in's exports. A `node:` prefix is accepted.
    pub fn get(&self, id: &str) -> Option<Value> {
        let name = id.strip_prefix("node:").unwrap_or(id);
        self.modules.get(name).cloned()
    }

    /// Check if a specifier names a built-in
    pub fn is_builtin(&self, id: &str) -> bool {
        let name = id.strip_prefix("node:").unwrap_or(id);
        self.modules.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }
}
