// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host-side `require` API

use crate::error::Result;
use crate::module_system::cache::Module;
use crate::module_system::loader::ModuleLoader;
use bramble_script::{ObjectRef, Value};

/// The require() function for CommonJS modules
pub fn require(loader: &mut ModuleLoader, specifier: &str, requester: Option<&Module>) -> Result<Value> {
    loader.load(specifier, requester)
}

/// require.resolve() - get the resolved path without loading
///
/// Built-ins resolve to their own name.
pub fn require_resolve(
    loader: &ModuleLoader,
    specifier: &str,
    requester: Option<&Module>,
) -> Result<String> {
    if loader.builtins().is_builtin(specifier) {
        return Ok(specifier.to_string());
    }
    loader
        .resolve(specifier, requester)
        .map(|resolution| resolution.filename().to_string())
}

/// require.cache - registered `module` objects keyed by filename
pub fn require_cache(loader: &ModuleLoader) -> Value {
    let registry = loader.registry();
    let cache = ObjectRef::new();

    for path in registry.keys() {
        if let Some(module) = registry.get(&path) {
            cache.set(module.filename(), Value::Object(module.object().clone()));
        }
    }

    Value::Object(cache)
}

/// require.main - the entry module's `module` object
pub fn require_main(loader: &ModuleLoader) -> Value {
    loader
        .main_module()
        .map(|module| Value::Object(module.object().clone()))
        .unwrap_or_default()
}
