// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runs module bodies
//!
//! A body is compiled (or decoded from a snapshot) into a unit and invoked
//! once with `exports`, a `require` bound to the module, `module`,
//! `__filename` and `__dirname`. Nested `require` calls re-enter the loader
//! through [`RequireHost`] with the binding's owner as requester.

use crate::error::{Result, RuntimeError};
use crate::module_system::cache::{Module, ModuleState};
use crate::module_system::loader::ModuleLoader;
use bramble_script::{CompiledUnit, Host, ModuleBindings, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Routes script `require` calls back into the loader
///
/// Each call loads on behalf of the module that owns the `require` binding.
/// `context` is the module currently running; it also serves as the owner
/// record for unregistered modules such as inline code.
pub(crate) struct RequireHost<'a> {
    loader: &'a mut ModuleLoader,
    context: &'a Module,
}

impl<'a> RequireHost<'a> {
    pub(crate) fn new(loader: &'a mut ModuleLoader, context: &'a Module) -> Self {
        Self { loader, context }
    }

    fn load_for(&mut self, owner: &str, specifier: &str) -> Result<Value> {
        if owner == self.context.filename() {
            return self.loader.load(specifier, Some(self.context));
        }
        match self.loader.registry().get(Path::new(owner)) {
            Some(requester) => self.loader.load(specifier, Some(requester.as_ref())),
            None => Err(RuntimeError::Generic(format!(
                "require('{}') called for a module that is no longer loaded: {}",
                specifier, owner
            ))),
        }
    }
}

impl Host for RequireHost<'_> {
    fn require(&mut self, owner: &str, specifier: &str) -> bramble_script::Result<Value> {
        self.load_for(owner, specifier)
            .map_err(bramble_script::Error::host)
    }
}

/// Compiles and runs a registered module's file.
pub(crate) fn run(loader: &mut ModuleLoader, module: &Arc<Module>, precompiled: bool) -> Result<()> {
    let filename = module.filename();
    let unit = if precompiled {
        let bytes = loader.filesystem().read(filename)?;
        loader
            .engine()
            .compile_snapshot(&bytes, filename)
            .map_err(|_| RuntimeError::InvalidSnapshot(PathBuf::from(filename)))?
    } else {
        let source = loader.filesystem().read_to_string(filename)?;
        loader.engine().compile(&source, filename)?
    };

    module.set_state(ModuleState::Executing);
    invoke(loader, module, &unit)?;
    Ok(())
}

/// Runs source text as the body of `module` and returns its completion value.
pub(crate) fn run_source(loader: &mut ModuleLoader, module: &Module, source: &str) -> Result<Value> {
    let unit = loader.engine().compile(source, module.filename())?;
    module.set_state(ModuleState::Executing);
    let value = invoke(loader, module, &unit)?;
    module.set_state(ModuleState::Ready);
    Ok(value)
}

/// Calls a function value with `require` bound to `module`.
pub(crate) fn call(
    loader: &mut ModuleLoader,
    module: &Module,
    callee: &Value,
    args: &[Value],
) -> Result<Value> {
    let engine = loader.engine().clone();
    let mut host = RequireHost::new(loader, module);
    engine
        .call(callee, args, &mut host)
        .map_err(RuntimeError::from_script)
}

fn invoke(loader: &mut ModuleLoader, module: &Module, unit: &CompiledUnit) -> Result<Value> {
    let bindings = ModuleBindings {
        exports: module.exports(),
        module: Value::Object(module.object().clone()),
        filename: module.filename().to_string(),
        dirname: module.dirname().to_string(),
    };
    let mut host = RequireHost::new(loader, module);
    unit.invoke(bindings, &mut host)
        .map_err(RuntimeError::from_script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::fs::MemoryFileSystem;

    fn loader(fs: MemoryFileSystem) -> ModuleLoader {
        let config = RuntimeConfig {
            cwd: Some(PathBuf::from("/proj")),
            ..Default::default()
        };
        ModuleLoader::new(&config, Arc::new(fs))
    }

    #[test]
    fn test_wrapper_bindings() {
        let mut loader = loader(MemoryFileSystem::new().with_file(
            "/proj/lib/w.js",
            "exports.file = __filename\nexports.dir = __dirname\nexports.same = this === exports\nexports.mod = module.id",
        ));
        let exports = loader.load("./lib/w", None).unwrap();
        assert_eq!(exports.get("file"), Value::from("/proj/lib/w.js"));
        assert_eq!(exports.get("dir"), Value::from("/proj/lib"));
        assert_eq!(exports.get("same"), Value::Boolean(true));
        assert_eq!(exports.get("mod"), Value::from("./lib/w"));
    }

    #[test]
    fn test_cycle_sees_partial_exports() {
        let mut loader = loader(
            MemoryFileSystem::new()
                .with_file(
                    "/proj/a.js",
                    "exports.early = 'a'\nconst b = require('./b')\nexports.late = 'a'\nexports.fromB = b.seen",
                )
                .with_file(
                    "/proj/b.js",
                    "const a = require('./a')\nexports.seen = a.early + '/' + typeof a.late\nexports.a = a",
                ),
        );
        let a = loader.load("./a", None).unwrap();
        assert_eq!(a.get("fromB"), Value::from("a/undefined"));
        assert_eq!(a.get("late"), Value::from("a"));

        let b = loader.load("./b", None).unwrap();
        assert_eq!(b.get("a"), a);
    }

    #[test]
    fn test_module_exports_replacement_visible_to_requirer() {
        let mut loader = loader(
            MemoryFileSystem::new()
                .with_file("/proj/main.js", "exports.v = require('./dep').name")
                .with_file("/proj/dep.js", "module.exports = { name: 'dep' }"),
        );
        let main = loader.load("./main", None).unwrap();
        assert_eq!(main.get("v"), Value::from("dep"));
    }

    #[test]
    fn test_nested_not_found_keeps_type() {
        let mut loader = loader(MemoryFileSystem::new().with_file("/proj/m.js", "require('./nope')"));
        let err = loader.load("./m", None).unwrap_err();
        assert!(matches!(err, RuntimeError::ModuleNotFound(ref id) if id == "./nope"));
    }

    #[test]
    fn test_syntax_error() {
        let mut loader = loader(MemoryFileSystem::new().with_file("/proj/s.js", "exports.x = = 1"));
        let err = loader.load("./s", None).unwrap_err();
        assert!(matches!(err, RuntimeError::Script(bramble_script::Error::Syntax { .. })));
        let module = loader.registry().get(Path::new("/proj/s.js")).unwrap();
        assert_eq!(module.state(), ModuleState::Failed);
    }

    #[test]
    fn test_snapshot_module() {
        let bytes = bramble_script::Engine::new()
            .make_snapshot("exports.compiled = true")
            .unwrap();
        let mut loader = loader(
            MemoryFileSystem::new()
                .with_file("/proj/c.jsc", bytes)
                .with_file("/proj/c.js", "exports.compiled = false"),
        );
        let exports = loader.load("./c", None).unwrap();
        assert_eq!(exports.get("compiled"), Value::Boolean(true));
    }

    #[test]
    fn test_invalid_snapshot() {
        let mut loader = loader(MemoryFileSystem::new().with_file("/proj/x.jsc", "plain text"));
        let err = loader.load("./x", None).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidSnapshot(ref p) if p == Path::new("/proj/x.jsc")));
        assert_eq!(err.to_string(), "Invalid snapshot file: /proj/x.jsc");
    }

    #[test]
    fn test_requester_context_used_for_nested_requires() {
        let mut loader = loader(
            MemoryFileSystem::new()
                .with_file("/proj/lib/entry.js", "exports.h = require('helper').name")
                .with_file("/proj/lib/helper.js", "exports.name = 'lib helper'")
                .with_file("/proj/helper.js", "exports.name = 'root helper'"),
        );
        let exports = loader.load("./lib/entry", None).unwrap();
        assert_eq!(exports.get("h"), Value::from("lib helper"));
    }

    #[test]
    fn test_run_source_and_call() {
        let mut loader = loader(MemoryFileSystem::new().with_file("/proj/a.js", "exports.x = 41"));
        let module = Module::detached("[eval]", "/proj/[eval]");
        let value = run_source(&mut loader, &module, "require('./a').x + 1").unwrap();
        assert_eq!(value, Value::Number(42.0));
        assert_eq!(module.state(), ModuleState::Ready);

        let require = bramble_script::Callable::require("/proj/[eval]");
        let a = call(&mut loader, &module, &require, &[Value::from("./a")]).unwrap();
        assert_eq!(a.get("x"), Value::Number(41.0));
    }

    #[test]
    fn test_exported_require_resolves_from_its_owner() {
        let mut loader = loader(
            MemoryFileSystem::new()
                .with_file("/proj/lib/a.js", "exports.req = require")
                .with_file("/proj/lib/b.js", "exports.name = 'lib'")
                .with_file("/proj/b.js", "exports.name = 'root'")
                .with_file("/proj/main.js", "exports.v = require('./lib/a').req('./b').name"),
        );
        let main = loader.load("./main", None).unwrap();
        assert_eq!(main.get("v"), Value::from("lib"));

        let b = loader.registry().get(Path::new("/proj/lib/b.js")).unwrap();
        assert_eq!(b.parent(), Some("/proj/lib/a.js"));
        assert!(!loader.registry().contains(Path::new("/proj/b.js")));
    }

    #[test]
    fn test_require_of_evicted_owner_fails() {
        let mut loader = loader(MemoryFileSystem::new().with_file("/proj/a.js", "exports.req = require"));
        let req = loader.load("./a", None).unwrap().get("req");
        loader.invalidate(Path::new("/proj/a.js"));

        let context = Module::detached("[eval]", "/proj/[eval]");
        let err = call(&mut loader, &context, &req, &[Value::from("./a")]).unwrap_err();
        assert!(matches!(err, RuntimeError::Generic(_)));
    }
}
