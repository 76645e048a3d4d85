// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The runtime: entry module execution, inline evaluation and snapshots

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::fs::{FileSystem, OsFileSystem};
use crate::globals;
use crate::module_system::{
    self, AddonLoader, ContentKind, Module, ModuleLoader, path, require_cache, require_resolve,
};
use crate::modules::BuiltinModules;
use crate::runtime::event_loop::TickQueue;
use bramble_script::{Engine, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Id of the module inline code runs as
const EVAL_ID: &str = "[eval]";

/// A configured module runtime
pub struct Runtime {
    /// Module loader (owns the registry and the engine)
    loader: ModuleLoader,
    /// Deferred callbacks queued by `process.nextTick`
    ticks: Arc<TickQueue>,
    /// Configuration the runtime was built from
    config: RuntimeConfig,
}

impl Runtime {
    /// Create a runtime reading modules from the OS filesystem
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_filesystem(config, Arc::new(OsFileSystem))
    }

    /// Create a runtime reading modules through `fs`
    pub fn with_filesystem(config: RuntimeConfig, fs: Arc<dyn FileSystem>) -> Self {
        let ticks = Arc::new(TickQueue::new());
        let engine = Engine::new();
        globals::install_globals(engine.globals(), &config, Arc::clone(&ticks));
        let builtins = BuiltinModules::standard(engine.globals());

        let loader = ModuleLoader::new(&config, fs)
            .with_engine(engine)
            .with_builtins(builtins);

        Self {
            loader,
            ticks,
            config,
        }
    }

    /// Open `.node` files with `addons`
    pub fn with_addons(mut self, addons: Arc<dyn AddonLoader>) -> Self {
        self.loader = self.loader.with_addons(addons);
        self
    }

    /// Loads the entry module, then runs deferred callbacks until none remain.
    ///
    /// Returns the entry module's exports.
    pub fn run_main(&mut self, entry: &str) -> Result<Value> {
        info!(entry, "running entry module");
        let exports = self.loader.load(entry, None)?;

        let context = match self.loader.main_module() {
            Some(main) => Arc::clone(main),
            None => Arc::new(self.eval_module()),
        };
        self.drain_ticks(&context)?;
        Ok(exports)
    }

    /// Runs inline code as an unregistered module rooted at the working
    /// directory, then drains deferred callbacks. Returns the completion
    /// value of the code.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let module = self.eval_module();
        let value = module_system::run_source(&mut self.loader, &module, source)?;
        self.drain_ticks(&module)?;
        Ok(value)
    }

    /// Compiles the source module `entry` resolves to and writes it as a
    /// snapshot to `out`. Returns the path of the compiled source.
    pub fn make_snapshot(&self, entry: &str, out: &Path) -> Result<PathBuf> {
        let resolution = self.loader.resolve(entry, None)?;
        if resolution.kind != ContentKind::Source {
            return Err(RuntimeError::Generic(format!(
                "Only source modules can be snapshotted: {}",
                resolution.filename()
            )));
        }

        let source = self.loader.filesystem().read_to_string(resolution.filename())?;
        let bytes = self.loader.engine().make_snapshot(&source)?;
        std::fs::write(out, &bytes)?;

        info!(
            source = resolution.filename(),
            out = %out.display(),
            bytes = bytes.len(),
            "wrote snapshot"
        );
        Ok(resolution.path().to_path_buf())
    }

    /// Resolves `id` from the working directory without loading it
    pub fn resolve(&self, id: &str) -> Result<String> {
        require_resolve(&self.loader, id, None)
    }

    /// Registered modules as a script object keyed by filename
    pub fn require_cache(&self) -> Value {
        require_cache(&self.loader)
    }

    /// The module loader
    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// The module loader, mutably
    pub fn loader_mut(&mut self) -> &mut ModuleLoader {
        &mut self.loader
    }

    /// The engine running module bodies
    pub fn engine(&self) -> &Engine {
        self.loader.engine()
    }

    /// The configuration the runtime was built from
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of deferred callbacks waiting to run
    pub fn pending_ticks(&self) -> usize {
        self.ticks.len()
    }

    fn eval_module(&self) -> Module {
        let filename = match self.loader.cwd() {
            Some(cwd) => path::join(cwd, EVAL_ID),
            None => EVAL_ID.to_string(),
        };
        Module::detached(EVAL_ID, &filename)
    }

    /// Runs queued callbacks in FIFO order, including ones queued while
    /// draining. `context` is the running module; a queued `require` still
    /// loads on behalf of the module that owns it.
    fn drain_ticks(&mut self, context: &Module) -> Result<usize> {
        let mut ran = 0;
        while let Some(tick) = self.ticks.pop() {
            module_system::call(&mut self.loader, context, &tick.callback, &tick.args)?;
            ran += 1;
        }
        if ran > 0 {
            debug!(ran, "drained deferred callbacks");
        }
        Ok(ran)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use bramble_script::{ArrayRef, Callable};

    fn runtime(fs: MemoryFileSystem) -> Runtime {
        let config = RuntimeConfig {
            cwd: Some(PathBuf::from("/proj")),
            argv: vec!["bramble".into(), "main.js".into()],
            ..Default::default()
        };
        Runtime::with_filesystem(config, Arc::new(fs))
    }

    /// Installs a global `record(...)` that appends its first argument.
    fn recorder(runtime: &Runtime) -> ArrayRef {
        let log = ArrayRef::new(vec![]);
        let sink = log.clone();
        runtime.engine().globals().set(
            "record",
            Callable::native("record", move |args| {
                sink.push(args.first().cloned().unwrap_or_default());
                Ok(Value::Undefined)
            }),
        );
        log
    }

    #[test]
    fn test_run_main_drains_ticks_after_load() {
        let mut rt = runtime(MemoryFileSystem::new().with_file(
            "/proj/main.js",
            "process.nextTick(record, 'tick')\nrecord('body')\nexports.done = true",
        ));
        let log = recorder(&rt);

        let exports = rt.run_main("./main").unwrap();
        assert_eq!(exports.get("done"), Value::Boolean(true));
        assert_eq!(log.to_vec(), vec![Value::from("body"), Value::from("tick")]);
        assert_eq!(rt.pending_ticks(), 0);
    }

    #[test]
    fn test_ticks_queued_while_draining_run() {
        let mut rt = runtime(MemoryFileSystem::new().with_file(
            "/proj/main.js",
            "process.nextTick(process.nextTick, record, 'nested')\nprocess.nextTick(record, 'first')",
        ));
        let log = recorder(&rt);

        rt.run_main("./main").unwrap();
        assert_eq!(log.to_vec(), vec![Value::from("first"), Value::from("nested")]);
    }

    #[test]
    fn test_deferred_require_uses_entry_context() {
        let mut rt = runtime(
            MemoryFileSystem::new()
                .with_file("/proj/app/main.js", "process.nextTick(require, './late')")
                .with_file("/proj/app/late.js", "record('late loaded')"),
        );
        let log = recorder(&rt);

        rt.run_main("./app/main").unwrap();
        assert_eq!(log.to_vec(), vec![Value::from("late loaded")]);
        assert!(rt.loader().registry().contains(Path::new("/proj/app/late.js")));
    }

    #[test]
    fn test_deferred_require_from_nested_module_uses_its_owner() {
        let mut rt = runtime(
            MemoryFileSystem::new()
                .with_file("/proj/app/main.js", "require('./lib/nested')")
                .with_file("/proj/app/lib/nested.js", "process.nextTick(require, './late')")
                .with_file("/proj/app/lib/late.js", "record('lib late')")
                .with_file("/proj/app/late.js", "record('app late')"),
        );
        let log = recorder(&rt);

        rt.run_main("./app/main").unwrap();
        assert_eq!(log.to_vec(), vec![Value::from("lib late")]);
        assert!(!rt.loader().registry().contains(Path::new("/proj/app/late.js")));
    }

    #[test]
    fn test_globals_and_builtins() {
        let mut rt = runtime(MemoryFileSystem::new().with_file(
            "/proj/main.js",
            "const path = require('path')\nexports.base = path.basename(__filename)\nexports.argv = process.argv[1]\nexports.cwd = process.cwd()\nexports.same = require('process') === process",
        ));
        let exports = rt.run_main("./main").unwrap();
        assert_eq!(exports.get("base"), Value::from("main.js"));
        assert_eq!(exports.get("argv"), Value::from("main.js"));
        assert_eq!(exports.get("cwd"), Value::from("/proj"));
        assert_eq!(exports.get("same"), Value::Boolean(true));
    }

    #[test]
    fn test_eval_is_not_registered() {
        let mut rt = runtime(MemoryFileSystem::new().with_file("/proj/a.js", "exports.x = 1"));
        let value = rt.eval("require('./a').x + 1").unwrap();
        assert_eq!(value, Value::Number(2.0));
        assert_eq!(rt.loader().registry().keys(), vec![PathBuf::from("/proj/a.js")]);
        assert!(rt.loader().main_module().is_none());
    }

    #[test]
    fn test_entry_failure_skips_ticks() {
        let mut rt = runtime(MemoryFileSystem::new().with_file(
            "/proj/main.js",
            "process.nextTick(record, 'never')\nundefinedThing()",
        ));
        let log = recorder(&rt);
        assert!(matches!(rt.run_main("./main"), Err(RuntimeError::Script(_))));
        assert!(log.is_empty());
        assert_eq!(rt.pending_ticks(), 1);
    }

    #[test]
    fn test_make_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m.js"), "exports.kind = 'snap'").unwrap();
        let config = RuntimeConfig {
            cwd: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let rt = Runtime::new(config.clone());
        let out = dir.path().join("m.jsc");
        let source = rt.make_snapshot("./m", &out).unwrap();
        assert!(source.ends_with("m.js"));

        // the snapshot now wins over the source
        std::fs::write(dir.path().join("m.js"), "exports.kind = 'source'").unwrap();
        let mut rt = Runtime::new(config);
        let exports = rt.run_main("./m").unwrap();
        assert_eq!(exports.get("kind"), Value::from("snap"));
    }
}
