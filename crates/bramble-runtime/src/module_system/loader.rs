// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - resolves, caches and runs modules

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::fs::FileSystem;
use crate::module_system::cache::{Module, ModuleRegistry, ModuleState};
use crate::module_system::executor;
use crate::module_system::native::{AddonLoader, NoAddons};
use crate::module_system::resolver::{ContentKind, Resolution, Resolver};
use crate::module_system::search::SearchPathBuilder;
use crate::modules::BuiltinModules;
use bramble_script::{Engine, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Module loader
///
/// Owns the registry, so independent loaders never share modules.
pub struct ModuleLoader {
    /// Engine that compiles and runs module bodies
    engine: Engine,
    /// Filesystem used for probing and reading
    fs: Arc<dyn FileSystem>,
    /// Module resolver
    resolver: Resolver,
    /// Search directory builder
    search: SearchPathBuilder,
    /// Loaded modules by path
    registry: ModuleRegistry,
    /// Reserved names served without resolution
    builtins: BuiltinModules,
    /// Opens `.node` files
    addons: Arc<dyn AddonLoader>,
    /// First module loaded without a requester
    main: Option<Arc<Module>>,
    cwd: Option<String>,
    load_stats: bool,
    evict_on_failure: bool,
}

impl ModuleLoader {
    /// Create a loader with a fresh engine, no built-ins and no addons
    pub fn new(config: &RuntimeConfig, fs: Arc<dyn FileSystem>) -> Self {
        let cwd = config.cwd_str();
        Self {
            engine: Engine::new(),
            resolver: Resolver::new(Arc::clone(&fs), cwd.clone(), config.strict_paths),
            search: SearchPathBuilder::new(config),
            fs,
            registry: ModuleRegistry::new(),
            builtins: BuiltinModules::new(),
            addons: Arc::new(NoAddons),
            main: None,
            cwd,
            load_stats: config.load_stats,
            evict_on_failure: config.evict_on_failure,
        }
    }

    /// Use `engine` (and its globals) to run module bodies
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Serve `builtins` ahead of resolution
    pub fn with_builtins(mut self, builtins: BuiltinModules) -> Self {
        self.builtins = builtins;
        self
    }

    /// Open `.node` files with `addons`
    pub fn with_addons(mut self, addons: Arc<dyn AddonLoader>) -> Self {
        self.addons = addons;
        self
    }

    /// Loads `id` on behalf of `requester` and returns its `module.exports`.
    ///
    /// A module is registered before its body runs, so a circular `require`
    /// gets the exports object as it stands at that moment.
    pub fn load(&mut self, id: &str, requester: Option<&Module>) -> Result<Value> {
        if let Some(exports) = self.builtins.get(id) {
            debug!(module = id, "built-in");
            return Ok(exports);
        }

        let resolution = self.resolve(id, requester)?;

        if let Some(cached) = self.registry.get(resolution.path()) {
            debug!(
                module = id,
                path = cached.filename(),
                state = ?cached.state(),
                "cache hit"
            );
            return Ok(cached.exports());
        }

        debug!(module = id, path = resolution.filename(), "cache miss");
        let module = self
            .registry
            .insert(Arc::new(Module::new(id, &resolution, requester)));
        if requester.is_none() && self.main.is_none() {
            self.main = Some(Arc::clone(&module));
        }

        let started = Instant::now();
        if let Err(err) = self.dispatch(&module) {
            module.set_state(ModuleState::Failed);
            if self.evict_on_failure {
                debug!(path = module.filename(), "evicting failed module");
                self.registry.evict(resolution.path());
            }
            return Err(err);
        }
        module.set_state(ModuleState::Ready);

        if self.load_stats {
            info!(
                "load \"{}\" {}ms",
                self.relative_to_cwd(module.filename()),
                started.elapsed().as_millis()
            );
        }

        Ok(module.exports())
    }

    /// Resolves `id` without loading it (`require.resolve`).
    ///
    /// A module requesting its own id fails before any probing.
    pub fn resolve(&self, id: &str, requester: Option<&Module>) -> Result<Resolution> {
        if let Some(requester) = requester {
            if requester.id() == id {
                debug!(module = id, "self-require rejected");
                return Err(RuntimeError::module_not_found(id));
            }
        }

        let dirs = self.search.build(id, requester);
        self.resolver
            .resolve(id, &dirs)?
            .ok_or_else(|| RuntimeError::module_not_found(id))
    }

    /// Removes a module so the next `require` loads it again
    pub fn invalidate(&self, path: &Path) -> Option<Arc<Module>> {
        self.registry.evict(path)
    }

    /// The module registry
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The first module loaded without a requester
    pub fn main_module(&self) -> Option<&Arc<Module>> {
        self.main.as_ref()
    }

    /// Built-in modules
    pub fn builtins(&self) -> &BuiltinModules {
        &self.builtins
    }

    /// The engine running module bodies
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The filesystem modules are read from
    pub fn filesystem(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Working directory modules are anchored to, if known
    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    fn dispatch(&mut self, module: &Arc<Module>) -> Result<()> {
        match module.kind() {
            ContentKind::Source => executor::run(self, module, false),
            ContentKind::Snapshot => executor::run(self, module, true),
            ContentKind::Data => {
                let content = self.fs.read_to_string(module.filename())?;
                let json: serde_json::Value = serde_json::from_str(&content)?;
                module.set_exports(Value::from_json(&json));
                Ok(())
            }
            ContentKind::NativeAddon => {
                let path = PathBuf::from(module.filename());
                match self.addons.open(&path) {
                    Some(exports) => {
                        module.set_exports(exports);
                        Ok(())
                    }
                    None => Err(RuntimeError::NativeLoadFailure(path)),
                }
            }
            ContentKind::Unknown => {
                warn!(path = module.filename(), "unrecognized module type, nothing executed");
                Ok(())
            }
        }
    }

    fn relative_to_cwd<'a>(&self, path: &'a str) -> &'a str {
        self.cwd
            .as_deref()
            .and_then(|cwd| path.strip_prefix(cwd))
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::module_system::native::AddonTable;

    fn loader(fs: MemoryFileSystem) -> (Arc<MemoryFileSystem>, ModuleLoader) {
        let fs = Arc::new(fs);
        let config = RuntimeConfig {
            cwd: Some(PathBuf::from("/proj")),
            ..Default::default()
        };
        let loader = ModuleLoader::new(&config, fs.clone());
        (fs, loader)
    }

    fn get(value: &Value, key: &str) -> Value {
        value.get(key)
    }

    #[test]
    fn test_end_to_end_identity() {
        let (_, mut loader) = loader(MemoryFileSystem::new().with_file("/proj/a.js", "exports.x = 1"));
        let first = loader.load("a", None).unwrap();
        assert_eq!(get(&first, "x"), Value::Number(1.0));

        let second = loader.load("a", None).unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.registry().len(), 1);
        assert_eq!(loader.main_module().unwrap().filename(), "/proj/a.js");
    }

    #[test]
    fn test_spellings_share_one_record() {
        let (_, mut loader) = loader(MemoryFileSystem::new().with_file("/proj/a.js", "exports.x = 1"));
        let a = loader.load("a", None).unwrap();
        let b = loader.load("./a.js", None).unwrap();
        let c = loader.load("/proj/lib/../a", None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(loader.registry().len(), 1);
    }

    #[test]
    fn test_module_not_found() {
        let (_, mut loader) = loader(MemoryFileSystem::new());
        let err = loader.load("missing", None).unwrap_err();
        assert!(matches!(err, RuntimeError::ModuleNotFound(ref id) if id == "missing"));
        assert!(loader.registry().is_empty());
    }

    #[test]
    fn test_self_require_without_probing() {
        let (fs, loader) = loader(MemoryFileSystem::new().with_file("/proj/a.js", ""));
        let requester = Module::new("a", &Resolution::new("/proj/a.js"), None);
        let before = fs.stat_count();
        assert!(matches!(
            loader.resolve("a", Some(&requester)),
            Err(RuntimeError::ModuleNotFound(_))
        ));
        assert_eq!(fs.stat_count(), before);
    }

    #[test]
    fn test_builtins_bypass_filesystem() {
        let (fs, loader) = loader(MemoryFileSystem::new().with_file("/proj/path.js", ""));
        let mut loader = loader.with_builtins(BuiltinModules::standard(&Default::default()));
        let path = loader.load("path", None).unwrap();
        assert!(path.get("join").is_function());
        assert_eq!(fs.stat_count(), 0);
        assert!(loader.registry().is_empty());
    }

    #[test]
    fn test_json_module() {
        let (_, mut loader) = loader(
            MemoryFileSystem::new().with_file("/proj/data.json", r#"{"name": "bramble", "n": [1, 2]}"#),
        );
        let data = loader.load("./data.json", None).unwrap();
        assert_eq!(get(&data, "name"), Value::from("bramble"));
        assert_eq!(get(&data, "n").to_string(), "1,2");
    }

    #[test]
    fn test_invalid_json_module() {
        let (_, mut loader) = loader(MemoryFileSystem::new().with_file("/proj/bad.json", "{"));
        assert!(matches!(
            loader.load("./bad.json", None),
            Err(RuntimeError::JsonParse(_))
        ));
    }

    #[test]
    fn test_native_addon() {
        let fs = MemoryFileSystem::new()
            .with_file("/proj/good.node", "")
            .with_file("/proj/bad.node", "");
        let (_, loader) = loader(fs);
        let mut table = AddonTable::new();
        table.register("/proj/good.node", Value::from("native"));
        let mut loader = loader.with_addons(Arc::new(table));

        assert_eq!(loader.load("./good.node", None).unwrap(), Value::from("native"));
        let err = loader.load("./bad.node", None).unwrap_err();
        assert!(matches!(err, RuntimeError::NativeLoadFailure(ref p) if p == Path::new("/proj/bad.node")));
    }

    #[test]
    fn test_unknown_kind_registers_without_running() {
        let (_, mut loader) = loader(MemoryFileSystem::new().with_file("/proj/notes", "not code"));
        let exports = loader.load("notes", None).unwrap();
        assert!(exports.as_object().unwrap().is_empty());
        let module = loader.registry().get(Path::new("/proj/notes")).unwrap();
        assert_eq!(module.state(), ModuleState::Ready);
    }

    #[test]
    fn test_failed_module_stays_cached() {
        let (_, mut loader) = loader(
            MemoryFileSystem::new().with_file("/proj/bad.js", "exports.before = 1\nmissing.call()"),
        );
        assert!(loader.load("./bad", None).is_err());

        let module = loader.registry().get(Path::new("/proj/bad.js")).unwrap();
        assert_eq!(module.state(), ModuleState::Failed);

        // a repeat require sees the partial exports instead of retrying
        let partial = loader.load("./bad", None).unwrap();
        assert_eq!(get(&partial, "before"), Value::Number(1.0));
    }

    #[test]
    fn test_evict_on_failure_retries() {
        let fs = Arc::new(MemoryFileSystem::new().with_file("/proj/flaky.js", "missing.call()"));
        let config = RuntimeConfig {
            cwd: Some(PathBuf::from("/proj")),
            evict_on_failure: true,
            ..Default::default()
        };
        let mut loader = ModuleLoader::new(&config, fs.clone());
        assert!(loader.load("./flaky", None).is_err());
        assert!(loader.registry().is_empty());

        fs.add_file("/proj/flaky.js", "exports.ok = true");
        let exports = loader.load("./flaky", None).unwrap();
        assert_eq!(get(&exports, "ok"), Value::Boolean(true));
    }

    #[test]
    fn test_invalidate_reloads() {
        let (fs, mut loader) = loader(MemoryFileSystem::new().with_file("/proj/a.js", "exports.v = 1"));
        let first = loader.load("a", None).unwrap();
        fs.add_file("/proj/a.js", "exports.v = 2");

        assert!(loader.invalidate(Path::new("/proj/a.js")).is_some());
        let second = loader.load("a", None).unwrap();
        assert_ne!(first, second);
        assert_eq!(get(&second, "v"), Value::Number(2.0));
    }

    #[test]
    fn test_independent_loaders() {
        let fs = MemoryFileSystem::new().with_file("/proj/a.js", "exports.x = 1");
        let (_, mut one) = loader(fs);
        let (_, mut two) = loader(MemoryFileSystem::new().with_file("/proj/a.js", "exports.x = 1"));
        assert_ne!(one.load("a", None).unwrap(), two.load("a", None).unwrap());
    }
}
