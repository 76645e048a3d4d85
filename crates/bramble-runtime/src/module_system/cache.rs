// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records and the registry that keeps one record per path

use crate::module_system::path::{dirname, join};
use crate::module_system::resolver::{ContentKind, Resolution};
use bramble_script::{ObjectRef, Value};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of a module record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Record built, not yet in the registry
    Created,
    /// In the registry, exports empty
    Registered,
    /// Body running; nested requires see the incomplete exports
    Executing,
    /// Body returned
    Ready,
    /// Body or handler failed
    Failed,
}

/// One loaded unit
#[derive(Debug)]
pub struct Module {
    id: String,
    filename: String,
    kind: ContentKind,
    parent: Option<String>,
    search_dirs: Arc<[String]>,
    object: ObjectRef,
    state: RwLock<ModuleState>,
}

impl Module {
    /// Creates a record for a resolved file.
    ///
    /// The search context is this module's own directory followed by the
    /// requester's context. The requester is only remembered by filename.
    pub fn new(id: &str, resolution: &Resolution, requester: Option<&Module>) -> Self {
        Self::with_filename(id, resolution.filename(), resolution.kind, requester)
    }

    /// Creates a record that will never be registered, e.g. inline code.
    pub fn detached(id: &str, filename: &str) -> Self {
        Self::with_filename(id, filename, ContentKind::Source, None)
    }

    fn with_filename(id: &str, filename: &str, kind: ContentKind, requester: Option<&Module>) -> Self {
        let own_dir = join(dirname(filename), "");
        let search_dirs: Arc<[String]> = match requester {
            Some(parent) => std::iter::once(own_dir)
                .chain(parent.search_dirs.iter().cloned())
                .collect(),
            None => Arc::from(vec![own_dir]),
        };
        let parent = requester.map(|p| p.filename.clone());

        let object = ObjectRef::from_entries([
            ("id", Value::from(id)),
            ("filename", Value::from(filename)),
            ("exports", Value::object()),
            ("loaded", Value::Boolean(false)),
            (
                "parent",
                parent.clone().map(Value::String).unwrap_or(Value::Null),
            ),
        ]);

        Self {
            id: id.to_string(),
            filename: filename.to_string(),
            kind,
            parent,
            search_dirs,
            object,
            state: RwLock::new(ModuleState::Created),
        }
    }

    /// The specifier this module was first requested by
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolved absolute path
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Directory containing the module
    pub fn dirname(&self) -> &str {
        dirname(&self.filename)
    }

    /// How the file is loaded
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Filename of the module that first required this one
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Directories searched first for this module's own requires
    pub fn search_dirs(&self) -> &Arc<[String]> {
        &self.search_dirs
    }

    /// The script-visible `module` object
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Current `module.exports`
    pub fn exports(&self) -> Value {
        self.object.get("exports").unwrap_or_default()
    }

    /// Replaces `module.exports`
    pub fn set_exports(&self, exports: Value) {
        self.object.set("exports", exports);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ModuleState {
        *self.state.read()
    }

    /// Moves to a new lifecycle state; `Ready` also sets `module.loaded`.
    pub fn set_state(&self, state: ModuleState) {
        *self.state.write() = state;
        if state == ModuleState::Ready {
            self.object.set("loaded", Value::Boolean(true));
        }
    }
}

/// Thread-safe registry of loaded modules, keyed by normalized path
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: DashMap<PathBuf, Arc<Module>>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a module by path
    pub fn get(&self, path: &Path) -> Option<Arc<Module>> {
        self.modules.get(path).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a path is registered
    pub fn contains(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    /// Registers a module under its filename.
    ///
    /// If the path is already taken the existing record is kept and
    /// returned; otherwise `module` is stored, moved to `Registered` and
    /// returned.
    pub fn insert(&self, module: Arc<Module>) -> Arc<Module> {
        let entry = self
            .modules
            .entry(PathBuf::from(module.filename()))
            .or_insert_with(|| {
                module.set_state(ModuleState::Registered);
                module
            });
        Arc::clone(entry.value())
    }

    /// Remove a module from the registry
    pub fn evict(&self, path: &Path) -> Option<Arc<Module>> {
        self.modules.remove(path).map(|(_, module)| module)
    }

    /// Clear the entire registry
    pub fn clear(&self) {
        self.modules.clear();
    }

    /// Get all registered paths, sorted
    pub fn keys(&self) -> Vec<PathBuf> {
        let mut keys: Vec<PathBuf> = self.modules.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Get the number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
