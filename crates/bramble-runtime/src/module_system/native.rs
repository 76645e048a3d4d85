// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native addon hand-off
//!
//! `.node` files are not executed by the engine. The loader passes the
//! resolved path to an [`AddonLoader`], which either produces the addon's
//! exports or returns `None`, reported as `NativeLoadFailure`.

use bramble_script::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Opens native addons
pub trait AddonLoader: Send + Sync {
    /// Returns the addon's exports, or `None` if it cannot be opened.
    fn open(&self, path: &Path) -> Option<Value>;
}

/// Refuses every addon
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAddons;

impl AddonLoader for NoAddons {
    fn open(&self, _path: &Path) -> Option<Value> {
        None
    }
}

/// Addons provided by the host, keyed by resolved path
#[derive(Debug, Default)]
pub struct AddonTable {
    addons: HashMap<PathBuf, Value>,
}

impl AddonTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the exports served for `path`
    pub fn register(&mut self, path: impl Into<PathBuf>, exports: Value) {
        self.addons.insert(path.into(), exports);
    }
}

impl AddonLoader for AddonTable {
    fn open(&self, path: &Path) -> Option<Value> {
        self.addons.get(path).cloned()
    }
}
