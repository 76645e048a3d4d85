// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Search directory construction
//!
//! The directory list for one `require` call is, in order:
//!
//! 1. the requester's inherited search context,
//! 2. `node_modules/` in each ancestor of the requester's directory,
//!    innermost first, ending with `/node_modules/`,
//! 3. the base set: `""` (the working directory), `$CWD/`,
//!    `$CWD/node_modules/`, `$HOME/node_modules/`, `$NODE_PATH/node_modules/`.
//!
//! The resolver takes the first directory that yields a file.

use crate::config::{RuntimeConfig, path_string};
use crate::module_system::cache::Module;
use crate::module_system::path::{dirname, join};
use tracing::trace;

const NODE_MODULES: &str = "node_modules/";

/// Builds ordered search directory lists
#[derive(Debug, Clone)]
pub struct SearchPathBuilder {
    base: Vec<String>,
}

impl SearchPathBuilder {
    /// Computes the base set from the configuration.
    ///
    /// The working directory entries are left out when the working directory
    /// is unknown; `HOME` and `NODE_PATH` entries only appear when set to a
    /// non-empty path.
    pub fn new(config: &RuntimeConfig) -> Self {
        let mut base = vec![String::new()];
        if let Some(cwd) = config.cwd_str() {
            base.push(join(&cwd, ""));
            base.push(join(&cwd, NODE_MODULES));
        }
        let roots = [config.home.as_deref(), config.node_path.as_deref()];
        for root in roots.into_iter().flatten() {
            if !root.as_os_str().is_empty() {
                base.push(join(&path_string(root), NODE_MODULES));
            }
        }
        Self { base }
    }

    /// The directories searched for every request.
    pub fn base(&self) -> &[String] {
        &self.base
    }

    /// The full directory list for `id` requested by `requester`.
    pub fn build(&self, id: &str, requester: Option<&Module>) -> Vec<String> {
        let Some(requester) = requester else {
            return self.base.clone();
        };

        let mut dirs: Vec<String> = requester.search_dirs().to_vec();
        let mut dir = requester.dirname();
        loop {
            dirs.push(join(dir, NODE_MODULES));
            if dir == "/" || dir == "." {
                break;
            }
            dir = dirname(dir);
        }
        dirs.extend(self.base.iter().cloned());

        trace!(module = id, from = requester.filename(), dirs = dirs.len(), "search directories");
        dirs
    }
}
