// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS module system
//!
//! - `path` - module path normalization
//! - `search` - ordered search directories per request
//! - `resolver` - extension, index and `package.json` probing
//! - `cache` - module records and the registry
//! - `loader` - the resolve / register / execute state machine
//! - `executor` - runs module bodies with the wrapper bindings
//! - `native` - `.node` addon hand-off

mod cache;
mod executor;
mod loader;
pub mod native;
pub mod path;
mod require;
mod resolver;
mod search;

pub(crate) use executor::{call, run_source};

pub use cache::{Module, ModuleRegistry, ModuleState};
pub use loader::ModuleLoader;
pub use native::{AddonLoader, AddonTable, NoAddons};
pub use require::{require, require_cache, require_main, require_resolve};
pub use resolver::{ContentKind, Resolution, Resolver};
pub use search::SearchPathBuilder;
