// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # bramble-runtime
//!
//! CommonJS module resolution, loading and caching on top of the
//! `bramble-script` engine.
//!
//! This crate turns a `require` specifier plus the requesting module into a
//! single cached, executed module:
//!
//! - Relative and absolute specifiers with `.jsc` / `.js` probing
//! - Directory packages (`index`, `package.json` `main`)
//! - `node_modules` lookup through the requester's ancestors, `HOME` and
//!   `NODE_PATH`
//! - One module record per resolved path, registered before its body runs,
//!   so circular requires see partially filled exports
//! - JSON data modules, snapshot (`.jsc`) modules and native addon hand-off
//! - `process` and `console` globals, the `path` built-in and
//!   `process.nextTick`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bramble_runtime::{Runtime, RuntimeConfig};
//!
//! let mut runtime = Runtime::new(RuntimeConfig::from_env());
//! let exports = runtime.run_main("./server.js")?;
//! println!("{}", exports.inspect());
//! # Ok::<(), bramble_runtime::RuntimeError>(())
//! ```
//!
//! ## In-memory modules
//!
//! ```rust
//! use bramble_runtime::{MemoryFileSystem, Runtime, RuntimeConfig};
//! use std::sync::Arc;
//!
//! let fs = MemoryFileSystem::new().with_file("/proj/a.js", "exports.x = 1");
//! let config = RuntimeConfig {
//!     cwd: Some("/proj".into()),
//!     ..Default::default()
//! };
//! let mut runtime = Runtime::with_filesystem(config, Arc::new(fs));
//! let exports = runtime.run_main("a").unwrap();
//! assert_eq!(exports.get("x"), bramble_script::Value::Number(1.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fs;
pub mod globals;
pub mod module_system;
pub mod modules;
pub mod runtime;

// Re-exports
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use fs::{FileKind, FileSystem, MemoryFileSystem, OsFileSystem};
pub use runtime::Runtime;

/// Version of the bramble runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
