// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Global objects visible to every module
//!
//! Implements:
//! - `process` - argv, env, platform, cwd() and nextTick()
//! - `console` - log, info, warn and error

pub mod console;
pub mod process;

use crate::config::RuntimeConfig;
use crate::runtime::TickQueue;
use bramble_script::{ObjectRef, Value};
use std::sync::Arc;

/// Installs the globals on an engine's global object
pub fn install_globals(globals: &ObjectRef, config: &RuntimeConfig, ticks: Arc<TickQueue>) {
    globals.set(
        "process",
        Value::Object(process::create_process_object(config, ticks)),
    );
    globals.set("console", Value::Object(console::create_console_object()));
}
