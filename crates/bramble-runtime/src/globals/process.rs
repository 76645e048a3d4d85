// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `process` global object

use crate::config::{RuntimeConfig, path_string};
use crate::runtime::TickQueue;
use bramble_script::{ArrayRef, Callable, Error, ObjectRef, Value};
use std::sync::Arc;

/// Create the process object
pub fn create_process_object(config: &RuntimeConfig, ticks: Arc<TickQueue>) -> ObjectRef {
    let process = ObjectRef::new();

    // process.argv
    let argv = config.argv.iter().map(|a| Value::from(a.as_str())).collect();
    process.set("argv", Value::Array(ArrayRef::new(argv)));

    // process.env
    let env = ObjectRef::from_entries(std::env::vars().map(|(k, v)| (k, Value::String(v))));
    process.set("env", Value::Object(env));

    // process.platform
    process.set("platform", Value::from(get_platform()));

    // process.cwd()
    let cwd = config
        .cwd
        .as_deref()
        .map(path_string)
        .unwrap_or_else(|| ".".to_string());
    process.set(
        "cwd",
        Callable::native("cwd", move |_| Ok(Value::from(cwd.as_str()))),
    );

    // process.nextTick(callback, ...args)
    process.set(
        "nextTick",
        Callable::native("nextTick", move |args| {
            let Some(callback) = args.first().filter(|v| v.is_function()) else {
                return Err(Error::type_error(
                    "The \"callback\" argument must be of type function",
                ));
            };
            ticks.push(callback.clone(), args[1..].to_vec());
            Ok(Value::Undefined)
        }),
    );

    process
}

/// Get the platform name
fn get_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}
