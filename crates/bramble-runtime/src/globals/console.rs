// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `console` global object

use bramble_script::{Callable, ObjectRef, Value};

/// Create the console object
pub fn create_console_object() -> ObjectRef {
    let console = ObjectRef::new();

    for name in ["log", "info"] {
        console.set(
            name,
            Callable::native(name, |args| {
                println!("{}", format_args(args));
                Ok(Value::Undefined)
            }),
        );
    }

    for name in ["warn", "error"] {
        console.set(
            name,
            Callable::native(name, |args| {
                eprintln!("{}", format_args(args));
                Ok(Value::Undefined)
            }),
        );
    }

    console
}

/// Joins arguments the way `console.log` prints them: top-level strings
/// verbatim, everything else inspected.
pub fn format_args(args: &[Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.inspect(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_args() {
        let obj = Value::Object(ObjectRef::from_entries([("a", Value::from("x"))]));
        let args = [Value::from("value:"), obj, Value::Number(3.0), Value::Undefined];
        assert_eq!(format_args(&args), "value: { a: 'x' } 3 undefined");
    }

    #[test]
    fn test_console_methods() {
        let console = create_console_object();
        assert_eq!(console.keys(), vec!["error", "info", "log", "warn"]);
    }
}
