// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `path` built-in module (POSIX semantics)

use bramble_script::{Callable, Error, ObjectRef, Result, Value};

/// Create the path module exports
pub fn create_module() -> Value {
    let exports = ObjectRef::new();

    exports.set("sep", Value::from("/"));
    exports.set(
        "dirname",
        Callable::native("dirname", |args| {
            Ok(Value::from(dirname(string_arg(args, 0, "path")?)))
        }),
    );
    exports.set(
        "basename",
        Callable::native("basename", |args| {
            let path = string_arg(args, 0, "path")?;
            let ext = match args.get(1) {
                None | Some(Value::Undefined) => None,
                Some(_) => Some(string_arg(args, 1, "ext")?),
            };
            Ok(Value::from(basename(path, ext)))
        }),
    );
    exports.set(
        "extname",
        Callable::native("extname", |args| {
            Ok(Value::from(extname(string_arg(args, 0, "path")?)))
        }),
    );
    exports.set(
        "join",
        Callable::native("join", |args| {
            let parts = (0..args.len())
                .map(|i| string_arg(args, i, "path"))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::from(join(&parts)))
        }),
    );
    exports.set(
        "normalize",
        Callable::native("normalize", |args| {
            Ok(Value::from(normalize(string_arg(args, 0, "path")?)))
        }),
    );
    exports.set(
        "isAbsolute",
        Callable::native("isAbsolute", |args| {
            Ok(Value::Boolean(is_absolute(string_arg(args, 0, "path")?)))
        }),
    );

    Value::Object(exports)
}

fn string_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        Error::type_error(format!(
            "The \"{}\" argument must be of type string",
            name
        ))
    })
}

/// path.basename(path, ext?)
pub fn basename(path: &str, ext: Option<&str>) -> String {
    let trimmed = path.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);

    match ext {
        Some(ext) if name.ends_with(ext) && name != ext => name[..name.len() - ext.len()].to_string(),
        _ => name.to_string(),
    }
}

/// path.dirname(path)
pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(pos) => trimmed[..pos].trim_end_matches('/').to_string(),
        None => ".".to_string(),
    }
}

/// path.extname(path)
pub fn extname(path: &str) -> String {
    let name = basename(path, None);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(pos) => name[pos..].to_string(),
    }
}

/// path.isAbsolute(path)
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// path.join(...paths)
pub fn join(paths: &[&str]) -> String {
    let joined = paths
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// path.normalize(path)
///
/// Unlike module path normalization this never fails: leading `..` segments
/// of relative paths are kept and `..` at the root is dropped.
pub fn normalize(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    let is_absolute = path.starts_with('/');

    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if !components.is_empty() && components.last() != Some(&"..") {
                    components.pop();
                } else if !is_absolute {
                    components.push("..");
                }
            }
            c => components.push(c),
        }
    }

    let mut result = components.join("/");
    if path.ends_with('/') && !result.is_empty() {
        result.push('/');
    }

    if is_absolute {
        format!("/{}", result)
    } else if result.is_empty() {
        ".".to_string()
    } else {
        result
    }
}
