// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path strings.
//!
//! Module paths are plain `/`-separated strings. The search directories are
//! concatenated with specifiers textually, so these helpers work on `&str`
//! rather than `std::path::Path`.

use crate::error::{Result, RuntimeError};

/// Collapses `.` and `..` segments and repeated slashes.
///
/// A leading `/` is preserved. A `..` with nothing left to pop fails with
/// [`RuntimeError::PathEscapesRoot`].
///
/// ```
/// use bramble_runtime::module_system::path::normalize;
///
/// assert_eq!(normalize("/a/b/../c").unwrap(), "/a/c");
/// assert_eq!(normalize("./a/./b").unwrap(), "a/b");
/// assert!(normalize("../x").is_err());
/// ```
pub fn normalize(path: &str) -> Result<String> {
    let absolute = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                None => return Err(RuntimeError::PathEscapesRoot(path.to_string())),
                Some(&"..") => out.push(".."),
                Some(_) => {
                    out.pop();
                }
            },
            name => out.push(name),
        }
    }

    let joined = out.join("/");
    Ok(if absolute {
        format!("/{}", joined)
    } else {
        joined
    })
}

/// Everything before the last `/`: `/` for root-level entries, `.` when the
/// path has no slash at all.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(pos) => &path[..pos],
        None => ".",
    }
}

/// Returns true for paths starting at the root.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Joins a directory and a name with exactly one slash between them.
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// The extension of the final path segment, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&name[pos + 1..]),
    }
}
