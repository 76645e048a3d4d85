// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Filesystem access used by module resolution and loading.
//!
//! Everything the module system reads goes through [`FileSystem`], so hosts
//! can serve modules from memory and tests can count probes.

use crate::module_system::path::normalize;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file
    File,
    /// A directory
    Directory,
}

/// Blocking filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reports what `path` is. Missing paths are an `io::Error`.
    fn stat(&self, path: &str) -> io::Result<FileKind>;

    /// Reads the whole file.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Reads the whole file as UTF-8.
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        String::from_utf8(self.read(path)?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// The host operating system's filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn stat(&self, path: &str) -> io::Result<FileKind> {
        let meta = std::fs::metadata(path)?;
        Ok(if meta.is_dir() {
            FileKind::Directory
        } else {
            FileKind::File
        })
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory file tree.
///
/// Directories exist implicitly as prefixes of stored files. Every `stat`
/// call is counted.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    stats: AtomicUsize,
}

impl MemoryFileSystem {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add_file`](Self::add_file).
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, contents);
        self
    }

    /// Stores a file, replacing any previous contents.
    pub fn add_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let key = normalize(path).unwrap_or_else(|_| path.to_string());
        self.files.write().insert(key, contents.into());
    }

    /// Removes a file.
    pub fn remove_file(&self, path: &str) -> bool {
        match normalize(path) {
            Ok(key) => self.files.write().remove(&key).is_some(),
            Err(_) => false,
        }
    }

    /// Number of `stat` calls made so far.
    pub fn stat_count(&self) -> usize {
        self.stats.load(Ordering::Relaxed)
    }

    fn key(path: &str) -> io::Result<String> {
        normalize(path).map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))
    }
}

impl FileSystem for MemoryFileSystem {
    fn stat(&self, path: &str) -> io::Result<FileKind> {
        self.stats.fetch_add(1, Ordering::Relaxed);
        let key = Self::key(path)?;
        let files = self.files.read();
        if files.contains_key(&key) {
            return Ok(FileKind::File);
        }

        let prefix = if key.ends_with('/') {
            key
        } else {
            format!("{}/", key)
        };
        match files.range(prefix.clone()..).next() {
            Some((name, _)) if name.starts_with(&prefix) => Ok(FileKind::Directory),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, path.to_string())),
        }
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let key = Self::key(path)?;
        self.files
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stat() {
        let fs = MemoryFileSystem::new().with_file("/proj/lib/a.js", "exports.a = 1");
        assert_eq!(fs.stat("/proj/lib/a.js").unwrap(), FileKind::File);
        assert_eq!(fs.stat("/proj/lib").unwrap(), FileKind::Directory);
        assert_eq!(fs.stat("/proj/./lib/../lib/").unwrap(), FileKind::Directory);
        assert_eq!(fs.stat("/").unwrap(), FileKind::Directory);
        assert!(fs.stat("/proj/li").is_err());
        assert!(fs.stat("/proj/lib/a").is_err());
        assert_eq!(fs.stat_count(), 6);
    }

    #[test]
    fn test_memory_read() {
        let fs = MemoryFileSystem::new().with_file("/x.json", "{}");
        assert_eq!(fs.read_to_string("/x.json").unwrap(), "{}");
        assert_eq!(fs.read("/y.json").unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(fs.remove_file("/x.json"));
        assert!(fs.read("/x.json").is_err());
    }

    #[test]
    fn test_os_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.js");
        std::fs::write(&file, "exports.m = true").unwrap();

        let fs = OsFileSystem;
        let dir_str = dir.path().to_string_lossy().to_string();
        let file_str = file.to_string_lossy().to_string();
        assert_eq!(fs.stat(&dir_str).unwrap(), FileKind::Directory);
        assert_eq!(fs.stat(&file_str).unwrap(), FileKind::File);
        assert_eq!(fs.read_to_string(&file_str).unwrap(), "exports.m = true");
        assert!(fs.stat(&format!("{}/missing", dir_str)).is_err());
    }
}
