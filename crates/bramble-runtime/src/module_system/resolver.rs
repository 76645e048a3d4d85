// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution

use crate::error::{Result, RuntimeError};
use crate::fs::{FileKind, FileSystem};
use crate::module_system::path::{extension, is_absolute, join, normalize};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Suffixes tried on every candidate, in order.
const SUFFIXES: [&str; 3] = ["", ".jsc", ".js"];

/// How a resolved file is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `.js` source, compiled and run
    Source,
    /// `.jsc` snapshot, decoded and run
    Snapshot,
    /// `.json` data, parsed into `module.exports`
    Data,
    /// `.node` addon, handed to the addon loader
    NativeAddon,
    /// Anything else; registered but nothing runs
    Unknown,
}

impl ContentKind {
    /// Classifies a path by its extension
    pub fn from_path(path: &str) -> Self {
        match extension(path) {
            Some("js") => Self::Source,
            Some("jsc") => Self::Snapshot,
            Some("json") => Self::Data,
            Some("node") => Self::NativeAddon,
            _ => Self::Unknown,
        }
    }
}

/// A resolved module file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    filename: String,
    /// How the file is loaded
    pub kind: ContentKind,
}

impl Resolution {
    /// Wraps a resolved path, deriving its content kind.
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let kind = ContentKind::from_path(&filename);
        Self { filename, kind }
    }

    /// The resolved path as a module path string
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The resolved path, the registry key
    pub fn path(&self) -> &Path {
        Path::new(&self.filename)
    }
}

/// Minimal package.json structure for resolution
#[derive(Debug, Deserialize)]
struct PackageJson {
    main: Option<String>,
}

/// Finds the file a specifier refers to
pub struct Resolver {
    fs: Arc<dyn FileSystem>,
    cwd: Option<String>,
    strict: bool,
}

impl Resolver {
    /// Creates a resolver.
    ///
    /// Relative candidates are anchored to `cwd` when known. With `strict`
    /// set every candidate is normalized before it is probed.
    pub fn new(fs: Arc<dyn FileSystem>, cwd: Option<String>, strict: bool) -> Self {
        Self { fs, cwd, strict }
    }

    /// Returns the path if it exists and is not a directory.
    pub fn probe(&self, path: &str) -> Option<String> {
        match self.fs.stat(path) {
            Ok(FileKind::File) => {
                trace!(path, "probe hit");
                Some(path.to_string())
            }
            _ => None,
        }
    }

    /// Resolves `id` against `directories`, first hit wins.
    ///
    /// Every directory is prefixed to `id` as is, absolute specifiers
    /// included, so `/lib/a` that misses at the root is retried as
    /// `<dir>/lib/a` under the remaining directories.
    pub fn resolve(&self, id: &str, directories: &[String]) -> Result<Option<Resolution>> {
        for dir in directories {
            if let Some(resolution) = self.resolve_candidate(format!("{}{}", dir, id))? {
                return Ok(Some(resolution));
            }
        }
        Ok(None)
    }

    fn resolve_candidate(&self, candidate: String) -> Result<Option<Resolution>> {
        let candidate = match &self.cwd {
            Some(cwd) if !is_absolute(&candidate) => join(cwd, &candidate),
            _ => candidate,
        };
        let candidate = if self.strict {
            normalize(&candidate)?
        } else {
            candidate
        };

        match self.find_file(&candidate)? {
            Some(hit) => {
                let resolution = self.finish(hit)?;
                debug!(candidate = %candidate, resolved = resolution.filename(), "resolved");
                Ok(Some(resolution))
            }
            None => Ok(None),
        }
    }

    fn find_file(&self, candidate: &str) -> Result<Option<String>> {
        let index = format!("{}/index", candidate);

        if let Some(hit) = self.try_path(candidate) {
            return Ok(Some(hit));
        }
        if let Some(hit) = self.try_path(&index) {
            return Ok(Some(hit));
        }

        let descriptor = format!("{}/package.json", candidate);
        if self.probe(&descriptor).is_some() {
            if let Some(main) = self.read_main(&descriptor)? {
                if let Some(hit) = self.try_path(&join(candidate, &main)) {
                    return Ok(Some(hit));
                }
            }
            if let Some(hit) = self.try_path(&index) {
                return Ok(Some(hit));
            }
        }

        Ok(None)
    }

    /// Tries `path`, `path.jsc` and `path.js`.
    fn try_path(&self, path: &str) -> Option<String> {
        SUFFIXES
            .iter()
            .find_map(|suffix| self.probe(&format!("{}{}", path, suffix)))
    }

    fn read_main(&self, descriptor: &str) -> Result<Option<String>> {
        let invalid = |reason: String| RuntimeError::PackageDescriptor {
            path: PathBuf::from(descriptor),
            reason,
        };
        let content = self
            .fs
            .read_to_string(descriptor)
            .map_err(|e| invalid(e.to_string()))?;
        let package: PackageJson =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        Ok(package.main)
    }

    /// Normalizes the hit so every spelling of a file shares one registry key.
    ///
    /// This happens in both modes. A hit that climbs above the root, such as
    /// `/../tmp/a.js`, fails with [`RuntimeError::PathEscapesRoot`] even
    /// though the filesystem found it; strict mode only adds the same check
    /// on each candidate before it is probed.
    fn finish(&self, hit: String) -> Result<Resolution> {
        Ok(Resolution::new(normalize(&hit)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn resolver(fs: MemoryFileSystem) -> Resolver {
        Resolver::new(Arc::new(fs), Some("/proj".to_string()), false)
    }

    fn base() -> Vec<String> {
        vec!["".into(), "/proj/".into(), "/proj/node_modules/".into()]
    }

    fn resolve(r: &Resolver, id: &str) -> Option<String> {
        r.resolve(id, &base()).unwrap().map(|res| res.filename().to_string())
    }

    #[test]
    fn test_literal_path_first() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/a", "")
                .with_file("/proj/a.js", ""),
        );
        assert_eq!(resolve(&r, "a").as_deref(), Some("/proj/a"));
    }

    #[test]
    fn test_snapshot_before_source() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/a.jsc", "")
                .with_file("/proj/a.js", ""),
        );
        let resolution = r.resolve("a", &base()).unwrap().unwrap();
        assert_eq!(resolution.filename(), "/proj/a.jsc");
        assert_eq!(resolution.kind, ContentKind::Snapshot);
    }

    #[test]
    fn test_directory_index() {
        let r = resolver(MemoryFileSystem::new().with_file("/proj/pkg/index.js", ""));
        assert_eq!(resolve(&r, "pkg").as_deref(), Some("/proj/pkg/index.js"));
    }

    #[test]
    fn test_package_main() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/node_modules/dep/package.json", r#"{"main": "lib/entry"}"#)
                .with_file("/proj/node_modules/dep/lib/entry.js", ""),
        );
        assert_eq!(
            resolve(&r, "dep").as_deref(),
            Some("/proj/node_modules/dep/lib/entry.js")
        );
    }

    #[test]
    fn test_package_main_missing_falls_back_to_index() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/pkg/package.json", r#"{"main": "nope.js"}"#)
                .with_file("/proj/pkg/index.js", ""),
        );
        assert_eq!(resolve(&r, "pkg").as_deref(), Some("/proj/pkg/index.js"));
    }

    #[test]
    fn test_package_without_main() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/pkg/package.json", r#"{"name": "pkg"}"#)
                .with_file("/proj/pkg/lib.js", ""),
        );
        assert_eq!(resolve(&r, "pkg"), None);
    }

    #[test]
    fn test_malformed_package_descriptor() {
        let r = resolver(MemoryFileSystem::new().with_file("/proj/pkg/package.json", "{ nope"));
        assert!(matches!(
            r.resolve("pkg", &base()),
            Err(RuntimeError::PackageDescriptor { .. })
        ));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let r = resolver(MemoryFileSystem::new().with_file("/proj/dir/other.txt", ""));
        assert_eq!(resolve(&r, "dir"), None);
    }

    #[test]
    fn test_first_directory_wins() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/proj/x.js", "")
                .with_file("/proj/node_modules/x.js", ""),
        );
        let dirs = vec!["/proj/node_modules/".to_string(), "/proj/".to_string()];
        let hit = r.resolve("x", &dirs).unwrap().unwrap();
        assert_eq!(hit.filename(), "/proj/node_modules/x.js");
    }

    #[test]
    fn test_hit_is_normalized() {
        let r = resolver(MemoryFileSystem::new().with_file("/proj/lib/a.js", ""));
        let dirs = vec!["/proj/lib/".to_string()];
        let hit = r.resolve("./a", &dirs).unwrap().unwrap();
        assert_eq!(hit.filename(), "/proj/lib/a.js");

        let hit = r.resolve("../lib/./a.js", &dirs).unwrap().unwrap();
        assert_eq!(hit.filename(), "/proj/lib/a.js");
    }

    #[test]
    fn test_absolute_specifier() {
        let r = resolver(MemoryFileSystem::new().with_file("/opt/m.js", ""));
        assert_eq!(resolve(&r, "/opt/m").as_deref(), Some("/opt/m.js"));
    }

    #[test]
    fn test_absolute_specifier_tries_every_directory() {
        let r = resolver(MemoryFileSystem::new().with_file("/proj/lib/a.js", ""));
        assert_eq!(resolve(&r, "/lib/a").as_deref(), Some("/proj/lib/a.js"));
    }

    #[test]
    fn test_absolute_hit_at_root_wins() {
        let r = resolver(
            MemoryFileSystem::new()
                .with_file("/lib/a.js", "")
                .with_file("/proj/lib/a.js", ""),
        );
        assert_eq!(resolve(&r, "/lib/a").as_deref(), Some("/lib/a.js"));
    }

    #[test]
    fn test_hit_above_root_fails_without_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "").unwrap();
        let spelled = format!("/..{}/a", dir.path().display());

        let r = Resolver::new(Arc::new(crate::fs::OsFileSystem), None, false);
        assert!(matches!(
            r.resolve(&spelled, &["".to_string()]),
            Err(RuntimeError::PathEscapesRoot(_))
        ));
    }

    #[test]
    fn test_strict_mode_rejects_escape() {
        let fs = MemoryFileSystem::new();
        let r = Resolver::new(Arc::new(fs), Some("/proj".to_string()), true);
        assert!(matches!(
            r.resolve("../../../x", &["".to_string()]),
            Err(RuntimeError::PathEscapesRoot(_))
        ));
    }

    #[test]
    fn test_strict_mode_probes_normalized_candidate() {
        let fs = Arc::new(MemoryFileSystem::new().with_file("/proj/a.js", ""));
        let r = Resolver::new(fs.clone(), Some("/proj".to_string()), true);
        let hit = r.resolve("./lib/../a", &["".to_string()]).unwrap().unwrap();
        assert_eq!(hit.filename(), "/proj/a.js");
    }

    #[test]
    fn test_content_kinds() {
        assert_eq!(ContentKind::from_path("/a.js"), ContentKind::Source);
        assert_eq!(ContentKind::from_path("/a.jsc"), ContentKind::Snapshot);
        assert_eq!(ContentKind::from_path("/a.json"), ContentKind::Data);
        assert_eq!(ContentKind::from_path("/a.node"), ContentKind::NativeAddon);
        assert_eq!(ContentKind::from_path("/a"), ContentKind::Unknown);
        assert_eq!(ContentKind::from_path("/a.txt"), ContentKind::Unknown);
    }
}
