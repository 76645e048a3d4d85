// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime configuration.

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable enabling strict path confinement.
pub const STRICT_PATHS_ENV: &str = "BRAMBLE_STRICT_PATHS";

/// Environment variable enabling per-module load timing.
pub const LOAD_STATS_ENV: &str = "BRAMBLE_LOAD_STATS";

/// Configuration for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Working directory relative specifiers are anchored to
    pub cwd: Option<PathBuf>,

    /// Home directory; contributes `$HOME/node_modules/`
    pub home: Option<PathBuf>,

    /// Extra module root; contributes `$NODE_PATH/node_modules/`
    pub node_path: Option<PathBuf>,

    /// Normalize every candidate before probing, rejecting root escapes
    pub strict_paths: bool,

    /// Log the time each fresh module load takes
    pub load_stats: bool,

    /// Drop a module from the registry when its body fails
    pub evict_on_failure: bool,

    /// Script-visible `process.argv`
    pub argv: Vec<String>,
}

impl RuntimeConfig {
    /// Builds a configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            cwd: std::env::current_dir().ok(),
            home: env_path("HOME"),
            node_path: env_path("NODE_PATH"),
            strict_paths: env_flag(STRICT_PATHS_ENV),
            load_stats: env_flag(LOAD_STATS_ENV),
            evict_on_failure: false,
            argv: std::env::args().collect(),
        }
    }

    /// Loads a configuration file (JSON). Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Fills fields left unset in `self` from `fallback`.
    pub fn or(mut self, fallback: RuntimeConfig) -> Self {
        self.cwd = self.cwd.or(fallback.cwd);
        self.home = self.home.or(fallback.home);
        self.node_path = self.node_path.or(fallback.node_path);
        self.strict_paths |= fallback.strict_paths;
        self.load_stats |= fallback.load_stats;
        self.evict_on_failure |= fallback.evict_on_failure;
        if self.argv.is_empty() {
            self.argv = fallback.argv;
        }
        self
    }

    /// The working directory as a module path string.
    pub(crate) fn cwd_str(&self) -> Option<String> {
        self.cwd.as_deref().map(path_string)
    }
}

/// Lossy conversion from a filesystem path to a module path string.
pub(crate) fn path_string(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.len() > 1 {
        s.trim_end_matches('/').to_string()
    } else {
        s.into_owned()
    }
}

/// A path variable; set but empty counts as unset.
fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"cwd": "/proj", "strict_paths": true}"#).unwrap();
        assert_eq!(config.cwd, Some(PathBuf::from("/proj")));
        assert!(config.strict_paths);
        assert!(!config.load_stats);
        assert!(config.home.is_none());
        assert!(config.argv.is_empty());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bramble.json");
        std::fs::write(&path, r#"{"node_path": "/opt/lib", "evict_on_failure": true}"#).unwrap();
        let config = RuntimeConfig::from_file(&path).unwrap();
        assert_eq!(config.node_path, Some(PathBuf::from("/opt/lib")));
        assert!(config.evict_on_failure);
    }

    #[test]
    fn test_or_prefers_explicit_values() {
        let explicit = RuntimeConfig {
            cwd: Some(PathBuf::from("/a")),
            ..Default::default()
        };
        let fallback = RuntimeConfig {
            cwd: Some(PathBuf::from("/b")),
            home: Some(PathBuf::from("/h")),
            load_stats: true,
            argv: vec!["bramble".into()],
            ..Default::default()
        };
        let merged = explicit.or(fallback);
        assert_eq!(merged.cwd, Some(PathBuf::from("/a")));
        assert_eq!(merged.home, Some(PathBuf::from("/h")));
        assert!(merged.load_stats);
        assert_eq!(merged.argv, vec!["bramble".to_string()]);
    }

    #[test]
    fn test_path_string_trims_trailing_slash() {
        assert_eq!(path_string(Path::new("/proj/")), "/proj");
        assert_eq!(path_string(Path::new("/")), "/");
    }
}
