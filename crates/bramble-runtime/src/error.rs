// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module runtime

use std::path::PathBuf;
use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while resolving, loading or running modules
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Resolution exhausted every candidate, or a module required itself
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// Normalization would pop above the root
    #[error("Path escapes root: {0}")]
    PathEscapesRoot(String),

    /// A snapshot file that is not an invocable unit
    #[error("Invalid snapshot file: {}", .0.display())]
    InvalidSnapshot(PathBuf),

    /// The native addon collaborator refused to open the file
    #[error("Failed to load native addon: {}", .0.display())]
    NativeLoadFailure(PathBuf),

    /// A `package.json` that could not be read or parsed
    #[error("Invalid package descriptor {}: {reason}", .path.display())]
    PackageDescriptor {
        /// Descriptor path
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },

    /// Script engine error (syntax or runtime)
    #[error("{0}")]
    Script(#[from] bramble_script::Error),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON parsing error in a data module
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl RuntimeError {
    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Recovers a runtime error that travelled through script execution.
    ///
    /// Nested `require` failures are boxed into `bramble_script::Error::Host`
    /// by the executor; this undoes the boxing so callers see the original
    /// variant.
    pub fn from_script(err: bramble_script::Error) -> Self {
        match err {
            bramble_script::Error::Host(inner) => match inner.downcast::<RuntimeError>() {
                Ok(original) => *original,
                Err(other) => Self::Generic(other.to_string()),
            },
            other => Self::Script(other),
        }
    }
}
