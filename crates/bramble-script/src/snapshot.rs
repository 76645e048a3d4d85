//! Snapshot artifacts.
//!
//! A snapshot is a pre-parsed module body. The on-disk layout is the 8-byte
//! magic `BRAMBLE\0`, a format version byte, then the JSON-encoded
//! [`Artifact`].

use crate::ast::Program;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Leading bytes of every snapshot file.
pub const MAGIC: &[u8; 8] = b"BRAMBLE\0";

/// Current artifact format version.
pub const VERSION: u8 = 1;

/// What a snapshot file holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// A callable module body with its parameter list.
    Function {
        /// Parameter names, bound positionally on invoke
        params: Vec<String>,
        /// The parsed body
        program: Program,
    },
    /// A plain data value. Loading one as a module is an error.
    Value {
        /// The stored value
        value: serde_json::Value,
    },
}

/// Serializes an artifact with the snapshot header.
pub fn encode(artifact: &Artifact) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(artifact).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
    let mut out = Vec::with_capacity(MAGIC.len() + 1 + body.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Parses snapshot bytes back into an artifact.
pub fn decode(bytes: &[u8]) -> Result<Artifact> {
    let Some(rest) = bytes.strip_prefix(MAGIC.as_slice()) else {
        return Err(Error::InvalidSnapshot("missing snapshot header".into()));
    };
    match rest.split_first() {
        Some((&VERSION, body)) => {
            serde_json::from_slice(body).map_err(|e| Error::InvalidSnapshot(e.to_string()))
        }
        Some((version, _)) => Err(Error::InvalidSnapshot(format!(
            "unsupported snapshot version {}",
            version
        ))),
        None => Err(Error::InvalidSnapshot("truncated snapshot".into())),
    }
}
