//! Provenance block shared by every artifact.

use std::time::{SystemTime, UNIX_EPOCH};

use lh_core::Result;
use serde::{Deserialize, Serialize};

/// Who made an artifact, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Always `"lanham"`.
    pub tool: String,
    /// Crate version that produced the artifact.
    pub tool_version: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_unix_ms: u128,
    /// Display title.
    pub title: String,
}

impl ArtifactMeta {
    /// Stamp a new artifact.
    pub fn new(title: &str) -> Result<Self> {
        Ok(Self {
            tool: "lanham".to_string(),
            tool_version: lh_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
            title: title.to_string(),
        })
    }
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| lh_core::Error::Computation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}
