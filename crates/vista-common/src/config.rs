//! JSON configuration file helpers.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::Result;

/// Read and deserialize a JSON document from `path`.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let value = serde_json::from_str(&raw)?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(value)
}

/// Serialize `value` as pretty JSON and write it to `path`.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw)?;
    Ok(())
}
