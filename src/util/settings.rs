//! Library settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Error, Result};
use crate::codec::CodecOptions;

/// Environment variable naming a JSON settings file.
pub const SETTINGS_ENV: &str = "H5ATTR_SETTINGS";

/// Settings shared by the orchestrator and the reference resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Decode fixed-width text to `String` instead of raw bytes.
    pub convert_byte_to_string: bool,
    /// Maximum number of resolved references kept per resolver (0 = unbounded).
    pub reference_cache_capacity: usize,
    /// Truncate each rendered reference to this many characters (0 = no limit).
    pub max_display_items: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            convert_byte_to_string: true,
            reference_cache_capacity: 4096,
            max_display_items: 0,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Json(inner) => {
                Error::InvalidSettings(format!("{}: {}", path.display(), inner))
            }
            other => other,
        })
    }

    /// Load settings from the file named by `H5ATTR_SETTINGS`, or defaults when unset.
    pub fn load() -> Result<Self> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => {
                tracing::debug!("loading settings from {:?}", path);
                Self::load_from(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Write settings as pretty JSON.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Codec options derived from these settings (all compound members selected).
    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            convert_byte_to_string: self.convert_byte_to_string,
            ..CodecOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.convert_byte_to_string);
        assert_eq!(s.reference_cache_capacity, 4096);
        assert_eq!(s.max_display_items, 0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = Settings::from_json(r#"{ "convert_byte_to_string": false, "unknown": 1 }"#).unwrap();
        assert!(!s.convert_byte_to_string);
        assert_eq!(s.reference_cache_capacity, 4096);
        assert!(!s.codec_options().convert_byte_to_string);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Settings::from_json("{ nope"), Err(Error::Json(_))));
    }
}
