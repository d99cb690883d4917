use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// How a location is opened for writing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Create if missing, keep existing content and append.
    #[default]
    Append,
    /// Create if missing, discard existing content.
    Truncate,
}

/// Configuration shared by all object streams opened through the selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Reopen attempts allowed within one `get()` on a loop-eligible source.
    pub reopen_limit: u32,
    /// Open behaviour for write-mode streams.
    pub write_mode: WriteMode,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reopen_limit: 1,
            write_mode: WriteMode::Append,
        }
    }
}

impl StreamConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> StreamResult<Self> {
        toml::from_str(text).map_err(|e| StreamError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> StreamResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StreamError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
