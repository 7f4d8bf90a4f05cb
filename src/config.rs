use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::bencode::{DecodeOptions, DEFAULT_MAX_DEPTH};
use crate::view::ViewMode;

pub const CONFIG_FILE: &str = "torrentinfo.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_depth: usize,
    pub view: ViewMode,
    pub tab: String,
    pub colour: bool,
    pub ascii_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            view: ViewMode::Basic,
            tab: "  ".to_string(),
            colour: true,
            ascii_only: false,
        }
    }
}

impl Config {
    /// Reads `torrentinfo.toml` from the working directory, falling back to
    /// defaults when there isn't one.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(CONFIG_FILE).exists() {
            Self::load_from(CONFIG_FILE)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_depth,
        }
    }
}
