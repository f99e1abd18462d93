//! Project configuration (godeco.toml) parsing and types.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "godeco.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration structure for godeco.toml.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GodecoConfig {
    /// Generation settings.
    #[serde(default)]
    pub generate: GenerateConfig,
}

/// `[generate]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    /// Import paths always added to the generated import block.
    pub imports: Option<Vec<String>>,
    /// Run the formatter on the output.
    pub format: Option<bool>,
    /// Formatter binary.
    pub gofmt: Option<String>,
}

impl GodecoConfig {
    /// Load `godeco.toml` from the current directory, if there is one.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from_path(path).map(Some)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl GenerateConfig {
    /// Configured import paths (default: none).
    pub fn imports(&self) -> &[String] {
        self.imports.as_deref().unwrap_or(&[])
    }

    /// Whether output is formatted (default: true).
    pub fn format(&self) -> bool {
        self.format.unwrap_or(true)
    }

    /// Formatter binary (default: `gofmt` from `PATH`).
    pub fn gofmt(&self) -> &str {
        self.gofmt.as_deref().unwrap_or("gofmt")
    }
}
