//! Runtime configuration
//!
//! Describes the virtual screen and the default window scaling. Read from
//! TOML; every field has a default, so an empty file is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::geometry::Rect;
use crate::screen::{ScreenDescriptor, DEFAULT_DPI, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};

/// Environment variable naming the config file read by [`Config::load`]
pub const CONFIG_ENV_VAR: &str = "WINDOWSIM_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Virtual screen configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Screen width in pixels (default: 1280)
    pub width: i32,

    /// Screen height in pixels (default: 1024)
    pub height: i32,

    /// Pixel density (default: 96.0)
    pub dpi: f64,

    /// Area available to popups, defaults to the full screen
    pub working_area: Option<Rect>,

    pub primary: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
            dpi: DEFAULT_DPI,
            working_area: None,
            primary: true,
        }
    }
}

impl ScreenConfig {
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Build the screen this config describes
    pub fn descriptor(&self) -> Result<ScreenDescriptor> {
        let bounds = self.bounds();
        let working_area = self.working_area.unwrap_or(bounds);
        ScreenDescriptor::new(self.dpi, bounds, working_area, self.primary)
    }
}

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub screen: ScreenConfig,

    /// Scaling factor for new windows (default: 1.0)
    pub scaling: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen: ScreenConfig::default(),
            scaling: 1.0,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from the file named by `WINDOWSIM_CONFIG`, or fall back to defaults
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from) else {
            tracing::info!("using default configuration");
            return Self::default();
        };

        match Self::from_path(&path) {
            Ok(config) => {
                tracing::info!(?path, screen = ?config.screen.bounds(), scaling = config.scaling, "loaded configuration");
                config
            }
            Err(e) => {
                tracing::warn!(?path, error = %e, "failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.scaling.is_nan() || self.scaling <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scaling must be positive, got {}",
                self.scaling
            )));
        }
        self.screen
            .descriptor()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}
