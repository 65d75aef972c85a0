//! Backend configuration.
//!
//! Tunables for the codec backend, loaded from an optional TOML file. Stock
//! defaults are the base layer; a user file overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [jpeg]
//! quality = 85              # Default JPEG quality (0-100)
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//! ```
//!
//! Unknown keys are rejected, so a typo fails loudly instead of being ignored.

use crate::imaging::Quality;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// JPEG encoder settings.
    pub jpeg: JpegConfig,
    /// Resampling settings.
    pub resize: ResizeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    /// Quality used when a save request does not name one.
    pub quality: u32,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResizeFilter,
}

/// Resampling filter names accepted in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl BackendConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jpeg.quality > 100 {
            return Err(ConfigError::Validation(format!(
                "jpeg.quality must be 0-100, got {}",
                self.jpeg.quality
            )));
        }
        Ok(())
    }

    pub fn jpeg_quality(&self) -> Quality {
        Quality::new(self.jpeg.quality)
    }

    pub fn resize_filter(&self) -> FilterType {
        self.resize.filter.filter_type()
    }
}

/// The stock default config as a `toml::Value::Table`, the base layer for
/// merging user overrides.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BackendConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BackendConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BackendConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file, or the stock defaults when `path` is `None`.
///
/// A path that is given but missing is an error.
pub fn load_config(path: Option<&Path>) -> Result<BackendConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config file with all keys and
/// explanations. Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imagestate backend configuration
# ================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# JPEG encoding
# ---------------------------------------------------------------------------
[jpeg]
# Quality used when a save does not specify one (0-100).
# 0 is encoded as 1, the lowest quality the encoder offers.
quality = 85

# ---------------------------------------------------------------------------
# Resizing
# ---------------------------------------------------------------------------
[resize]
# Resampling filter for resize operations.
# One of: nearest, triangle, catmull-rom, gaussian, lanczos3
filter = "lanczos3"
"##
}
