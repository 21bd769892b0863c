//! Configuration management for BorderBatch

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{Result, BorderbatchError};
use crate::processing::Orientation;

pub mod profiles;
pub use profiles::*;

/// Name of the subfolder created inside the input folder for outputs
pub const OUTPUT_SUBDIR: &str = "bordered_images";

/// Immutable snapshot of every tunable, shared read-only by all workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output canvas width in pixels
    pub target_width: u32,

    /// Output canvas height in pixels
    pub target_height: u32,

    /// Border ratios for images wider than tall
    #[serde(deserialize_with = "profiles::landscape_section")]
    pub landscape: BorderProfile,

    /// Border ratios for everything else
    #[serde(deserialize_with = "profiles::portrait_section")]
    pub portrait: BorderProfile,

    /// Number of images per batch
    pub batch_size: usize,

    /// Number of concurrent workers
    pub workers: usize,

    /// JPEG output quality (1-100)
    pub jpeg_quality: u8,

    /// Prefix prepended to each output filename
    pub output_prefix: String,

    /// Write outputs into `OUTPUT_SUBDIR` instead of next to the inputs
    pub separate_folder: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_width: 1080,
            target_height: 1080,
            landscape: BorderProfile::landscape(),
            portrait: BorderProfile::portrait(),
            batch_size: 10,
            workers: 1000,
            jpeg_quality: 100,
            output_prefix: "bordered_".to_string(),
            separate_folder: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}

/// Values passed explicitly on the command line.
///
/// Only `Some` fields replace what the defaults or a config file set.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub landscape_vertical: Option<f64>,
    pub landscape_horizontal: Option<f64>,
    pub portrait_vertical: Option<f64>,
    pub portrait_horizontal: Option<f64>,
    pub batch_size: Option<usize>,
    pub workers: Option<usize>,
    pub jpeg_quality: Option<u8>,
    pub output_prefix: Option<String>,
    pub separate_folder: Option<bool>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// True when no override was given
    pub fn is_empty(&self) -> bool {
        self.target_width.is_none()
            && self.target_height.is_none()
            && self.landscape_vertical.is_none()
            && self.landscape_horizontal.is_none()
            && self.portrait_vertical.is_none()
            && self.portrait_horizontal.is_none()
            && self.batch_size.is_none()
            && self.workers.is_none()
            && self.jpeg_quality.is_none()
            && self.output_prefix.is_none()
            && self.separate_folder.is_none()
    }
}

impl Config {
    /// Load configuration from a `.toml` or `.yaml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BorderbatchError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        match extension_of(path.as_ref()).as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(BorderbatchError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        }
    }

    /// Save configuration to a `.toml` or `.yaml` file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = match extension_of(path.as_ref()).as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| BorderbatchError::config(format!("TOML serialization failed: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            _ => return Err(BorderbatchError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        };

        std::fs::write(&path, content)
            .map_err(|e| BorderbatchError::config(
                format!("Failed to write config file {:?}: {}", path.as_ref(), e)
            ))?;

        Ok(())
    }

    /// Apply command-line overrides on top of this configuration
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(width) = overrides.target_width {
            self.target_width = width;
        }
        if let Some(height) = overrides.target_height {
            self.target_height = height;
        }
        if let Some(ratio) = overrides.landscape_vertical {
            self.landscape.vertical = ratio;
        }
        if let Some(ratio) = overrides.landscape_horizontal {
            self.landscape.horizontal = ratio;
        }
        if let Some(ratio) = overrides.portrait_vertical {
            self.portrait.vertical = ratio;
        }
        if let Some(ratio) = overrides.portrait_horizontal {
            self.portrait.horizontal = ratio;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(quality) = overrides.jpeg_quality {
            self.jpeg_quality = quality;
        }
        if let Some(prefix) = &overrides.output_prefix {
            self.output_prefix = prefix.clone();
        }
        if let Some(separate) = overrides.separate_folder {
            self.separate_folder = separate;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(BorderbatchError::config(format!(
                "Target dimensions must be greater than 0, got {}x{}",
                self.target_width, self.target_height
            )));
        }

        self.landscape.validate("landscape")?;
        self.portrait.validate("portrait")?;

        if self.batch_size == 0 {
            return Err(BorderbatchError::config("Batch size must be greater than 0"));
        }

        if self.workers == 0 {
            return Err(BorderbatchError::config("Worker count must be greater than 0"));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(BorderbatchError::config(format!(
                "JPEG quality must be between 1-100, got {}",
                self.jpeg_quality
            )));
        }

        if !self.separate_folder && self.output_prefix.is_empty() {
            return Err(BorderbatchError::config(
                "An output prefix is required when writing next to the input files"
            ));
        }

        Ok(())
    }

    /// Border ratios to use for an image of the given orientation
    pub fn border_for(&self, orientation: Orientation) -> BorderProfile {
        profile_for(orientation, &self.landscape, &self.portrait)
    }

    /// Where outputs for `input_folder` are written
    pub fn output_folder(&self, input_folder: &Path) -> PathBuf {
        if self.separate_folder {
            input_folder.join(OUTPUT_SUBDIR)
        } else {
            input_folder.to_path_buf()
        }
    }

    /// Output filename for an input filename; non-UTF-8 names pass through intact
    pub fn output_name(&self, filename: &OsStr) -> OsString {
        let mut name = OsString::from(&self.output_prefix);
        name.push(filename);
        name
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}
