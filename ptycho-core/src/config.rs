//! Translator configuration.
//!
//! Configuration is optional: [`TranslatorConfig::default`] reproduces the
//! standard `.tif` translation. A JSON file may override any subset of
//! fields, for example:
//!
//! ```json
//! {
//!     "extension": ".tiff",
//!     "compression": 6,
//!     "metadata": { "instrument": "Nion UltraSTEM", "sample_name": "MoS2" }
//! }
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for one translation run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Extension of the frame files, including the leading dot. Matched
    /// case-sensitively.
    pub extension: String,
    /// Deflate level (0-9) for the main dataset, or `None` for no compression.
    pub compression: Option<u8>,
    /// Apply the shuffle filter ahead of compression.
    pub shuffle: bool,
    /// Number of progress reports over one ingest.
    pub progress_divisions: usize,
    /// Free-form descriptive fields stored with the measurement.
    pub metadata: MetadataConfig,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            extension: ".tif".to_string(),
            compression: Some(4),
            shuffle: false,
            progress_divisions: 16,
            metadata: MetadataConfig::default(),
        }
    }
}

/// Descriptive fields written to the measurement group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub instrument: String,
    pub user_name: String,
    pub sample_name: String,
    pub sample_description: String,
}

impl TranslatorConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`TranslatorConfig::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not valid JSON or fails
    /// [`TranslatorConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    ///
    /// # Errors
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !self.extension.starts_with('.') || self.extension.len() < 2 {
            return Err(Error::Config(format!(
                "extension must start with '.' and name a suffix, got {:?}",
                self.extension
            )));
        }
        if let Some(level) = self.compression {
            if level > 9 {
                return Err(Error::Config(format!(
                    "compression level must be 0-9, got {level}"
                )));
            }
        }
        if self.progress_divisions == 0 {
            return Err(Error::Config(
                "progress_divisions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
