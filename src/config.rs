//! Hyperparameters and dataset locations.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Default directory holding one image per sample.
pub const DEFAULT_IMAGE_DIR: &str = "images";

/// Default label file, one integer per line.
pub const DEFAULT_LABEL_FILE: &str = "labels.txt";

/// Preprocessing hyperparameters.
///
/// Built from a JSON object holding `img_width`, `img_height` and
/// `blur_radius`. Other keys are ignored so the same object can carry
/// training hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperparameters {
    /// Target width in pixels.
    pub img_width: u32,

    /// Target height in pixels.
    pub img_height: u32,

    /// Standard deviation of the Gaussian blur. Zero disables blurring.
    pub blur_radius: f32,
}

impl Hyperparameters {
    /// Extract hyperparameters from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing or invalid key.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let hyp = Self {
            img_width: positive_int(map, "img_width")?,
            img_height: positive_int(map, "img_height")?,
            blur_radius: non_negative_number(map, "blur_radius")?,
        };
        hyp.validate()?;
        Ok(hyp)
    }

    /// Parse hyperparameters from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object or a key is invalid.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|source| Error::ConfigParse { source })?;

        match value {
            Value::Object(map) => Self::from_map(&map),
            other => Err(Error::Config {
                key: "<root>".to_string(),
                reason: format!("expected a JSON object, got {other}"),
            }),
        }
    }

    /// Read hyperparameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds invalid values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Validate the hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the blur radius is negative
    /// or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.img_width == 0 {
            return Err(Error::Config {
                key: "img_width".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.img_height == 0 {
            return Err(Error::Config {
                key: "img_height".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(Error::Config {
                key: "blur_radius".to_string(),
                reason: "must be a finite, non-negative number".to_string(),
            });
        }

        Ok(())
    }
}

/// Where to find the dataset and how to preprocess it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    /// Directory of sample images.
    pub image_dir: PathBuf,

    /// Label file aligned with the sorted image order.
    pub label_file: PathBuf,

    /// Preprocessing hyperparameters.
    pub hyperparameters: Hyperparameters,
}

impl DataConfig {
    /// Configuration using the default `images` directory and `labels.txt`.
    #[must_use]
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            label_file: PathBuf::from(DEFAULT_LABEL_FILE),
            hyperparameters,
        }
    }

    /// Replace the image directory.
    #[must_use]
    pub fn with_image_dir<P: Into<PathBuf>>(mut self, image_dir: P) -> Self {
        self.image_dir = image_dir.into();
        self
    }

    /// Replace the label file.
    #[must_use]
    pub fn with_label_file<P: Into<PathBuf>>(mut self, label_file: P) -> Self {
        self.label_file = label_file.into();
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any hyperparameter is out of range.
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    map.get(key).ok_or_else(|| Error::Config {
        key: key.to_string(),
        reason: "missing required key".to_string(),
    })
}

fn positive_int(map: &Map<String, Value>, key: &str) -> Result<u32> {
    let value = lookup(map, key)?;
    value
        .as_u64()
        .filter(|&v| v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| Error::Config {
            key: key.to_string(),
            reason: format!("expected a positive integer, got {value}"),
        })
}

#[allow(clippy::cast_possible_truncation)]
fn non_negative_number(map: &Map<String, Value>, key: &str) -> Result<f32> {
    let value = lookup(map, key)?;
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as f32)
        .ok_or_else(|| Error::Config {
            key: key.to_string(),
            reason: format!("expected a non-negative number, got {value}"),
        })
}
