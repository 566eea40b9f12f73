//! Custom error types for siamese-pairs.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the siamese-pairs library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or decode an image file.
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A decoded image produced NaN or infinite values.
    #[error("image {path} produced non-finite pixel values")]
    NonFiniteValue { path: PathBuf },

    /// The label file does not hold one label per image.
    #[error("label count mismatch: {images} images but {labels} labels")]
    LabelCountMismatch { images: usize, labels: usize },

    /// A hyperparameter is missing or invalid.
    #[error("invalid configuration key {key}: {reason}")]
    Config { key: String, reason: String },

    /// Failed to read a configuration file.
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid JSON.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        #[source]
        source: serde_json::Error,
    },

    /// Failed to list the image directory.
    #[error("failed to read image directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the label file.
    #[error("failed to read label file {path}: {source}")]
    LabelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A label line is not an integer.
    #[error("invalid label on line {line} of {path}: {content:?}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The pair tensor for this many images does not fit in memory addressing.
    #[error("pair tensor for {images} images does not fit in memory")]
    PairTensorTooLarge { images: usize },

    /// The image tensor for this dataset does not fit in memory addressing.
    #[error("image tensor of {images} images at {width}x{height} does not fit in memory")]
    ImageTensorTooLarge {
        images: usize,
        width: u32,
        height: u32,
    },
}

/// Result type alias for siamese-pairs operations.
pub type Result<T> = std::result::Result<T, Error>;
