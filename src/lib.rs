//! # `siamese-pairs`
//!
//! Prepares paired image data for training a Siamese similarity model.
//!
//! A directory of images and a parallel label file are loaded, every image is
//! resized and blurred, and every unordered pair of images is built together
//! with a flag telling whether both images share a label. Pairs are then split
//! into left and right tensors, one per network branch.
//!
//! Image files are taken in file name order and the `k`-th label belongs to
//! the `k`-th file.
//!
//! ## Example
//!
//! ```no_run
//! use siamese_pairs::{DataConfig, Hyperparameters, Pipeline};
//!
//! # fn main() -> siamese_pairs::Result<()> {
//! let hyp = Hyperparameters::from_json(r#"{"img_width": 64, "img_height": 64, "blur_radius": 1}"#)?;
//! let pipeline = Pipeline::new(DataConfig::new(hyp))?;
//!
//! let prepared = pipeline.run()?;
//! println!("{} pairs, {} same-label", prepared.len(), prepared.positive_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod device;
pub mod error;
pub mod pairs;
pub mod pipeline;

pub use config::{DataConfig, Hyperparameters};
pub use error::{Error, Result};
pub use pipeline::{Dataset, Pipeline, PreparedPairs};
