//! End-to-end preparation: load, pair, split.

use indicatif::BinaryBytes;
use ndarray::Array4;

use crate::config::DataConfig;
use crate::dataset::{self, ImageSet, LabelSet};
use crate::error::Result;
use crate::pairs::{self, estimated_pair_bytes, PairBatches, PairLabelSet, PairedImageSet};

/// Images and labels loaded from disk, aligned by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// NHWC image tensor with values in [0, 1].
    pub images: ImageSet,

    /// One label per image.
    pub labels: LabelSet,
}

impl Dataset {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Build all pairs at once.
    ///
    /// # Errors
    ///
    /// See [`pairs::generate_pairs`].
    pub fn pairs(&self) -> Result<(PairedImageSet, PairLabelSet)> {
        pairs::generate_pairs(&self.images, &self.labels)
    }

    /// Stream pairs in batches of at most `batch_size`.
    ///
    /// # Errors
    ///
    /// See [`pairs::pair_batches`].
    pub fn batches(&self, batch_size: usize) -> Result<PairBatches<'_>> {
        pairs::pair_batches(&self.images, &self.labels, batch_size)
    }
}

/// Model-ready inputs for the two branches of a Siamese network.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPairs {
    /// First image of every pair, `(T, H, W, 3)`.
    pub left: Array4<f32>,

    /// Second image of every pair, `(T, H, W, 3)`.
    pub right: Array4<f32>,

    /// Same-label flag of every pair.
    pub labels: PairLabelSet,
}

impl PreparedPairs {
    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of pairs whose images share a label.
    #[must_use]
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&same| same).count()
    }
}

/// Preparation pipeline bound to one dataset configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DataConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: DataConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        Ok(Self { config })
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Load and preprocess images and labels.
    ///
    /// # Errors
    ///
    /// Returns the first loading error; nothing is returned partially.
    pub fn load(&self) -> Result<Dataset> {
        let (images, labels) = dataset::load_data(&self.config)?;
        let dataset = Dataset { images, labels };

        let (_, height, width, _) = dataset.images.dim();
        match estimated_pair_bytes(dataset.len(), height, width) {
            Some(bytes) => tracing::info!(
                "{} pairs will need {}",
                pairs::pair_count(dataset.len()),
                BinaryBytes(bytes as u64)
            ),
            None => tracing::warn!(
                "{} images give more pairs than can be held in memory",
                dataset.len()
            ),
        }

        Ok(dataset)
    }

    /// Load the dataset, build every pair, and split them into branch inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or pairing fails.
    pub fn run(&self) -> Result<PreparedPairs> {
        let dataset = self.load()?;

        tracing::info!("Generating pairs...");
        let (paired, labels) = dataset.pairs()?;
        drop(dataset);

        let (left, right) = pairs::split_pairs(&paired)?;
        let prepared = PreparedPairs {
            left,
            right,
            labels,
        };

        tracing::info!(
            "Prepared {} pairs ({} same-label)",
            prepared.len(),
            prepared.positive_count()
        );

        Ok(prepared)
    }
}
