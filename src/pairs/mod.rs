//! Combinatorial pairing of images for Siamese training.

mod generate;
mod index;
mod split;

pub use generate::{
    estimated_pair_bytes, generate_pairs, pair_batches, PairBatch, PairBatches, PairLabelSet,
    PairedImageSet,
};
pub use index::{pair_count, pair_position, PairIndices};
pub use split::{split_pairs, stack_pairs};
