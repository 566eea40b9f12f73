//! Siamese pair tensors built from an image set and its labels.

use std::mem::size_of;

use ndarray::{Array1, Array5, Axis};

use crate::dataset::{ImageSet, LabelSet, RGB_CHANNELS};
use crate::error::{Error, Result};

use super::index::{checked_pair_count, PairIndices};

/// Pair tensor of shape `(T, 2, H, W, 3)`. Axis 1 holds the left and right
/// image of each pair.
pub type PairedImageSet = Array5<f32>;

/// Per-pair flag, `true` when both images carry the same label.
pub type PairLabelSet = Array1<bool>;

/// Build every unordered image pair and its "same class" flag.
///
/// Pair `k` holds `(images[i], images[j])` for the `k`-th `(i, j)` produced by
/// [`PairIndices`], and label `k` is `labels[i] == labels[j]`. Fewer than two
/// images give empty outputs.
///
/// The pair tensor grows quadratically with the number of images; see
/// [`estimated_pair_bytes`] and [`pair_batches`] for large sets.
///
/// # Errors
///
/// Returns [`Error::LabelCountMismatch`] if `images` and `labels` differ in
/// length and [`Error::PairTensorTooLarge`] if the tensor cannot be allocated.
pub fn generate_pairs(
    images: &ImageSet,
    labels: &LabelSet,
) -> Result<(PairedImageSet, PairLabelSet)> {
    let n = check_lengths(images, labels)?;
    check_size(images, checked_pair_count(n))?;
    Ok(fill_pairs(images, labels, PairIndices::new(n)))
}

/// Bytes needed for the pair tensor of `n` images of `height` x `width`.
///
/// Returns `None` if the size overflows addressable memory.
#[must_use]
pub fn estimated_pair_bytes(n: usize, height: usize, width: usize) -> Option<usize> {
    pair_tensor_bytes(checked_pair_count(n)?, height, width, RGB_CHANNELS)
}

/// A contiguous run of pairs from [`pair_batches`].
#[derive(Debug, Clone, PartialEq)]
pub struct PairBatch {
    /// Position of the first pair of this batch in the full pair order.
    pub offset: usize,

    /// Pair tensor of shape `(len, 2, H, W, 3)`.
    pub paired: PairedImageSet,

    /// Same-label flags for the pairs of this batch.
    pub labels: PairLabelSet,
}

impl PairBatch {
    /// Number of pairs in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the batch holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Iterator over fixed-size batches of pairs, in [`PairIndices`] order.
#[derive(Debug, Clone)]
pub struct PairBatches<'a> {
    images: &'a ImageSet,
    labels: &'a LabelSet,
    indices: PairIndices,
    batch_size: usize,
    offset: usize,
}

/// Stream the output of [`generate_pairs`] in batches of at most
/// `batch_size` pairs.
///
/// Only one batch is materialized at a time. Concatenating the batches gives
/// exactly the tensors [`generate_pairs`] returns.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for a zero `batch_size`, plus the
/// errors of [`generate_pairs`].
pub fn pair_batches<'a>(
    images: &'a ImageSet,
    labels: &'a LabelSet,
    batch_size: usize,
) -> Result<PairBatches<'a>> {
    if batch_size == 0 {
        return Err(Error::InvalidParameter {
            name: "batch_size".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let n = check_lengths(images, labels)?;
    let largest_batch = checked_pair_count(n).map_or(batch_size, |total| batch_size.min(total));
    check_size(images, Some(largest_batch))?;

    Ok(PairBatches {
        images,
        labels,
        indices: PairIndices::new(n),
        batch_size,
        offset: 0,
    })
}

impl Iterator for PairBatches<'_> {
    type Item = PairBatch;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<_> = self.indices.by_ref().take(self.batch_size).collect();
        if chunk.is_empty() {
            return None;
        }

        let offset = self.offset;
        self.offset += chunk.len();

        let (paired, labels) = fill_pairs(self.images, self.labels, chunk.into_iter());
        Some(PairBatch {
            offset,
            paired,
            labels,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let batches = self.indices.len().div_ceil(self.batch_size);
        (batches, Some(batches))
    }
}

impl ExactSizeIterator for PairBatches<'_> {}

fn check_lengths(images: &ImageSet, labels: &LabelSet) -> Result<usize> {
    let n = images.len_of(Axis(0));
    if n != labels.len() {
        return Err(Error::LabelCountMismatch {
            images: n,
            labels: labels.len(),
        });
    }
    Ok(n)
}

/// `pairs` is `None` when the pair count itself overflows.
fn check_size(images: &ImageSet, pairs: Option<usize>) -> Result<()> {
    let (n, height, width, channels) = images.dim();
    match pairs.and_then(|pairs| pair_tensor_bytes(pairs, height, width, channels)) {
        Some(_) => Ok(()),
        None => Err(Error::PairTensorTooLarge { images: n }),
    }
}

fn pair_tensor_bytes(pairs: usize, height: usize, width: usize, channels: usize) -> Option<usize> {
    pairs
        .checked_mul(2)?
        .checked_mul(height)?
        .checked_mul(width)?
        .checked_mul(channels)?
        .checked_mul(size_of::<f32>())
        .filter(|&bytes| isize::try_from(bytes).is_ok())
}

/// Preallocate the outputs and copy each indexed pair into place.
fn fill_pairs<I>(images: &ImageSet, labels: &LabelSet, indices: I) -> (PairedImageSet, PairLabelSet)
where
    I: ExactSizeIterator<Item = (usize, usize)> + Clone,
{
    let (_, height, width, channels) = images.dim();
    let mut paired = PairedImageSet::zeros((indices.len(), 2, height, width, channels));

    for (mut pair, (i, j)) in paired.outer_iter_mut().zip(indices.clone()) {
        pair.index_axis_mut(Axis(0), 0)
            .assign(&images.index_axis(Axis(0), i));
        pair.index_axis_mut(Axis(0), 1)
            .assign(&images.index_axis(Axis(0), j));
    }

    let same = indices.map(|(i, j)| labels[i] == labels[j]).collect();

    (paired, same)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, concatenate, s};

    /// Images whose pixels encode their own index, so pairs can be traced back.
    #[allow(clippy::cast_precision_loss)]
    fn indexed_images(n: usize, height: usize, width: usize) -> ImageSet {
        ImageSet::from_shape_fn((n, height, width, RGB_CHANNELS), |(k, y, x, c)| {
            (k * 1000 + y * 100 + x * 10 + c) as f32
        })
    }

    #[test]
    fn test_label_pairs_follow_combinations_order() {
        let images = indexed_images(3, 2, 2);
        let (paired, same) = generate_pairs(&images, &arr1(&[1, 2, 1])).unwrap();

        assert_eq!(paired.shape(), &[3, 2, 2, 2, 3]);
        assert_eq!(same, arr1(&[false, false, true]));
    }

    #[test]
    fn test_four_images_two_classes() {
        let images = indexed_images(4, 8, 8);
        let (paired, same) = generate_pairs(&images, &arr1(&[0, 1, 0, 1])).unwrap();

        assert_eq!(paired.len_of(Axis(0)), 6);
        assert_eq!(same, arr1(&[false, true, false, false, true, false]));
    }

    #[test]
    fn test_pair_contents_match_indices() {
        let images = indexed_images(5, 3, 4);
        let labels = arr1(&[0, 0, 0, 0, 0]);
        let (paired, _) = generate_pairs(&images, &labels).unwrap();

        for (k, (i, j)) in PairIndices::new(5).enumerate() {
            assert_eq!(paired.slice(s![k, 0, .., .., ..]), images.slice(s![i, .., .., ..]));
            assert_eq!(paired.slice(s![k, 1, .., .., ..]), images.slice(s![j, .., .., ..]));
        }
    }

    #[test]
    fn test_pair_count_matches_formula() {
        for n in 0..8 {
            let images = indexed_images(n, 1, 1);
            let labels = LabelSet::zeros(n);
            let (paired, same) = generate_pairs(&images, &labels).unwrap();

            assert_eq!(paired.len_of(Axis(0)), n * n.saturating_sub(1) / 2);
            assert_eq!(same.len(), paired.len_of(Axis(0)));
        }
    }

    #[test]
    fn test_fewer_than_two_images_is_empty() {
        let (paired, same) = generate_pairs(&indexed_images(1, 4, 4), &arr1(&[3])).unwrap();
        assert_eq!(paired.shape(), &[0, 2, 4, 4, 3]);
        assert!(same.is_empty());

        let (paired, same) = generate_pairs(&indexed_images(0, 4, 4), &LabelSet::zeros(0)).unwrap();
        assert_eq!(paired.shape(), &[0, 2, 4, 4, 3]);
        assert!(same.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let images = indexed_images(4, 3, 3);
        let labels = arr1(&[2, 2, 5, 2]);

        let first = generate_pairs(&images, &labels).unwrap();
        let second = generate_pairs(&images, &labels).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_length_mismatch() {
        let err = generate_pairs(&indexed_images(3, 2, 2), &arr1(&[0, 1])).unwrap_err();
        assert!(matches!(
            err,
            Error::LabelCountMismatch {
                images: 3,
                labels: 2
            }
        ));
    }

    #[test]
    fn test_batches_concatenate_to_full_output() {
        let images = indexed_images(6, 2, 3);
        let labels = arr1(&[0, 1, 1, 0, 2, 1]);
        let (paired, same) = generate_pairs(&images, &labels).unwrap();

        let batches: Vec<_> = pair_batches(&images, &labels, 4).unwrap().collect();
        assert_eq!(batches.len(), 4);
        assert_eq!(
            batches.iter().map(|b| b.offset).collect::<Vec<_>>(),
            [0, 4, 8, 12]
        );
        assert_eq!(batches.last().map(PairBatch::len), Some(3));

        let paired_views: Vec<_> = batches.iter().map(|b| b.paired.view()).collect();
        let label_views: Vec<_> = batches.iter().map(|b| b.labels.view()).collect();
        assert_eq!(concatenate(Axis(0), &paired_views).unwrap(), paired);
        assert_eq!(concatenate(Axis(0), &label_views).unwrap(), same);
    }

    #[test]
    fn test_batches_size_hint_and_empty() {
        let images = indexed_images(5, 1, 1);
        let labels = LabelSet::zeros(5);
        assert_eq!(pair_batches(&images, &labels, 3).unwrap().len(), 4);

        let images = indexed_images(1, 1, 1);
        let labels = LabelSet::zeros(1);
        assert_eq!(pair_batches(&images, &labels, 3).unwrap().count(), 0);
    }

    #[test]
    fn test_oversized_pair_tensor_is_an_error() {
        let images = ImageSet::zeros((3, 2, 2, RGB_CHANNELS));
        assert!(check_size(&images, Some(3)).is_ok());
        assert!(matches!(
            check_size(&images, Some(usize::MAX / 4)),
            Err(Error::PairTensorTooLarge { images: 3 })
        ));
        assert!(matches!(
            check_size(&images, checked_pair_count(usize::MAX)),
            Err(Error::PairTensorTooLarge { images: 3 })
        ));
    }

    #[test]
    fn test_zero_batch_size() {
        let images = indexed_images(2, 1, 1);
        let labels = LabelSet::zeros(2);
        assert!(matches!(
            pair_batches(&images, &labels, 0),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_estimated_pair_bytes() {
        assert_eq!(estimated_pair_bytes(4, 8, 8), Some(6 * 2 * 8 * 8 * 3 * 4));
        assert_eq!(estimated_pair_bytes(1, 8, 8), Some(0));
        assert_eq!(estimated_pair_bytes(1 << 20, 1 << 16, 1 << 16), None);
        assert_eq!(estimated_pair_bytes(usize::MAX, 1, 1), None);
        assert_eq!(estimated_pair_bytes(usize::MAX, 0, 0), None);
    }
}
