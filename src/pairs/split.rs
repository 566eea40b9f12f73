//! Separate pair tensors into per-branch inputs.

use ndarray::{stack, Array4, Axis};

use crate::error::{Error, Result};

use super::generate::PairedImageSet;

/// Split a pair tensor into its left and right images.
///
/// Both outputs have shape `(T, H, W, 3)` and keep the pair order, so
/// `left[k]` and `right[k]` are the two members of pair `k`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if axis 1 of `paired` is not of length 2.
pub fn split_pairs(paired: &PairedImageSet) -> Result<(Array4<f32>, Array4<f32>)> {
    let members = paired.len_of(Axis(1));
    if members != 2 {
        return Err(Error::ShapeMismatch {
            expected: "2 images per pair".to_string(),
            actual: format!("{members} images per pair"),
        });
    }

    let left = paired.index_axis(Axis(1), 0).to_owned();
    let right = paired.index_axis(Axis(1), 1).to_owned();
    Ok((left, right))
}

/// Recombine left and right images into a pair tensor.
///
/// Inverse of [`split_pairs`].
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if `left` and `right` differ in shape.
pub fn stack_pairs(left: &Array4<f32>, right: &Array4<f32>) -> Result<PairedImageSet> {
    stack(Axis(1), &[left.view(), right.view()]).map_err(|_| Error::ShapeMismatch {
        expected: format!("{:?}", left.shape()),
        actual: format!("{:?}", right.shape()),
    })
}
