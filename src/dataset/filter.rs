//! Decode, resize and blur a single image file.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use crate::error::{Error, Result};

use super::{Image, RGB_CHANNELS};

/// Load an image from disk and turn it into an RGB array.
///
/// The image is:
/// 1. Decoded from the specified path
/// 2. Stretched to exactly `width` x `height` (aspect ratio is not kept)
/// 3. Smoothed with a Gaussian blur whose standard deviation is `blur_radius`
/// 4. Returned as an HWC array of shape `(height, width, 3)` with values in
///    the native [0, 255] range
///
/// A `blur_radius` of zero leaves the resized image untouched.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the file cannot be read or decoded and
/// [`Error::NonFiniteValue`] if the result contains NaN or infinite values.
pub fn process<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    blur_radius: f32,
) -> Result<Image> {
    let path = path.as_ref();
    check_params(width, height, blur_radius)?;

    let img = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let array = filter_image(&img, width, height, blur_radius)?;
    check_finite(array, path)
}

/// Reject arrays holding NaN or infinite values.
fn check_finite(array: Image, path: &Path) -> Result<Image> {
    if array.iter().any(|v| !v.is_finite()) {
        return Err(Error::NonFiniteValue {
            path: path.to_path_buf(),
        });
    }

    Ok(array)
}

/// Reject dimensions and radii the filters cannot handle.
pub(super) fn check_params(width: u32, height: u32, blur_radius: f32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidParameter {
            name: "size".to_string(),
            reason: format!("{width}x{height} must have positive width and height"),
        });
    }

    if !blur_radius.is_finite() || blur_radius < 0.0 {
        return Err(Error::InvalidParameter {
            name: "blur_radius".to_string(),
            reason: format!("{blur_radius} must be finite and non-negative"),
        });
    }

    Ok(())
}

fn filter_image(img: &DynamicImage, width: u32, height: u32, blur_radius: f32) -> Result<Image> {
    let resized = img.resize_exact(width, height, FilterType::CatmullRom).to_rgb8();

    // gaussian_blur_f32 panics on a zero sigma
    let blurred = if blur_radius > 0.0 {
        gaussian_blur_f32(&resized, blur_radius)
    } else {
        resized
    };

    rgb_to_array(blurred)
}

fn rgb_to_array(rgb: RgbImage) -> Result<Image> {
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    // RgbImage stores rows of interleaved RGB, which is already HWC
    let array = ndarray::Array3::from_shape_vec((height, width, RGB_CHANNELS), rgb.into_raw())
        .map_err(|err| Error::ShapeMismatch {
            expected: format!("({height}, {width}, {RGB_CHANNELS})"),
            actual: err.to_string(),
        })?;

    Ok(array.mapv(f32::from))
}
