//! Image directory and label file loading.

mod filter;
mod load;

pub use filter::process;
pub use load::{list_images, load_data, load_images, load_labels};

use ndarray::{Array1, Array3, Array4};

/// Single preprocessed image in HWC layout (height, width, RGB).
pub type Image = Array3<f32>;

/// Stack of images in NHWC layout. Values are normalized to [0, 1].
pub type ImageSet = Array4<f32>;

/// One integer class label per image, aligned by index with the [`ImageSet`].
pub type LabelSet = Array1<i64>;

/// Divisor mapping 8-bit pixel intensities to [0, 1].
pub const NORM: f32 = 255.0;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
