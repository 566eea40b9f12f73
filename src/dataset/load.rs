//! Dataset loading: image directory plus parallel label file.

use std::fs;
use std::mem::size_of;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Axis;

use crate::config::DataConfig;
use crate::error::{Error, Result};

use super::filter::{check_params, process};
use super::{ImageSet, LabelSet, NORM, RGB_CHANNELS};

/// List the image files of a directory in a reproducible order.
///
/// Only regular files are returned (subdirectories are skipped), sorted by
/// file name. Raw directory listing order differs across platforms and
/// filesystems, and labels are aligned to images by position, so the order
/// has to be fixed here.
///
/// # Errors
///
/// Returns [`Error::ReadDir`] if the directory cannot be listed.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read_dir_error = |source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if path.is_file() {
            paths.push(path);
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Load, preprocess, and normalize every image in a directory.
///
/// Returns an NHWC tensor of shape `(N, height, width, 3)` with values in
/// [0, 1], ordered as [`list_images`] orders the files.
///
/// # Errors
///
/// Fails on the first image that cannot be decoded; no partial dataset is
/// returned.
pub fn load_images<P: AsRef<Path>>(
    dir: P,
    width: u32,
    height: u32,
    blur_radius: f32,
) -> Result<ImageSet> {
    let paths = list_images(&dir)?;
    tracing::info!(
        "Found {} images in {}",
        paths.len(),
        dir.as_ref().display()
    );
    load_files(&paths, width, height, blur_radius)
}

/// Read one integer label per line.
///
/// Anything after a `#` is a comment. Surrounding whitespace is trimmed and
/// blank lines are skipped.
///
/// # Errors
///
/// Returns [`Error::LabelRead`] if the file cannot be read and
/// [`Error::LabelParse`] for the first line that is not an integer.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<LabelSet> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::LabelRead {
        path: path.to_path_buf(),
        source,
    })?;

    parse_labels(&text, path)
}

/// Load the images and labels described by `config`.
///
/// The label count is checked against the directory listing before any image
/// is decoded.
///
/// # Errors
///
/// Returns [`Error::LabelCountMismatch`] when the label file does not hold
/// exactly one label per image, or any error from loading either input.
pub fn load_data(config: &DataConfig) -> Result<(ImageSet, LabelSet)> {
    config.validate()?;
    tracing::info!("Loading and processing data...");

    let labels = load_labels(&config.label_file)?;
    let paths = list_images(&config.image_dir)?;

    if paths.len() != labels.len() {
        return Err(Error::LabelCountMismatch {
            images: paths.len(),
            labels: labels.len(),
        });
    }

    let hyp = &config.hyperparameters;
    let images = load_files(&paths, hyp.img_width, hyp.img_height, hyp.blur_radius)?;

    tracing::info!(
        "Loaded {} images of {}x{} with {} labels",
        images.len_of(Axis(0)),
        hyp.img_width,
        hyp.img_height,
        labels.len()
    );

    Ok((images, labels))
}

/// Decode `paths` into a preallocated tensor, then normalize in place.
fn load_files(paths: &[PathBuf], width: u32, height: u32, blur_radius: f32) -> Result<ImageSet> {
    check_params(width, height, blur_radius)?;

    if image_tensor_bytes(paths.len(), width, height).is_none() {
        return Err(Error::ImageTensorTooLarge {
            images: paths.len(),
            width,
            height,
        });
    }

    let mut images = ImageSet::zeros((
        paths.len(),
        height as usize,
        width as usize,
        RGB_CHANNELS,
    ));

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Loading [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    for (mut slot, path) in images.outer_iter_mut().zip(paths) {
        tracing::debug!("Processing {}", path.display());
        let image = process(path, width, height, blur_radius)?;
        slot.assign(&image);
        pb.inc(1);
    }

    pb.finish_with_message("Images loaded");

    images /= NORM;
    Ok(images)
}

/// Bytes of an `(n, height, width, 3)` `f32` tensor, `None` past `isize::MAX`.
fn image_tensor_bytes(n: usize, width: u32, height: u32) -> Option<usize> {
    // ndarray bounds the product of the non-zero axes, even when `n` is zero
    n.max(1)
        .checked_mul(height as usize)?
        .checked_mul(width as usize)?
        .checked_mul(RGB_CHANNELS)?
        .checked_mul(size_of::<f32>())
        .filter(|&bytes| isize::try_from(bytes).is_ok())
        .map(|bytes| if n == 0 { 0 } else { bytes })
}

fn parse_labels(text: &str, path: &Path) -> Result<LabelSet> {
    let labels = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, strip_comment(line).trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, line)| {
            line.parse::<i64>().map_err(|_| Error::LabelParse {
                path: path.to_path_buf(),
                line: line_no,
                content: line.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LabelSet::from(labels))
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(data, _)| data)
}
