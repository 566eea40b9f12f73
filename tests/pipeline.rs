use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use ndarray::{s, Axis};

use siamese_pairs::pairs::{generate_pairs, split_pairs, stack_pairs};
use siamese_pairs::{DataConfig, Error, Hyperparameters, Pipeline};

fn write_dataset(root: &Path, values: &[u8], labels: &str) -> DataConfig {
    let image_dir = root.join("images");
    fs::create_dir(&image_dir).unwrap();
    for (idx, &value) in values.iter().enumerate() {
        RgbImage::from_pixel(12, 10, Rgb([value, value / 2, 255 - value]))
            .save(image_dir.join(format!("img_{idx:02}.png")))
            .unwrap();
    }

    let label_file = root.join("labels.txt");
    fs::write(&label_file, labels).unwrap();

    let hyp = Hyperparameters::from_json(r#"{"img_width": 8, "img_height": 8, "blur_radius": 0}"#)
        .unwrap();
    DataConfig::new(hyp)
        .with_image_dir(image_dir)
        .with_label_file(label_file)
}

#[test]
fn four_images_two_classes() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_dataset(dir.path(), &[0, 60, 120, 180], "0\n1\n0\n1\n");
    let pipeline = Pipeline::new(config).unwrap();

    let dataset = pipeline.load().unwrap();
    assert_eq!(dataset.images.shape(), &[4, 8, 8, 3]);
    assert!(dataset.images.iter().all(|&v| (0.0..=1.0).contains(&v)));

    let (paired, same) = generate_pairs(&dataset.images, &dataset.labels).unwrap();
    assert_eq!(paired.shape(), &[6, 2, 8, 8, 3]);
    assert_eq!(
        same.to_vec(),
        vec![false, true, false, false, true, false]
    );

    // pair (1, 3) sits at position 4
    assert_eq!(
        paired.slice(s![4, 0, .., .., ..]),
        dataset.images.index_axis(Axis(0), 1)
    );
    assert_eq!(
        paired.slice(s![4, 1, .., .., ..]),
        dataset.images.index_axis(Axis(0), 3)
    );

    let (left, right) = split_pairs(&paired).unwrap();
    assert_eq!(left.shape(), &[6, 8, 8, 3]);
    assert_eq!(stack_pairs(&left, &right).unwrap(), paired);
}

#[test]
fn run_produces_branch_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_dataset(dir.path(), &[10, 20, 30], "1\n2\n1\n");

    let prepared = Pipeline::new(config).unwrap().run().unwrap();

    assert_eq!(prepared.len(), 3);
    assert_eq!(prepared.labels.to_vec(), vec![false, false, true]);
    assert_eq!(prepared.positive_count(), 1);
    assert_eq!(prepared.left.shape(), &[3, 8, 8, 3]);
    assert_eq!(prepared.right.shape(), &[3, 8, 8, 3]);

    // red channel encodes the source image: left of pair 2 is image 1, right is image 2
    assert!((prepared.left[[2, 0, 0, 0]] - 20.0 / 255.0).abs() < 1e-6);
    assert!((prepared.right[[2, 0, 0, 0]] - 30.0 / 255.0).abs() < 1e-6);
}

#[test]
fn single_image_gives_no_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_dataset(dir.path(), &[99], "4\n");

    let prepared = Pipeline::new(config).unwrap().run().unwrap();
    assert!(prepared.is_empty());
    assert_eq!(prepared.left.shape(), &[0, 8, 8, 3]);
}

#[test]
fn label_count_mismatch_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_dataset(dir.path(), &[1, 2, 3, 4, 5], "0\n0\n1\n1\n");

    let err = Pipeline::new(config).unwrap().run().unwrap_err();
    assert!(matches!(
        err,
        Error::LabelCountMismatch {
            images: 5,
            labels: 4
        }
    ));
}

#[test]
fn streamed_batches_match_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_dataset(dir.path(), &[5, 50, 100, 150, 200], "3\n3\n1\n3\n1\n");
    let pipeline = Pipeline::new(config).unwrap();

    let dataset = pipeline.load().unwrap();
    let (_, same) = dataset.pairs().unwrap();

    let streamed: Vec<bool> = dataset
        .batches(3)
        .unwrap()
        .flat_map(|batch| batch.labels.to_vec())
        .collect();
    assert_eq!(streamed, same.to_vec());
}
