//! `siamese-pairs` CLI - Build Siamese training pairs from an image directory.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siamese_pairs::config::{DEFAULT_IMAGE_DIR, DEFAULT_LABEL_FILE};
use siamese_pairs::device::{self, DeviceEnv};
use siamese_pairs::{DataConfig, Hyperparameters, Pipeline};

/// Load an image directory and its labels, then build every image pair.
#[derive(Parser, Debug)]
#[command(name = "siamese-pairs")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory with one image per sample, taken in file name order.
    #[arg(long, default_value = DEFAULT_IMAGE_DIR, value_name = "DIR")]
    images: PathBuf,

    /// Label file with one integer per line, aligned with the sorted images.
    #[arg(long, default_value = DEFAULT_LABEL_FILE, value_name = "FILE")]
    labels: PathBuf,

    /// JSON file with `img_width`, `img_height` and `blur_radius`. Other keys are ignored.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target image width; overrides `img_width`.
    #[arg(long, value_name = "INT")]
    width: Option<u32>,

    /// Target image height; overrides `img_height`.
    #[arg(long, value_name = "INT")]
    height: Option<u32>,

    /// Gaussian blur standard deviation; overrides `blur_radius`.
    #[arg(long, value_name = "FLOAT")]
    blur_radius: Option<f32>,

    /// Set the CUDA/TensorFlow environment, exposing only these devices.
    #[arg(long, value_name = "IDS")]
    gpu: Option<String>,

    /// Build pairs in batches of this size instead of all at once.
    #[arg(long, value_name = "INT")]
    batch_size: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("siamese_pairs={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if let Some(devices) = &args.gpu {
        device::init(&DeviceEnv::with_visible_devices(devices.as_str()));
    }

    let hyperparameters = hyperparameters(args)?;
    let config = DataConfig::new(hyperparameters)
        .with_image_dir(&args.images)
        .with_label_file(&args.labels);

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    if let Some(batch_size) = args.batch_size {
        let dataset = pipeline.load().context("Failed to load dataset")?;
        let mut pairs = 0;
        let mut positives = 0;

        for batch in dataset.batches(batch_size).context("Failed to build pairs")? {
            tracing::debug!("Batch at {} with {} pairs", batch.offset, batch.len());
            pairs += batch.len();
            positives += batch.labels.iter().filter(|&&same| same).count();
        }

        println!("Streamed {pairs} pairs ({positives} same-label) in batches of {batch_size}");
        return Ok(());
    }

    let prepared = pipeline.run().context("Failed to prepare pairs")?;

    println!(
        "Prepared {} pairs ({} same-label); left {:?}, right {:?}",
        prepared.len(),
        prepared.positive_count(),
        prepared.left.shape(),
        prepared.right.shape()
    );

    Ok(())
}

/// Merge the optional JSON file with command-line overrides.
fn hyperparameters(args: &Args) -> Result<Hyperparameters> {
    let mut map = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<Map<String, Value>>(&text)
                .with_context(|| format!("{} is not a JSON object", path.display()))?
        }
        None => Map::new(),
    };

    if let Some(width) = args.width {
        map.insert("img_width".to_string(), Value::from(width));
    }
    if let Some(height) = args.height {
        map.insert("img_height".to_string(), Value::from(height));
    }
    if let Some(blur_radius) = args.blur_radius {
        map.insert("blur_radius".to_string(), Value::from(blur_radius));
    }

    Hyperparameters::from_map(&map).context("Missing or invalid hyperparameters")
}
