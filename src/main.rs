//! Offline tool: decode recorded detector output against a still image and
//! write the landmark-model crop.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use opencv::{core::Vector, imgcodecs, prelude::*};
use posture_pipeline::{config::Config, landmarks::Landmarks, tracker::BodyTracker};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image the detector ran on
    #[arg(short, long)]
    image: PathBuf,

    /// Detector scores, raw little-endian f32 (one per anchor)
    #[arg(short, long)]
    scores: PathBuf,

    /// Detector boxes, raw little-endian f32 (one row per anchor)
    #[arg(short, long)]
    boxes: PathBuf,

    /// Where to write the crop
    #[arg(short, long, default_value = "crop.png")]
    output: PathBuf,

    /// Landmark model output for the crop, raw little-endian f32 (39 x 5)
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this path
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

/// Read a raw little-endian f32 tensor dump
fn read_f32_file(path: &Path) -> Result<Vec<f32>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.len() % 4 != 0 {
        bail!("{} is {} bytes, not a whole number of f32 values", path.display(), bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(path) = &args.save_config {
        config
            .to_file(path)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        info!("Configuration written to {}", path.display());
    }

    let mut tracker = BodyTracker::new(&config).context("Invalid configuration")?;

    let image_path = args.image.to_string_lossy();
    let frame = imgcodecs::imread(&image_path, imgcodecs::IMREAD_COLOR)?;
    if frame.empty() {
        bail!("Could not read image {image_path}");
    }
    let width = u32::try_from(frame.cols())?;
    let height = u32::try_from(frame.rows())?;

    let scores = read_f32_file(&args.scores)?;
    let boxes = read_f32_file(&args.boxes)?;

    let Some(region) = tracker
        .locate(&scores, &boxes, width, height)
        .context("Failed to decode detector output")?
    else {
        warn!("No body found in {image_path}");
        return Ok(());
    };

    info!(
        "Region center ({:.1}, {:.1}), size {:.1}px, rotation {:.1} deg",
        region.center_x,
        region.center_y,
        region.size,
        region.rotation.to_degrees()
    );

    let crop = match tracker.crop(&frame, &region) {
        Ok(crop) => crop,
        Err(e) if e.is_frame_skip() => {
            warn!("Skipping degenerate region: {e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let output = args.output.to_string_lossy();
    if !imgcodecs::imwrite(&output, &crop.image, &Vector::new())? {
        bail!("Could not write crop to {output}");
    }
    info!("Wrote {}x{} crop to {output}", crop.width(), crop.height());

    if let Some(path) = &args.landmarks {
        let raw = read_f32_file(path)?;
        let landmarks = Landmarks::from_raw(&raw)?.project(&crop);
        for (index, landmark) in landmarks.iter().take(33) {
            println!(
                "{:<18} {:>8.1} {:>8.1} {:>8.1}  vis {:.2}",
                index.name(),
                landmark.x,
                landmark.y,
                landmark.z,
                landmark.visibility
            );
        }
    }

    Ok(())
}
