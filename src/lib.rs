//! Body region pipeline for posture tracking.
//!
//! Turns raw body-detector output into an upright, body-centred crop for a
//! landmark model, and smooths the landmarks that model returns:
//! 1. Anchor decoding picks the single best body proposal
//! 2. The proposal becomes a square, rotated region in frame pixels
//! 3. The region is resampled into an axis-aligned crop (`OpenCV`)
//! 4. Landmarks predicted on the crop are smoothed over time (One-Euro)
//!
//! Neural network inference is not part of this crate; callers run the
//! detector and landmark models and hand over their flat output tensors.
//!
//! # Examples
//!
//! ```no_run
//! use posture_pipeline::{config::Config, landmarks::Landmarks, tracker::BodyTracker};
//! use opencv::{imgcodecs, prelude::*};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = BodyTracker::new(&Config::default())?;
//! let frame = imgcodecs::imread("frame.jpg", imgcodecs::IMREAD_COLOR)?;
//! # let (scores, boxes) = (vec![0.0f32; 2254], vec![0.0f32; 2254 * 12]);
//! # let raw_landmarks = vec![0.0f32; 39 * 5];
//!
//! // `scores` and `boxes` come from the body detector
//! let (width, height) = (u32::try_from(frame.cols())?, u32::try_from(frame.rows())?);
//! if let Some(region) = tracker.locate(&scores, &boxes, width, height)? {
//!     let crop = tracker.crop(&frame, &region)?;
//!
//!     // `raw_landmarks` come from the landmark model run on `crop.image`
//!     let landmarks = Landmarks::from_raw(&raw_landmarks)?.project(&crop);
//!     let smoothed = tracker.smooth(&landmarks, 0.033);
//!     println!("nose at ({:.1}, {:.1})", smoothed.points[0].x, smoothed.points[0].y);
//! }
//! # Ok(())
//! # }
//! ```

/// Anchor grid of the body detector
pub mod anchors;

/// Detector output decoding into a single body proposal
pub mod body_detection;

/// Square, rotated body regions in frame pixels
pub mod region;

/// Affine extraction of the landmark-model crop
pub mod warp;

/// Landmark indices and per-frame landmark sets
pub mod landmarks;

/// Signal filters for smoothing landmark trajectories
pub mod filters;

/// One-Euro filter bank over all landmark coordinates
pub mod smoother;

/// Per-body pipeline driver
pub mod tracker;

/// Error types and result handling
pub mod error;

/// Constants used throughout the pipeline
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
