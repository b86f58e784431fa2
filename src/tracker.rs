//! Per-body pipeline driver.
//!
//! Runs decode → normalize for each frame, extracts the landmark-model crop
//! and smooths the landmarks that come back. Smoothing history is dropped when
//! the body is lost so a re-acquired body never inherits stale state.

use crate::anchors::AnchorTable;
use crate::body_detection::DetectionDecoder;
use crate::config::Config;
use crate::landmarks::Landmarks;
use crate::region::{Region, RegionNormalizer};
use crate::smoother::LandmarkSmoother;
use crate::warp::{Crop, RegionWarper};
use crate::Result;
use log::{debug, info};
use opencv::core::Mat;

/// Tracks one body across frames
#[derive(Debug)]
pub struct BodyTracker {
    anchors: &'static AnchorTable,
    decoder: DetectionDecoder,
    normalizer: RegionNormalizer,
    warper: RegionWarper,
    smoother: LandmarkSmoother,
    object_scale: f64,
    tracking: bool,
}

impl BodyTracker {
    /// Build a tracker for the reference detector
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration does not validate
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let decoder = DetectionDecoder::new(config.detection.score_threshold)
            .with_keypoint_count(config.detection.keypoints_per_anchor)?;
        let normalizer = RegionNormalizer::new(config.region.scale, config.region.rotation_policy)?;
        let warper = RegionWarper::new(config.warp.crop_width, config.warp.crop_height)?;
        let smoother = LandmarkSmoother::new(config.smoothing.params()?);

        debug!(
            "Body tracker: threshold {}, scale {}, {:?} rotation, {}x{} crop",
            config.detection.score_threshold,
            config.region.scale,
            config.region.rotation_policy,
            config.warp.crop_width,
            config.warp.crop_height
        );

        Ok(Self {
            anchors: AnchorTable::blazepose(),
            decoder,
            normalizer,
            warper,
            smoother,
            object_scale: config.smoothing.object_scale,
            tracking: false,
        })
    }

    /// Locate the body in one frame of detector output
    ///
    /// Returns `Ok(None)` when no anchor clears the threshold, which ends any
    /// current track.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for tensors that do not match the anchor
    /// table or an empty frame size.
    pub fn locate(&mut self, scores: &[f32], boxes: &[f32], frame_width: u32, frame_height: u32) -> Result<Option<Region>> {
        let Some(candidate) = self.decoder.decode(scores, boxes, self.anchors)? else {
            if self.tracking {
                info!("Tracking lost");
                self.reset();
            }
            return Ok(None);
        };

        let region = self.normalizer.normalize(&candidate, frame_width, frame_height)?;

        if !self.tracking {
            info!(
                "Body acquired at ({:.0}, {:.0}), size {:.0}px, score {:.2}",
                region.center_x, region.center_y, region.size, candidate.score
            );
            self.tracking = true;
        }

        Ok(Some(region))
    }

    /// Extract the landmark-model crop of `region`
    ///
    /// # Errors
    ///
    /// Returns `Error::Geometry` for a degenerate region; the frame should be
    /// skipped.
    pub fn crop(&self, frame: &Mat, region: &Region) -> Result<Crop> {
        self.warper.warp(frame, region)
    }

    /// Smooth landmarks observed at `timestamp` seconds
    pub fn smooth(&mut self, landmarks: &Landmarks, timestamp: f64) -> Landmarks {
        self.smoother.apply(landmarks, timestamp, self.object_scale)
    }

    /// Smooth with a per-frame `object_scale`, e.g. derived from `region.size`
    ///
    /// A non-finite or non-positive scale falls back to the configured one.
    pub fn smooth_scaled(&mut self, landmarks: &Landmarks, timestamp: f64, object_scale: f64) -> Landmarks {
        let object_scale = if object_scale.is_finite() && object_scale > 0.0 {
            object_scale
        } else {
            debug!("Ignoring object scale {object_scale}, using {}", self.object_scale);
            self.object_scale
        };
        self.smoother.apply(landmarks, timestamp, object_scale)
    }

    /// Drop the track and all smoothing history
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.tracking = false;
    }

    /// Whether a body was found on the last located frame
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    #[must_use]
    pub fn warper(&self) -> &RegionWarper {
        &self.warper
    }
}
