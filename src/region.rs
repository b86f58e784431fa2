//! Oriented square regions of interest around a detected body.
//!
//! A [`DetectionCandidate`] is turned into a [`Region`] in two stages:
//! square-ify in normalized detector coordinates, then scale to frame pixels
//! with padding, rotation bias and corner construction.

use crate::body_detection::DetectionCandidate;
use crate::constants::ROTATION_BIAS;
use crate::{Error, Result};
use opencv::core::Point2f;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// How the region rotation is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Axis-aligned detector box; only the fixed rotation bias is applied
    #[default]
    DetectorBox,
    /// Angle of the hip → scale guide keypoint vector, plus the rotation bias
    GuideKeypoints,
}

/// Square region in normalized detector coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareRegion {
    pub center_x: f32,
    pub center_y: f32,
    pub size: f32,
    pub rotation: f32,
}

/// Oriented square in frame pixel coordinates
///
/// Corners are ordered p0..p3 as produced by [`to_pixels`]. For the default
/// bias (rotation π/2) p1 is the bottom-left, p2 the bottom-right and p3 the
/// top-right corner of the upright square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center_x: f32,
    pub center_y: f32,
    pub size: f32,
    pub rotation: f32,
    pub corners: [Point2f; 4],
}

impl Region {
    /// Whether every coordinate of the region is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.center_x, self.center_y, self.size, self.rotation]
            .iter()
            .all(|v| v.is_finite())
            && self.corners.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

/// Wrap an angle to (-π, π]
#[must_use]
pub fn normalize_radians(angle: f32) -> f32 {
    let wrapped = angle - TAU * ((angle + PI) / TAU).floor();
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Rotation implied by the two guide keypoints; an upright body gives 0
///
/// Returns `None` for a zero-length or non-finite guide vector.
#[must_use]
pub fn rotation_from_guide_keypoints(hip: Point2f, scale: Point2f) -> Option<f32> {
    let dx = scale.x - hip.x;
    let dy = scale.y - hip.y;
    if !(dx.is_finite() && dy.is_finite()) || dx.hypot(dy) <= f32::EPSILON {
        return None;
    }
    Some(normalize_radians(FRAC_PI_2 - (-dy).atan2(dx)))
}

/// Square-ify stage: square at the candidate center with side max(width, height)
#[must_use]
pub fn square_region(candidate: &DetectionCandidate, policy: RotationPolicy) -> SquareRegion {
    let rotation = match policy {
        RotationPolicy::DetectorBox => 0.0,
        RotationPolicy::GuideKeypoints => {
            rotation_from_guide_keypoints(candidate.guide_keypoint_a, candidate.guide_keypoint_b).unwrap_or_else(|| {
                log::debug!("Degenerate guide keypoints, using zero rotation");
                0.0
            })
        }
    };

    SquareRegion {
        center_x: candidate.box_center_x,
        center_y: candidate.box_center_y,
        size: candidate.box_width.max(candidate.box_height),
        rotation,
    }
}

/// Scale-to-pixels stage
///
/// The side becomes `size * scale * max(frame_width, frame_height)`. Without
/// an explicit rotation the square's own rotation plus [`ROTATION_BIAS`] is
/// used; an explicit rotation replaces both.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for a zero frame dimension, a scale that is
/// not strictly positive, or a negative square size. A zero size passes and
/// is left for the warp to reject as degenerate.
#[allow(clippy::cast_precision_loss)] // Frame dimensions fit f32 exactly
pub fn to_pixels(
    square: &SquareRegion,
    frame_width: u32,
    frame_height: u32,
    scale: f32,
    rotation: Option<f32>,
) -> Result<Region> {
    if frame_width == 0 || frame_height == 0 {
        return Err(Error::InvalidInput(format!(
            "Frame size must be non-zero, got {frame_width}x{frame_height}"
        )));
    }
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::InvalidInput(format!("Region scale must be positive, got {scale}")));
    }
    // Negative sides would swap opposite corners and flip the crop
    if !(square.size >= 0.0) {
        return Err(Error::InvalidInput(format!(
            "Region size must not be negative, got {}",
            square.size
        )));
    }

    let rotation = rotation.unwrap_or(square.rotation + ROTATION_BIAS);
    let width = frame_width as f32;
    let height = frame_height as f32;

    let center_x = square.center_x * width;
    let center_y = square.center_y * height;
    let size = square.size * scale * width.max(height);

    Ok(Region {
        center_x,
        center_y,
        size,
        rotation,
        corners: rotated_square_corners(center_x, center_y, size, rotation),
    })
}

/// Corners of a square of side `size` rotated by `rotation` around its center
#[must_use]
pub fn rotated_square_corners(center_x: f32, center_y: f32, size: f32, rotation: f32) -> [Point2f; 4] {
    let half = size / 2.0;
    let (sin, cos) = rotation.sin_cos();
    let (hc, hs) = (half * cos, half * sin);

    [
        Point2f::new(center_x + hc - hs, center_y - hs - hc),
        Point2f::new(center_x - hc - hs, center_y + hs - hc),
        Point2f::new(center_x - hc + hs, center_y + hs + hc),
        Point2f::new(center_x + hc + hs, center_y - hs + hc),
    ]
}

/// Converts detection candidates into pixel regions under one rotation policy
#[derive(Debug, Clone)]
pub struct RegionNormalizer {
    scale: f32,
    policy: RotationPolicy,
}

impl RegionNormalizer {
    /// Create a normalizer with a padding scale and rotation policy
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the scale is not strictly positive
    pub fn new(scale: f32, policy: RotationPolicy) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::ConfigError(format!("Region scale must be positive, got {scale}")));
        }
        Ok(Self { scale, policy })
    }

    /// Padding scale applied around the detection square
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Configured rotation policy
    #[must_use]
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Region of `candidate` in a frame of the given size
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an empty frame.
    pub fn normalize(&self, candidate: &DetectionCandidate, frame_width: u32, frame_height: u32) -> Result<Region> {
        let square = square_region(candidate, self.policy);
        to_pixels(&square, frame_width, frame_height, self.scale, None)
    }
}
