//! Constants used throughout the pipeline

use std::f32::consts::FRAC_PI_2;

/// Side of the square detector input image in pixels
pub const DETECTOR_INPUT_SIZE: u32 = 224;

/// Output strides of the reference body detector, in tensor order
pub const DETECTOR_STRIDES: [u32; 2] = [8, 16];

/// Anchor widths for stride 8
pub const STRIDE_8_ANCHOR_WIDTHS: [f32; 2] = [0.203_125, 0.406_25];

/// Anchor heights for stride 8
pub const STRIDE_8_ANCHOR_HEIGHTS: [f32; 2] = [0.265_625, 0.531_25];

/// Anchor widths for stride 16
pub const STRIDE_16_ANCHOR_WIDTHS: [f32; 6] = [0.5, 0.656_25, 0.843_75, 1.062_5, 1.343_75, 1.718_75];

/// Anchor heights for stride 16
pub const STRIDE_16_ANCHOR_HEIGHTS: [f32; 6] = [0.734_375, 0.968_75, 1.343_75, 1.75, 2.343_75, 3.468_75];

/// Total anchors of the reference configuration: 28² × 2 + 14² × 6
pub const NUM_ANCHORS: usize = 2254;

/// Keypoints predicted per anchor by the reference detector
pub const DETECTOR_KEYPOINTS: usize = 4;

/// Box offsets (cx, cy, w, h) preceding the keypoint offsets of each anchor row
pub const BOX_OFFSET_VALUES: usize = 4;

/// Number of landmarks produced by the landmark model
pub const NUM_LANDMARKS: usize = 39;

/// Values per landmark in the raw landmark output (x, y, z, visibility, presence)
pub const LANDMARK_VALUES: usize = 5;

/// Smoothed coordinate axes per landmark
pub const LANDMARK_AXES: usize = 3;

/// Rotation bias added when no explicit rotation is given.
///
/// Calibrated against the detector's training convention; with it an upright
/// body produces an upright crop.
pub const ROTATION_BIAS: f32 = FRAC_PI_2;

/// Minimum doubled triangle area (px²) of the warp source corners
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Landmark model input side in pixels
pub const DEFAULT_CROP_SIZE: u32 = 256;

/// Default detection score threshold
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// Default padding applied around the detection square
pub const DEFAULT_REGION_SCALE: f32 = 1.25;

/// Default One-Euro parameters
pub const DEFAULT_MIN_CUTOFF: f64 = 0.05;
pub const DEFAULT_BETA: f64 = 80.0;
pub const DEFAULT_DERIVATE_CUTOFF: f64 = 1.0;
pub const DEFAULT_OBJECT_SCALE: f64 = 1.0;
