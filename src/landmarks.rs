//! Body landmark indices and per-frame landmark sets.

use crate::constants::{LANDMARK_VALUES, NUM_LANDMARKS};
use crate::warp::Crop;
use crate::{Error, Result};
use opencv::core::Point2f;

/// Index of each landmark produced by the landmark model
///
/// The first 33 entries are named body joints; the last 6 are auxiliary points
/// the model emits for region alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
    Aux0 = 33,
    Aux1 = 34,
    Aux2 = 35,
    Aux3 = 36,
    Aux4 = 37,
    Aux5 = 38,
}

impl LandmarkIndex {
    pub const COUNT: usize = NUM_LANDMARKS;

    /// All indices in order
    pub const ALL: [Self; NUM_LANDMARKS] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
        Self::Aux0,
        Self::Aux1,
        Self::Aux2,
        Self::Aux3,
        Self::Aux4,
        Self::Aux5,
    ];

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Snake-case joint name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
            Self::Aux0 => "aux_0",
            Self::Aux1 => "aux_1",
            Self::Aux2 => "aux_2",
            Self::Aux3 => "aux_3",
            Self::Aux4 => "aux_4",
            Self::Aux5 => "aux_5",
        }
    }
}

/// Landmark pairs joined when drawing the body skeleton
pub const SKELETON_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 31] = {
    use LandmarkIndex::*;
    [
        (RightAnkle, RightHeel),
        (RightHeel, RightFootIndex),
        (LeftAnkle, LeftHeel),
        (LeftHeel, LeftFootIndex),
        (RightAnkle, RightKnee),
        (RightKnee, RightHip),
        (RightHip, LeftHip),
        (LeftHip, LeftKnee),
        (LeftKnee, LeftAnkle),
        (RightHip, RightShoulder),
        (RightShoulder, LeftShoulder),
        (LeftShoulder, LeftHip),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (RightWrist, RightIndex),
        (RightWrist, RightPinky),
        (RightWrist, RightThumb),
        (RightPinky, RightIndex),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (LeftWrist, LeftIndex),
        (LeftWrist, LeftPinky),
        (LeftWrist, LeftThumb),
        (LeftPinky, LeftIndex),
        (RightEyeOuter, RightEye),
        (RightEye, RightEyeInner),
        (RightEyeInner, Nose),
        (Nose, LeftEyeInner),
        (LeftEyeInner, LeftEye),
        (LeftEye, LeftEyeOuter),
        (MouthLeft, MouthRight),
    ]
};

/// Single landmark with its confidence scores
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Likelihood of the joint being visible (not occluded)
    pub visibility: f32,
    /// Likelihood of the joint being inside the frame
    pub presence: f32,
}

impl Landmark {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32, visibility: f32, presence: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
            presence,
        }
    }

    /// Coordinate by axis (0 = x, 1 = y, 2 = z)
    #[must_use]
    pub fn axis(&self, axis: usize) -> Option<f32> {
        match axis {
            0 => Some(self.x),
            1 => Some(self.y),
            2 => Some(self.z),
            _ => None,
        }
    }
}

/// Full landmark set of one body in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    pub points: [Landmark; NUM_LANDMARKS],
}

impl Landmarks {
    #[must_use]
    pub fn new(points: [Landmark; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Build from the landmark model's flat output of `(x, y, z, visibility, presence)` rows
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `raw` is not exactly 39 × 5 values
    pub fn from_raw(raw: &[f32]) -> Result<Self> {
        if raw.len() != NUM_LANDMARKS * LANDMARK_VALUES {
            return Err(Error::InvalidInput(format!(
                "Landmark output has {} values, expected {}",
                raw.len(),
                NUM_LANDMARKS * LANDMARK_VALUES
            )));
        }

        let mut points = [Landmark::default(); NUM_LANDMARKS];
        for (point, row) in points.iter_mut().zip(raw.chunks_exact(LANDMARK_VALUES)) {
            *point = Landmark::new(row[0], row[1], row[2], row[3], row[4]);
        }
        Ok(Self { points })
    }

    #[must_use]
    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.points[index as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkIndex, &Landmark)> {
        LandmarkIndex::ALL.iter().copied().zip(self.points.iter())
    }

    /// Project crop-normalized landmarks onto the frame
    ///
    /// `x`/`y` in [0, 1] of the crop become frame pixels through the crop's
    /// inverse transform; `z` is scaled by the same factor as the crop width.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn project(&self, crop: &Crop) -> Self {
        let width = crop.width() as f32;
        let height = crop.height() as f32;
        let z_scale = (crop.frame_scale() * f64::from(width)) as f32;

        let mut points = self.points;
        for point in &mut points {
            let frame = crop.to_frame(Point2f::new(point.x * width, point.y * height));
            point.x = frame.x;
            point.y = frame.y;
            point.z *= z_scale;
        }
        Self { points }
    }
}

impl Default for Landmarks {
    fn default() -> Self {
        Self {
            points: [Landmark::default(); NUM_LANDMARKS],
        }
    }
}
