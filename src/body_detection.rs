//! Decoding of raw body detector tensors into a single body proposal.
//!
//! The decoder keeps only the highest scoring anchor above the threshold. It
//! performs no non-maximum suppression and is therefore not multi-person safe:
//! with two people in view the proposal belongs to whichever scores higher on
//! this frame.

use crate::anchors::{Anchor, AnchorTable};
use crate::constants::{BOX_OFFSET_VALUES, DETECTOR_KEYPOINTS};
use crate::{Error, Result};
use ndarray::{ArrayView1, ArrayView2};
use opencv::core::Point2f;

/// Best body proposal of a frame, normalized to [0, 1] detector coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCandidate {
    /// Raw detector score of the winning anchor
    pub score: f32,
    pub box_center_x: f32,
    pub box_center_y: f32,
    pub box_width: f32,
    pub box_height: f32,
    /// Approximate hip center
    pub guide_keypoint_a: Point2f,
    /// Point above the shoulders giving body scale and orientation
    pub guide_keypoint_b: Point2f,
    /// Index of the winning anchor in the anchor table
    pub anchor_index: usize,
}

/// Single-best-candidate decoder for anchor based detector output
#[derive(Debug, Clone)]
pub struct DetectionDecoder {
    score_threshold: f32,
    keypoint_count: usize,
}

impl DetectionDecoder {
    /// Create a decoder for the reference detector layout (4 keypoints per anchor)
    #[must_use]
    pub fn new(score_threshold: f32) -> Self {
        Self {
            score_threshold,
            keypoint_count: DETECTOR_KEYPOINTS,
        }
    }

    /// Override the number of keypoints predicted per anchor
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if fewer than the two guide keypoints are present
    pub fn with_keypoint_count(mut self, keypoint_count: usize) -> Result<Self> {
        if keypoint_count < 2 {
            return Err(Error::ConfigError(format!(
                "Detector must predict at least 2 keypoints, got {keypoint_count}"
            )));
        }
        self.keypoint_count = keypoint_count;
        Ok(self)
    }

    /// Score threshold anchors must strictly exceed
    #[must_use]
    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// Values per anchor row of the box tensor
    #[must_use]
    pub fn box_row_len(&self) -> usize {
        BOX_OFFSET_VALUES + 2 * self.keypoint_count
    }

    /// Decode the best proposal of a frame
    ///
    /// Returns `Ok(None)` when no anchor clears the threshold.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the tensor lengths do not match the
    /// anchor table or the winning row decodes to non-finite values.
    pub fn decode(&self, scores: &[f32], boxes: &[f32], anchors: &AnchorTable) -> Result<Option<DetectionCandidate>> {
        let n_anchors = anchors.len();
        if scores.len() != n_anchors {
            return Err(Error::InvalidInput(format!(
                "Score tensor has {} values, expected {}",
                scores.len(),
                n_anchors
            )));
        }

        let row_len = self.box_row_len();
        let shape_error = || {
            Error::InvalidInput(format!(
                "Box tensor has {} values, expected {} ({} anchors x {})",
                boxes.len(),
                n_anchors * row_len,
                n_anchors,
                row_len
            ))
        };
        // A longer slice would still form a valid view
        if boxes.len() != n_anchors * row_len {
            return Err(shape_error());
        }
        let boxes = ArrayView2::from_shape((n_anchors, row_len), boxes).map_err(|_| shape_error())?;

        let Some((index, score)) = self.best_anchor(scores) else {
            return Ok(None);
        };

        let candidate = Self::decode_row(&anchors[index], boxes.row(index), anchors.input_size(), score, index);
        if !candidate.is_finite() {
            return Err(Error::InvalidInput(format!(
                "Anchor {index} decoded to non-finite values"
            )));
        }

        log::trace!(
            "Best anchor {} score {:.3} center ({:.3}, {:.3})",
            index,
            score,
            candidate.box_center_x,
            candidate.box_center_y
        );

        Ok(Some(candidate))
    }

    /// Highest scoring anchor strictly above the threshold; the first index wins ties
    fn best_anchor(&self, scores: &[f32]) -> Option<(usize, f32)> {
        scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, score)| score > self.score_threshold)
            .fold(None, |best, (i, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((i, score)),
            })
    }

    /// Decode one box row relative to its anchor
    #[allow(clippy::cast_precision_loss)] // Detector input sizes are small
    fn decode_row(
        anchor: &Anchor,
        row: ArrayView1<'_, f32>,
        input_size: u32,
        score: f32,
        anchor_index: usize,
    ) -> DetectionCandidate {
        let size = input_size as f32;
        let keypoint = |k: usize| {
            let base = BOX_OFFSET_VALUES + 2 * k;
            Point2f::new(
                row[base] / size + anchor.x_center,
                row[base + 1] / size + anchor.y_center,
            )
        };

        DetectionCandidate {
            score,
            box_center_x: row[0] / size + anchor.x_center,
            box_center_y: row[1] / size + anchor.y_center,
            box_width: row[2] / size * anchor.width,
            box_height: row[3] / size * anchor.height,
            guide_keypoint_a: keypoint(0),
            guide_keypoint_b: keypoint(1),
            anchor_index,
        }
    }
}

impl DetectionCandidate {
    fn is_finite(&self) -> bool {
        [
            self.box_center_x,
            self.box_center_y,
            self.box_width,
            self.box_height,
            self.guide_keypoint_a.x,
            self.guide_keypoint_a.y,
            self.guide_keypoint_b.x,
            self.guide_keypoint_b.y,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Decode raw reference detector output against `anchors`
///
/// # Errors
///
/// See [`DetectionDecoder::decode`].
pub fn decode_bboxes(
    score_threshold: f32,
    scores: &[f32],
    boxes: &[f32],
    anchors: &AnchorTable,
) -> Result<Option<DetectionCandidate>> {
    DetectionDecoder::new(score_threshold).decode(scores, boxes, anchors)
}
