//! Anchor grid matching the body detector's output layout.
//!
//! The detector predicts one score and one box row per anchor. Anchors are laid
//! out stride by stride (in configuration order); within a stride they are
//! row-major over the grid rows and columns, then by anchor index inside the
//! cell. Raw tensors must be flattened in exactly this order.

use crate::constants::{
    DETECTOR_INPUT_SIZE, DETECTOR_STRIDES, STRIDE_16_ANCHOR_HEIGHTS, STRIDE_16_ANCHOR_WIDTHS,
    STRIDE_8_ANCHOR_HEIGHTS, STRIDE_8_ANCHOR_WIDTHS,
};
use crate::{Error, Result};
use std::ops::Index;
use std::sync::OnceLock;

/// A reference box on the detector grid, normalized to the input image size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
}

/// Grid layout of one detector output stride
#[derive(Debug, Clone, PartialEq)]
pub struct StrideLayer {
    /// Stride in input pixels
    pub stride: u32,
    /// `(width, height)` of each anchor in a cell; its length is the anchors-per-cell count
    pub anchor_sizes: Vec<(f32, f32)>,
}

/// Parameters the anchor table is generated from
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorConfig {
    /// Side of the square detector input in pixels
    pub input_size: u32,
    /// Output layers in tensor order
    pub layers: Vec<StrideLayer>,
}

impl AnchorConfig {
    /// Configuration of the reference 224×224 body detector
    #[must_use]
    pub fn blazepose() -> Self {
        let sizes = |widths: &[f32], heights: &[f32]| widths.iter().copied().zip(heights.iter().copied()).collect();
        Self {
            input_size: DETECTOR_INPUT_SIZE,
            layers: vec![
                StrideLayer {
                    stride: DETECTOR_STRIDES[0],
                    anchor_sizes: sizes(&STRIDE_8_ANCHOR_WIDTHS, &STRIDE_8_ANCHOR_HEIGHTS),
                },
                StrideLayer {
                    stride: DETECTOR_STRIDES[1],
                    anchor_sizes: sizes(&STRIDE_16_ANCHOR_WIDTHS, &STRIDE_16_ANCHOR_HEIGHTS),
                },
            ],
        }
    }
}

/// Ordered, immutable list of anchors
#[derive(Debug, Clone)]
pub struct AnchorTable {
    anchors: Vec<Anchor>,
    input_size: u32,
}

impl AnchorTable {
    /// Generate the anchor table for a detector configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if a stride is zero, does not divide the
    /// input size, or has an empty anchor-size table.
    #[allow(clippy::cast_precision_loss)] // Grid sizes are far below f32 precision limits
    pub fn generate(config: &AnchorConfig) -> Result<Self> {
        if config.layers.is_empty() {
            return Err(Error::ConfigError("Anchor configuration has no layers".to_string()));
        }

        let mut anchors = Vec::new();
        for layer in &config.layers {
            if layer.stride == 0 || config.input_size % layer.stride != 0 {
                return Err(Error::ConfigError(format!(
                    "Stride {} does not evenly divide input size {}",
                    layer.stride, config.input_size
                )));
            }
            if layer.anchor_sizes.is_empty() {
                return Err(Error::ConfigError(format!(
                    "Stride {} has no anchor sizes",
                    layer.stride
                )));
            }

            let grid = config.input_size / layer.stride;
            let grid_f = grid as f32;
            for row in 0..grid {
                for col in 0..grid {
                    let x_center = (col as f32 + 0.5) / grid_f;
                    let y_center = (row as f32 + 0.5) / grid_f;
                    anchors.extend(layer.anchor_sizes.iter().map(|&(width, height)| Anchor {
                        x_center,
                        y_center,
                        width,
                        height,
                    }));
                }
            }
        }

        log::debug!(
            "Generated {} anchors for input size {}",
            anchors.len(),
            config.input_size
        );

        Ok(Self {
            anchors,
            input_size: config.input_size,
        })
    }

    /// Shared table of the reference detector, built on first use
    ///
    /// # Panics
    ///
    /// Never in practice: the reference configuration is statically valid.
    pub fn blazepose() -> &'static Self {
        static ANCHORS: OnceLock<AnchorTable> = OnceLock::new();
        ANCHORS.get_or_init(|| {
            Self::generate(&AnchorConfig::blazepose()).expect("reference anchor configuration is valid")
        })
    }

    /// Number of anchors
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether the table holds no anchors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Detector input side the table was generated for
    #[must_use]
    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Anchor at `index`, if any
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Anchor> {
        self.anchors.get(index)
    }

    /// Iterate anchors in tensor order
    pub fn iter(&self) -> std::slice::Iter<'_, Anchor> {
        self.anchors.iter()
    }
}

impl Index<usize> for AnchorTable {
    type Output = Anchor;

    fn index(&self, index: usize) -> &Anchor {
        &self.anchors[index]
    }
}
