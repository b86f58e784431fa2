//! Configuration management for the body pipeline

use crate::constants::{
    DEFAULT_BETA, DEFAULT_CROP_SIZE, DEFAULT_DERIVATE_CUTOFF, DEFAULT_MIN_CUTOFF, DEFAULT_OBJECT_SCALE,
    DEFAULT_REGION_SCALE, DEFAULT_SCORE_THRESHOLD, DETECTOR_KEYPOINTS,
};
use crate::filters::OneEuroParams;
use crate::region::RotationPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detector output decoding
    pub detection: DetectionConfig,

    /// Region normalization
    pub region: RegionConfig,

    /// Crop extraction
    pub warp: WarpConfig,

    /// Landmark smoothing
    pub smoothing: SmoothingConfig,
}

/// Detector decoding parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Raw score an anchor must strictly exceed
    pub score_threshold: f32,

    /// Keypoints predicted per anchor
    pub keypoints_per_anchor: usize,
}

/// Region normalization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Enlargement applied to the detected body size
    pub scale: f32,

    /// Source of the region rotation
    pub rotation_policy: RotationPolicy,
}

/// Crop size handed to the landmark model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    pub crop_width: u32,
    pub crop_height: u32,
}

/// One-Euro smoothing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Cutoff frequency at rest (Hz)
    pub min_cutoff: f64,

    /// Speed coefficient
    pub beta: f64,

    /// Derivative cutoff frequency (Hz)
    pub derivate_cutoff: f64,

    /// Scale applied to the speed estimate
    pub object_scale: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            keypoints_per_anchor: DETECTOR_KEYPOINTS,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_REGION_SCALE,
            rotation_policy: RotationPolicy::default(),
        }
    }
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            crop_width: DEFAULT_CROP_SIZE,
            crop_height: DEFAULT_CROP_SIZE,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_cutoff: DEFAULT_MIN_CUTOFF,
            beta: DEFAULT_BETA,
            derivate_cutoff: DEFAULT_DERIVATE_CUTOFF,
            object_scale: DEFAULT_OBJECT_SCALE,
        }
    }
}

impl SmoothingConfig {
    /// Filter tuning for the landmark smoother
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for out-of-range parameters
    pub fn params(&self) -> Result<OneEuroParams> {
        OneEuroParams::new(self.min_cutoff, self.beta, self.derivate_cutoff)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::ConfigError`
    /// if it does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the text does not parse
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if serialization fails and `Error::Io` if
    /// the file cannot be written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first invalid parameter
    pub fn validate(&self) -> Result<()> {
        // Raw detector scores are not squashed, so only finiteness is required
        if !self.detection.score_threshold.is_finite() {
            return Err(Error::ConfigError("Score threshold must be finite".to_string()));
        }
        if self.detection.keypoints_per_anchor < 2 {
            return Err(Error::ConfigError(
                "Detector must predict at least 2 keypoints per anchor".to_string(),
            ));
        }

        if !(self.region.scale.is_finite() && self.region.scale > 0.0) {
            return Err(Error::ConfigError(format!(
                "Region scale must be positive, got {}",
                self.region.scale
            )));
        }

        if self.warp.crop_width == 0 || self.warp.crop_height == 0 {
            return Err(Error::ConfigError("Crop dimensions must be greater than 0".to_string()));
        }
        if i32::try_from(self.warp.crop_width).is_err() || i32::try_from(self.warp.crop_height).is_err() {
            return Err(Error::ConfigError("Crop dimensions are too large".to_string()));
        }
        if self.warp.crop_width != self.warp.crop_height {
            return Err(Error::ConfigError(format!(
                "Crop must be square, got {}x{}",
                self.warp.crop_width, self.warp.crop_height
            )));
        }

        self.smoothing.params()?;
        if !(self.smoothing.object_scale.is_finite() && self.smoothing.object_scale > 0.0) {
            return Err(Error::ConfigError(format!(
                "Object scale must be positive, got {}",
                self.smoothing.object_scale
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r"# Body pipeline configuration

# Detector output decoding
detection:
  score_threshold: 0.5
  keypoints_per_anchor: 4

# Region normalization
region:
  scale: 1.25
  # detector_box | guide_keypoints
  rotation_policy: detector_box

# Landmark model crop
warp:
  crop_width: 256
  crop_height: 256

# One-Euro landmark smoothing
smoothing:
  min_cutoff: 0.05
  beta: 80.0
  derivate_cutoff: 1.0
  object_scale: 1.0
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warp.crop_width, 256);
        assert_eq!(config.region.rotation_policy, RotationPolicy::DetectorBox);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed = Config::from_yaml("region:\n  rotation_policy: guide_keypoints\n").unwrap();
        assert_eq!(parsed.region.rotation_policy, RotationPolicy::GuideKeypoints);
        assert_eq!(parsed.region.scale, DEFAULT_REGION_SCALE);
        assert_eq!(parsed.smoothing, SmoothingConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.region.scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.smoothing.min_cutoff = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.warp.crop_height = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detection.keypoints_per_anchor = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_square_crop_rejected() {
        let mut config = Config::default();
        config.warp.crop_width = 256;
        config.warp.crop_height = 128;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let parsed = Config::from_yaml("warp:\n  crop_width: 192\n  crop_height: 256\n").unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn test_unparseable_yaml() {
        assert!(matches!(
            Config::from_yaml("smoothing: [1, 2"),
            Err(Error::ConfigError(_))
        ));
    }
}
