//! Temporal smoothing of per-frame landmarks with a bank of One-Euro filters.

use crate::constants::{LANDMARK_AXES, NUM_LANDMARKS};
use crate::filters::{OneEuroParams, OneEuroState, Update};
use crate::landmarks::{Landmark, Landmarks};

const CHANNELS: usize = NUM_LANDMARKS * LANDMARK_AXES;

/// One-Euro filter bank over the x, y and z of every landmark
///
/// Channel `landmark * 3 + axis` holds the state of one coordinate. All
/// channels share one tuning. Visibility and presence are not filtered.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    params: OneEuroParams,
    channels: [OneEuroState; CHANNELS],
}

impl LandmarkSmoother {
    #[must_use]
    pub fn new(params: OneEuroParams) -> Self {
        Self {
            params,
            channels: [OneEuroState::default(); CHANNELS],
        }
    }

    #[must_use]
    pub fn params(&self) -> &OneEuroParams {
        &self.params
    }

    /// Smooth one frame of landmarks observed at `timestamp` seconds
    ///
    /// A timestamp that does not advance restarts every channel, so the
    /// output equals the input for that frame.
    #[allow(clippy::cast_possible_truncation)] // Filtered coordinates stay in f32 range
    pub fn apply(&mut self, landmarks: &Landmarks, timestamp: f64, object_scale: f64) -> Landmarks {
        let mut restarted = false;
        let mut points = [Landmark::default(); NUM_LANDMARKS];

        for (i, (out, raw)) in points.iter_mut().zip(landmarks.points.iter()).enumerate() {
            let mut filtered = [raw.x, raw.y, raw.z];
            for (axis, value) in filtered.iter_mut().enumerate() {
                let (v, update) = self.channels[i * LANDMARK_AXES + axis].update(
                    &self.params,
                    f64::from(*value),
                    timestamp,
                    object_scale,
                );
                restarted |= update == Update::Restart;
                *value = v as f32;
            }
            *out = Landmark {
                x: filtered[0],
                y: filtered[1],
                z: filtered[2],
                ..*raw
            };
        }

        if restarted {
            log::debug!("Landmark smoother restarted at t={timestamp:.3}s");
        }

        Landmarks::new(points)
    }

    /// Forget all channel history
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    /// Whether any channel holds history
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.channels.iter().any(OneEuroState::is_primed)
    }
}
