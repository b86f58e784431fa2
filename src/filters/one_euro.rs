use crate::{Error, Result};
use std::f64::consts::PI;

/// Tuning of a One-Euro filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneEuroParams {
    /// Cutoff frequency at rest (Hz)
    pub min_cutoff: f64,
    /// Speed coefficient; higher values trade jitter for less lag
    pub beta: f64,
    /// Cutoff frequency of the derivative low-pass (Hz)
    pub derivate_cutoff: f64,
}

impl OneEuroParams {
    /// # Errors
    ///
    /// Returns `Error::ConfigError` unless both cutoffs are finite and positive
    /// and `beta` is finite and non-negative.
    pub fn new(min_cutoff: f64, beta: f64, derivate_cutoff: f64) -> Result<Self> {
        if !(min_cutoff.is_finite() && min_cutoff > 0.0) {
            return Err(Error::ConfigError(format!(
                "min_cutoff must be positive, got {min_cutoff}"
            )));
        }
        if !(beta.is_finite() && beta >= 0.0) {
            return Err(Error::ConfigError(format!("beta must be non-negative, got {beta}")));
        }
        if !(derivate_cutoff.is_finite() && derivate_cutoff > 0.0) {
            return Err(Error::ConfigError(format!(
                "derivate_cutoff must be positive, got {derivate_cutoff}"
            )));
        }
        Ok(Self {
            min_cutoff,
            beta,
            derivate_cutoff,
        })
    }
}

/// alpha = 1 / (1 + f / (2π·cutoff)) for sampling rate `f`
#[must_use]
pub fn smoothing_factor(rate: f64, cutoff: f64) -> f64 {
    1.0 / (1.0 + rate / (2.0 * PI * cutoff))
}

/// How a sample was consumed by [`OneEuroState::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// First sample after construction or reset; returned unfiltered
    WarmUp,
    /// Timestamp went backwards, repeated or was not finite; state restarted
    Restart,
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    value: f64,
    derivative: f64,
    timestamp: f64,
}

/// State of one filtered channel, without its parameters
///
/// Many channels sharing one tuning keep only this and pass the parameters in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OneEuroState {
    previous: Option<Sample>,
}

impl OneEuroState {
    /// Feed `value` observed at `timestamp` seconds
    pub fn update(&mut self, params: &OneEuroParams, value: f64, timestamp: f64, object_scale: f64) -> (f64, Update) {
        if !timestamp.is_finite() || !value.is_finite() {
            let outcome = if self.previous.is_some() {
                Update::Restart
            } else {
                Update::WarmUp
            };
            self.previous = None;
            return (value, outcome);
        }

        let Some(prev) = self.previous else {
            self.warm_up(value, timestamp);
            return (value, Update::WarmUp);
        };

        if timestamp <= prev.timestamp {
            self.warm_up(value, timestamp);
            return (value, Update::Restart);
        }

        let rate = 1.0 / (timestamp - prev.timestamp);

        let raw_derivative = (value - prev.value) * rate;
        let alpha_d = smoothing_factor(rate, params.derivate_cutoff);
        let derivative = (1.0 - alpha_d).mul_add(prev.derivative, alpha_d * raw_derivative);

        let cutoff = params.beta.mul_add((derivative * object_scale).abs(), params.min_cutoff);
        let alpha = smoothing_factor(rate, cutoff);
        let filtered = (1.0 - alpha).mul_add(prev.value, alpha * value);

        self.previous = Some(Sample {
            value: filtered,
            derivative,
            timestamp,
        });
        (filtered, Update::Filtered)
    }

    fn warm_up(&mut self, value: f64, timestamp: f64) {
        self.previous = Some(Sample {
            value,
            derivative: 0.0,
            timestamp,
        });
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Whether the channel holds a previous sample
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }
}

/// Single-channel One-Euro filter over timestamped samples
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: OneEuroParams,
    state: OneEuroState,
}

impl OneEuroFilter {
    #[must_use]
    pub fn new(params: OneEuroParams) -> Self {
        Self {
            params,
            state: OneEuroState::default(),
        }
    }

    #[must_use]
    pub fn params(&self) -> &OneEuroParams {
        &self.params
    }

    /// Filter `value` taken at `timestamp` seconds
    ///
    /// `object_scale` multiplies the speed estimate so the same tuning works
    /// for objects of different apparent size.
    pub fn apply(&mut self, value: f64, timestamp: f64, object_scale: f64) -> f64 {
        self.state.update(&self.params, value, timestamp, object_scale).0
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 30.0;

    fn filter(min_cutoff: f64, beta: f64) -> OneEuroFilter {
        OneEuroFilter::new(OneEuroParams::new(min_cutoff, beta, 1.0).unwrap())
    }

    #[test]
    fn test_smoothing_factor_bounds() {
        for &cutoff in &[0.05, 1.0, 10.0, 100.0] {
            for &rate in &[10.0, 30.0, 120.0, 1000.0] {
                let alpha = smoothing_factor(rate, cutoff);
                assert!(alpha > 0.0 && alpha < 1.0, "alpha={alpha} for rate={rate}, cutoff={cutoff}");
            }
        }
    }

    #[test]
    fn test_first_sample_passes_through() {
        let mut f = filter(1.0, 0.0);
        assert_eq!(f.apply(5.0, 0.0, 1.0), 5.0);
    }

    #[test]
    fn test_step_is_smoothed() {
        let mut f = filter(1.0, 0.0);
        f.apply(0.0, 0.0, 1.0);
        let out = f.apply(10.0, DT, 1.0);
        let expected = 10.0 * smoothing_factor(30.0, 1.0);
        assert!((out - expected).abs() < 1e-9, "got {out}, expected {expected}");
    }

    #[test]
    fn test_beta_reduces_lag() {
        let mut slow = filter(1.0, 0.0);
        let mut fast = filter(1.0, 1.0);
        slow.apply(0.0, 0.0, 1.0);
        fast.apply(0.0, 0.0, 1.0);

        let r_slow = slow.apply(10.0, DT, 1.0);
        let r_fast = fast.apply(10.0, DT, 1.0);
        assert!(r_fast > r_slow, "beta>0 ({r_fast}) should track faster than beta=0 ({r_slow})");
    }

    #[test]
    fn test_timestamp_regression_restarts() {
        let mut f = filter(1.0, 0.0);
        f.apply(0.0, 1.0, 1.0);
        f.apply(1.0, 1.0 + DT, 1.0);

        // Equal timestamp counts as regression
        assert_eq!(f.apply(7.0, 1.0 + DT, 1.0), 7.0);
        assert_eq!(f.apply(3.0, 0.5, 1.0), 3.0);
        assert!(f.apply(4.0, 0.5 + DT, 1.0) < 4.0);
    }

    #[test]
    fn test_non_finite_timestamp_clears_state() {
        let params = OneEuroParams::new(1.0, 0.0, 1.0).unwrap();
        let mut state = OneEuroState::default();
        assert_eq!(state.update(&params, 1.0, 0.0, 1.0).1, Update::WarmUp);
        assert_eq!(state.update(&params, 2.0, f64::NAN, 1.0), (2.0, Update::Restart));
        assert!(!state.is_primed());
        assert_eq!(state.update(&params, 3.0, 1.0, 1.0), (3.0, Update::WarmUp));
    }

    #[test]
    fn test_reset() {
        let mut f = filter(1.0, 0.0);
        f.apply(0.0, 0.0, 1.0);
        f.reset();
        assert_eq!(f.apply(10.0, DT, 1.0), 10.0);
    }

    #[test]
    fn test_invalid_params() {
        assert!(OneEuroParams::new(0.0, 0.0, 1.0).is_err());
        assert!(OneEuroParams::new(1.0, -1.0, 1.0).is_err());
        assert!(OneEuroParams::new(1.0, 0.0, f64::INFINITY).is_err());
    }
}
