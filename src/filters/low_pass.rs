use crate::{Error, Result};

/// First-order low-pass filter with a constant coefficient
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    alpha: f64,
    last: Option<f64>,
}

impl LowPassFilter {
    /// Create a new first-order low-pass filter
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if alpha is not in the range (0, 1]
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::ConfigError(format!("Alpha must be in (0, 1], got {alpha}")));
        }
        Ok(Self { alpha, last: None })
    }

    /// Blend `value` into the running output; the first value passes through
    pub fn apply(&mut self, value: f64) -> f64 {
        let filtered = match self.last {
            Some(last) => self.alpha.mul_add(value - last, last),
            None => value,
        };
        self.last = Some(filtered);
        filtered
    }

    /// Last output, if any
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order_low_pass() {
        let mut filter = LowPassFilter::new(0.5).unwrap();

        // First value passes through
        assert_eq!(filter.apply(10.0), 10.0);

        // Second value is filtered
        assert_eq!(filter.apply(20.0), 15.0); // 10 + 0.5 * (20 - 10)
        assert_eq!(filter.last(), Some(15.0));
    }

    #[test]
    fn test_alpha_one_is_passthrough() {
        let mut filter = LowPassFilter::new(1.0).unwrap();
        filter.apply(3.0);
        assert_eq!(filter.apply(-8.0), -8.0);
    }

    #[test]
    fn test_reset() {
        let mut filter = LowPassFilter::new(0.2).unwrap();
        filter.apply(100.0);
        filter.reset();
        assert_eq!(filter.last(), None);
        assert_eq!(filter.apply(1.0), 1.0);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        for alpha in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(LowPassFilter::new(alpha), Err(Error::ConfigError(_))));
        }
    }
}
