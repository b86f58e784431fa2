//! Signal filters for smoothing landmark trajectories.
//!
//! The One-Euro filter adapts its cutoff to the signal speed: slow motion is
//! smoothed hard to remove jitter, fast motion is followed closely to avoid lag.

/// Speed-adaptive One-Euro filter over timestamped samples
pub mod one_euro;

/// Constant-coefficient first-order low-pass filter
pub mod low_pass;

pub use low_pass::LowPassFilter;
pub use one_euro::{smoothing_factor, OneEuroFilter, OneEuroParams, OneEuroState, Update};
