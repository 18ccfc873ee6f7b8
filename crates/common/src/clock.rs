//! Recording clock.
//!
//! The capture session and the on-screen elapsed counter both read from
//! a monotonic epoch captured the moment recording starts; the wall
//! clock at that moment is kept for log correlation.

use std::time::Instant;

/// A recording clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment recording started).
#[derive(Debug, Clone)]
pub struct RecordingClock {
    /// The instant recording started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl RecordingClock {
    /// Create a new recording clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get nanoseconds elapsed since recording start.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Get seconds elapsed since recording start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Whole seconds elapsed since recording start (for display).
    pub fn elapsed_whole_secs(&self) -> u64 {
        self.epoch.elapsed().as_secs()
    }

    /// Wall-clock time at recording start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = RecordingClock::start();
        // Should be very small but non-negative
        assert!(clock.elapsed_ns() < 1_000_000_000); // less than 1 second
        assert_eq!(clock.elapsed_whole_secs(), 0);
    }

    #[test]
    fn test_epoch_wall_is_rfc3339() {
        let clock = RecordingClock::start();
        assert!(chrono::DateTime::parse_from_rfc3339(clock.epoch_wall()).is_ok());
    }
}
