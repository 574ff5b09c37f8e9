//! Simulation time.
//!
//! The signal probability is a function of hours elapsed since a fixed
//! epoch, so every injector started against the same epoch sees the same
//! oscillation phase regardless of when it was launched.

use chrono::{DateTime, Utc};

/// Milliseconds per hour.
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Wall clock anchored at the simulation epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    epoch: DateTime<Utc>,
}

impl SimulationClock {
    /// Create a clock measuring time from `epoch`.
    pub const fn new(epoch: DateTime<Utc>) -> Self {
        Self { epoch }
    }

    /// The simulation epoch.
    pub const fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Hours elapsed between the epoch and `now`, at millisecond resolution.
    ///
    /// Negative when `now` precedes the epoch.
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_hours_at(&self, now: DateTime<Utc>) -> f64 {
        let millis = now.signed_duration_since(self.epoch).num_milliseconds();
        millis as f64 / MILLIS_PER_HOUR
    }

    /// Hours elapsed between the epoch and the current wall-clock time.
    pub fn elapsed_hours(&self) -> f64 {
        self.elapsed_hours_at(Utc::now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2023-10-23T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn zero_at_epoch() {
        let clock = SimulationClock::new(epoch());
        assert!(clock.elapsed_hours_at(epoch()).abs() < f64::EPSILON);
    }

    #[test]
    fn fractional_hours() {
        let clock = SimulationClock::new(epoch());
        let later = epoch() + TimeDelta::minutes(45);
        assert!((clock.elapsed_hours_at(later) - 0.75).abs() < 1e-12);

        let much_later = epoch() + TimeDelta::days(2) + TimeDelta::minutes(90);
        assert!((clock.elapsed_hours_at(much_later) - 49.5).abs() < 1e-12);
    }

    #[test]
    fn negative_before_epoch() {
        let clock = SimulationClock::new(epoch());
        let earlier = epoch() - TimeDelta::hours(3);
        assert!((clock.elapsed_hours_at(earlier) + 3.0).abs() < 1e-12);
    }

    #[test]
    fn live_clock_is_past_epoch() {
        let clock = SimulationClock::new(epoch());
        assert!(clock.elapsed_hours() > 0.0);
    }
}
