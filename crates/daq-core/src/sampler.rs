//! Event category and arrival-time sampling.
//!
//! The signal probability oscillates sinusoidally between zero and
//! `max_signal_fraction` with period `period_hours`:
//!
//! ```text
//! p(h) = max_signal_fraction * (1 + sin(2 * pi * h / period_hours)) / 2
//! ```
//!
//! Inter-event delays are exponential with mean `3600 / events_per_hour`
//! seconds, giving a Poisson arrival process.

use std::f64::consts::TAU;
use std::time::{Duration, TryFromFloatSecsError};

use daq_types::Category;
use rand::Rng;
use rand::distr::Open01;

use crate::config::SamplingConfig;

/// Seconds per hour.
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Errors from sampler construction or delay conversion.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// A sampling parameter is outside its accepted range.
    #[error("invalid sampling parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A drawn delay could not be represented as a [`Duration`].
    #[error("inter-arrival delay of {seconds} s is not representable: {source}")]
    UnrepresentableDelay {
        /// The drawn delay.
        seconds: f64,
        /// Conversion error.
        source: TryFromFloatSecsError,
    },
}

/// Draws event categories and inter-arrival delays.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSampler {
    max_signal_fraction: f64,
    period_hours: f64,
    events_per_hour: f64,
}

impl EventSampler {
    /// Create a sampler from validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidParameter`] when `max_signal_fraction`
    /// is outside `[0, 1]` or either rate parameter is not a positive
    /// finite number.
    pub fn new(config: &SamplingConfig) -> Result<Self, SamplerError> {
        let fraction = config.max_signal_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(SamplerError::InvalidParameter {
                name: "max_signal_fraction",
                value: fraction,
            });
        }
        for (name, value) in [
            ("period_hours", config.period_hours),
            ("events_per_hour", config.events_per_hour),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SamplerError::InvalidParameter { name, value });
            }
        }

        Ok(Self {
            max_signal_fraction: fraction,
            period_hours: config.period_hours,
            events_per_hour: config.events_per_hour,
        })
    }

    /// Probability that an event emitted `elapsed_hours` after the epoch is
    /// a signal event. Always within `[0, max_signal_fraction]`.
    pub fn signal_probability(&self, elapsed_hours: f64) -> f64 {
        let phase = TAU * elapsed_hours / self.period_hours;
        let p = self.max_signal_fraction * (1.0 + phase.sin()) / 2.0;
        p.clamp(0.0, self.max_signal_fraction)
    }

    /// Draw a category: signal with probability `p`, background otherwise.
    pub fn draw_category<R: Rng + ?Sized>(p: f64, rng: &mut R) -> Category {
        let u: f64 = rng.random();
        Category::from_is_signal(u < p)
    }

    /// Draw an exponential inter-arrival time in seconds. Always positive.
    pub fn inter_arrival_seconds<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.sample(Open01);
        -u.ln() / self.events_per_hour * SECONDS_PER_HOUR
    }

    /// Draw the delay until the next event.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::UnrepresentableDelay`] if the draw overflows
    /// a [`Duration`].
    pub fn draw_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Duration, SamplerError> {
        let seconds = self.inter_arrival_seconds(rng);
        Duration::try_from_secs_f64(seconds)
            .map_err(|source| SamplerError::UnrepresentableDelay { seconds, source })
    }

    /// Mean delay between events.
    pub fn mean_interval(&self) -> Duration {
        Duration::try_from_secs_f64(SECONDS_PER_HOUR / self.events_per_hour)
            .unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn sampler() -> EventSampler {
        EventSampler::new(&SamplingConfig::default()).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn probability_at_reference_points() {
        let s = sampler();
        assert!(approx(s.signal_probability(0.0), 0.05));
        assert!(approx(s.signal_probability(0.75), 0.10));
        assert!(approx(s.signal_probability(1.5), 0.05));
        assert!(approx(s.signal_probability(2.25), 0.0));
    }

    #[test]
    fn probability_stays_in_range_and_is_periodic() {
        let s = sampler();
        for step in 0..2000 {
            let h = f64::from(step) * 0.037 - 20.0;
            let p = s.signal_probability(h);
            assert!((0.0..=0.1).contains(&p), "p({h}) = {p}");
            assert!((p - s.signal_probability(h + 3.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn category_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert_eq!(EventSampler::draw_category(0.0, &mut rng), Category::Background);
            assert_eq!(EventSampler::draw_category(1.0, &mut rng), Category::Signal);
        }
    }

    #[test]
    fn category_frequency_tracks_probability() {
        let mut rng = StdRng::seed_from_u64(11);
        let signals = (0..20_000)
            .filter(|_| EventSampler::draw_category(0.1, &mut rng).is_signal())
            .count();
        let fraction = signals as f64 / 20_000.0;
        assert!((fraction - 0.1).abs() < 0.01, "fraction = {fraction}");
    }

    #[test]
    fn delays_are_positive_with_expected_mean() {
        let s = sampler();
        let mut rng = StdRng::seed_from_u64(42);
        let draws: Vec<f64> = (0..10_000).map(|_| s.inter_arrival_seconds(&mut rng)).collect();
        assert!(draws.iter().all(|&d| d > 0.0));
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!((mean - 12.0).abs() < 1.2, "mean = {mean}");
    }

    #[test]
    fn draw_delay_converts_to_duration() {
        let s = sampler();
        let mut rng = StdRng::seed_from_u64(3);
        let delay = s.draw_delay(&mut rng).unwrap();
        assert!(delay > Duration::ZERO);
        assert_eq!(s.mean_interval(), Duration::from_secs(12));
    }

    #[test]
    fn rejects_invalid_parameters() {
        let bad = [
            SamplingConfig {
                max_signal_fraction: -0.1,
                ..SamplingConfig::default()
            },
            SamplingConfig {
                period_hours: 0.0,
                ..SamplingConfig::default()
            },
            SamplingConfig {
                events_per_hour: f64::INFINITY,
                ..SamplingConfig::default()
            },
        ];
        for config in &bad {
            assert!(matches!(
                EventSampler::new(config),
                Err(SamplerError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn zero_fraction_never_signals() {
        let s = EventSampler::new(&SamplingConfig {
            max_signal_fraction: 0.0,
            ..SamplingConfig::default()
        })
        .unwrap();
        for step in 0..100 {
            assert!(s.signal_probability(f64::from(step) * 0.1).abs() < f64::EPSILON);
        }
    }
}
