//! Signal conditioning for raw ultrasonic echo pulses.
//!
//! The acquisition loop feeds every cycle through the same fixed order:
//! pulse-width → distance conversion, trailing median, optional EMA, clamp to
//! the configured sensing range.  [`DistancePipeline`] owns that order and the
//! filter state; the free functions underneath it are kept public because the
//! tests (and calibration tooling) exercise them directly.

use std::time::Duration;

use thiserror::Error;

use crate::config::{DistanceConfig, FilterConfig};

// ---------------------------------------------------------------------------
// FilterError
// ---------------------------------------------------------------------------

/// Errors from the conditioning primitives.
///
/// All of these indicate misconfiguration rather than bad sensor data — bad
/// data is represented as an absent sample, not an error.
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    #[error("median window size must be greater than zero")]
    ZeroWindow,

    #[error("median window is empty")]
    EmptyWindow,

    #[error("ema alpha must be within [0, 1], got {0}")]
    AlphaOutOfRange(f64),

    #[error("clamp lower bound {lo} exceeds upper bound {hi}")]
    InvertedBounds { lo: f64, hi: f64 },
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Convert an ultrasonic echo pulse width to centimetres.
///
/// The speed of sound is estimated from the ambient temperature as
/// `331.3 + 0.606 · T` m/s; the result is halved because the pulse travels to
/// the target and back.  Returns `None` for a missing or zero-length pulse.
pub fn pulse_to_distance(echo: Option<Duration>, temp_c: f64) -> Option<f64> {
    let echo = echo?;
    if echo.is_zero() {
        return None;
    }
    let speed_m_s = 331.3 + 0.606 * temp_c;
    let one_way_m = echo.as_secs_f64() * speed_m_s / 2.0;
    Some(one_way_m * 100.0)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Median of the most recent `size` samples in `window`.
///
/// Older samples are discarded from `window` in place, so the caller keeps a
/// single growing `Vec` and this function bounds it.  Even-length windows
/// average the two middle values.
pub fn median(window: &mut Vec<f64>, size: usize) -> Result<f64, FilterError> {
    if size == 0 {
        return Err(FilterError::ZeroWindow);
    }
    if window.is_empty() {
        return Err(FilterError::EmptyWindow);
    }
    if window.len() > size {
        window.drain(..window.len() - size);
    }

    let mut sorted = window.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid])
    } else {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Exponential moving average step.
///
/// Bootstraps by passing `x` through unchanged when there is no previous
/// value.
pub fn ema(prev: Option<f64>, x: f64, alpha: f64) -> Result<f64, FilterError> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(FilterError::AlphaOutOfRange(alpha));
    }
    Ok(match prev {
        None => x,
        Some(prev) => alpha * x + (1.0 - alpha) * prev,
    })
}

/// Clamp `x` into the inclusive range `[lo, hi]`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> Result<f64, FilterError> {
    if lo > hi {
        return Err(FilterError::InvertedBounds { lo, hi });
    }
    Ok(x.max(lo).min(hi))
}

// ---------------------------------------------------------------------------
// DistancePipeline
// ---------------------------------------------------------------------------

/// The per-acquisition conditioning pipeline:
/// convert → median → optional EMA → clamp.
///
/// Construction validates every parameter so the per-tick path cannot fail on
/// configuration; a cycle with no valid echo simply yields `None`.
#[derive(Debug)]
pub struct DistancePipeline {
    temp_c: f64,
    median_size: usize,
    ema_alpha: f64,
    range_lo: f64,
    range_hi: f64,
    window: Vec<f64>,
    ema_value: Option<f64>,
}

impl DistancePipeline {
    /// Build a pipeline from the sensing-range and filter configuration.
    pub fn new(distance: &DistanceConfig, filters: &FilterConfig) -> Result<Self, FilterError> {
        if filters.median_window == 0 {
            return Err(FilterError::ZeroWindow);
        }
        if !(0.0..=1.0).contains(&filters.ema_alpha) {
            return Err(FilterError::AlphaOutOfRange(filters.ema_alpha));
        }
        if distance.min_cm > distance.max_cm {
            return Err(FilterError::InvertedBounds {
                lo: distance.min_cm,
                hi: distance.max_cm,
            });
        }
        Ok(Self {
            temp_c: distance.temp_c,
            median_size: filters.median_window,
            ema_alpha: filters.ema_alpha,
            range_lo: distance.min_cm,
            range_hi: distance.max_cm,
            window: Vec::with_capacity(filters.median_window + 1),
            ema_value: None,
        })
    }

    /// Run one acquisition's echo through the pipeline.
    ///
    /// Returns the conditioned distance in centimetres, or `None` when the
    /// echo was missing — a transient miss, not an error.
    pub fn process(&mut self, echo: Option<Duration>) -> Option<f64> {
        let raw_cm = pulse_to_distance(echo, self.temp_c)?;
        self.window.push(raw_cm);

        let filtered = median(&mut self.window, self.median_size).unwrap_or(raw_cm);

        let smoothed = if self.ema_alpha > 0.0 {
            let value = ema(self.ema_value, filtered, self.ema_alpha).unwrap_or(filtered);
            self.ema_value = Some(value);
            value
        } else {
            filtered
        };

        Some(smoothed.max(self.range_lo).min(self.range_hi))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn us(micros: u64) -> Option<Duration> {
        Some(Duration::from_micros(micros))
    }

    // --- pulse_to_distance ---

    #[test]
    fn conversion_at_20c() {
        // A 20 cm round trip at 20 °C is roughly a 1165 µs pulse.
        let cm = pulse_to_distance(us(1165), 20.0).unwrap();
        assert!((cm - 20.0).abs() < 0.2, "got {cm}");
    }

    #[test]
    fn warmer_air_reads_farther() {
        let base = pulse_to_distance(us(1165), 20.0).unwrap();
        let warm = pulse_to_distance(us(1165), 30.0).unwrap();
        assert!(warm > base);
    }

    #[test]
    fn missing_or_zero_pulse_yields_none() {
        assert!(pulse_to_distance(None, 20.0).is_none());
        assert!(pulse_to_distance(Some(Duration::ZERO), 20.0).is_none());
    }

    // --- median ---

    #[test]
    fn median_keeps_only_trailing_samples() {
        let mut window = vec![1.0, 2.0, 3.0, 100.0, 100.0, 100.0];
        let value = median(&mut window, 3).unwrap();
        assert_eq!(value, 100.0);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn median_of_even_window_averages_middles() {
        let mut window = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&mut window, 4).unwrap(), 2.5);
    }

    #[test]
    fn median_rejects_zero_size_and_empty_window() {
        let mut window = vec![1.0];
        assert!(matches!(median(&mut window, 0), Err(FilterError::ZeroWindow)));
        let mut empty: Vec<f64> = Vec::new();
        assert!(matches!(median(&mut empty, 3), Err(FilterError::EmptyWindow)));
    }

    // --- ema ---

    #[test]
    fn ema_bootstraps_on_first_sample() {
        assert_eq!(ema(None, 42.0, 0.3).unwrap(), 42.0);
    }

    #[test]
    fn ema_blends_previous_value() {
        let value = ema(Some(10.0), 20.0, 0.25).unwrap();
        assert!((value - 12.5).abs() < 1e-9);
    }

    #[test]
    fn ema_rejects_alpha_outside_unit_interval() {
        assert!(matches!(
            ema(None, 1.0, 1.5),
            Err(FilterError::AlphaOutOfRange(_))
        ));
        assert!(matches!(
            ema(None, 1.0, -0.1),
            Err(FilterError::AlphaOutOfRange(_))
        ));
    }

    // --- clamp ---

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5.0, 0.0, 10.0).unwrap(), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0).unwrap(), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0).unwrap(), 10.0);
    }

    #[test]
    fn clamp_rejects_inverted_bounds() {
        assert!(matches!(
            clamp(1.0, 5.0, 2.0),
            Err(FilterError::InvertedBounds { .. })
        ));
    }

    // --- DistancePipeline ---

    fn pipeline(median_window: usize, ema_alpha: f64) -> DistancePipeline {
        let distance = DistanceConfig {
            min_cm: 10.0,
            max_cm: 60.0,
            temp_c: 20.0,
        };
        let filters = FilterConfig {
            median_window,
            ema_alpha,
        };
        DistancePipeline::new(&distance, &filters).expect("valid pipeline")
    }

    /// Round-trip helper: pulse width that converts to roughly `cm`.
    fn echo_for(cm: f64) -> Option<Duration> {
        let speed = 331.3 + 0.606 * 20.0;
        let secs = cm / 100.0 * 2.0 / speed;
        Some(Duration::from_secs_f64(secs))
    }

    #[test]
    fn pipeline_clamps_to_sensing_range() {
        let mut p = pipeline(1, 0.0);
        let low = p.process(echo_for(2.0)).unwrap();
        assert_eq!(low, 10.0);
        let high = p.process(echo_for(90.0)).unwrap();
        assert_eq!(high, 60.0);
    }

    #[test]
    fn pipeline_median_suppresses_a_spike() {
        let mut p = pipeline(3, 0.0);
        p.process(echo_for(30.0));
        p.process(echo_for(30.0));
        let out = p.process(echo_for(55.0)).unwrap();
        assert!((out - 30.0).abs() < 0.5, "spike should not pass, got {out}");
    }

    #[test]
    fn pipeline_missing_echo_yields_none() {
        let mut p = pipeline(3, 0.25);
        assert!(p.process(None).is_none());
    }

    #[test]
    fn pipeline_rejects_invalid_config() {
        let distance = DistanceConfig {
            min_cm: 10.0,
            max_cm: 60.0,
            temp_c: 20.0,
        };
        let filters = FilterConfig {
            median_window: 0,
            ema_alpha: 0.25,
        };
        assert!(DistancePipeline::new(&distance, &filters).is_err());
    }
}
