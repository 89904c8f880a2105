//! Percussive hit detection on the conditioned distance stream.
//!
//! A Schmitt trigger with a refractory guard: the detector fires when the
//! hand crosses below `threshold - hysteresis`, then stays silent until the
//! hand retreats above `threshold + hysteresis` — oscillation inside the band
//! can never chatter.  Velocity comes from the approach speed between the two
//! most recent samples.

use std::time::{Duration, Instant};

use crate::config::HitConfig;

// ---------------------------------------------------------------------------
// HitEvent
// ---------------------------------------------------------------------------

/// A single detected percussive trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEvent {
    /// MIDI velocity 0–127 derived from the approach speed.
    pub velocity: u8,
}

// ---------------------------------------------------------------------------
// HitDetector
// ---------------------------------------------------------------------------

/// Debounced threshold-crossing detector with velocity estimation.
#[derive(Debug)]
pub struct HitDetector {
    threshold_cm: f64,
    hysteresis_cm: f64,
    refractory: Duration,
    velocity_min: u8,
    velocity_max: u8,
    min_speed_cm_s: f64,
    max_speed_cm_s: f64,
    fixed_velocity: u8,

    armed: bool,
    last_hit: Option<Instant>,
    last_sample: Option<(f64, Instant)>,
}

impl HitDetector {
    pub fn from_config(config: &HitConfig) -> Self {
        Self {
            threshold_cm: config.threshold_cm,
            hysteresis_cm: config.hysteresis_cm,
            refractory: Duration::from_millis(config.refractory_ms),
            velocity_min: config.velocity_min,
            velocity_max: config.velocity_max,
            min_speed_cm_s: config.min_speed_cm_s,
            max_speed_cm_s: config.max_speed_cm_s,
            fixed_velocity: config.fixed_velocity,
            armed: true,
            last_hit: None,
            last_sample: None,
        }
    }

    /// Feed one conditioned distance sample.
    ///
    /// Returns a [`HitEvent`] on the debounced falling crossing; at most one
    /// event per refractory window.  While disarmed, further crossings are
    /// ignored no matter how deep.
    pub fn update(&mut self, cm: f64, now: Instant) -> Option<HitEvent> {
        let refractory_ok = match self.last_hit {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.refractory,
        };

        let mut fired = None;
        if self.armed && cm < self.threshold_cm - self.hysteresis_cm && refractory_ok {
            let velocity = self.velocity_from_approach(cm, now);
            self.armed = false;
            self.last_hit = Some(now);
            fired = Some(HitEvent { velocity });
        }

        if !self.armed && cm > self.threshold_cm + self.hysteresis_cm {
            self.armed = true;
        }

        self.last_sample = Some((cm, now));
        fired
    }

    /// Map approach speed onto the configured velocity curve.
    ///
    /// Without a prior sample (or with a non-advancing clock) there is no
    /// speed to measure, so the fixed fallback velocity is used.
    fn velocity_from_approach(&self, cm: f64, now: Instant) -> u8 {
        let Some((last_cm, last_at)) = self.last_sample else {
            return self.fixed_velocity;
        };
        let dt = now.saturating_duration_since(last_at);
        if dt.is_zero() {
            return self.fixed_velocity;
        }

        let speed = ((last_cm - cm) / dt.as_secs_f64()).max(0.0);
        if speed <= self.min_speed_cm_s {
            return self.velocity_min;
        }
        if speed >= self.max_speed_cm_s {
            return self.velocity_max;
        }
        let ratio = (speed - self.min_speed_cm_s) / (self.max_speed_cm_s - self.min_speed_cm_s);
        let velocity =
            self.velocity_min as f64 + ratio * (self.velocity_max - self.velocity_min) as f64;
        velocity.round() as u8
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
