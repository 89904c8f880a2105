//! Echo pulse timing: the edge-callback latch and the pulse-source seam.
//!
//! Real ultrasonic hardware reports the echo as a pair of edge interrupts
//! with microsecond timestamps, delivered on a context asynchronous to the
//! acquisition loop.  [`EchoLatch`] is the single point of contact between
//! the two: the callback side records edges under one short-lived mutex, the
//! loop side consumes the last completed pulse with a read-and-clear.
//!
//! [`PulseSource`] abstracts the trigger/echo capability itself.  GPIO access
//! is deliberately not part of this crate; [`SimPulseSource`] stands in for
//! the hardware by synthesising edge pairs from a configured waveform, and
//! drives the same latch a real driver would.

use std::sync::Mutex;
use std::time::Duration;

// ---------------------------------------------------------------------------
// EchoLatch
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct EchoCell {
    in_flight: bool,
    start_tick_us: Option<u64>,
    last_echo_us: Option<u64>,
}

/// Latest-value cell for completed echo pulses.
///
/// Updated by edge callbacks, consumed by the acquisition loop.  The mutex is
/// held only for the duration of each update; nothing blocks inside the
/// critical section.
#[derive(Debug)]
pub struct EchoLatch {
    timeout_us: u64,
    inner: Mutex<EchoCell>,
}

impl EchoLatch {
    /// `timeout_us` bounds plausible pulse widths; anything longer is
    /// discarded as a missed echo.
    pub fn new(timeout_us: u64) -> Self {
        Self {
            timeout_us: timeout_us.max(1),
            inner: Mutex::new(EchoCell::default()),
        }
    }

    /// Whether a new trigger pulse may be emitted (no reading in flight).
    pub fn can_trigger(&self) -> bool {
        !self.inner.lock().unwrap().in_flight
    }

    /// Rising edge: the echo pulse has started.
    pub fn on_rising(&self, tick_us: u64) {
        let mut cell = self.inner.lock().unwrap();
        cell.start_tick_us = Some(tick_us);
        cell.in_flight = true;
    }

    /// Falling edge: the echo pulse has completed.  Widths outside
    /// `(0, timeout_us]` are discarded.
    pub fn on_falling(&self, tick_us: u64) {
        let mut cell = self.inner.lock().unwrap();
        if let Some(start) = cell.start_tick_us.take() {
            let width = tick_us.wrapping_sub(start);
            if width > 0 && width <= self.timeout_us {
                cell.last_echo_us = Some(width);
            }
        }
        cell.in_flight = false;
    }

    /// Hardware watchdog fired while waiting for the falling edge: abandon
    /// the in-flight reading.
    pub fn on_timeout(&self) {
        let mut cell = self.inner.lock().unwrap();
        if cell.in_flight {
            log::debug!("echo: pulse timed out after {} us", self.timeout_us);
        }
        cell.in_flight = false;
        cell.start_tick_us = None;
    }

    /// Consume the last completed echo.  A second read before the next
    /// falling edge yields `None`.
    pub fn take_echo(&self) -> Option<Duration> {
        let mut cell = self.inner.lock().unwrap();
        cell.last_echo_us.take().map(Duration::from_micros)
    }
}

// ---------------------------------------------------------------------------
// PulseSource
// ---------------------------------------------------------------------------

/// The trigger/echo capability the acquisition loop is written against.
pub trait PulseSource: Send {
    /// Emit a trigger pulse.  Returns `false` when a reading is already in
    /// flight and the trigger was suppressed.
    fn trigger(&mut self) -> bool;

    /// Consume the most recently completed echo, if any.
    fn take_echo(&mut self) -> Option<Duration>;
}

// ---------------------------------------------------------------------------
// SimPulseSource
// ---------------------------------------------------------------------------

/// Software stand-in for the ultrasonic hardware.
///
/// Cycles through a configured waveform of distances, converting each one
/// back into the pulse width the hardware would have reported and feeding it
/// through an [`EchoLatch`] as a synthetic edge pair.
pub struct SimPulseSource {
    waveform_cm: Vec<f64>,
    index: usize,
    temp_c: f64,
    latch: EchoLatch,
    clock_us: u64,
}

impl SimPulseSource {
    pub fn new(waveform_cm: &[f64], temp_c: f64, timeout_us: u64) -> Self {
        let waveform_cm = if waveform_cm.is_empty() {
            log::warn!("echo: empty simulator waveform, holding 40 cm");
            vec![40.0]
        } else {
            waveform_cm.to_vec()
        };
        Self {
            waveform_cm,
            index: 0,
            temp_c,
            latch: EchoLatch::new(timeout_us),
            clock_us: 0,
        }
    }

    fn width_us_for(&self, cm: f64) -> u64 {
        let speed_m_s = 331.3 + 0.606 * self.temp_c;
        ((cm * 2.0 * 1e4) / speed_m_s).round().max(1.0) as u64
    }
}

impl PulseSource for SimPulseSource {
    fn trigger(&mut self) -> bool {
        if !self.latch.can_trigger() {
            return false;
        }
        let cm = self.waveform_cm[self.index];
        self.index = (self.index + 1) % self.waveform_cm.len();

        let width = self.width_us_for(cm);
        self.latch.on_rising(self.clock_us);
        self.latch.on_falling(self.clock_us + width);
        self.clock_us = self.clock_us.wrapping_add(width + 10);
        true
    }

    fn take_echo(&mut self) -> Option<Duration> {
        self.latch.take_echo()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
