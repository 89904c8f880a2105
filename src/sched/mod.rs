//! Drift-free fixed-rate scheduling.
//!
//! Both nodes run their main loop on a fixed arithmetic deadline grid:
//! `deadline[n] = start + n · period`, never `now + period`, so variable
//! processing time cannot accumulate into drift.  When an iteration overruns
//! its deadline, the next cycle fires immediately (no sleep) and the grid
//! index realigns past `now` — missed slots are skipped, never replayed as a
//! burst.
//!
//! [`TickGrid`] is the pure deadline arithmetic (directly testable with
//! synthetic clocks); [`FixedRateScheduler`] is the blocking loop around it,
//! polling a cooperative stop flag once per cycle.  Resource release is
//! RAII: everything a loop owns is dropped on every exit path, panics
//! included.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// TickGrid
// ---------------------------------------------------------------------------

/// Fixed arithmetic deadline grid.
#[derive(Debug)]
pub struct TickGrid {
    start: Instant,
    period: Duration,
    index: u64,
}

impl TickGrid {
    /// The first deadline is `start + period`.
    pub fn new(start: Instant, period: Duration) -> Self {
        Self {
            start,
            period,
            index: 0,
        }
    }

    /// Grid period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Advance to the next deadline.
    ///
    /// The returned instant always lies on the grid.  If `now` has already
    /// passed it, the caller's `max(0, deadline - now)` sleep collapses to
    /// zero — that cycle fires immediately — and the index realigns to the
    /// first grid slot after `now`, skipping the missed ones.
    pub fn next_deadline(&mut self, now: Instant) -> Instant {
        self.index += 1;
        let deadline = self.deadline_at(self.index);
        if now > deadline {
            // The next advance lands on the first grid slot after `now`.
            let elapsed = now.saturating_duration_since(self.start);
            self.index = (elapsed.as_nanos() / self.period.as_nanos().max(1)) as u64;
        }
        deadline
    }

    fn deadline_at(&self, index: u64) -> Instant {
        self.start + Duration::from_nanos((self.period.as_nanos() as u64).saturating_mul(index))
    }
}

// ---------------------------------------------------------------------------
// FixedRateScheduler
// ---------------------------------------------------------------------------

/// Blocking fixed-rate loop driver.
pub struct FixedRateScheduler {
    period: Duration,
    stop: Arc<AtomicBool>,
}

impl FixedRateScheduler {
    /// `rate_hz` must be positive; configuration validation guarantees it
    /// before a node starts.
    pub fn new(rate_hz: f64, stop: Arc<AtomicBool>) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / rate_hz),
            stop,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run `tick` on the grid until the stop flag is set.
    ///
    /// The flag is checked exactly once per cycle, before the tick runs.
    pub fn run<F: FnMut(Instant)>(&self, mut tick: F) {
        let mut grid = TickGrid::new(Instant::now(), self.period);
        while !self.stop.load(Ordering::Relaxed) {
            let deadline = grid.next_deadline(Instant::now());
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            tick(Instant::now());
        }
        log::debug!("sched: loop stopped");
    }
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// One-second grid for the sensor node's liveness heartbeat, independent of
/// the acquisition rate.
#[derive(Debug)]
pub struct Heartbeat {
    next_at: Instant,
    interval: Duration,
    seq: u64,
}

impl Heartbeat {
    pub fn new(start: Instant) -> Self {
        Self {
            next_at: start + Duration::from_secs(1),
            interval: Duration::from_secs(1),
            seq: 0,
        }
    }

    /// Returns the sequence numbers due at `now` (catching up if the loop
    /// stalled across several intervals).
    pub fn due(&mut self, now: Instant) -> Vec<u64> {
        let mut due = Vec::new();
        while now >= self.next_at {
            self.seq += 1;
            due.push(self.seq);
            self.next_at += self.interval;
        }
        due
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
