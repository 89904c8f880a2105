//! Single-slot mailbox between the observation capture thread and the tick
//! loop.
//!
//! The capture side posts whatever the vision model produced for its latest
//! frame — an observation, or `None` when no hand was found.  The slot is
//! overwritten in place: there is no queue, no ordering guarantee beyond
//! "latest observation wins", and the recognizer's debounce timers are built
//! to tolerate the resulting sampling jitter.
//!
//! [`ObservationSource`] is the seam for the external vision capability.
//! [`IdleObservationSource`] is the headless stand-in used when no capability
//! is wired up, so the router node still runs (and decays safely to SELECT
//! with no instrument).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use super::hand::HandObservation;

// ---------------------------------------------------------------------------
// ObservationMailbox
// ---------------------------------------------------------------------------

/// Latest-wins overwrite cell holding the most recent frame result.
#[derive(Debug, Default)]
pub struct ObservationMailbox {
    slot: Mutex<Option<HandObservation>>,
}

impl ObservationMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with the newest frame result.
    pub fn post(&self, obs: Option<HandObservation>) {
        *self.slot.lock().unwrap() = obs;
    }

    /// The most recent frame result.  Called once per tick by the router
    /// loop; posting between two ticks simply overwrites.
    pub fn latest(&self) -> Option<HandObservation> {
        self.slot.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// ObservationSource
// ---------------------------------------------------------------------------

/// Anything that can feed frame results into a mailbox from its own thread.
pub trait ObservationSource: Send + 'static {
    /// Run until `stop` is set, posting each frame's result to `mailbox`.
    fn run(self: Box<Self>, mailbox: Arc<ObservationMailbox>, stop: Arc<AtomicBool>);
}

/// Spawn an observation source on a named thread.
pub fn spawn_observation_source<S: ObservationSource>(
    source: S,
    mailbox: Arc<ObservationMailbox>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("observation-capture".into())
        .spawn(move || Box::new(source).run(mailbox, stop))
        .expect("failed to spawn observation-capture thread")
}

// ---------------------------------------------------------------------------
// IdleObservationSource
// ---------------------------------------------------------------------------

/// Stand-in source for headless runs: reports "no hand" at a camera-like
/// rate until stopped.
pub struct IdleObservationSource;

impl ObservationSource for IdleObservationSource {
    fn run(self: Box<Self>, mailbox: Arc<ObservationMailbox>, stop: Arc<AtomicBool>) {
        log::warn!("gesture: no observation capability wired, running idle");
        while !stop.load(Ordering::Relaxed) {
            mailbox.post(None);
            std::thread::sleep(Duration::from_millis(33));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
