//! Hand-gesture recognition — observations in, debounced state out.
//!
//! # Data flow
//!
//! ```text
//! vision capability → ObservationMailbox → GestureRecognizer::update
//!   (own thread)       (single slot,         (once per router tick)
//!                       latest wins)              │
//!                                                 ▼
//!                                           GestureState
//!                                  {instrument, mode, recording,
//!                                   note_gate}
//! ```
//!
//! The vision model itself is external: it delivers, per frame, either
//! nothing or 21 normalized points plus a handedness label.  Everything
//! noisy about that stream — dropouts, single-frame misreads, boundary
//! chatter — is absorbed here by debounce timers and hysteresis before any
//! state changes.

pub mod hand;
pub mod mailbox;
pub mod recognizer;

pub use hand::{
    finger_state, pinch_distance_px, FingerState, HandObservation, Handedness, Point2,
    LANDMARK_COUNT,
};
pub use mailbox::{
    spawn_observation_source, IdleObservationSource, ObservationMailbox, ObservationSource,
};
pub use recognizer::{GestureRecognizer, GestureState, Mode};
