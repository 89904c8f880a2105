//! theremidi — a gesture- and distance-controlled live MIDI instrument.
//!
//! Two cooperating real-time nodes share this library:
//!
//! * the **sensor node** (`sensor-node` binary) reads an ultrasonic distance
//!   sensor on a fixed-rate loop, conditions the signal, detects percussive
//!   hits, and streams telemetry to the router;
//! * the **router node** (`router-node` binary) fuses that telemetry with a
//!   debounced hand-gesture state machine and emits MIDI notes, drum
//!   impulses and transport control changes, guarded by a staleness
//!   watchdog.
//!
//! # Module map
//!
//! | module      | role                                                  |
//! |-------------|-------------------------------------------------------|
//! | [`config`]    | TOML settings for both nodes, validated at startup  |
//! | [`signal`]    | echo timing, conditioning filters, hit detection    |
//! | [`telemetry`] | bounded outbound queue + single-slot receive buffer |
//! | [`gesture`]   | hand observations → debounced SELECT/PLAY state     |
//! | [`midi`]      | message encoding and `midir` output ports           |
//! | [`router`]    | distance → note mapping and the per-tick router     |
//! | [`sched`]     | drift-free fixed-rate loops and the heartbeat grid  |

pub mod config;
pub mod gesture;
pub mod midi;
pub mod router;
pub mod sched;
pub mod signal;
pub mod telemetry;
