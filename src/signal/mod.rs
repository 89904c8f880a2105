//! Sensor-side signal path — echo timing → conditioning → hit detection.
//!
//! # Pipeline
//!
//! ```text
//! edge callbacks → EchoLatch → pulse_to_distance → median → EMA → clamp
//!                                                  (DistancePipeline)
//!                                                        │
//!                                                        ▼
//!                                                   HitDetector
//! ```

pub mod echo;
pub mod filters;
pub mod hit;

pub use echo::{EchoLatch, PulseSource, SimPulseSource};
pub use filters::{clamp, ema, median, pulse_to_distance, DistancePipeline, FilterError};
pub use hit::{HitDetector, HitEvent};
