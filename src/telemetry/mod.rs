//! Best-effort telemetry between the sensor node and the router node.
//!
//! # Architecture
//!
//! ```text
//! sensor node                              router node
//! ───────────                              ───────────
//! TelemetrySender ──/dist /hit /alive──▶ TelemetryReceiver
//!   bounded queue        (UDP/OSC)          socket thread
//!   drain worker                                │
//!                                               ▼
//!                                          SensorInbox
//!                                     single slot per class,
//!                                     hit read-and-cleared
//! ```
//!
//! The producer never blocks: queue overflow coalesces distance readings and
//! drops (with a log line) hit/heartbeat messages.  The receive side keeps no
//! queue at all — one slot per class, latest wins.

pub mod message;
pub mod receiver;
pub mod sender;

pub use message::{TelemetryError, TelemetryMsg, ALIVE_ADDR, DIST_ADDR, HIT_ADDR};
pub use receiver::{SensorInbox, SensorSnapshot, TelemetryReceiver};
pub use sender::{Offer, OscUdpTransport, TelemetrySender, TelemetryTransport, TxQueue};
