//! Telemetry message types and their OSC wire mapping.
//!
//! Three message classes travel from the sensor node to the router node:
//!
//! | address  | payload                     | policy on overflow        |
//! |----------|-----------------------------|---------------------------|
//! | `/dist`  | 32-bit float, centimetres   | coalescing (latest wins)  |
//! | `/hit`   | integer velocity 0–127      | drop the new message      |
//! | `/alive` | increasing sequence number  | drop the new message      |
//!
//! Encoding and decoding go through `rosc`; everything outside this module
//! handles [`TelemetryMsg`] values only.

use rosc::{OscMessage, OscPacket, OscType};
use thiserror::Error;

/// OSC address for distance readings.
pub const DIST_ADDR: &str = "/dist";
/// OSC address for percussive hits.
pub const HIT_ADDR: &str = "/hit";
/// OSC address for the coarse liveness heartbeat.
pub const ALIVE_ADDR: &str = "/alive";

// ---------------------------------------------------------------------------
// TelemetryError
// ---------------------------------------------------------------------------

/// Errors on the telemetry path.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("osc encoding failed: {0}")]
    Encode(rosc::OscError),

    #[error("osc decoding failed: {0}")]
    Decode(rosc::OscError),

    #[error("unknown telemetry address: {0}")]
    UnknownAddress(String),

    #[error("malformed payload for {0}")]
    BadPayload(&'static str),
}

// ---------------------------------------------------------------------------
// TelemetryMsg
// ---------------------------------------------------------------------------

/// One sensor → router datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryMsg {
    /// Conditioned distance reading in centimetres.
    Distance(f32),
    /// Percussive hit with MIDI velocity.
    Hit(u8),
    /// Heartbeat sequence number, emitted at ≥ 1 Hz.
    Alive(u64),
}

impl TelemetryMsg {
    /// The OSC address this message travels under.
    pub fn address(&self) -> &'static str {
        match self {
            TelemetryMsg::Distance(_) => DIST_ADDR,
            TelemetryMsg::Hit(_) => HIT_ADDR,
            TelemetryMsg::Alive(_) => ALIVE_ADDR,
        }
    }

    /// Distance messages coalesce on queue overflow; the rest do not.
    pub fn is_coalescing(&self) -> bool {
        matches!(self, TelemetryMsg::Distance(_))
    }

    /// Encode to an OSC datagram.
    pub fn encode(&self) -> Result<Vec<u8>, TelemetryError> {
        let args = match *self {
            TelemetryMsg::Distance(cm) => vec![OscType::Float(cm)],
            TelemetryMsg::Hit(velocity) => vec![OscType::Int(velocity as i32)],
            TelemetryMsg::Alive(seq) => vec![OscType::Long(seq as i64)],
        };
        let packet = OscPacket::Message(OscMessage {
            addr: self.address().to_string(),
            args,
        });
        rosc::encoder::encode(&packet).map_err(TelemetryError::Encode)
    }

    /// Decode one inbound datagram.
    ///
    /// Unknown addresses and malformed payloads are errors; the receive loop
    /// logs and drops them without aborting.
    pub fn decode(datagram: &[u8]) -> Result<Self, TelemetryError> {
        let (_, packet) = rosc::decoder::decode_udp(datagram).map_err(TelemetryError::Decode)?;
        let OscPacket::Message(msg) = packet else {
            return Err(TelemetryError::BadPayload("bundle"));
        };
        Self::from_osc(msg)
    }

    fn from_osc(msg: OscMessage) -> Result<Self, TelemetryError> {
        match msg.addr.as_str() {
            DIST_ADDR => match msg.args.first() {
                Some(OscType::Float(cm)) => Ok(TelemetryMsg::Distance(*cm)),
                Some(OscType::Double(cm)) => Ok(TelemetryMsg::Distance(*cm as f32)),
                _ => Err(TelemetryError::BadPayload(DIST_ADDR)),
            },
            HIT_ADDR => match msg.args.first() {
                Some(OscType::Int(velocity)) => {
                    Ok(TelemetryMsg::Hit((*velocity).clamp(0, 127) as u8))
                }
                _ => Err(TelemetryError::BadPayload(HIT_ADDR)),
            },
            ALIVE_ADDR => match msg.args.first() {
                Some(OscType::Long(seq)) => Ok(TelemetryMsg::Alive((*seq).max(0) as u64)),
                Some(OscType::Int(seq)) => Ok(TelemetryMsg::Alive((*seq).max(0) as u64)),
                _ => Err(TelemetryError::BadPayload(ALIVE_ADDR)),
            },
            other => Err(TelemetryError::UnknownAddress(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
