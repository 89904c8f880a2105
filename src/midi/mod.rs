//! MIDI output: message encoding and the sink seam.
//!
//! User-facing configuration speaks 1–16 channel numbers; [`Channel`] owns
//! the translation to the wire's 0-based nibble and refuses anything outside
//! the range at construction.  [`MidiMessage`] encodes straight to status
//! bytes — three bytes for notes and control changes, two for a program
//! change.
//!
//! [`MidiSink`] is the seam the router writes against.  The production
//! implementation in [`output`] connects through `midir`; tests record
//! messages with [`MockMidiSink`].

pub mod output;

pub use output::{open_outputs, MidiOutputs, MidirSink};

use thiserror::Error;

// ---------------------------------------------------------------------------
// MidiError
// ---------------------------------------------------------------------------

/// Errors from the MIDI output subsystem.
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI channel must be 1-16, got {0}")]
    ChannelOutOfRange(u8),

    #[error("failed to initialise MIDI client: {0}")]
    Init(String),

    #[error("MIDI output port '{name}' not found; available ports: {available}")]
    PortNotFound { name: String, available: String },

    #[error("failed to connect to MIDI output '{0}': {1}")]
    Connect(String, String),

    #[error("MIDI send failed: {0}")]
    Send(String),
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A validated MIDI channel, stored as the wire's 0-based value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel(u8);

impl Channel {
    /// Accepts user-facing channel numbers 1–16.
    pub fn new(user_channel: u8) -> Result<Self, MidiError> {
        if (1..=16).contains(&user_channel) {
            Ok(Self(user_channel - 1))
        } else {
            Err(MidiError::ChannelOutOfRange(user_channel))
        }
    }

    /// The 0-based value that goes into the status byte.
    pub fn wire(self) -> u8 {
        self.0
    }

    /// The 1-based number as users and configs see it.
    pub fn user(self) -> u8 {
        self.0 + 1
    }
}

// ---------------------------------------------------------------------------
// MidiMessage
// ---------------------------------------------------------------------------

/// One outbound MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn {
        channel: Channel,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: Channel,
        note: u8,
        velocity: u8,
    },
    ControlChange {
        channel: Channel,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        channel: Channel,
        program: u8,
    },
}

impl MidiMessage {
    /// Encode to wire bytes.  Returns the byte buffer and its used length
    /// (2 for program change, 3 otherwise).  Data bytes are masked to 7 bits.
    pub fn to_bytes(self) -> ([u8; 3], usize) {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => ([0x90 | channel.wire(), note & 0x7F, velocity & 0x7F], 3),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => ([0x80 | channel.wire(), note & 0x7F, velocity & 0x7F], 3),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => ([0xB0 | channel.wire(), controller & 0x7F, value & 0x7F], 3),
            MidiMessage::ProgramChange { channel, program } => {
                ([0xC0 | channel.wire(), program & 0x7F, 0], 2)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MidiSink
// ---------------------------------------------------------------------------

/// Object-safe send capability for one MIDI output port.
pub trait MidiSink: Send {
    fn send(&mut self, msg: MidiMessage) -> Result<(), MidiError>;
}

// Compile-time assertion: Box<dyn MidiSink> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn MidiSink>) {}
};

// ---------------------------------------------------------------------------
// MockMidiSink  (test-only)
// ---------------------------------------------------------------------------

/// Test double that records every message, with optional failure injection.
#[cfg(test)]
pub struct MockMidiSink {
    sent: std::sync::Arc<std::sync::Mutex<Vec<MidiMessage>>>,
    fail_all: bool,
    fail_program_change: bool,
}

#[cfg(test)]
impl MockMidiSink {
    pub fn new() -> Self {
        Self {
            sent: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
            fail_all: false,
            fail_program_change: false,
        }
    }

    /// A sink whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    /// A sink that fails only program changes.
    pub fn failing_program_change() -> Self {
        Self {
            fail_program_change: true,
            ..Self::new()
        }
    }

    /// Shared handle to the recorded messages.
    pub fn sent(&self) -> std::sync::Arc<std::sync::Mutex<Vec<MidiMessage>>> {
        std::sync::Arc::clone(&self.sent)
    }
}

#[cfg(test)]
impl MidiSink for MockMidiSink {
    fn send(&mut self, msg: MidiMessage) -> Result<(), MidiError> {
        if self.fail_all {
            return Err(MidiError::Send("mock failure".into()));
        }
        if self.fail_program_change && matches!(msg, MidiMessage::ProgramChange { .. }) {
            return Err(MidiError::Send("mock program change failure".into()));
        }
        self.sent.lock().unwrap().push(msg);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_translates_to_zero_based_wire() {
        assert_eq!(Channel::new(1).unwrap().wire(), 0);
        assert_eq!(Channel::new(16).unwrap().wire(), 15);
        assert_eq!(Channel::new(10).unwrap().user(), 10);
    }

    #[test]
    fn channel_rejects_out_of_range() {
        assert!(matches!(Channel::new(0), Err(MidiError::ChannelOutOfRange(0))));
        assert!(matches!(
            Channel::new(17),
            Err(MidiError::ChannelOutOfRange(17))
        ));
    }

    #[test]
    fn note_on_encodes_status_and_data() {
        let msg = MidiMessage::NoteOn {
            channel: Channel::new(1).unwrap(),
            note: 60,
            velocity: 90,
        };
        assert_eq!(msg.to_bytes(), ([0x90, 60, 90], 3));
    }

    #[test]
    fn note_off_encodes_on_the_right_channel() {
        let msg = MidiMessage::NoteOff {
            channel: Channel::new(10).unwrap(),
            note: 36,
            velocity: 0,
        };
        assert_eq!(msg.to_bytes(), ([0x89, 36, 0], 3));
    }

    #[test]
    fn control_change_encodes() {
        let msg = MidiMessage::ControlChange {
            channel: Channel::new(1).unwrap(),
            controller: 20,
            value: 127,
        };
        assert_eq!(msg.to_bytes(), ([0xB0, 20, 127], 3));
    }

    #[test]
    fn program_change_is_two_bytes() {
        let msg = MidiMessage::ProgramChange {
            channel: Channel::new(1).unwrap(),
            program: 81,
        };
        let (bytes, len) = msg.to_bytes();
        assert_eq!(len, 2);
        assert_eq!(&bytes[..len], &[0xC0, 81]);
    }

    #[test]
    fn data_bytes_are_masked_to_seven_bits() {
        let msg = MidiMessage::NoteOn {
            channel: Channel::new(1).unwrap(),
            note: 200,
            velocity: 255,
        };
        let (bytes, _) = msg.to_bytes();
        assert_eq!(bytes[1], 200 & 0x7F);
        assert_eq!(bytes[2], 127);
    }

    #[test]
    fn mock_records_in_order() {
        let mut sink = MockMidiSink::new();
        let sent = sink.sent();
        let ch = Channel::new(1).unwrap();
        sink.send(MidiMessage::NoteOn {
            channel: ch,
            note: 60,
            velocity: 90,
        })
        .unwrap();
        sink.send(MidiMessage::NoteOff {
            channel: ch,
            note: 60,
            velocity: 0,
        })
        .unwrap();
        assert_eq!(sent.lock().unwrap().len(), 2);
    }
}
