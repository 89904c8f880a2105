//! The tick-driven music router.
//!
//! [`MusicRouter::process_tick`] fuses the latest [`GestureState`] and
//! [`SensorSnapshot`] into MIDI traffic, in a fixed evaluation order:
//!
//! 1. instrument change — release the held note, re-apply the instrument
//!    (program change for pitched entries), optionally request a new track;
//! 2. watchdog — stale telemetry forces a safe release, logged only on the
//!    trip and recovery edges;
//! 3. recording edges — record CC, optional insert-track CC, count-in mute;
//! 4. gate — outside PLAY, muted, or stale: release and stop;
//! 5. drum instruments — one NoteOn+NoteOff impulse per note-gate rising
//!    edge, never held;
//! 6. pitched instruments — bucket-snap the distance, quantize, and emit
//!    only on change, so a sustained note is never retriggered.
//!
//! The held-note invariant: `held_note` is `Some` exactly when one NoteOn
//! has been sent with no matching NoteOff.  State advances optimistically on
//! send (there is no transport acknowledgement); a failed note or CC send
//! surfaces as a [`RouterError`] because losing a NoteOn/NoteOff pairing
//! would desynchronise that bookkeeping.  A failed program change is only
//! cosmetic and is logged and swallowed.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{ConfigError, InstrumentEntry, InstrumentKind, RouterNodeConfig};
use crate::gesture::{GestureState, Mode};
use crate::midi::{Channel, MidiError, MidiMessage, MidiOutputs};
use crate::telemetry::SensorSnapshot;

use super::mapping::{quantize_note, NoteMapping};

// ---------------------------------------------------------------------------
// RouterError
// ---------------------------------------------------------------------------

/// A tick-level failure.  The tick loop logs it and carries on; router state
/// stays consistent because every mutation happens after its send succeeds.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("MIDI send failed: {0}")]
    Midi(#[from] MidiError),
}

// ---------------------------------------------------------------------------
// RouterConfig
// ---------------------------------------------------------------------------

/// Immutable, validated router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub mapping: NoteMapping,
    pub instruments: Vec<InstrumentEntry>,
    pub lead_channel: Channel,
    pub drum_channel: Channel,
    pub control_channel: Channel,
    pub drum_note: u8,
    pub drum_velocity_default: u8,
    pub lead_velocity: u8,
    pub record_cc: u8,
    pub insert_track_cc: u8,
    pub distance_step_cm: f64,
    pub bpm: f64,
    pub countin_beats: u32,
    pub watchdog: Duration,
    pub insert_on_instrument_change: bool,
    pub insert_on_record_start: bool,
}

impl RouterConfig {
    /// Build from the loaded node configuration.  `validate()` has usually
    /// run already, but every invariant is re-checked here so this type is
    /// impossible to construct in an invalid state.
    pub fn from_node_config(config: &RouterNodeConfig) -> Result<Self, ConfigError> {
        let channel = |field: &'static str, value: u8| {
            Channel::new(value).map_err(|_| ConfigError::ChannelOutOfRange { field, value })
        };
        Ok(Self {
            mapping: config.mapping.to_mapping()?,
            instruments: config.instruments.clone(),
            lead_channel: channel("midi.lead_channel", config.midi.lead_channel)?,
            drum_channel: channel("midi.drum_channel", config.midi.drum_channel)?,
            control_channel: channel("midi.control_channel", config.midi.control_channel)?,
            drum_note: config.midi.drum_note,
            drum_velocity_default: config.midi.drum_velocity_default,
            lead_velocity: config.midi.lead_velocity,
            record_cc: config.midi.record_cc,
            insert_track_cc: config.midi.insert_track_cc,
            distance_step_cm: config.router.distance_step_cm,
            bpm: config.transport.bpm,
            countin_beats: config.transport.countin_beats,
            watchdog: Duration::from_secs_f64(config.router.watchdog_s),
            insert_on_instrument_change: config.router.auto_insert_track_on_instrument_change,
            insert_on_record_start: config.router.auto_insert_track_on_record_start,
        })
    }

    /// Length of the count-in mute: `countin_beats · 60 / bpm`.
    pub fn countin_duration(&self) -> Duration {
        Duration::from_secs_f64(self.countin_beats as f64 * 60.0 / self.bpm)
    }
}

// ---------------------------------------------------------------------------
// RouterState
// ---------------------------------------------------------------------------

/// Mutable per-tick state, exclusively owned by the router.
#[derive(Debug, Default)]
pub struct RouterState {
    /// The sounding note, if any.  `Some` ⇔ one unmatched NoteOn outstanding.
    pub held_note: Option<u8>,
    /// End of the count-in mute window.
    pub mute_until: Option<Instant>,
    pub was_recording: bool,
    pub was_note_playing: bool,
}

// ---------------------------------------------------------------------------
// MusicRouter
// ---------------------------------------------------------------------------

/// Applies play logic, quantization and transport control each tick.
pub struct MusicRouter {
    config: RouterConfig,
    midi: MidiOutputs,
    state: RouterState,
    watchdog_tripped: bool,
    last_instrument: Option<usize>,
    last_mode: Option<Mode>,
    current_is_drum: bool,
    current_drum_note: u8,
}

impl MusicRouter {
    pub fn new(midi: MidiOutputs, config: RouterConfig) -> Self {
        let drum_note = config.drum_note;
        Self {
            config,
            midi,
            state: RouterState::default(),
            watchdog_tripped: false,
            last_instrument: None,
            last_mode: None,
            current_is_drum: false,
            current_drum_note: drum_note,
        }
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    /// Process one router tick.
    pub fn process_tick(
        &mut self,
        gesture: &GestureState,
        sensor: &SensorSnapshot,
        now: Instant,
    ) -> Result<(), RouterError> {
        // ── 1. Instrument / mode changes ─────────────────────────────────
        if self.last_mode != Some(gesture.mode) {
            log::info!("router: mode changed to {:?}", gesture.mode);
            self.last_mode = Some(gesture.mode);
        }
        if self.last_instrument != gesture.instrument {
            log::info!("router: instrument changed to {:?}", gesture.instrument);
            self.last_instrument = gesture.instrument;
            self.apply_instrument(gesture.instrument);
            self.release_note()?;
            if self.config.insert_on_instrument_change && gesture.recording {
                self.insert_new_track()?;
            }
        }

        // ── 2. Watchdog ──────────────────────────────────────────────────
        let stale = self.check_watchdog(sensor, now)?;

        // ── 3. Recording edges ───────────────────────────────────────────
        self.handle_recording_edge(gesture, now)?;
        let muted = self.state.mute_until.map_or(false, |until| now < until);

        // ── 4. Gate ──────────────────────────────────────────────────────
        if gesture.mode != Mode::Play || muted || stale {
            self.release_note()?;
            self.state.was_note_playing = false;
            return Ok(());
        }

        // ── 5. Drum impulse ──────────────────────────────────────────────
        if self.current_is_drum {
            self.release_note()?;
            if !self.state.was_note_playing && gesture.note_gate {
                let velocity = sensor
                    .hit_velocity
                    .unwrap_or(self.config.drum_velocity_default);
                self.trigger_drum(velocity)?;
            }
            self.state.was_note_playing = gesture.note_gate;
            return Ok(());
        }

        // ── 6. Pitched note ──────────────────────────────────────────────
        let Some(dist_cm) = sensor.dist_cm else {
            self.release_note()?;
            self.state.was_note_playing = false;
            return Ok(());
        };
        if !gesture.note_gate {
            self.release_note()?;
            self.state.was_note_playing = false;
            return Ok(());
        }

        let step = self.config.distance_step_cm;
        let snapped = (dist_cm / step).round() * step;
        let note = quantize_note(snapped, &self.config.mapping);
        if self.state.held_note == Some(note) {
            // Change-only emission: identical successive ticks are silent.
            return Ok(());
        }

        self.release_note()?;
        log::info!("router: pitch from distance {dist_cm:.1} cm -> note {note}");
        self.midi.musical.send(MidiMessage::NoteOn {
            channel: self.config.lead_channel,
            note,
            velocity: self.config.lead_velocity,
        })?;
        self.state.held_note = Some(note);
        self.state.was_note_playing = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn release_note(&mut self) -> Result<(), RouterError> {
        let Some(note) = self.state.held_note else {
            return Ok(());
        };
        self.midi.musical.send(MidiMessage::NoteOff {
            channel: self.config.lead_channel,
            note,
            velocity: 0,
        })?;
        log::debug!("router: note off {note}");
        self.state.held_note = None;
        Ok(())
    }

    fn trigger_drum(&mut self, velocity: u8) -> Result<(), RouterError> {
        self.midi.musical.send(MidiMessage::NoteOn {
            channel: self.config.drum_channel,
            note: self.current_drum_note,
            velocity,
        })?;
        self.midi.musical.send(MidiMessage::NoteOff {
            channel: self.config.drum_channel,
            note: self.current_drum_note,
            velocity: 0,
        })?;
        log::debug!("router: drum hit velocity {velocity}");
        Ok(())
    }

    fn check_watchdog(
        &mut self,
        sensor: &SensorSnapshot,
        now: Instant,
    ) -> Result<bool, RouterError> {
        let elapsed = now.saturating_duration_since(sensor.last_rx);
        if elapsed >= self.config.watchdog {
            if !self.watchdog_tripped {
                log::warn!("router: watchdog tripped after {:.3} s", elapsed.as_secs_f64());
                self.watchdog_tripped = true;
            }
            self.release_note()?;
            return Ok(true);
        }
        if self.watchdog_tripped {
            log::info!("router: watchdog recovered");
            self.watchdog_tripped = false;
        }
        Ok(false)
    }

    fn handle_recording_edge(
        &mut self,
        gesture: &GestureState,
        now: Instant,
    ) -> Result<(), RouterError> {
        if !self.state.was_recording && gesture.recording {
            log::info!("router: recording started");
            self.send_control(self.config.record_cc)?;
            if self.config.insert_on_record_start {
                self.insert_new_track()?;
            }
            self.state.mute_until = Some(now + self.config.countin_duration());
            self.state.was_recording = true;
            self.release_note()?;
        } else if self.state.was_recording && !gesture.recording {
            log::info!("router: recording stopped");
            self.send_control(self.config.record_cc)?;
            self.state.was_recording = false;
            self.state.mute_until = None;
        }
        Ok(())
    }

    fn send_control(&mut self, controller: u8) -> Result<(), RouterError> {
        self.midi.control.send(MidiMessage::ControlChange {
            channel: self.config.control_channel,
            controller,
            value: 127,
        })?;
        Ok(())
    }

    fn insert_new_track(&mut self) -> Result<(), RouterError> {
        log::info!("router: requesting new DAW track");
        self.send_control(self.config.insert_track_cc)
    }

    fn apply_instrument(&mut self, instrument: Option<usize>) {
        let entry = instrument.and_then(|i| self.config.instruments.get(i));
        match entry {
            Some(entry) if entry.kind == InstrumentKind::Drum => {
                self.current_is_drum = true;
                self.current_drum_note = entry.note.unwrap_or(self.config.drum_note);
            }
            Some(entry) => {
                self.current_is_drum = false;
                if let Some(program) = entry.program {
                    // A missed program change only affects timbre; the tick
                    // must not die for it.
                    match self.midi.musical.send(MidiMessage::ProgramChange {
                        channel: self.config.lead_channel,
                        program,
                    }) {
                        Ok(()) => log::info!("router: program change {program}"),
                        Err(e) => log::warn!("router: program change failed: {e}"),
                    }
                }
            }
            None => {
                self.current_is_drum = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
