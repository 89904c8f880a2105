//! Node configuration structs, defaults, TOML persistence and validation.
//!
//! Each node binary loads one top-level struct — [`SensorNodeConfig`] for the
//! sensor node, [`RouterNodeConfig`] for the router node.  Both implement
//! `Serialize`, `Deserialize`, `Default` and `Clone` so they can be
//! round-tripped through TOML files and shared across threads.
//!
//! A missing file yields the defaults (first-run scenario), but
//! [`SensorNodeConfig::validate`] / [`RouterNodeConfig::validate`] must pass
//! before a node starts.  Invalid ranges are a fatal startup error, never
//! silently substituted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::router::mapping::{MappingError, NoteMapping};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialise config: {0}")]
    Serialise(#[from] toml::ser::Error),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A value that must be strictly positive was zero or negative.
    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// A value that may be zero but never negative was negative.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// A MIDI channel outside the user-facing 1–16 range.
    #[error("MIDI channel {field} must be 1-16, got {value}")]
    ChannelOutOfRange { field: &'static str, value: u8 },

    /// A MIDI data byte (note, velocity, CC number) outside 0–127.
    #[error("{field} must be 0-127, got {value}")]
    DataByteOutOfRange { field: &'static str, value: u8 },

    #[error("filters.ema_alpha must be within [0, 1], got {0}")]
    AlphaOutOfRange(f64),

    #[error("filters.median_window must be at least 1")]
    EmptyMedianWindow,

    #[error("telemetry.queue_size must be at least 1")]
    EmptyQueue,

    #[error("hit.velocity_min ({min}) must not exceed hit.velocity_max ({max})")]
    VelocityBoundsInverted { min: u8, max: u8 },

    #[error("hit.min_speed_cm_s ({min}) must be less than hit.max_speed_cm_s ({max})")]
    SpeedBoundsInverted { min: f64, max: f64 },

    #[error("distance.min_cm ({min}) must be less than distance.max_cm ({max})")]
    DistanceBoundsInverted { min: f64, max: f64 },

    #[error("at least one instrument must be configured")]
    NoInstruments,
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

fn check_channel(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if (1..=16).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ChannelOutOfRange { field, value })
    }
}

fn check_data_byte(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if value <= 127 {
        Ok(())
    } else {
        Err(ConfigError::DataByteOutOfRange { field, value })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn load_toml<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn save_toml<T: Serialize>(value: &T, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Sensor node
// ---------------------------------------------------------------------------

/// Sensing range and ambient temperature used for echo conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceConfig {
    /// Lower clamp bound of the sensing range (cm).
    pub min_cm: f64,
    /// Upper clamp bound of the sensing range (cm).
    pub max_cm: f64,
    /// Ambient temperature (°C) used to estimate the speed of sound.
    pub temp_c: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            min_cm: 15.0,
            max_cm: 60.0,
            temp_c: 20.0,
        }
    }
}

/// Median / EMA smoothing applied to raw distance readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Number of trailing samples the median filter keeps.
    pub median_window: usize,
    /// EMA smoothing factor in `[0, 1]`.  `0.0` disables the EMA stage.
    pub ema_alpha: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            median_window: 5,
            ema_alpha: 0.25,
        }
    }
}

/// Outbound telemetry target and queue sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Router node address.
    pub host: String,
    /// Router node UDP port.
    pub port: u16,
    /// Bounded outbound queue capacity.
    pub queue_size: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 9000,
            queue_size: 64,
        }
    }
}

/// Hit detector thresholds and velocity curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitConfig {
    /// Whether percussive hit detection runs at all.
    pub enabled: bool,
    /// Trigger threshold (cm).  Firing requires `cm < threshold - hysteresis`.
    pub threshold_cm: f64,
    /// Hysteresis half-band (cm).  Re-arming requires `cm > threshold + hysteresis`.
    pub hysteresis_cm: f64,
    /// Minimum time between hits (ms).
    pub refractory_ms: u64,
    /// Velocity emitted at or below `min_speed_cm_s`.
    pub velocity_min: u8,
    /// Velocity emitted at or above `max_speed_cm_s`.
    pub velocity_max: u8,
    /// Approach speed mapped to `velocity_min` (cm/s).
    pub min_speed_cm_s: f64,
    /// Approach speed mapped to `velocity_max` (cm/s).
    pub max_speed_cm_s: f64,
    /// Fallback velocity when no approach speed can be computed.
    pub fixed_velocity: u8,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_cm: 25.0,
            hysteresis_cm: 2.0,
            refractory_ms: 200,
            velocity_min: 30,
            velocity_max: 127,
            min_speed_cm_s: 5.0,
            max_speed_cm_s: 120.0,
            fixed_velocity: 100,
        }
    }
}

/// Simulated sensor waveform used when no hardware is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Distances (cm) the simulated sensor cycles through, one per tick.
    pub waveform_cm: Vec<f64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            waveform_cm: vec![40.0],
        }
    }
}

/// Top-level configuration for the sensor node binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorNodeConfig {
    /// Log filter passed to `env_logger` (e.g. `"info"`, `"debug"`).
    pub log_level: String,
    /// Acquisition rate in Hz.
    pub cycle_hz: f64,
    /// Echo pulses longer than this are discarded as timeouts (µs).
    pub echo_timeout_us: u64,
    pub distance: DistanceConfig,
    pub filters: FilterConfig,
    pub telemetry: TelemetryConfig,
    pub hit: HitConfig,
    pub simulator: SimulatorConfig,
}

impl Default for SensorNodeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            cycle_hz: 100.0,
            echo_timeout_us: 30_000,
            distance: DistanceConfig::default(),
            filters: FilterConfig::default(),
            telemetry: TelemetryConfig::default(),
            hit: HitConfig::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl SensorNodeConfig {
    /// Load from `path`, returning the defaults when the file does not exist
    /// yet.  Call [`validate`](Self::validate) before using the result.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        save_toml(self, path)
    }

    /// Check every invariant the sensor node relies on.  Any violation is a
    /// fatal startup error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("cycle_hz", self.cycle_hz)?;
        if self.distance.min_cm >= self.distance.max_cm {
            return Err(ConfigError::DistanceBoundsInverted {
                min: self.distance.min_cm,
                max: self.distance.max_cm,
            });
        }
        if self.filters.median_window == 0 {
            return Err(ConfigError::EmptyMedianWindow);
        }
        if !(0.0..=1.0).contains(&self.filters.ema_alpha) {
            return Err(ConfigError::AlphaOutOfRange(self.filters.ema_alpha));
        }
        if self.telemetry.queue_size == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        check_data_byte("hit.velocity_min", self.hit.velocity_min)?;
        check_data_byte("hit.velocity_max", self.hit.velocity_max)?;
        check_data_byte("hit.fixed_velocity", self.hit.fixed_velocity)?;
        if self.hit.velocity_min > self.hit.velocity_max {
            return Err(ConfigError::VelocityBoundsInverted {
                min: self.hit.velocity_min,
                max: self.hit.velocity_max,
            });
        }
        if self.hit.min_speed_cm_s >= self.hit.max_speed_cm_s {
            return Err(ConfigError::SpeedBoundsInverted {
                min: self.hit.min_speed_cm_s,
                max: self.hit.max_speed_cm_s,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Router node
// ---------------------------------------------------------------------------

/// UDP endpoint the router listens on for sensor telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9000,
        }
    }
}

/// Router tick rate, watchdog and track-insertion policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Decision tick rate in Hz.
    pub tick_hz: f64,
    /// Telemetry staleness timeout in seconds.
    pub watchdog_s: f64,
    /// Snap distance readings to buckets of this size before quantizing,
    /// damping note flutter from sensor noise.
    pub distance_step_cm: f64,
    /// Emit an insert-track CC when the instrument changes mid-recording.
    pub auto_insert_track_on_instrument_change: bool,
    /// Emit an insert-track CC when recording starts.
    pub auto_insert_track_on_record_start: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            tick_hz: 100.0,
            watchdog_s: 0.5,
            distance_step_cm: 5.0,
            auto_insert_track_on_instrument_change: false,
            auto_insert_track_on_record_start: false,
        }
    }
}

/// Musical transport: tempo and count-in length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub bpm: f64,
    pub countin_beats: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            countin_beats: 4,
        }
    }
}

/// MIDI port names, channels and controller numbers.
///
/// Channels are user-facing 1–16; the wire translation to 0-based happens in
/// [`crate::midi::Channel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Output port carrying notes and program changes.
    pub musical_port: String,
    /// Output port carrying transport control changes.
    pub control_port: String,
    pub lead_channel: u8,
    pub drum_channel: u8,
    pub control_channel: u8,
    /// Default drum note when an instrument entry does not override it.
    pub drum_note: u8,
    pub drum_velocity_default: u8,
    pub lead_velocity: u8,
    /// CC number toggling DAW record.
    pub record_cc: u8,
    /// CC number requesting a new DAW track.
    pub insert_track_cc: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            musical_port: "theremidi-musical".into(),
            control_port: "theremidi-control".into(),
            lead_channel: 1,
            drum_channel: 10,
            control_channel: 1,
            drum_note: 36,
            drum_velocity_default: 100,
            lead_velocity: 90,
            record_cc: 20,
            insert_track_cc: 21,
        }
    }
}

/// Distance-to-note mapping bounds, converted to a validated [`NoteMapping`]
/// at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    pub d_min_cm: f64,
    pub d_max_cm: f64,
    pub note_lo: u8,
    pub note_hi: u8,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            d_min_cm: 15.0,
            d_max_cm: 60.0,
            note_lo: 48,
            note_hi: 72,
        }
    }
}

impl MappingConfig {
    /// Build the validated runtime mapping.
    pub fn to_mapping(&self) -> Result<NoteMapping, MappingError> {
        NoteMapping::new(self.d_min_cm, self.d_max_cm, self.note_lo, self.note_hi)
    }
}

/// Whether an instrument sustains pitched notes or fires drum impulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Lead,
    Drum,
}

/// One selectable instrument.  Order matters: the gesture recognizer maps an
/// extended-finger count of `n` to the `n-1`th entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub label: String,
    pub kind: InstrumentKind,
    /// GM program number sent when a lead instrument becomes active.
    pub program: Option<u8>,
    /// Drum note overriding `midi.drum_note` for this entry.
    pub note: Option<u8>,
}

/// Gesture recognizer thresholds, all field-calibratable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// A fist reading must hold this long before it is trusted (ms).
    pub fist_stable_ms: u64,
    /// A finger count must hold this long to become the candidate (ms).
    pub select_stable_ms: u64,
    /// A candidate must hold this long to auto-commit (ms).
    pub select_commit_ms: u64,
    /// The arm combo must hold this long to start recording (ms).
    pub arm_dwell_ms: u64,
    /// A detection dropout shorter than this still counts as present (ms).
    pub hand_grace_ms: u64,
    /// Pinch enter threshold (px).
    pub pinch_on_px: f64,
    /// Hysteresis band added to the enter threshold for the exit test (px).
    pub pinch_hysteresis_px: f64,
    /// Exclude the idle five-finger count from instrument candidacy.
    pub ignore_idle_count: bool,
    /// Calibration: invert the thumb extension test.
    pub thumb_invert: bool,
    /// Calibration: swap the reported handedness.
    pub handedness_invert: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            fist_stable_ms: 150,
            select_stable_ms: 400,
            select_commit_ms: 1000,
            arm_dwell_ms: 250,
            hand_grace_ms: 200,
            pinch_on_px: 40.0,
            pinch_hysteresis_px: 6.0,
            ignore_idle_count: true,
            thumb_invert: true,
            handedness_invert: false,
        }
    }
}

/// Top-level configuration for the router node binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterNodeConfig {
    pub log_level: String,
    pub link: LinkConfig,
    pub router: RouterSettings,
    pub transport: TransportConfig,
    pub midi: MidiConfig,
    pub mapping: MappingConfig,
    pub instruments: Vec<InstrumentEntry>,
    pub gesture: GestureConfig,
}

impl Default for RouterNodeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            link: LinkConfig::default(),
            router: RouterSettings::default(),
            transport: TransportConfig::default(),
            midi: MidiConfig::default(),
            mapping: MappingConfig::default(),
            instruments: vec![
                InstrumentEntry {
                    label: "lead".into(),
                    kind: InstrumentKind::Lead,
                    program: Some(81),
                    note: None,
                },
                InstrumentEntry {
                    label: "drum".into(),
                    kind: InstrumentKind::Drum,
                    program: None,
                    note: Some(36),
                },
            ],
            gesture: GestureConfig::default(),
        }
    }
}

impl RouterNodeConfig {
    /// Load from `path`, returning the defaults when the file does not exist
    /// yet.  Call [`validate`](Self::validate) before using the result.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        save_toml(self, path)
    }

    /// Check every invariant the router node relies on.  Any violation is a
    /// fatal startup error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("router.tick_hz", self.router.tick_hz)?;
        check_positive("router.watchdog_s", self.router.watchdog_s)?;
        check_positive("router.distance_step_cm", self.router.distance_step_cm)?;
        check_positive("transport.bpm", self.transport.bpm)?;
        check_positive("gesture.pinch_on_px", self.gesture.pinch_on_px)?;
        if self.gesture.pinch_hysteresis_px < 0.0 {
            return Err(ConfigError::Negative {
                field: "gesture.pinch_hysteresis_px",
                value: self.gesture.pinch_hysteresis_px,
            });
        }

        check_channel("midi.lead_channel", self.midi.lead_channel)?;
        check_channel("midi.drum_channel", self.midi.drum_channel)?;
        check_channel("midi.control_channel", self.midi.control_channel)?;
        check_data_byte("midi.drum_note", self.midi.drum_note)?;
        check_data_byte("midi.drum_velocity_default", self.midi.drum_velocity_default)?;
        check_data_byte("midi.lead_velocity", self.midi.lead_velocity)?;
        check_data_byte("midi.record_cc", self.midi.record_cc)?;
        check_data_byte("midi.insert_track_cc", self.midi.insert_track_cc)?;

        self.mapping.to_mapping()?;

        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        for entry in &self.instruments {
            if let Some(program) = entry.program {
                check_data_byte("instruments.program", program)?;
            }
            if let Some(note) = entry.note {
                check_data_byte("instruments.note", note)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sensor_round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sensor.toml");

        let mut original = SensorNodeConfig::default();
        original.cycle_hz = 50.0;
        original.hit.enabled = true;
        original.simulator.waveform_cm = vec![20.0, 30.0, 40.0];
        original.save_to(&path).expect("save");

        let loaded = SensorNodeConfig::load_from(&path).expect("load");
        assert_eq!(loaded.cycle_hz, 50.0);
        assert!(loaded.hit.enabled);
        assert_eq!(loaded.simulator.waveform_cm, vec![20.0, 30.0, 40.0]);
        assert_eq!(loaded.telemetry.port, original.telemetry.port);
    }

    #[test]
    fn router_round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("router.toml");

        let mut original = RouterNodeConfig::default();
        original.router.watchdog_s = 2.5;
        original.midi.lead_channel = 3;
        original.save_to(&path).expect("save");

        let loaded = RouterNodeConfig::load_from(&path).expect("load");
        assert_eq!(loaded.router.watchdog_s, 2.5);
        assert_eq!(loaded.midi.lead_channel, 3);
        assert_eq!(loaded.instruments.len(), 2);
        assert_eq!(loaded.instruments[0].label, "lead");
        assert_eq!(loaded.instruments[1].kind, InstrumentKind::Drum);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nope.toml");

        let sensor = SensorNodeConfig::load_from(&path).expect("defaults");
        assert_eq!(sensor.cycle_hz, SensorNodeConfig::default().cycle_hz);

        let router = RouterNodeConfig::load_from(&path).expect("defaults");
        assert_eq!(
            router.router.tick_hz,
            RouterNodeConfig::default().router.tick_hz
        );
    }

    #[test]
    fn defaults_validate() {
        SensorNodeConfig::default().validate().expect("sensor defaults");
        RouterNodeConfig::default().validate().expect("router defaults");
    }

    #[test]
    fn zero_tick_rate_is_fatal() {
        let mut config = RouterNodeConfig::default();
        config.router.tick_hz = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "router.tick_hz",
                ..
            })
        ));
    }

    #[test]
    fn channel_out_of_range_is_fatal() {
        let mut config = RouterNodeConfig::default();
        config.midi.drum_channel = 17;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ChannelOutOfRange { value: 17, .. })
        ));

        config.midi.drum_channel = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_mapping_is_fatal() {
        let mut config = RouterNodeConfig::default();
        config.mapping.d_min_cm = 60.0;
        config.mapping.d_max_cm = 15.0;
        assert!(matches!(config.validate(), Err(ConfigError::Mapping(_))));
    }

    #[test]
    fn empty_instrument_list_is_fatal() {
        let mut config = RouterNodeConfig::default();
        config.instruments.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoInstruments)));
    }

    #[test]
    fn alpha_above_one_is_fatal() {
        let mut config = SensorNodeConfig::default();
        config.filters.ema_alpha = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AlphaOutOfRange(_))
        ));
    }

    #[test]
    fn inverted_velocity_bounds_are_fatal() {
        let mut config = SensorNodeConfig::default();
        config.hit.velocity_min = 100;
        config.hit.velocity_max = 50;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::VelocityBoundsInverted { min: 100, max: 50 })
        ));
    }

    #[test]
    fn inverted_sensing_range_is_fatal() {
        let mut config = SensorNodeConfig::default();
        config.distance.min_cm = 80.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DistanceBoundsInverted { .. })
        ));
    }

    #[test]
    fn instrument_order_survives_round_trip() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("order.toml");

        let mut config = RouterNodeConfig::default();
        config.instruments = vec![
            InstrumentEntry {
                label: "synth".into(),
                kind: InstrumentKind::Lead,
                program: Some(5),
                note: None,
            },
            InstrumentEntry {
                label: "kick".into(),
                kind: InstrumentKind::Drum,
                program: None,
                note: Some(36),
            },
            InstrumentEntry {
                label: "snare".into(),
                kind: InstrumentKind::Drum,
                program: None,
                note: Some(38),
            },
        ];
        config.save_to(&path).expect("save");

        let loaded = RouterNodeConfig::load_from(&path).expect("load");
        let labels: Vec<&str> = loaded.instruments.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["synth", "kick", "snare"]);
    }
}
