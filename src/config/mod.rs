//! Configuration for both nodes.
//!
//! Provides `SensorNodeConfig` and `RouterNodeConfig` with per-subsystem
//! sub-structs, TOML persistence via `load_from` / `save_to`, and fail-fast
//! `validate()` — a node refuses to start on any invalid range.

pub mod settings;

pub use settings::{
    ConfigError, DistanceConfig, FilterConfig, GestureConfig, HitConfig, InstrumentEntry,
    InstrumentKind, LinkConfig, MappingConfig, MidiConfig, RouterNodeConfig, RouterSettings,
    SensorNodeConfig, SimulatorConfig, TelemetryConfig, TransportConfig,
};
