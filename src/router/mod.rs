//! Router-node decision core — distance → note mapping and the per-tick
//! music router.

pub mod mapping;
pub mod music;

pub use mapping::{clamp_distance, interpolate_note, quantize_note, MappingError, NoteMapping};
pub use music::{MusicRouter, RouterConfig, RouterError, RouterState};
