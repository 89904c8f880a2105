//! Linear distance-to-note mapping.
//!
//! [`NoteMapping`] is validated at construction — an inverted range is a
//! fatal configuration error, never silently reordered.  [`quantize_note`]
//! is the hot-path entry: clamp, interpolate, round half-up, clamp again to
//! the note bounds.

use thiserror::Error;

// ---------------------------------------------------------------------------
// MappingError
// ---------------------------------------------------------------------------

/// Invalid mapping bounds.
#[derive(Debug, Clone, Error)]
pub enum MappingError {
    #[error("mapping.d_min_cm ({0}) must be less than mapping.d_max_cm ({1})")]
    InvertedDistance(f64, f64),

    #[error("mapping.note_lo ({0}) must not exceed mapping.note_hi ({1})")]
    InvertedNotes(u8, u8),
}

// ---------------------------------------------------------------------------
// NoteMapping
// ---------------------------------------------------------------------------

/// Parameters of a linear distance → MIDI note mapping.
///
/// Invariants (enforced by [`NoteMapping::new`]): `d_min_cm < d_max_cm` and
/// `note_lo <= note_hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteMapping {
    d_min_cm: f64,
    d_max_cm: f64,
    note_lo: u8,
    note_hi: u8,
}

impl NoteMapping {
    pub fn new(d_min_cm: f64, d_max_cm: f64, note_lo: u8, note_hi: u8) -> Result<Self, MappingError> {
        if d_min_cm >= d_max_cm {
            return Err(MappingError::InvertedDistance(d_min_cm, d_max_cm));
        }
        if note_lo > note_hi {
            return Err(MappingError::InvertedNotes(note_lo, note_hi));
        }
        Ok(Self {
            d_min_cm,
            d_max_cm,
            note_lo,
            note_hi,
        })
    }

    pub fn d_min_cm(&self) -> f64 {
        self.d_min_cm
    }

    pub fn d_max_cm(&self) -> f64 {
        self.d_max_cm
    }

    pub fn note_lo(&self) -> u8 {
        self.note_lo
    }

    pub fn note_hi(&self) -> u8 {
        self.note_hi
    }
}

// ---------------------------------------------------------------------------
// Mapping functions
// ---------------------------------------------------------------------------

/// Clamp a distance reading into the configured range.
pub fn clamp_distance(dist_cm: f64, mapping: &NoteMapping) -> f64 {
    dist_cm.max(mapping.d_min_cm).min(mapping.d_max_cm)
}

/// Interpolate a floating-point note number from the distance.
pub fn interpolate_note(dist_cm: f64, mapping: &NoteMapping) -> f64 {
    let distance_span = mapping.d_max_cm - mapping.d_min_cm;
    let note_span = (mapping.note_hi - mapping.note_lo) as f64;
    if note_span == 0.0 {
        return mapping.note_lo as f64;
    }
    let ratio = (dist_cm - mapping.d_min_cm) / distance_span;
    mapping.note_lo as f64 + ratio * note_span
}

/// Map a distance in centimetres to an integer MIDI note.
///
/// Linear between the configured bounds, rounded to the nearest semitone
/// with exact midpoints rounding up, clamped to `[note_lo, note_hi]`.
pub fn quantize_note(dist_cm: f64, mapping: &NoteMapping) -> u8 {
    let clamped = clamp_distance(dist_cm, mapping);
    let note = interpolate_note(clamped, mapping);
    let quantized = (note + 0.5).floor() as i64;
    quantized.clamp(mapping.note_lo as i64, mapping.note_hi as i64) as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
