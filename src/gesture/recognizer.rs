//! The debounced gesture state machine.
//!
//! # States and transitions
//!
//! ```text
//!            fist edge (commits candidate)
//! SELECT ───────────────────────────────▶ PLAY
//!   ▲                                       │
//!   │  fist edge (hand present;             │ arm combo held for the
//!   │  also clears recording)               │ dwell time → recording
//!   └───────────────────────────────────────┘
//! ```
//!
//! Every raw signal is debounced before it may drive a transition:
//!
//! * a *fist* is trusted only after the raw reading holds for
//!   `fist_stable_ms`;
//! * the finger count becomes the *candidate* instrument after
//!   `select_stable_ms`, and auto-commits after `select_commit_ms`;
//! * arming is inhibited on PLAY entry until the combo is seen released
//!   once, then requires a continuous `arm_dwell_ms` hold;
//! * the pinch note gate uses separate enter/exit thresholds;
//! * a detection dropout shorter than `hand_grace_ms` still counts as
//!   "hand present".
//!
//! The per-frame output is a pure function of the accumulated timers and the
//! observation history; `update` takes `now` explicitly so tests drive the
//! clock.

use std::time::{Duration, Instant};

use crate::config::GestureConfig;

use super::hand::{finger_state, pinch_distance_px, HandObservation};

// ---------------------------------------------------------------------------
// GestureState
// ---------------------------------------------------------------------------

/// Router-facing mode: instrument selection vs. performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Select,
    Play,
}

/// The recognizer's per-frame output, read-only to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureState {
    /// Active instrument index into the configured instrument list.
    pub instrument: Option<usize>,
    pub mode: Mode,
    pub recording: bool,
    /// Whether a note should sound (pitched instruments) or fire (drums).
    pub note_gate: bool,
}

// ---------------------------------------------------------------------------
// GestureRecognizer
// ---------------------------------------------------------------------------

/// Debounced SELECT/PLAY state machine over a stream of hand observations.
pub struct GestureRecognizer {
    // Thresholds
    fist_stable: Duration,
    select_stable: Duration,
    select_commit: Duration,
    arm_dwell: Duration,
    hand_grace: Duration,
    pinch_on_px: f64,
    pinch_off_px: f64,
    ignore_idle_count: bool,
    thumb_invert: bool,
    handedness_invert: bool,
    instrument_count: usize,

    // Mode state
    mode: Mode,
    recording: bool,
    note_gate: bool,
    instrument: Option<usize>,
    candidate: Option<usize>,

    // Debounce state
    last_count: Option<u8>,
    last_count_change: Instant,
    fist_raw: bool,
    last_fist_change: Instant,
    prev_fist: bool,
    last_hand_seen: Instant,
    arm_ready: bool,
    prev_arm_combo: bool,
    arm_start: Option<Instant>,
    prev_pinch: bool,
}

impl GestureRecognizer {
    /// `instrument_count` bounds the finger-count → instrument mapping:
    /// `n` extended fingers select entry `n - 1`.
    pub fn new(config: &GestureConfig, instrument_count: usize, now: Instant) -> Self {
        Self {
            fist_stable: Duration::from_millis(config.fist_stable_ms),
            select_stable: Duration::from_millis(config.select_stable_ms),
            select_commit: Duration::from_millis(config.select_commit_ms),
            arm_dwell: Duration::from_millis(config.arm_dwell_ms),
            hand_grace: Duration::from_millis(config.hand_grace_ms),
            pinch_on_px: config.pinch_on_px,
            pinch_off_px: config.pinch_on_px + config.pinch_hysteresis_px,
            ignore_idle_count: config.ignore_idle_count,
            thumb_invert: config.thumb_invert,
            handedness_invert: config.handedness_invert,
            instrument_count,

            mode: Mode::Select,
            recording: false,
            note_gate: false,
            instrument: None,
            candidate: None,

            last_count: None,
            last_count_change: now,
            fist_raw: false,
            last_fist_change: now,
            prev_fist: false,
            last_hand_seen: now,
            arm_ready: false,
            prev_arm_combo: false,
            arm_start: None,
            prev_pinch: false,
        }
    }

    /// Feed one frame's observation (or its absence) and get the new state.
    pub fn update(&mut self, obs: Option<&HandObservation>, now: Instant) -> GestureState {
        let (count, arm_combo, pinch_px) = match obs {
            Some(obs) => {
                let fingers = finger_state(obs, self.thumb_invert, self.handedness_invert);
                (
                    fingers.extended_count(),
                    fingers.arm_combo(),
                    Some(pinch_distance_px(obs)),
                )
            }
            None => (0, false, None),
        };

        if obs.is_some() {
            self.last_hand_seen = now;
        }
        let present = obs.is_some()
            || now.saturating_duration_since(self.last_hand_seen) <= self.hand_grace;

        self.step_modes(count, arm_combo, present, now);
        self.step_note_gate(pinch_px, arm_combo);
        self.state()
    }

    /// Current output without advancing any timer.
    pub fn state(&self) -> GestureState {
        GestureState {
            instrument: self.instrument,
            mode: self.mode,
            recording: self.recording,
            note_gate: self.note_gate,
        }
    }

    /// The debounced but not-yet-committed instrument candidate.
    pub fn candidate(&self) -> Option<usize> {
        self.candidate
    }

    // -----------------------------------------------------------------------
    // Mode transitions
    // -----------------------------------------------------------------------

    fn step_modes(&mut self, count: u8, arm_combo: bool, present: bool, now: Instant) {
        // Fist stability debounce: a raw fist is trusted only after it holds.
        let fist_raw = count == 0;
        if fist_raw != self.fist_raw {
            self.fist_raw = fist_raw;
            self.last_fist_change = now;
        }
        let fist_stable =
            now.saturating_duration_since(self.last_fist_change) >= self.fist_stable;
        let fist = fist_raw && fist_stable;

        // Transitions are evaluated against the mode at the start of the
        // frame so one frame can never chain two transitions.
        let start_mode = self.mode;

        if start_mode == Mode::Select {
            self.step_select(count, fist, now);
        }

        if start_mode == Mode::Play && !self.recording {
            if present && fist && !self.prev_fist {
                self.mode = Mode::Select;
                log::info!("gesture: play -> select (fist)");
            }
            self.step_arming(arm_combo, now);
        }

        if start_mode == Mode::Play && self.recording && present && fist && !self.prev_fist {
            self.recording = false;
            self.mode = Mode::Select;
            log::info!("gesture: recording stopped, play -> select (fist)");
        }

        self.prev_fist = fist;
    }

    fn step_select(&mut self, count: u8, fist: bool, now: Instant) {
        if self.last_count != Some(count) {
            self.last_count = Some(count);
            self.last_count_change = now;
        }
        let stable_for = now.saturating_duration_since(self.last_count_change);

        if stable_for >= self.select_stable {
            let idle = self.ignore_idle_count && count == 5;
            if !idle {
                let cand = self.candidate_for(count);
                self.candidate = cand;
                // Dwell auto-commit is checked before the fist edge below;
                // when both land in one frame the dwell commit wins the
                // instrument and the fist still enters PLAY.
                if stable_for >= self.select_commit
                    && cand.is_some()
                    && cand != self.instrument
                {
                    self.instrument = cand;
                    log::info!(
                        "gesture: instrument committed by dwell -> {:?}",
                        self.instrument
                    );
                }
            }
        }

        if fist && !self.prev_fist {
            if self.candidate.is_some() {
                self.instrument = self.candidate;
            }
            self.mode = Mode::Play;
            log::info!(
                "gesture: select -> play (fist), instrument {:?}",
                self.instrument
            );
            // Arming starts inhibited: the combo must be seen released once
            // before a new hold can arm, so a combo carried through the
            // transition cannot immediately start recording.
            self.arm_ready = false;
            self.prev_arm_combo = true;
            self.arm_start = None;
        }
    }

    fn step_arming(&mut self, arm_combo: bool, now: Instant) {
        if !self.arm_ready && !arm_combo {
            self.arm_ready = true;
        }
        if self.arm_ready && arm_combo && !self.prev_arm_combo {
            self.arm_start = Some(now);
        }
        if self.arm_ready && arm_combo && self.prev_arm_combo {
            if let Some(started) = self.arm_start {
                if now.saturating_duration_since(started) >= self.arm_dwell {
                    self.recording = true;
                    self.arm_start = None;
                    log::info!("gesture: armed, recording started");
                }
            }
        }
        if !arm_combo {
            self.arm_start = None;
        }
        self.prev_arm_combo = arm_combo;
    }

    fn candidate_for(&self, count: u8) -> Option<usize> {
        let count = count as usize;
        if count >= 1 && count <= self.instrument_count {
            Some(count - 1)
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Note gate
    // -----------------------------------------------------------------------

    fn step_note_gate(&mut self, pinch_px: Option<f64>, arm_combo: bool) {
        if self.mode != Mode::Play || self.instrument.is_none() {
            self.note_gate = false;
            self.prev_pinch = false;
            return;
        }
        // No measurement: hold the gate where it is rather than guessing.
        let Some(px) = pinch_px else {
            return;
        };

        let threshold = if self.prev_pinch {
            self.pinch_off_px
        } else {
            self.pinch_on_px
        };
        // Arming and performance gestures are mutually exclusive.
        let pinched = px < threshold && !arm_combo;

        if pinched && !self.prev_pinch {
            self.note_gate = true;
        } else if !pinched && self.prev_pinch {
            self.note_gate = false;
        }
        self.prev_pinch = pinched;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::hand::{Handedness, Point2, LANDMARK_COUNT};

    const TIP: [usize; 5] = [4, 8, 12, 16, 20];
    const PIP: [usize; 5] = [3, 6, 10, 14, 18];

    fn config() -> GestureConfig {
        GestureConfig {
            fist_stable_ms: 150,
            select_stable_ms: 400,
            select_commit_ms: 1000,
            arm_dwell_ms: 250,
            hand_grace_ms: 200,
            pinch_on_px: 40.0,
            pinch_hysteresis_px: 6.0,
            ignore_idle_count: true,
            thumb_invert: false,
            handedness_invert: false,
        }
    }

    /// The arming pattern: thumb, middle and ring retracted, index and
    /// pinky free.  Reads as an extended-finger count of 2.
    const ARM: [bool; 5] = [false, true, false, false, true];

    /// First `n` fingers extended, thumb first.
    fn counted(n: u8) -> [bool; 5] {
        let mut fingers = [false; 5];
        for (i, f) in fingers.iter_mut().enumerate() {
            *f = (i as u8) < n;
        }
        fingers
    }

    /// Build a right-hand observation with the given per-finger extension
    /// and a thumb-to-index tip distance of `pinch_px` on a 1000 px frame.
    ///
    /// The four non-thumb fingers use deep joints (y = 0.7) so an extended
    /// index tip can sit right next to the thumb tip without reading as
    /// retracted.
    fn obs(fingers: [bool; 5], pinch_px: f64) -> HandObservation {
        let mut points = [Point2 { x: 0.5, y: 0.5 }; LANDMARK_COUNT];

        for i in 1..5 {
            points[PIP[i]] = Point2 {
                x: 0.3 + 0.1 * i as f32,
                y: 0.7,
            };
            points[TIP[i]] = Point2 {
                x: 0.3 + 0.1 * i as f32,
                y: if fingers[i] { 0.3 } else { 0.9 },
            };
        }
        // Thumb extends sideways on a right hand.
        points[PIP[0]] = Point2 { x: 0.3, y: 0.3 };
        points[TIP[0]] = Point2 {
            x: if fingers[0] { 0.4 } else { 0.2 },
            y: 0.3,
        };

        // Place the index tip `pinch_px` from the thumb tip along x, at the
        // y its extension state dictates.
        let thumb = points[TIP[0]];
        points[TIP[1]] = Point2 {
            x: thumb.x + (pinch_px / 1000.0) as f32,
            y: if fingers[1] { 0.3 } else { 0.9 },
        };

        HandObservation {
            points,
            handedness: Handedness::Right,
            frame_w: 1000,
            frame_h: 1000,
        }
    }

    fn recognizer(instruments: usize) -> (GestureRecognizer, Instant) {
        let t0 = Instant::now();
        (GestureRecognizer::new(&config(), instruments, t0), t0)
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    // --- selection ---

    #[test]
    fn flicker_below_stable_duration_never_sets_candidate() {
        let (mut rec, t0) = recognizer(5);

        // Alternate 3 and 4 fingers every 100 ms — never stable for 400 ms.
        for i in 0..8u64 {
            let count = if i % 2 == 0 { 3 } else { 4 };
            rec.update(Some(&obs(counted(count), 200.0)), at(t0, i * 100));
        }
        assert_eq!(rec.candidate(), None);
        assert_eq!(rec.state().instrument, None);
    }

    #[test]
    fn stable_count_becomes_candidate_then_commits_by_dwell() {
        let (mut rec, t0) = recognizer(5);

        // Flicker first, then hold three fingers.
        rec.update(Some(&obs(counted(3), 200.0)), at(t0, 0));
        rec.update(Some(&obs(counted(4), 200.0)), at(t0, 100));
        rec.update(Some(&obs(counted(3), 200.0)), at(t0, 200));

        // 399 ms of stability: not yet a candidate.
        rec.update(Some(&obs(counted(3), 200.0)), at(t0, 599));
        assert_eq!(rec.candidate(), None);

        // 400 ms: candidate is index 2 (three fingers), not yet committed.
        rec.update(Some(&obs(counted(3), 200.0)), at(t0, 600));
        assert_eq!(rec.candidate(), Some(2));
        assert_eq!(rec.state().instrument, None);

        // 1000 ms of stability: committed.
        rec.update(Some(&obs(counted(3), 200.0)), at(t0, 1200));
        assert_eq!(rec.state().instrument, Some(2));
    }

    #[test]
    fn idle_five_finger_count_is_not_a_candidate() {
        let (mut rec, t0) = recognizer(5);
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, 0));
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, 1500));
        assert_eq!(rec.candidate(), None);
        assert_eq!(rec.state().instrument, None);
    }

    #[test]
    fn count_beyond_instrument_list_is_not_a_candidate() {
        let (mut rec, t0) = recognizer(2);
        rec.update(Some(&obs(counted(4), 200.0)), at(t0, 0));
        rec.update(Some(&obs(counted(4), 200.0)), at(t0, 500));
        assert_eq!(rec.candidate(), None);
    }

    // --- fist commit and mode transitions ---

    /// Drive the recognizer into PLAY with instrument index 1 committed
    /// (two fingers, then a stabilized fist).  Returns the next free time.
    fn enter_play(rec: &mut GestureRecognizer, t0: Instant) -> u64 {
        rec.update(Some(&obs(counted(2), 200.0)), at(t0, 0));
        rec.update(Some(&obs(counted(2), 200.0)), at(t0, 450));
        assert_eq!(rec.candidate(), Some(1));

        // Fist: raw immediately, trusted after 150 ms of stability.
        rec.update(Some(&obs(counted(0), 200.0)), at(t0, 500));
        rec.update(Some(&obs(counted(0), 200.0)), at(t0, 660));
        assert_eq!(rec.state().mode, Mode::Play);
        assert_eq!(rec.state().instrument, Some(1));
        700
    }

    #[test]
    fn fist_commits_candidate_and_enters_play() {
        let (mut rec, t0) = recognizer(5);
        enter_play(&mut rec, t0);
    }

    #[test]
    fn single_frame_fist_does_not_transition() {
        let (mut rec, t0) = recognizer(5);
        rec.update(Some(&obs(counted(2), 200.0)), at(t0, 0));
        rec.update(Some(&obs(counted(0), 200.0)), at(t0, 100));
        // Fist released before the stability window elapsed.
        rec.update(Some(&obs(counted(2), 200.0)), at(t0, 150));
        rec.update(Some(&obs(counted(2), 200.0)), at(t0, 400));
        assert_eq!(rec.state().mode, Mode::Select);
    }

    #[test]
    fn fist_in_play_returns_to_select() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);

        // Open the hand, then fist again.
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));
        rec.update(Some(&obs(counted(0), 200.0)), at(t0, t + 100));
        rec.update(Some(&obs(counted(0), 200.0)), at(t0, t + 300));
        assert_eq!(rec.state().mode, Mode::Select);
        // The committed instrument survives the trip back.
        assert_eq!(rec.state().instrument, Some(1));
    }

    #[test]
    fn short_dropout_does_not_exit_play() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));

        // 100 ms without detection — inside both grace and fist stability.
        rec.update(None, at(t0, t + 50));
        rec.update(None, at(t0, t + 100));
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t + 150));
        assert_eq!(rec.state().mode, Mode::Play);
    }

    // --- arming ---

    #[test]
    fn combo_held_through_play_entry_cannot_arm() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);

        // Hold the arm combo continuously from PLAY entry far past the dwell.
        for i in 0..10u64 {
            rec.update(Some(&obs(ARM, 200.0)), at(t0, t + i * 100));
        }
        assert!(!rec.state().recording, "inhibited until the combo releases");
    }

    #[test]
    fn combo_dwell_after_release_starts_recording() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);

        // Release the combo once (open hand), then hold it for the dwell.
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 100));
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 200));
        assert!(!rec.state().recording, "dwell not yet elapsed");
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 360));
        assert!(rec.state().recording);
    }

    #[test]
    fn breaking_the_combo_cancels_the_dwell() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);

        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 100));
        // Break at 200 ms, resume at 250 ms: the timer must restart.
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t + 200));
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 250));
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 450));
        assert!(!rec.state().recording, "250 ms must be continuous");
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 510));
        assert!(rec.state().recording);
    }

    #[test]
    fn fist_stops_recording_and_returns_to_select() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);

        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 100));
        rec.update(Some(&obs(ARM, 200.0)), at(t0, t + 400));
        assert!(rec.state().recording);

        rec.update(Some(&obs(counted(0), 200.0)), at(t0, t + 500));
        rec.update(Some(&obs(counted(0), 200.0)), at(t0, t + 700));
        assert!(!rec.state().recording);
        assert_eq!(rec.state().mode, Mode::Select);
    }

    // --- note gate ---

    #[test]
    fn pinch_toggles_gate_in_play_only() {
        let (mut rec, t0) = recognizer(5);

        // Pinching in SELECT does nothing.
        rec.update(Some(&obs(counted(2), 10.0)), at(t0, 0));
        assert!(!rec.state().note_gate);

        let t = enter_play(&mut rec, t0);
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));

        // Pinch closes → gate on; pinch opens → gate off.
        rec.update(Some(&obs(counted(2), 10.0)), at(t0, t + 100));
        assert!(rec.state().note_gate);
        rec.update(Some(&obs(counted(2), 200.0)), at(t0, t + 200));
        assert!(!rec.state().note_gate);
    }

    #[test]
    fn pinch_hysteresis_holds_the_gate_inside_the_band() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));

        rec.update(Some(&obs(counted(2), 30.0)), at(t0, t + 100));
        assert!(rec.state().note_gate);

        // 43 px: above the 40 px enter threshold, below the 46 px exit.
        rec.update(Some(&obs(counted(2), 43.0)), at(t0, t + 200));
        assert!(rec.state().note_gate, "inside the band the gate holds");

        rec.update(Some(&obs(counted(2), 47.0)), at(t0, t + 300));
        assert!(!rec.state().note_gate);

        // 43 px again: now below the exit threshold but above enter — the
        // gate must stay off.
        rec.update(Some(&obs(counted(2), 43.0)), at(t0, t + 400));
        assert!(!rec.state().note_gate);
    }

    #[test]
    fn arm_combo_suppresses_the_gate() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));

        // A tight pinch while the arm combo is held must not open the gate.
        rec.update(Some(&obs(ARM, 10.0)), at(t0, t + 100));
        assert!(!rec.state().note_gate);
    }

    #[test]
    fn leaving_play_forces_the_gate_off() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));
        rec.update(Some(&obs(counted(2), 10.0)), at(t0, t + 100));
        assert!(rec.state().note_gate);

        rec.update(Some(&obs(counted(0), 200.0)), at(t0, t + 200));
        rec.update(Some(&obs(counted(0), 200.0)), at(t0, t + 400));
        assert_eq!(rec.state().mode, Mode::Select);
        assert!(!rec.state().note_gate);
    }

    #[test]
    fn missing_measurement_does_not_toggle_the_gate() {
        let (mut rec, t0) = recognizer(5);
        let t = enter_play(&mut rec, t0);
        rec.update(Some(&obs(counted(5), 200.0)), at(t0, t));
        rec.update(Some(&obs(counted(2), 10.0)), at(t0, t + 100));
        assert!(rec.state().note_gate);

        // Dropout inside the grace window: the gate holds its last value.
        rec.update(None, at(t0, t + 150));
        assert!(rec.state().note_gate);
    }
}
