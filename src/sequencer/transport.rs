// Transport - Counters and configuration the scheduler advances
// Tempo, bar length, subdivision, ramp, silent bars and count-in

use super::pattern::Subdivision;
use super::timeline::{Tempo, clamp_beats_per_bar, clamp_bpm};
use crate::synth::click::ClickCategory;
use crate::synth::sound_bank::SoundId;
use serde::{Deserialize, Serialize};

/// Gradual tempo change toward a target, one step every N bars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoRamp {
    pub enabled: bool,
    pub target_bpm: f64,
    /// BPM added (or removed) per ramp boundary
    pub step: f64,
    /// Ramp boundary every this many completed bars
    pub every_bars: u32,
}

impl TempoRamp {
    pub fn new(target_bpm: f64, step: f64, every_bars: u32) -> Self {
        Self {
            enabled: true,
            target_bpm,
            step,
            every_bars,
        }
        .sanitized()
    }

    /// Clamp fields into usable ranges
    pub fn sanitized(self) -> Self {
        let step = if self.step.is_finite() { self.step.abs() } else { 0.0 };
        Self {
            enabled: self.enabled,
            target_bpm: clamp_bpm(self.target_bpm),
            step,
            every_bars: self.every_bars.max(1),
        }
    }

    /// True when `bar_count` completed bars land on a ramp boundary
    pub fn is_boundary(&self, bar_count: u64) -> bool {
        bar_count > 0 && bar_count % self.every_bars.max(1) as u64 == 0
    }

    /// Next tempo after one ramp step, never overshooting the target
    pub fn step_from(&self, bpm: f64) -> f64 {
        if bpm < self.target_bpm {
            (bpm + self.step).min(self.target_bpm)
        } else if bpm > self.target_bpm {
            (bpm - self.step).max(self.target_bpm)
        } else {
            bpm
        }
    }
}

/// Silent practice mode: N audible bars followed by M muted bars, repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilentMode {
    pub enabled: bool,
    pub audible_bars: u32,
    pub silent_bars: u32,
}

impl SilentMode {
    pub fn new(audible_bars: u32, silent_bars: u32) -> Self {
        Self {
            enabled: true,
            audible_bars,
            silent_bars,
        }
    }

    /// Whether bar number `bar_count` falls in the muted phase of the cycle
    pub fn is_muted(&self, bar_count: u64) -> bool {
        let cycle = self.audible_bars as u64 + self.silent_bars as u64;
        if !self.enabled || cycle == 0 {
            return false;
        }
        bar_count % cycle >= self.audible_bars as u64
    }
}

/// Read-only copy of the transport, for UIs and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub tempo: f64,
    pub beats_per_bar: u32,
    pub subdivision: Subdivision,
    pub subdivision_index: u32,
    pub current_beat: u32,
    pub bar_count: u64,
    pub next_onset_time: f64,
    pub is_running: bool,
    pub sound: SoundId,
    pub tempo_ramp: Option<TempoRamp>,
    pub silent_mode: SilentMode,
    pub count_in_bars: u32,
    pub count_in_remaining: u32,
}

/// Mutable transport state, owned by one scheduler
#[derive(Debug, Clone)]
pub struct TransportState {
    tempo: Tempo,
    beats_per_bar: u32,
    subdivision: Subdivision,
    subdivision_index: u32,
    current_beat: u32,
    bar_count: u64,
    next_onset_time: f64,
    is_running: bool,
    sound: SoundId,
    tempo_ramp: Option<TempoRamp>,
    silent_mode: SilentMode,
    count_in_bars: u32,
    count_in_remaining: u32,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportState {
    pub fn new() -> Self {
        Self {
            tempo: Tempo::default(),
            beats_per_bar: 4,
            subdivision: Subdivision::default(),
            subdivision_index: 0,
            current_beat: 0,
            bar_count: 0,
            next_onset_time: 0.0,
            is_running: false,
            sound: SoundId::default(),
            tempo_ramp: None,
            silent_mode: SilentMode::default(),
            count_in_bars: 0,
            count_in_remaining: 0,
        }
    }

    // ---- Commands ----

    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo.set_bpm(bpm);
    }

    pub fn set_time_signature(&mut self, beats: u32) {
        self.beats_per_bar = clamp_beats_per_bar(beats);
        if self.current_beat >= self.beats_per_bar {
            self.current_beat = 0;
        }
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) {
        self.subdivision = subdivision;
        self.subdivision_index = 0;
    }

    pub fn set_sound(&mut self, sound: SoundId) {
        self.sound = sound;
    }

    /// Replace the ramp wholesale. Never touches `bar_count`.
    pub fn set_tempo_ramp(&mut self, ramp: Option<TempoRamp>) {
        self.tempo_ramp = ramp.map(TempoRamp::sanitized);
    }

    pub fn set_silent_mode(&mut self, silent_mode: SilentMode) {
        self.silent_mode = silent_mode;
    }

    /// Count-in length applied on the next start
    pub fn set_count_in(&mut self, bars: u32) {
        self.count_in_bars = bars;
    }

    /// Reset counters and arm the transport for a run starting at `first_onset`
    pub fn begin(&mut self, bpm: f64, first_onset: f64) {
        self.tempo.set_bpm(bpm);
        self.current_beat = 0;
        self.subdivision_index = 0;
        self.bar_count = 0;
        self.count_in_remaining = self.count_in_bars;
        self.next_onset_time = first_onset;
        self.is_running = true;
    }

    /// Counters are kept so the caller can inspect where playback stopped
    pub fn halt(&mut self) {
        self.is_running = false;
    }

    // ---- Queries ----

    pub fn tempo(&self) -> f64 {
        self.tempo.bpm()
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn subdivision(&self) -> Subdivision {
        self.subdivision
    }

    pub fn subdivision_index(&self) -> u32 {
        self.subdivision_index
    }

    pub fn current_beat(&self) -> u32 {
        self.current_beat
    }

    pub fn bar_count(&self) -> u64 {
        self.bar_count
    }

    pub fn next_onset_time(&self) -> f64 {
        self.next_onset_time
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn sound(&self) -> SoundId {
        self.sound
    }

    pub fn tempo_ramp(&self) -> Option<TempoRamp> {
        self.tempo_ramp
    }

    pub fn silent_mode(&self) -> SilentMode {
        self.silent_mode
    }

    pub fn is_counting_in(&self) -> bool {
        self.count_in_remaining > 0
    }

    /// Slots per beat at the current position (count-in always clicks quarters)
    pub fn divisions(&self) -> u32 {
        if self.is_counting_in() {
            1
        } else {
            self.subdivision.divisions()
        }
    }

    pub fn is_downbeat(&self) -> bool {
        self.current_beat == 0 && self.subdivision_index == 0
    }

    /// Whether the slot at the current position produces a sound in the pattern
    pub fn slot_sounds(&self) -> bool {
        self.is_counting_in() || self.subdivision.pattern().is_onset(self.subdivision_index)
    }

    /// Click category for the current slot: cue > accent > normal
    pub fn click_category(&self) -> ClickCategory {
        if self.is_counting_in() {
            return ClickCategory::CountIn;
        }
        if self.is_cue_slot() {
            ClickCategory::Cue
        } else if self.is_downbeat() {
            ClickCategory::Accent
        } else {
            ClickCategory::Normal
        }
    }

    /// First slot of the last beat of a bar whose completion is a ramp boundary
    pub fn is_cue_slot(&self) -> bool {
        match self.tempo_ramp {
            Some(ramp) if ramp.enabled => {
                ramp.is_boundary(self.bar_count + 1)
                    && self.current_beat + 1 >= self.beats_per_bar
                    && self.subdivision_index == 0
            }
            _ => false,
        }
    }

    /// Silent-mode muting of the current bar; the count-in is never muted
    pub fn is_muted(&self) -> bool {
        !self.is_counting_in() && self.silent_mode.is_muted(self.bar_count)
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            tempo: self.tempo(),
            beats_per_bar: self.beats_per_bar,
            subdivision: self.subdivision,
            subdivision_index: self.subdivision_index,
            current_beat: self.current_beat,
            bar_count: self.bar_count,
            next_onset_time: self.next_onset_time,
            is_running: self.is_running,
            sound: self.sound,
            tempo_ramp: self.tempo_ramp,
            silent_mode: self.silent_mode,
            count_in_bars: self.count_in_bars,
            count_in_remaining: self.count_in_remaining,
        }
    }

    // ---- Advance ----

    /// Move to the next slot: time, subdivision, beat, bar, then the ramp
    ///
    /// Returns true when this step completed a bar.
    pub fn advance(&mut self) -> bool {
        let divisions = self.divisions();
        self.next_onset_time += self.tempo.onset_duration_seconds(divisions);
        self.subdivision_index += 1;

        if self.subdivision_index < divisions {
            return false;
        }
        self.subdivision_index = 0;
        self.current_beat += 1;

        if self.current_beat < self.beats_per_bar {
            return false;
        }
        self.current_beat = 0;

        if self.is_counting_in() {
            // Count-in bars don't count toward ramp or silent cycling
            self.count_in_remaining -= 1;
            return false;
        }

        self.bar_count += 1;
        self.apply_ramp_step();
        true
    }

    fn apply_ramp_step(&mut self) {
        let Some(ramp) = self.tempo_ramp else {
            return;
        };
        if !ramp.enabled || !ramp.is_boundary(self.bar_count) {
            return;
        }
        let before = self.tempo();
        let after = ramp.step_from(before);
        if after != before {
            self.tempo.set_bpm(after);
            log::debug!(
                "Tempo ramp at bar {}: {:.1} -> {:.1} BPM",
                self.bar_count,
                before,
                after
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(beats: u32, subdivision: Subdivision) -> TransportState {
        let mut state = TransportState::new();
        state.set_time_signature(beats);
        state.set_subdivision(subdivision);
        state.begin(120.0, 0.0);
        state
    }

    #[test]
    fn test_advance_wraps_beats_and_bars() {
        let mut state = running(3, Subdivision::Quarter);

        assert!(!state.advance());
        assert!(!state.advance());
        assert_eq!(state.current_beat(), 2);
        assert!(state.advance());
        assert_eq!(state.current_beat(), 0);
        assert_eq!(state.bar_count(), 1);
        assert!((state.next_onset_time() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_advance_through_subdivisions() {
        let mut state = running(2, Subdivision::Triplet);
        state.advance();
        state.advance();
        assert_eq!(state.subdivision_index(), 2);
        assert_eq!(state.current_beat(), 0);
        state.advance();
        assert_eq!(state.subdivision_index(), 0);
        assert_eq!(state.current_beat(), 1);
    }

    #[test]
    fn test_set_time_signature_wraps_current_beat() {
        let mut state = running(7, Subdivision::Quarter);
        for _ in 0..5 {
            state.advance();
        }
        assert_eq!(state.current_beat(), 5);

        state.set_time_signature(4);
        assert_eq!(state.current_beat(), 0);

        state.set_time_signature(0);
        assert_eq!(state.beats_per_bar(), 1);
    }

    #[test]
    fn test_set_subdivision_resets_index() {
        let mut state = running(4, Subdivision::Sixteenth);
        state.advance();
        state.advance();
        assert_eq!(state.subdivision_index(), 2);

        state.set_subdivision(Subdivision::Eighth);
        assert_eq!(state.subdivision_index(), 0);
    }

    #[test]
    fn test_ramp_step_never_overshoots() {
        let up = TempoRamp::new(140.0, 7.0, 1);
        assert_eq!(up.step_from(120.0), 127.0);
        assert_eq!(up.step_from(137.0), 140.0);
        assert_eq!(up.step_from(140.0), 140.0);

        let down = TempoRamp::new(100.0, 15.0, 2);
        assert_eq!(down.step_from(110.0), 100.0);
        assert_eq!(down.step_from(100.0), 100.0);
    }

    #[test]
    fn test_ramp_sanitized() {
        let ramp = TempoRamp::new(999.0, -5.0, 0);
        assert_eq!(ramp.target_bpm, 300.0);
        assert_eq!(ramp.step, 5.0);
        assert_eq!(ramp.every_bars, 1);
    }

    #[test]
    fn test_ramp_boundaries() {
        let ramp = TempoRamp::new(140.0, 5.0, 4);
        assert!(!ramp.is_boundary(0));
        assert!(!ramp.is_boundary(3));
        assert!(ramp.is_boundary(4));
        assert!(ramp.is_boundary(8));
    }

    #[test]
    fn test_unsanitized_zero_bar_ramp_steps_every_bar() {
        let ramp = TempoRamp {
            enabled: true,
            target_bpm: 140.0,
            step: 5.0,
            every_bars: 0,
        };
        assert!(!ramp.is_boundary(0));
        assert!(ramp.is_boundary(1));
        assert!(ramp.is_boundary(7));
    }

    #[test]
    fn test_disabling_ramp_keeps_tempo_and_bars() {
        let mut state = running(1, Subdivision::Quarter);
        state.set_tempo_ramp(Some(TempoRamp::new(140.0, 5.0, 1)));
        state.advance();
        state.advance();
        assert_eq!(state.tempo(), 130.0);

        state.set_tempo_ramp(None);
        state.advance();
        assert_eq!(state.tempo(), 130.0);
        assert_eq!(state.bar_count(), 3);

        // Re-enabling resumes from the current tempo
        state.set_tempo_ramp(Some(TempoRamp::new(140.0, 5.0, 1)));
        state.advance();
        assert_eq!(state.tempo(), 135.0);
    }

    #[test]
    fn test_silent_mode_cycle() {
        let silent = SilentMode::new(2, 1);
        let muted: Vec<bool> = (0..6).map(|bar| silent.is_muted(bar)).collect();
        assert_eq!(muted, vec![false, false, true, false, false, true]);

        let disabled = SilentMode {
            enabled: false,
            ..silent
        };
        assert!(!disabled.is_muted(2));

        // Degenerate cycles never mute
        assert!(!SilentMode::new(0, 0).is_muted(5));
        // No audible bars: everything muted
        assert!(SilentMode::new(0, 3).is_muted(0));
    }

    #[test]
    fn test_click_category_priority() {
        let mut state = running(4, Subdivision::Quarter);
        assert_eq!(state.click_category(), ClickCategory::Accent);
        state.advance();
        assert_eq!(state.click_category(), ClickCategory::Normal);

        // Single-beat bars: the downbeat is also the last beat before the boundary
        let mut state = running(1, Subdivision::Quarter);
        state.set_tempo_ramp(Some(TempoRamp::new(140.0, 5.0, 1)));
        assert!(state.is_downbeat());
        assert_eq!(state.click_category(), ClickCategory::Cue);
    }

    #[test]
    fn test_cue_only_on_last_beat_before_boundary() {
        let mut state = running(4, Subdivision::Eighth);
        state.set_tempo_ramp(Some(TempoRamp::new(140.0, 5.0, 2)));

        let mut cues = Vec::new();
        // Two bars of eighths = 16 slots
        for slot in 0..16 {
            if state.is_cue_slot() {
                cues.push(slot);
            }
            state.advance();
        }
        // Bar 1 (index 1) ends on a boundary; its last beat starts at slot 8 + 6
        assert_eq!(cues, vec![14]);
    }

    #[test]
    fn test_count_in_then_main_pattern() {
        let mut state = TransportState::new();
        state.set_time_signature(2);
        state.set_subdivision(Subdivision::Eighth);
        state.set_count_in(1);
        state.begin(120.0, 0.0);

        assert!(state.is_counting_in());
        assert_eq!(state.divisions(), 1);
        assert_eq!(state.click_category(), ClickCategory::CountIn);

        // Count-in bar: two quarter beats, no bar counted
        assert!(!state.advance());
        assert!(!state.advance());
        assert!(!state.is_counting_in());
        assert_eq!(state.bar_count(), 0);
        assert_eq!(state.current_beat(), 0);
        assert!((state.next_onset_time() - 1.0).abs() < 1e-9);

        assert_eq!(state.divisions(), 2);
        assert_eq!(state.click_category(), ClickCategory::Accent);
    }

    #[test]
    fn test_halt_preserves_counters() {
        let mut state = running(2, Subdivision::Quarter);
        for _ in 0..5 {
            state.advance();
        }
        state.halt();
        let snapshot = state.snapshot();
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.bar_count, 2);
        assert_eq!(snapshot.current_beat, 1);
    }
}
