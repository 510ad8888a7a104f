// Preset types - Named, serializable practice setups

use crate::sequencer::pattern::Subdivision;
use crate::sequencer::timeline::{DEFAULT_BPM, clamp_beats_per_bar, clamp_bpm};
use crate::sequencer::transport::{SilentMode, TempoRamp, TransportSnapshot};
use crate::synth::sound_bank::SoundId;
use serde::{Deserialize, Serialize};

/// A saved metronome setup
///
/// Stored as JSON with camelCase keys. Optional parts left out of the file
/// leave the corresponding engine setting untouched when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    pub bpm: f64,
    pub beats_per_bar: u32,
    #[serde(default)]
    pub subdivision: Subdivision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_ramp: Option<TempoRamp>,
    /// Count-in bars played before the pattern starts
    #[serde(default)]
    pub count_in_measures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<SoundId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent_mode: Option<SilentMode>,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bpm: DEFAULT_BPM,
            beats_per_bar: 4,
            subdivision: Subdivision::default(),
            tempo_ramp: None,
            count_in_measures: 0,
            sound: None,
            silent_mode: None,
        }
    }

    /// Capture the current engine setup under a name
    pub fn from_snapshot(name: impl Into<String>, snapshot: &TransportSnapshot) -> Self {
        Self {
            name: name.into(),
            bpm: snapshot.tempo,
            beats_per_bar: snapshot.beats_per_bar,
            subdivision: snapshot.subdivision,
            tempo_ramp: snapshot.tempo_ramp,
            count_in_measures: snapshot.count_in_bars,
            sound: Some(snapshot.sound),
            silent_mode: snapshot.silent_mode.enabled.then_some(snapshot.silent_mode),
        }
    }

    /// Same preset with every number brought into range
    pub fn sanitized(mut self) -> Self {
        self.bpm = clamp_bpm(self.bpm);
        self.beats_per_bar = clamp_beats_per_bar(self.beats_per_bar);
        self.tempo_ramp = self.tempo_ramp.map(TempoRamp::sanitized);
        self
    }
}
