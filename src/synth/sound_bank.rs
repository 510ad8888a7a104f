// Sound bank - Synthesis recipes for the click sounds

use super::oscillator::WaveformType;
use std::fmt;

/// How to synthesize one click sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRecipe {
    pub waveform: WaveformType,
    /// Base frequency in Hz, before the category multiplier
    pub frequency: f32,
    /// Time in seconds for the envelope to decay to -60 dB
    pub decay: f32,
    /// Start one octave up and sweep down to the base frequency (kick drum)
    pub pitch_sweep: bool,
}

impl SoundRecipe {
    const fn new(frequency: f32, waveform: WaveformType, decay: f32) -> Self {
        Self {
            waveform,
            frequency,
            decay,
            pitch_sweep: false,
        }
    }

    const fn swept(self) -> Self {
        Self {
            pitch_sweep: true,
            ..self
        }
    }
}

/// Identifier of a click sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum SoundId {
    #[default]
    Elec1,
    Elec2,
    Elec3,
    Elec4,
    Mech1,
    Mech2,
    Cowbell,
    Conga,
    Woodblock,
    Clave,
    Sticks,
    Kick,
}

impl SoundId {
    pub const ALL: [SoundId; 12] = [
        SoundId::Elec1,
        SoundId::Elec2,
        SoundId::Elec3,
        SoundId::Elec4,
        SoundId::Mech1,
        SoundId::Mech2,
        SoundId::Cowbell,
        SoundId::Conga,
        SoundId::Woodblock,
        SoundId::Clave,
        SoundId::Sticks,
        SoundId::Kick,
    ];

    pub fn recipe(&self) -> SoundRecipe {
        use WaveformType::*;
        match self {
            SoundId::Elec1 => SoundRecipe::new(1000.0, Sine, 0.05),
            SoundId::Elec2 => SoundRecipe::new(880.0, Square, 0.03),
            SoundId::Elec3 => SoundRecipe::new(1200.0, Sine, 0.02),
            SoundId::Elec4 => SoundRecipe::new(600.0, Triangle, 0.08),
            SoundId::Mech1 => SoundRecipe::new(400.0, Triangle, 0.1),
            SoundId::Mech2 => SoundRecipe::new(350.0, Sine, 0.15),
            SoundId::Cowbell => SoundRecipe::new(800.0, Square, 0.2),
            SoundId::Conga => SoundRecipe::new(200.0, Sine, 0.2),
            SoundId::Woodblock => SoundRecipe::new(2200.0, Sine, 0.03),
            SoundId::Clave => SoundRecipe::new(3200.0, Sine, 0.02),
            SoundId::Sticks => SoundRecipe::new(4000.0, Sine, 0.01),
            SoundId::Kick => SoundRecipe::new(150.0, Sine, 0.2).swept(),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            SoundId::Elec1 => "elec_1",
            SoundId::Elec2 => "elec_2",
            SoundId::Elec3 => "elec_3",
            SoundId::Elec4 => "elec_4",
            SoundId::Mech1 => "mech_1",
            SoundId::Mech2 => "mech_2",
            SoundId::Cowbell => "cowbell",
            SoundId::Conga => "conga",
            SoundId::Woodblock => "woodblock",
            SoundId::Clave => "clave",
            SoundId::Sticks => "sticks",
            SoundId::Kick => "kick",
        }
    }

    pub fn lookup(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.iter().copied().find(|s| s.id().eq_ignore_ascii_case(id))
    }

    /// Unknown ids fall back to `elec_1`
    pub fn from_id(id: &str) -> Self {
        Self::lookup(id).unwrap_or_else(|| {
            log::warn!("Unknown sound '{}', falling back to {}", id, SoundId::default());
            Self::default()
        })
    }
}

impl From<String> for SoundId {
    fn from(id: String) -> Self {
        Self::from_id(&id)
    }
}

impl From<SoundId> for &'static str {
    fn from(sound: SoundId) -> Self {
        sound.id()
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
