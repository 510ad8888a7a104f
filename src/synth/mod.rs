// Module synthèse - Oscillateurs et génération des clicks

pub mod click;
pub mod oscillator;
pub mod sound_bank;
pub mod voice;
