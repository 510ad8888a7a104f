// Master volume shared between the control side and the audio callback

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Clamp a volume to [0, 1]; NaN is treated as silence
pub fn clamp_volume(level: f32) -> f32 {
    if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) }
}

/// Lock-free master volume, always within [0, 1]
///
/// Stored as f32 bits in an `AtomicU32`. Clones share the same value, so the
/// renderer reads what `set_volume` wrote without a lock.
#[derive(Clone, Debug)]
pub struct SharedVolume {
    bits: Arc<AtomicU32>,
}

impl SharedVolume {
    pub fn new(level: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(clamp_volume(level).to_bits())),
        }
    }

    /// Store a new level; returns the value actually stored after clamping
    pub fn set(&self, level: f32) -> f32 {
        let level = clamp_volume(level);
        self.bits.store(level.to_bits(), Ordering::Relaxed);
        level
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
