// Utilitaires DSP - Gain smoothing and the output stage of the click mix

/// Below this the decaying tails are treated as silence
const DENORMAL_THRESHOLD: f32 = 1e-15;

#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Last step before the device: denormal flush then tanh saturation
///
/// Overlapping clicks (fast tempo, long kick decay) can sum past 1.0.
#[inline]
pub fn output_stage(mix: f32) -> f32 {
    flush_denormal(mix).tanh()
}

/// One-pole glide toward a gain target
///
/// y[n] = y[n-1] + α (target - y[n-1]), α = 1 - e^(-1 / (τ · sr))
pub struct GainSmoother {
    gain: f32,
    alpha: f32,
}

impl GainSmoother {
    /// `tau_ms` is the time to cover ~63% of a step; 0 jumps immediately
    pub fn new(initial_gain: f32, tau_ms: f32, sample_rate: f32) -> Self {
        let tau_samples = tau_ms * 0.001 * sample_rate;
        let alpha = if tau_samples > 0.0 {
            (1.0 - (-1.0 / tau_samples).exp()).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            gain: initial_gain,
            alpha,
        }
    }

    #[inline]
    pub fn next(&mut self, target: f32) -> f32 {
        self.gain = flush_denormal(self.gain + self.alpha * (target - self.gain));
        self.gain
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stage() {
        assert_eq!(output_stage(1e-20), 0.0);
        assert!((output_stage(0.1) - 0.1).abs() < 0.001);
        // Four full-scale clicks on top of each other stay below 1
        assert!(output_stage(4.0) < 1.0);
        assert!(output_stage(-4.0) > -1.0);
    }

    #[test]
    fn test_smoother_reaches_63_percent_after_tau() {
        // 15 ms at 48 kHz = 720 samples
        let mut smoother = GainSmoother::new(0.0, 15.0, 48000.0);
        let gain = (0..720).map(|_| smoother.next(1.0)).last().unwrap_or(0.0);
        assert!((gain - 0.632).abs() < 0.01, "gain after tau: {}", gain);
    }

    #[test]
    fn test_smoother_fade_out_is_monotonic() {
        let mut smoother = GainSmoother::new(0.5, 5.0, 44100.0);
        let mut previous = smoother.gain();
        for _ in 0..2000 {
            let gain = smoother.next(0.0);
            assert!(gain <= previous && gain >= 0.0);
            previous = gain;
        }
    }

    #[test]
    fn test_zero_tau_is_immediate() {
        let mut smoother = GainSmoother::new(0.0, 0.0, 48000.0);
        assert_eq!(smoother.next(0.8), 0.8);
        assert_eq!(smoother.gain(), 0.8);
    }
}
