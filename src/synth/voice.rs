// Click voices - Sample-accurate rendering of scheduled clicks
//
// Runs inside the audio callback: no allocations after construction,
// no locks, no I/O.

use super::click::{
    ATTACK_SECONDS, DECAY_FLOOR, PITCH_SWEEP_SECONDS, RELEASE_TAIL_SECONDS, ScheduledClick,
};
use super::oscillator::ClickOscillator;
use crate::audio::dsp_utils::{GainSmoother, output_stage};
use crate::audio::parameters::SharedVolume;
use crate::audio::timing::SampleClock;
use crate::messaging::channels::ClickConsumer;
use ringbuf::traits::Consumer;

/// One sounding click: oscillator plus attack/exponential-decay envelope
pub struct ClickVoice {
    oscillator: ClickOscillator,
    frequency: f32,
    pitch_sweep: bool,
    sample_rate: f32,
    position: u32,
    attack_samples: f32,
    decay_samples: f32,
    total_samples: u32,
}

impl ClickVoice {
    pub fn new(click: &ScheduledClick, sample_rate: f32) -> Self {
        let attack_samples = (ATTACK_SECONDS * sample_rate).max(1.0);
        let decay_samples = (click.decay * sample_rate).max(attack_samples + 1.0);
        let total_samples = (decay_samples + RELEASE_TAIL_SECONDS * sample_rate).ceil() as u32;

        Self {
            oscillator: ClickOscillator::new(click.waveform, sample_rate),
            frequency: click.frequency,
            pitch_sweep: click.pitch_sweep,
            sample_rate,
            position: 0,
            attack_samples,
            decay_samples,
            total_samples,
        }
    }

    /// Envelope value `t` samples after onset
    fn envelope(&self, t: f32) -> f32 {
        if t < self.attack_samples {
            t / self.attack_samples
        } else if t < self.decay_samples {
            let progress = (t - self.attack_samples) / (self.decay_samples - self.attack_samples);
            DECAY_FLOOR.powf(progress)
        } else {
            DECAY_FLOOR
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.is_finished() {
            return 0.0;
        }

        let t = self.position as f32;
        let frequency = if self.pitch_sweep {
            // Exponential glide from one octave up down to the base pitch
            let progress = (t / (PITCH_SWEEP_SECONDS * self.sample_rate)).min(1.0);
            self.frequency * 2.0 * 0.5f32.powf(progress)
        } else {
            self.frequency
        };

        let sample = self.oscillator.next(frequency) * self.envelope(t);
        self.position += 1;
        sample
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.total_samples
    }

    pub fn length_samples(&self) -> u32 {
        self.total_samples
    }
}

/// Realtime renderer: pulls scheduled clicks off the queue and mixes voices
pub struct ClickRenderer {
    consumer: ClickConsumer,
    clock: SampleClock,
    sample_rate: f32,
    position: u64,
    block_frames: usize,
    pending: Vec<ScheduledClick>,
    voices: Vec<ClickVoice>,
    max_voices: usize,
    volume: SharedVolume,
    volume_smoother: GainSmoother,
}

impl ClickRenderer {
    pub fn new(
        consumer: ClickConsumer,
        clock: SampleClock,
        volume: SharedVolume,
        volume_smoothing_ms: f32,
        max_voices: usize,
    ) -> Self {
        let sample_rate = clock.sample_rate();
        let max_voices = max_voices.max(1);
        let initial_volume = volume.get();

        Self {
            consumer,
            position: clock.current_sample(),
            clock,
            sample_rate,
            block_frames: 0,
            // Pre-allocate everything: the callback must never allocate
            pending: Vec::with_capacity(max_voices * 2),
            voices: Vec::with_capacity(max_voices),
            max_voices,
            volume,
            volume_smoother: GainSmoother::new(initial_volume, volume_smoothing_ms, sample_rate),
        }
    }

    /// Drain newly scheduled clicks. Call once at the top of each callback.
    pub fn begin_block(&mut self) {
        self.block_frames = 0;
        while let Some(click) = self.consumer.try_pop() {
            if self.pending.len() < self.pending.capacity() {
                self.pending.push(click);
            }
            // Otherwise dropped: more clicks in flight than the lookahead can produce
        }
    }

    /// Render the next mono sample
    pub fn next_sample(&mut self) -> f32 {
        self.start_due_voices();

        let mut mix = 0.0;
        for voice in self.voices.iter_mut() {
            mix += voice.next_sample();
        }

        let gain = self.volume_smoother.next(self.volume.get());
        let sample = output_stage(mix * gain);

        self.position += 1;
        self.block_frames += 1;
        sample
    }

    /// Release finished voices and publish the new clock position
    pub fn end_block(&mut self) {
        self.voices.retain(|v| !v.is_finished());
        self.clock.advance(self.block_frames);
        self.block_frames = 0;
    }

    fn start_due_voices(&mut self) {
        let mut i = 0;
        while i < self.pending.len() {
            let start = self.clock.seconds_to_samples(self.pending[i].time);
            // Late clicks (start already passed) fire right away
            if start <= self.position {
                let click = self.pending.swap_remove(i);
                if self.voices.len() >= self.max_voices {
                    // Steal the oldest voice
                    self.voices.remove(0);
                }
                self.voices.push(ClickVoice::new(&click, self.sample_rate));
            } else {
                i += 1;
            }
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn pending_clicks(&self) -> usize {
        self.pending.len()
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}
