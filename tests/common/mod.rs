// Shared rig: an offline metronome on a manual clock, recording every click
// and every beat event.

#![allow(dead_code)]

use clicktrack::{
    AudioClock, BeatEvent, ClickCategory, ClickOutput, EngineConfig, ManualClock, Metronome,
    OutputDevice, SoundId, Subscription,
};
use std::sync::{Arc, Mutex};

/// Timer period the rig simulates
pub const TICK: f64 = 0.025;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedClick {
    pub time: f64,
    pub category: ClickCategory,
    pub sound: SoundId,
}

#[derive(Clone, Default)]
pub struct RecordingOutput {
    pub clicks: Arc<Mutex<Vec<RecordedClick>>>,
}

impl ClickOutput for RecordingOutput {
    fn play_click(
        &mut self,
        time: f64,
        category: ClickCategory,
        sound: SoundId,
    ) -> clicktrack::Result<()> {
        self.clicks.lock().unwrap().push(RecordedClick {
            time,
            category,
            sound,
        });
        Ok(())
    }
}

pub struct AlwaysOn;

impl OutputDevice for AlwaysOn {
    fn resume(&mut self) -> clicktrack::Result<()> {
        Ok(())
    }
}

pub struct Rig {
    pub metronome: Metronome,
    pub clock: ManualClock,
    pub clicks: Arc<Mutex<Vec<RecordedClick>>>,
    pub events: Arc<Mutex<Vec<BeatEvent>>>,
    _subscription: Subscription,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_output(RecordingOutput::default())
    }

    pub fn with_output(output: RecordingOutput) -> Self {
        let clock = ManualClock::new(0.0);
        let clicks = Arc::clone(&output.clicks);
        let metronome = Metronome::offline(
            EngineConfig::default(),
            Arc::new(clock.clone()),
            Box::new(output),
            Box::new(AlwaysOn),
        );

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = metronome.on_beat(move |e| sink.lock().unwrap().push(*e));

        Self {
            metronome,
            clock,
            clicks,
            events,
            _subscription: subscription,
        }
    }

    /// Move the clock forward in timer-sized steps, running a pass each time
    pub fn run_until(&self, seconds: f64) {
        while self.clock.now() < seconds {
            self.clock.advance(TICK);
            self.metronome.tick();
        }
    }

    pub fn events(&self) -> Vec<BeatEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<RecordedClick> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
        self.clicks.lock().unwrap().clear();
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
