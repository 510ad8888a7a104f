// Metronome - Public façade: commands, timer thread and beat notifications
//
// The scheduler sits behind one mutex shared by the command methods and the
// timer thread, so a command always lands between two passes. Beat events are
// collected under the lock and published after it is released, which lets
// listeners call back into the metronome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::pattern::Subdivision;
use super::scheduler::Scheduler;
use super::transport::{SilentMode, TempoRamp, TransportSnapshot};
use crate::audio::engine::{AudioEngine, OutputDevice};
use crate::audio::parameters::SharedVolume;
use crate::audio::timing::AudioClock;
use crate::config::EngineConfig;
use crate::error::{MetronomeError, Result};
use crate::messaging::beat_bus::{BeatEvent, BeatEventBus, Subscription};
use crate::preset::Preset;
use crate::synth::click::ClickOutput;
use crate::synth::sound_bank::SoundId;

/// Running timer thread
struct Timer {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Timer {
    /// Ask the thread to exit. It finishes the pass in progress, if any.
    fn cancel(self) {
        self.running.store(false, Ordering::Release);
        self.handle.thread().unpark();
    }
}

/// Lookahead metronome on an audio output
pub struct Metronome {
    handle: MetronomeHandle,
    clock: Arc<dyn AudioClock>,
    device: Box<dyn OutputDevice>,
    config: EngineConfig,
    timer: Option<Timer>,
    /// Offline metronomes are driven by `tick` only
    timer_enabled: bool,
}

impl Metronome {
    /// Metronome on the configured cpal output device
    pub fn new(config: EngineConfig) -> Result<Self> {
        let config = config.sanitized();
        let volume = SharedVolume::new(config.initial_volume);
        let (engine, clock, synth) = AudioEngine::open(&config, volume.clone())?;
        Ok(Self::assemble(
            config,
            volume,
            Arc::new(clock),
            Box::new(synth),
            Box::new(engine),
            true,
        ))
    }

    /// Metronome on a caller-supplied clock and click output, with the
    /// usual timer thread
    pub fn with_backend(
        config: EngineConfig,
        clock: Arc<dyn AudioClock>,
        clicks: Box<dyn ClickOutput>,
        device: Box<dyn OutputDevice>,
    ) -> Self {
        let config = config.sanitized();
        let volume = SharedVolume::new(config.initial_volume);
        Self::assemble(config, volume, clock, clicks, device, true)
    }

    /// Like `with_backend`, but no timer thread: passes only run on `tick`
    pub fn offline(
        config: EngineConfig,
        clock: Arc<dyn AudioClock>,
        clicks: Box<dyn ClickOutput>,
        device: Box<dyn OutputDevice>,
    ) -> Self {
        let config = config.sanitized();
        let volume = SharedVolume::new(config.initial_volume);
        Self::assemble(config, volume, clock, clicks, device, false)
    }

    fn assemble(
        config: EngineConfig,
        volume: SharedVolume,
        clock: Arc<dyn AudioClock>,
        clicks: Box<dyn ClickOutput>,
        device: Box<dyn OutputDevice>,
        timer_enabled: bool,
    ) -> Self {
        let scheduler = Scheduler::new(clicks, config.schedule_ahead_secs);
        Self {
            handle: MetronomeHandle {
                scheduler: Arc::new(Mutex::new(scheduler)),
                bus: BeatEventBus::new(),
                volume,
            },
            clock,
            device,
            config,
            timer: None,
            timer_enabled,
        }
    }

    fn scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.handle.scheduler()
    }

    // ---- Transport ----

    /// Start playback at `bpm`. No-op while already running.
    ///
    /// Blocks until the output device reports it is running; on failure the
    /// metronome stays stopped.
    pub fn start(&mut self, bpm: f64) -> Result<()> {
        if self.is_running() {
            log::debug!("start ignored, already running");
            return Ok(());
        }

        self.device.resume()?;

        let first_onset = self.clock.now() + self.config.start_offset_secs;
        {
            let mut scheduler = self.scheduler();
            scheduler.transport_mut().begin(bpm, first_onset);
            log::info!(
                "Metronome started at {:.1} BPM, first onset at {:.3}s",
                scheduler.transport().tempo(),
                first_onset
            );
        }

        if self.timer_enabled {
            match self.spawn_timer() {
                Ok(timer) => self.timer = Some(timer),
                Err(e) => {
                    self.scheduler().transport_mut().halt();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Stop playback. Counters are kept; clicks already queued still sound.
    pub fn stop(&mut self) {
        // Halt first: a pass racing the cancel then finds nothing to schedule
        {
            let mut scheduler = self.scheduler();
            if scheduler.transport().is_running() {
                scheduler.transport_mut().halt();
                log::info!("Metronome stopped at bar {}", scheduler.transport().bar_count());
            }
        }

        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler().transport().is_running()
    }

    /// Run one scheduling pass against the clock now, on the calling thread
    ///
    /// Returns the number of slots processed.
    pub fn tick(&self) -> usize {
        let mut events = Vec::new();
        let processed = run_pass(&self.handle.scheduler, self.clock.as_ref(), &mut events);
        for event in &events {
            self.handle.bus.publish(event);
        }
        processed
    }

    fn spawn_timer(&self) -> Result<Timer> {
        let running = Arc::new(AtomicBool::new(true));
        let interval = Duration::from_millis(self.config.lookahead_interval_ms);

        let flag = Arc::clone(&running);
        let scheduler = Arc::clone(&self.handle.scheduler);
        let clock = Arc::clone(&self.clock);
        let bus = self.handle.bus.clone();

        let handle = thread::Builder::new()
            .name("clicktrack-scheduler".to_string())
            .spawn(move || {
                let mut events = Vec::new();
                while flag.load(Ordering::Acquire) {
                    run_pass(&scheduler, clock.as_ref(), &mut events);
                    for event in events.drain(..) {
                        bus.publish(&event);
                    }
                    thread::park_timeout(interval);
                }
                log::debug!("Scheduler timer exited");
            })
            .map_err(MetronomeError::Timer)?;

        Ok(Timer { running, handle })
    }

    // ---- Commands ----

    /// Thread-safe handle for UIs and beat listeners
    pub fn handle(&self) -> MetronomeHandle {
        self.handle.clone()
    }

    pub fn set_tempo(&self, bpm: f64) {
        self.handle.set_tempo(bpm);
    }

    pub fn set_time_signature(&self, beats_per_bar: u32) {
        self.handle.set_time_signature(beats_per_bar);
    }

    pub fn set_subdivision(&self, subdivision: Subdivision) {
        self.handle.set_subdivision(subdivision);
    }

    pub fn set_subdivision_id(&self, id: &str) {
        self.handle.set_subdivision_id(id);
    }

    pub fn set_sound(&self, sound: SoundId) {
        self.handle.set_sound(sound);
    }

    pub fn set_sound_type(&self, id: &str) {
        self.handle.set_sound_type(id);
    }

    pub fn set_volume(&self, level: f32) {
        self.handle.set_volume(level);
    }

    pub fn volume(&self) -> f32 {
        self.handle.volume()
    }

    pub fn set_tempo_ramp(&self, ramp: Option<TempoRamp>) {
        self.handle.set_tempo_ramp(ramp);
    }

    pub fn set_silent_mode(&self, silent_mode: SilentMode) {
        self.handle.set_silent_mode(silent_mode);
    }

    pub fn set_count_in(&self, bars: u32) {
        self.handle.set_count_in(bars);
    }

    pub fn apply_preset(&self, preset: &Preset) {
        self.handle.apply_preset(preset);
    }

    // ---- Observation ----

    pub fn on_beat<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&BeatEvent) + Send + Sync + 'static,
    {
        self.handle.on_beat(listener)
    }

    pub fn beat_bus(&self) -> &BeatEventBus {
        &self.handle.bus
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        self.handle.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current time on the clock onsets are scheduled against
    pub fn now(&self) -> f64 {
        self.clock.now()
    }
}

/// Cloneable, thread-safe access to the commands and beat notifications of
/// a [`Metronome`]. Start and stop stay with the owner of the audio device.
#[derive(Clone)]
pub struct MetronomeHandle {
    scheduler: Arc<Mutex<Scheduler>>,
    bus: BeatEventBus,
    volume: SharedVolume,
}

impl MetronomeHandle {
    fn scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_tempo(&self, bpm: f64) {
        let mut scheduler = self.scheduler();
        scheduler.transport_mut().set_tempo(bpm);
        log::debug!("Tempo set to {:.1} BPM", scheduler.transport().tempo());
    }

    pub fn set_time_signature(&self, beats_per_bar: u32) {
        let mut scheduler = self.scheduler();
        scheduler.transport_mut().set_time_signature(beats_per_bar);
        log::debug!("{} beats per bar", scheduler.transport().beats_per_bar());
    }

    pub fn set_subdivision(&self, subdivision: Subdivision) {
        self.scheduler().transport_mut().set_subdivision(subdivision);
        log::debug!("Subdivision set to {}", subdivision);
    }

    /// Subdivision by id; unknown ids fall back to quarter notes
    pub fn set_subdivision_id(&self, id: &str) {
        self.set_subdivision(Subdivision::from_id(id));
    }

    pub fn set_sound(&self, sound: SoundId) {
        self.scheduler().transport_mut().set_sound(sound);
        log::debug!("Sound set to {}", sound);
    }

    /// Sound by id; unknown ids fall back to the default sound
    pub fn set_sound_type(&self, id: &str) {
        self.set_sound(SoundId::from_id(id));
    }

    pub fn set_volume(&self, level: f32) {
        let level = self.volume.set(level);
        log::debug!("Volume set to {:.2}", level);
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    pub fn set_tempo_ramp(&self, ramp: Option<TempoRamp>) {
        self.scheduler().transport_mut().set_tempo_ramp(ramp);
    }

    pub fn set_silent_mode(&self, silent_mode: SilentMode) {
        self.scheduler().transport_mut().set_silent_mode(silent_mode);
    }

    /// Count-in bars played by the next `start`
    pub fn set_count_in(&self, bars: u32) {
        self.scheduler().transport_mut().set_count_in(bars);
    }

    /// Load a preset's settings. Parts the preset leaves out are untouched,
    /// except the tempo ramp, which a preset always replaces.
    pub fn apply_preset(&self, preset: &Preset) {
        let preset = preset.clone().sanitized();
        let mut scheduler = self.scheduler();
        let transport = scheduler.transport_mut();

        transport.set_tempo(preset.bpm);
        transport.set_time_signature(preset.beats_per_bar);
        transport.set_subdivision(preset.subdivision);
        transport.set_tempo_ramp(preset.tempo_ramp);
        transport.set_count_in(preset.count_in_measures);
        if let Some(sound) = preset.sound {
            transport.set_sound(sound);
        }
        if let Some(silent_mode) = preset.silent_mode {
            transport.set_silent_mode(silent_mode);
        }
        log::info!("Preset '{}' applied", preset.name);
    }

    /// Call `listener` for every onset slot, from the scheduling thread
    pub fn on_beat<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&BeatEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        self.scheduler().snapshot()
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

/// One pass under the scheduler lock; events are returned, not published
fn run_pass(scheduler: &Mutex<Scheduler>, clock: &dyn AudioClock, events: &mut Vec<BeatEvent>) -> usize {
    let mut scheduler = scheduler.lock().unwrap_or_else(PoisonError::into_inner);
    let now = clock.now();
    scheduler.run_pass(now, &mut |event| events.push(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::timing::ManualClock;
    use crate::synth::click::ClickCategory;

    struct NullClicks;

    impl ClickOutput for NullClicks {
        fn play_click(&mut self, _: f64, _: ClickCategory, _: SoundId) -> Result<()> {
            Ok(())
        }
    }

    struct FlakyDevice {
        fail: bool,
    }

    impl OutputDevice for FlakyDevice {
        fn resume(&mut self) -> Result<()> {
            if self.fail {
                Err(MetronomeError::StreamPlay("device unplugged".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn offline(clock: &ManualClock, fail: bool) -> Metronome {
        Metronome::offline(
            EngineConfig::default(),
            Arc::new(clock.clone()),
            Box::new(NullClicks),
            Box::new(FlakyDevice { fail }),
        )
    }

    #[test]
    fn test_start_sets_first_onset_after_offset() {
        let clock = ManualClock::new(10.0);
        let mut metronome = offline(&clock, false);
        metronome.start(90.0).unwrap();

        let snapshot = metronome.snapshot();
        assert!(snapshot.is_running);
        assert_eq!(snapshot.tempo, 90.0);
        assert!((snapshot.next_onset_time - 10.05).abs() < 1e-9);
    }

    #[test]
    fn test_failed_device_leaves_metronome_stopped() {
        let clock = ManualClock::new(0.0);
        let mut metronome = offline(&clock, true);

        let result = metronome.start(120.0);
        assert!(matches!(result, Err(MetronomeError::StreamPlay(_))));
        assert!(!metronome.is_running());
        assert_eq!(metronome.tick(), 0);
    }

    #[test]
    fn test_listener_can_call_back_into_metronome() {
        let clock = ManualClock::new(0.0);
        let mut metronome = offline(&clock, false);
        metronome.start(120.0).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = metronome.handle();
        let log = Arc::clone(&seen);
        let _sub = metronome.on_beat(move |_| {
            // Would deadlock if events were published under the lock
            log.lock().unwrap().push(inner.snapshot().bar_count);
        });

        clock.set(0.5);
        metronome.tick();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_volume_is_clamped() {
        let clock = ManualClock::new(0.0);
        let metronome = offline(&clock, false);
        assert_eq!(metronome.volume(), 0.5);
        metronome.set_volume(7.0);
        assert_eq!(metronome.volume(), 1.0);
        metronome.set_volume(f32::NAN);
        assert_eq!(metronome.volume(), 0.0);
    }

    #[test]
    fn test_apply_preset() {
        let clock = ManualClock::new(0.0);
        let metronome = offline(&clock, false);
        metronome.set_sound(SoundId::Kick);

        let preset = Preset {
            bpm: 95.0,
            beats_per_bar: 7,
            subdivision: Subdivision::Shuffle,
            tempo_ramp: Some(TempoRamp::new(120.0, 5.0, 2)),
            count_in_measures: 2,
            ..Preset::new("Odd")
        };
        metronome.apply_preset(&preset);

        let snapshot = metronome.snapshot();
        assert_eq!(snapshot.tempo, 95.0);
        assert_eq!(snapshot.beats_per_bar, 7);
        assert_eq!(snapshot.subdivision, Subdivision::Shuffle);
        assert_eq!(snapshot.count_in_bars, 2);
        assert!(snapshot.tempo_ramp.is_some());
        // No sound in the preset: previous choice kept
        assert_eq!(snapshot.sound, SoundId::Kick);
    }

    #[test]
    fn test_timer_thread_schedules_without_tick() {
        let clock = ManualClock::new(0.0);
        let count = Arc::new(Mutex::new(0usize));
        let mut metronome = Metronome::with_backend(
            EngineConfig::default(),
            Arc::new(clock.clone()),
            Box::new(NullClicks),
            Box::new(FlakyDevice { fail: false }),
        );

        let counter = Arc::clone(&count);
        let _sub = metronome.on_beat(move |_| *counter.lock().unwrap() += 1);
        metronome.start(120.0).unwrap();

        // First onset at 0.05 lies inside the initial window
        let mut waited = 0;
        while *count.lock().unwrap() == 0 && waited < 200 {
            thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
        metronome.stop();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    struct PanicsOnSecondClick {
        calls: Arc<Mutex<usize>>,
    }

    impl ClickOutput for PanicsOnSecondClick {
        fn play_click(&mut self, _: f64, _: ClickCategory, _: SoundId) -> Result<()> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 2 {
                drop(calls);
                panic!("output driver crashed");
            }
            Ok(())
        }
    }

    fn wait_for(count: &Arc<Mutex<usize>>, at_least: usize) {
        let mut waited = 0;
        while *count.lock().unwrap() < at_least && waited < 200 {
            thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
    }

    #[test]
    fn test_timer_thread_survives_panicking_output() {
        let clock = ManualClock::new(0.0);
        let events = Arc::new(Mutex::new(0usize));
        let mut metronome = Metronome::with_backend(
            EngineConfig::default(),
            Arc::new(clock.clone()),
            Box::new(PanicsOnSecondClick {
                calls: Arc::new(Mutex::new(0)),
            }),
            Box::new(FlakyDevice { fail: false }),
        );

        let counter = Arc::clone(&events);
        let _sub = metronome.on_beat(move |_| *counter.lock().unwrap() += 1);
        metronome.start(120.0).unwrap();

        // Onsets at 0.05, 0.55, 1.05, 1.55 fall inside the window at 1.5
        clock.set(1.5);
        wait_for(&events, 4);
        metronome.stop();

        assert_eq!(*events.lock().unwrap(), 4);
        assert!(!metronome.is_running());
    }

    #[test]
    fn test_no_beats_after_stop_returns() {
        let clock = ManualClock::new(0.0);
        let events = Arc::new(Mutex::new(0usize));
        let mut metronome = Metronome::with_backend(
            EngineConfig::default(),
            Arc::new(clock.clone()),
            Box::new(NullClicks),
            Box::new(FlakyDevice { fail: false }),
        );

        let counter = Arc::clone(&events);
        let _sub = metronome.on_beat(move |_| *counter.lock().unwrap() += 1);
        metronome.start(120.0).unwrap();
        wait_for(&events, 1);

        metronome.stop();
        let at_stop = *events.lock().unwrap();

        // Plenty of due onsets, but the transport is halted
        clock.set(10.0);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(*events.lock().unwrap(), at_stop);
        assert_eq!(metronome.tick(), 0);
    }
}
