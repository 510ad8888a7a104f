// Integration test: timing properties of the lookahead scheduler
//
// Drives an offline metronome with a manual clock, the way the timer thread
// would, and checks onset times, counters, ramps and silent bars.

mod common;

use clicktrack::{ClickCategory, SilentMode, Subdivision, TempoRamp};
use common::{Rig, approx};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_onset_interval_matches_tempo_and_divisions() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..25 {
        let bpm = rng.gen_range(20.0..300.0);
        let subdivision = Subdivision::ALL[rng.gen_range(0..Subdivision::ALL.len())];
        let beats = rng.gen_range(1..=8);

        let mut rig = Rig::new();
        rig.metronome.set_subdivision(subdivision);
        rig.metronome.set_time_signature(beats);
        rig.metronome.start(bpm).unwrap();
        rig.run_until(4.0);

        let events = rig.events();
        assert!(events.len() >= 2, "{} BPM {}", bpm, subdivision);

        let expected = 60.0 / bpm / subdivision.divisions() as f64;
        for pair in events.windows(2) {
            let interval = pair[1].time - pair[0].time;
            assert!(
                (interval - expected).abs() < 1e-9,
                "{} BPM {}: interval {} expected {}",
                bpm,
                subdivision,
                interval,
                expected
            );
        }
        // Every slot of the pattern is notified, sounding or not
        let sounding = events.iter().filter(|e| e.sounding).count();
        assert_eq!(rig.clicks().len(), sounding);
        rig.metronome.stop();
    }
}

#[test]
fn test_beat_wraps_and_bar_counts() {
    let mut rig = Rig::new();
    rig.metronome.set_time_signature(3);
    rig.metronome.start(120.0).unwrap();
    rig.run_until(3.0);

    let events = rig.events();
    let beats: Vec<u32> = events.iter().map(|e| e.beat_index).collect();
    let bars: Vec<u64> = events.iter().map(|e| e.bar).collect();
    assert_eq!(beats, vec![0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(bars, vec![0, 0, 0, 1, 1, 1, 2]);
    assert_eq!(rig.metronome.snapshot().bar_count, 2);
}

#[test]
fn test_first_bar_accent_after_four_onsets() {
    let mut rig = Rig::new();
    rig.metronome.start(120.0).unwrap();
    rig.run_until(1.5);

    let events = rig.events();
    assert_eq!(events.len(), 4);
    let accents: Vec<_> = events.iter().filter(|e| e.is_accent).collect();
    assert_eq!(accents.len(), 1);
    assert_eq!(accents[0].beat_index, 0);
    assert_eq!(rig.metronome.snapshot().bar_count, 1);

    let categories: Vec<ClickCategory> = rig.clicks().iter().map(|c| c.category).collect();
    assert_eq!(
        categories,
        vec![
            ClickCategory::Accent,
            ClickCategory::Normal,
            ClickCategory::Normal,
            ClickCategory::Normal,
        ]
    );
}

#[test]
fn test_ramp_reaches_target_and_stays() {
    let mut rig = Rig::new();
    rig.metronome
        .set_tempo_ramp(Some(TempoRamp::new(140.0, 5.0, 1)));
    rig.metronome.start(120.0).unwrap();
    rig.run_until(11.5);

    let events = rig.events();
    let tempo_of_bar = |bar: u64| {
        events
            .iter()
            .find(|e| e.bar == bar)
            .map(|e| e.tempo_bpm)
            .unwrap()
    };
    let tempos: Vec<f64> = (0..6).map(tempo_of_bar).collect();
    assert_eq!(tempos, vec![120.0, 125.0, 130.0, 135.0, 140.0, 140.0]);
    assert_eq!(rig.metronome.snapshot().tempo, 140.0);

    // Cue on beat 4 of every bar, since every bar ends on a boundary
    let clicks = rig.clicks();
    for (i, click) in clicks.iter().enumerate() {
        let expected = match i % 4 {
            0 => ClickCategory::Accent,
            3 => ClickCategory::Cue,
            _ => ClickCategory::Normal,
        };
        assert_eq!(click.category, expected, "click {}", i);
    }
}

#[test]
fn test_silent_mode_two_on_one_off() {
    let mut rig = Rig::new();
    rig.metronome.set_silent_mode(SilentMode::new(2, 1));
    rig.metronome.start(120.0).unwrap();
    rig.run_until(12.0);

    let events: Vec<_> = rig.events().into_iter().filter(|e| e.bar < 6).collect();
    assert_eq!(events.len(), 24);

    for bar in 0..6u64 {
        let in_bar: Vec<_> = events.iter().filter(|e| e.bar == bar).collect();
        assert_eq!(in_bar.len(), 4, "bar {} not fully notified", bar);
        let muted = bar == 2 || bar == 5;
        assert!(in_bar.iter().all(|e| e.muted == muted), "bar {}", bar);
    }

    let audible_times: Vec<f64> = events.iter().filter(|e| !e.muted).map(|e| e.time).collect();
    let click_times: Vec<f64> = rig
        .clicks()
        .iter()
        .map(|c| c.time)
        .filter(|&t| t < 12.0)
        .collect();
    assert_eq!(click_times, audible_times);
    assert_eq!(click_times.len(), 16);
}

#[test]
fn test_subdivision_change_mid_run() {
    let mut rig = Rig::new();
    rig.metronome.start(120.0).unwrap();
    rig.run_until(1.0);
    assert!(approx(rig.metronome.snapshot().next_onset_time, 1.55));

    rig.metronome.set_subdivision(Subdivision::Eighth);
    assert_eq!(rig.metronome.snapshot().subdivision_index, 0);
    rig.clear();
    rig.run_until(3.0);

    let events = rig.events();
    // The onset already computed at quarter spacing stays where it was
    assert!(approx(events[0].time, 1.55));
    for pair in events.windows(2) {
        assert!(approx(pair[1].time - pair[0].time, 0.25));
    }
    let indices: Vec<u32> = events.iter().take(4).map(|e| e.subdivision_index).collect();
    assert_eq!(indices, vec![0, 1, 0, 1]);
}

#[test]
fn test_stop_is_idempotent_and_start_while_running_is_noop() {
    let mut rig = Rig::new();
    rig.metronome.start(120.0).unwrap();
    rig.run_until(2.5);
    assert_eq!(rig.metronome.snapshot().bar_count, 1);

    // Already running: tempo and counters untouched
    rig.metronome.start(60.0).unwrap();
    let snapshot = rig.metronome.snapshot();
    assert_eq!(snapshot.bar_count, 1);
    assert_eq!(snapshot.tempo, 120.0);

    rig.metronome.stop();
    let once = rig.metronome.snapshot();
    rig.metronome.stop();
    let twice = rig.metronome.snapshot();
    assert_eq!(once, twice);
    assert!(!twice.is_running);
    assert_eq!(twice.bar_count, 1);

    // Nothing is scheduled while stopped
    rig.clear();
    rig.run_until(5.0);
    assert!(rig.events().is_empty());
    assert!(rig.clicks().is_empty());
}

#[test]
fn test_restart_resets_counters() {
    let mut rig = Rig::new();
    rig.metronome.set_time_signature(2);
    rig.metronome.start(120.0).unwrap();
    rig.run_until(2.0);
    rig.metronome.stop();
    assert!(rig.metronome.snapshot().bar_count > 0);

    rig.metronome.start(90.0).unwrap();
    let snapshot = rig.metronome.snapshot();
    assert_eq!(snapshot.bar_count, 0);
    assert_eq!(snapshot.current_beat, 0);
    assert_eq!(snapshot.subdivision_index, 0);
    assert_eq!(snapshot.tempo, 90.0);
    assert!(approx(snapshot.next_onset_time, rig.metronome.now() + 0.05));
}

#[test]
fn test_clicks_carry_absolute_times() {
    let mut rig = Rig::new();
    rig.clock.set(100.0);
    rig.metronome.start(60.0).unwrap();
    rig.run_until(102.5);

    let times: Vec<f64> = rig.clicks().iter().map(|c| c.time).collect();
    assert_eq!(times.len(), 3);
    assert!(approx(times[0], 100.05));
    assert!(approx(times[1], 101.05));
    assert!(approx(times[2], 102.05));
}
