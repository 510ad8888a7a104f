// Scheduler - Lookahead loop turning transport state into timed clicks
//
// A coarse timer calls `run_pass` every few tens of milliseconds. Each pass
// schedules every onset that falls inside the lookahead window at its exact
// audio-clock time, so the timer's own jitter never reaches the output.

use std::panic::{AssertUnwindSafe, catch_unwind};

use super::transport::{TransportSnapshot, TransportState};
use crate::messaging::beat_bus::BeatEvent;
use crate::synth::click::ClickOutput;

/// Window the scheduler looks ahead of the audio clock, in seconds
pub const DEFAULT_SCHEDULE_AHEAD: f64 = 0.1;

pub struct Scheduler {
    transport: TransportState,
    output: Box<dyn ClickOutput>,
    schedule_ahead: f64,
}

impl Scheduler {
    pub fn new(output: Box<dyn ClickOutput>, schedule_ahead: f64) -> Self {
        Self {
            transport: TransportState::new(),
            output,
            schedule_ahead: if schedule_ahead > 0.0 {
                schedule_ahead
            } else {
                DEFAULT_SCHEDULE_AHEAD
            },
        }
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    /// Commands go through here; they land before the next pass reads them
    pub fn transport_mut(&mut self) -> &mut TransportState {
        &mut self.transport
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        self.transport.snapshot()
    }

    pub fn schedule_ahead(&self) -> f64 {
        self.schedule_ahead
    }

    /// Schedule every slot due before `now + schedule_ahead`
    ///
    /// `notify` is called once per slot, in order. Returns the number of
    /// slots processed. Does nothing while the transport is stopped.
    pub fn run_pass(&mut self, now: f64, notify: &mut dyn FnMut(BeatEvent)) -> usize {
        if !self.transport.is_running() {
            return 0;
        }

        let horizon = now + self.schedule_ahead;
        let mut processed = 0;

        while self.transport.next_onset_time() < horizon {
            self.process_slot(notify);
            self.transport.advance();
            processed += 1;
        }

        processed
    }

    fn process_slot(&mut self, notify: &mut dyn FnMut(BeatEvent)) {
        let t = &self.transport;
        let sounding = t.slot_sounds();
        let muted = t.is_muted();
        let time = t.next_onset_time();

        let event = BeatEvent {
            beat_index: t.current_beat(),
            is_accent: t.is_downbeat(),
            tempo_bpm: t.tempo(),
            subdivision_index: t.subdivision_index(),
            bar: t.bar_count(),
            time,
            sounding,
            muted,
            count_in: t.is_counting_in(),
        };

        let click = (sounding && !muted).then(|| (t.click_category(), t.sound()));

        notify(event);

        if let Some((category, sound)) = click {
            // Neither an error nor a panic in the output may cost the following onsets
            let output = &mut self.output;
            match catch_unwind(AssertUnwindSafe(|| output.play_click(time, category, sound))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Click at {:.3}s skipped: {}", time, e),
                Err(_) => log::warn!("Click output panicked at {:.3}s, click skipped", time),
            }
        }
    }
}
