// Beat event bus - Fan-out of onset notifications to any number of listeners
//
// Every subdivision slot produces exactly one event, audible or not, so
// visual feedback stays locked to the rhythm even through silent bars.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// One onset slot, as seen by listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Beat within the bar, 0-based
    pub beat_index: u32,
    /// Downbeat of the bar (beat 0, first subdivision slot)
    pub is_accent: bool,
    /// Tempo at the time the slot was scheduled
    pub tempo_bpm: f64,
    /// Slot within the beat, 0-based
    pub subdivision_index: u32,
    /// Bars completed before this one
    pub bar: u64,
    /// Audio-clock time the slot is scheduled for
    pub time: f64,
    /// The pattern marks this slot as a sounding onset
    pub sounding: bool,
    /// Silent mode suppressed the sound of this slot
    pub muted: bool,
    /// Slot belongs to the count-in
    pub count_in: bool,
}

type Listener = Arc<dyn Fn(&BeatEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Multi-subscriber notification channel
///
/// Cloning gives another handle to the same subscriber set.
#[derive(Clone, Default)]
pub struct BeatEventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl BeatEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned handle's
    /// `unsubscribe` is called; dropping the handle does not unsubscribe.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&BeatEvent) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver one event to every listener, in subscription order
    ///
    /// Listeners run on a snapshot taken before the first call, without the
    /// bus lock held, so they may subscribe or unsubscribe freely. A listener
    /// removed mid-pass is skipped. A panicking listener is logged and the
    /// remaining ones still run.
    pub fn publish(&self, event: &BeatEvent) {
        let snapshot: Vec<(u64, Listener)> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.clone()
        };

        for (id, listener) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                log::warn!(
                    "Beat listener {} panicked on beat {} (bar {})",
                    id,
                    event.beat_index,
                    event.bar
                );
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .any(|(existing, _)| *existing == id)
    }
}

/// Handle returned by [`BeatEventBus::subscribe`]
#[must_use = "dropping a Subscription leaves the listener registered forever"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    /// Remove the listener. Safe to call from inside a listener.
    pub fn unsubscribe(self) {
        if let Some(bus) = self.bus.upgrade() {
            let mut inner = bus.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
