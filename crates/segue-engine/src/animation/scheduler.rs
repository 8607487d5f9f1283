//! The per-frame callback queue.
//!
//! Single-threaded and cooperative: `tick(delta_ms)` runs every registered
//! callback once, in registration order, so ordering within a frame is
//! deterministic. Callbacks retire themselves by returning
//! `TickOutcome::Stop` — this is how self-terminating update loops (the
//! spring line, the marquee) avoid idle cost without a real platform
//! scheduler. Tests drive `tick` manually; there is no wall clock anywhere.

/// What a frame callback wants the scheduler to do with it next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep calling this callback.
    Continue,
    /// Remove this callback after the current frame.
    Stop,
}

/// Identifier for a registered frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type FrameCallback = Box<dyn FnMut(f32) -> TickOutcome + Send>;

/// Registration-ordered per-frame callback list.
#[derive(Default)]
pub struct FrameScheduler {
    entries: Vec<(CallbackId, FrameCallback)>,
    next_id: u64,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("callbacks", &self.entries.len())
            .finish()
    }
}

impl FrameScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it runs after all previously registered ones.
    pub fn add(&mut self, callback: impl FnMut(f32) -> TickOutcome + Send + 'static) -> CallbackId {
        self.next_id += 1;
        let id = CallbackId(self.next_id);
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns true if it was registered.
    pub fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Run one frame. Callbacks returning `Stop` are removed afterwards;
    /// a callback registered during a tick first runs next frame.
    pub fn tick(&mut self, delta_ms: f32) {
        let mut retired = Vec::new();
        // Swap out so callbacks can register new ones re-entrantly.
        let mut running = std::mem::take(&mut self.entries);
        for (id, callback) in &mut running {
            if callback(delta_ms) == TickOutcome::Stop {
                retired.push(*id);
            }
        }
        // Newly added callbacks follow the ones that ran this frame.
        let added = std::mem::take(&mut self.entries);
        self.entries = running;
        self.entries.extend(added);
        self.entries.retain(|(id, _)| !retired.contains(id));
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static_assertions::assert_impl_all!(FrameScheduler: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = FrameScheduler::new();

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            scheduler.add(move |_| {
                order.lock().unwrap().push(label);
                TickOutcome::Continue
            });
        }

        scheduler.tick(16.0);
        assert_eq!(*order.lock().unwrap(), ["first", "second", "third"]);
    }

    #[test]
    fn stop_retires_a_callback() {
        let count = Arc::new(Mutex::new(0));
        let mut scheduler = FrameScheduler::new();

        let counter = Arc::clone(&count);
        scheduler.add(move |_| {
            *counter.lock().unwrap() += 1;
            TickOutcome::Stop
        });

        scheduler.tick(16.0);
        scheduler.tick(16.0);
        assert_eq!(*count.lock().unwrap(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn remove_by_id() {
        let mut scheduler = FrameScheduler::new();
        let id = scheduler.add(|_| TickOutcome::Continue);
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.remove(id));
        assert!(!scheduler.remove(id));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn callbacks_receive_the_delta() {
        let seen = Arc::new(Mutex::new(0.0_f32));
        let mut scheduler = FrameScheduler::new();
        let slot = Arc::clone(&seen);
        scheduler.add(move |delta| {
            *slot.lock().unwrap() = delta;
            TickOutcome::Continue
        });
        scheduler.tick(33.4);
        assert!((*seen.lock().unwrap() - 33.4).abs() < 1e-6);
    }
}
