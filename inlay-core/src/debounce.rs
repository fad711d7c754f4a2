//! Trailing-edge debouncer driven by an explicit deadline.
//!
//! The host's event loop owns the timer: it sleeps until [`Debouncer::deadline`]
//! and then calls [`Debouncer::poll`]. Each `push` inside the window replaces
//! the pending event and restarts the window, so a burst collapses to its last
//! event.

use std::time::Duration;

use tokio::time::Instant;

/// Default coalescing window for trigger events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct Debouncer<E> {
    window: Duration,
    pending: Option<(E, Instant)>,
}

impl<E> Debouncer<E> {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records `event` as the latest one and restarts the window at `now`.
    pub fn push(&mut self, event: E, now: Instant) {
        self.pending = Some((event, now + self.window));
    }

    /// When the pending event becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Returns the latest event once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<E> {
        match self.pending {
            Some((_, due)) if due <= now => self.pending.take().map(|(event, _)| event),
            _ => None,
        }
    }

    /// Drops the pending event without firing it.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

impl<E> Default for Debouncer<E> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_last_event() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.push(1, start);
        debouncer.push(2, start + Duration::from_millis(40));
        debouncer.push(3, start + Duration::from_millis(90));

        // Window restarted at 90ms, so nothing is due at 150ms.
        assert_eq!(debouncer.poll(start + Duration::from_millis(150)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(190)), Some(3));
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), None);
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn clear_discards_pending_event() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.push("x", start);
        debouncer.clear();
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
