//! Cooldown-window debouncer.
//!
//! Accepts at most one press per cooldown window. The check and the update
//! of the window happen under one lock, so the debouncer can be shared
//! between any number of ingestion tasks.

use super::{ButtonEvent, ButtonId, DebounceScope};
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Mutable debounce bookkeeping, owned by a [`Debouncer`].
#[derive(Debug, Default)]
pub struct DebounceState {
    /// Last accepted press per cooldown window. A missing entry means the
    /// cooldown has already elapsed.
    last_accepted: HashMap<Option<ButtonId>, Instant>,
    /// Button in the pressed phase of its most recent accepted press.
    currently_pressed: Option<ButtonId>,
}

/// Decides which presses are real.
pub struct Debouncer {
    cooldown: Duration,
    scope: DebounceScope,
    state: Mutex<DebounceState>,
}

impl Debouncer {
    pub fn new(cooldown: Duration, scope: DebounceScope) -> Self {
        Self {
            cooldown,
            scope,
            state: Mutex::new(DebounceState::default()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn scope(&self) -> DebounceScope {
        self.scope
    }

    /// Decide whether `event`, observed at `now`, is a real press.
    ///
    /// Returns `true` and starts a new cooldown window when at least
    /// `cooldown` has passed since the last accepted press in the event's
    /// window. Rejected events leave the state untouched. A `now` earlier
    /// than the last accepted press counts as no time elapsed.
    pub fn accept(&self, event: &ButtonEvent, now: Instant) -> bool {
        let window = self.scope.window(event.id);
        let mut state = self.state.lock();

        if let Some(last) = state.last_accepted.get(&window)
            && now.saturating_duration_since(*last) < self.cooldown
        {
            debug!(
                "[Debounce] Ignoring button {} ({:?} into {:?} cooldown)",
                event.id,
                now.saturating_duration_since(*last),
                self.cooldown
            );
            return false;
        }

        // Windows whose cooldown has run out no longer affect any decision
        let cooldown = self.cooldown;
        state
            .last_accepted
            .retain(|_, last| now.saturating_duration_since(*last) < cooldown);
        state.last_accepted.insert(window, now);
        state.currently_pressed = Some(event.id);
        info!("[Debounce] Button {} pressed", event.id);
        true
    }

    /// Button whose accepted press has not been released yet, if any.
    pub fn currently_pressed(&self) -> Option<ButtonId> {
        self.state.lock().currently_pressed
    }

    /// Mark the press of `id` as released.
    ///
    /// Does nothing when another button has been accepted in the meantime.
    pub fn release(&self, id: ButtonId) {
        let mut state = self.state.lock();
        if state.currently_pressed == Some(id) {
            state.currently_pressed = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    const COOLDOWN: Duration = Duration::from_secs(15);

    fn press(debouncer: &Debouncer, id: ButtonId, t0: Instant, secs: u64) -> bool {
        let now = t0 + Duration::from_secs(secs);
        debouncer.accept(&ButtonEvent::new(id, now), now)
    }

    #[test]
    fn test_first_press_is_accepted() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::Global);
        let t0 = Instant::now();

        assert!(press(&debouncer, 3, t0, 0));
        assert_eq!(debouncer.currently_pressed(), Some(3));
    }

    #[test]
    fn test_rapid_presses_only_first_accepted() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::Global);
        let t0 = Instant::now();

        assert!(press(&debouncer, 0, t0, 0));
        for secs in [1, 2, 5, 9, 14] {
            assert!(!press(&debouncer, 0, t0, secs), "press at {secs}s");
        }
    }

    #[test]
    fn test_cooldown_measured_from_last_accepted_press() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::Global);
        let t0 = Instant::now();

        // Scenario: 0s accepted, 5s rejected, 20s accepted
        assert!(press(&debouncer, 0, t0, 0));
        assert!(!press(&debouncer, 0, t0, 5));
        assert!(press(&debouncer, 0, t0, 20));
        // Window restarted at 20s, not at the rejected 5s press
        assert!(!press(&debouncer, 0, t0, 34));
        assert!(press(&debouncer, 0, t0, 35));
    }

    #[test]
    fn test_exact_cooldown_boundary_is_accepted() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::Global);
        let t0 = Instant::now();

        assert!(press(&debouncer, 0, t0, 0));
        assert!(press(&debouncer, 0, t0, 15));
    }

    #[test]
    fn test_global_scope_blocks_other_buttons() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::Global);
        let t0 = Instant::now();

        assert!(press(&debouncer, 0, t0, 0));
        assert!(!press(&debouncer, 1, t0, 1));
        assert_eq!(debouncer.currently_pressed(), Some(0));
    }

    #[test]
    fn test_per_button_scope_keeps_separate_windows() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::PerButton);
        let t0 = Instant::now();

        assert!(press(&debouncer, 0, t0, 0));
        assert!(press(&debouncer, 1, t0, 1));
        assert!(!press(&debouncer, 0, t0, 2));
        assert!(!press(&debouncer, 1, t0, 3));
        assert_eq!(debouncer.currently_pressed(), Some(1));
    }

    #[test]
    fn test_clock_going_backwards_is_rejected() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::Global);
        let t0 = Instant::now() + Duration::from_secs(60);

        assert!(debouncer.accept(&ButtonEvent::new(0, t0), t0));
        let earlier = t0 - Duration::from_secs(30);
        assert!(!debouncer.accept(&ButtonEvent::new(0, earlier), earlier));
    }

    #[test]
    fn test_expired_windows_are_pruned() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::PerButton);
        let t0 = Instant::now();

        for id in 0..50 {
            assert!(press(&debouncer, id, t0, 0));
        }
        assert_eq!(debouncer.state.lock().last_accepted.len(), 50);

        assert!(press(&debouncer, 99, t0, 20));
        assert_eq!(debouncer.state.lock().last_accepted.len(), 1);
        // Pruned buttons start fresh
        assert!(press(&debouncer, 0, t0, 21));
    }

    #[test]
    fn test_release_only_clears_matching_button() {
        let debouncer = Debouncer::new(COOLDOWN, DebounceScope::PerButton);
        let t0 = Instant::now();

        assert!(press(&debouncer, 0, t0, 0));
        assert!(press(&debouncer, 1, t0, 1));

        debouncer.release(0);
        assert_eq!(debouncer.currently_pressed(), Some(1));

        debouncer.release(1);
        assert_eq!(debouncer.currently_pressed(), None);
    }

    #[test]
    fn test_concurrent_presses_accept_exactly_one() {
        let debouncer = Arc::new(Debouncer::new(COOLDOWN, DebounceScope::Global));
        let now = Instant::now();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|id| {
                let debouncer = debouncer.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    debouncer.accept(&ButtonEvent::new(id, now), now)
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();
        assert_eq!(accepted, 1);
    }
}
