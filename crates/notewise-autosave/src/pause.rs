//! Auto-save pause state.
//!
//! Pausing stops trigger-driven drains only. Queued items stay queued and
//! explicit `process_queue` / `force_save_all` calls still run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use notewise_core::{CoreEvent, EventBus};

/// Shared pause flag.
///
/// The hot path (`is_paused`) is a lock-free atomic load; handles and the
/// coordinator task share one flag.
#[derive(Debug, Clone, Default)]
pub struct PauseState {
    paused: Arc<AtomicBool>,
}

impl PauseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether triggers are currently ignored.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Stop trigger-driven drains. Returns `false` if already paused.
    pub fn pause(&self, events: &EventBus) -> bool {
        let changed = !self.paused.swap(true, Ordering::SeqCst);
        if changed {
            info!(subsystem = "autosave", component = "pause", "Auto-save PAUSED");
            events.emit(CoreEvent::AutoSavePaused);
        }
        changed
    }

    /// Resume trigger-driven drains. Returns `false` if not paused.
    pub fn resume(&self, events: &EventBus) -> bool {
        let changed = self.paused.swap(false, Ordering::SeqCst);
        if changed {
            info!(subsystem = "autosave", component = "pause", "Auto-save RESUMED");
            events.emit(CoreEvent::AutoSaveResumed);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_running() {
        assert!(!PauseState::new().is_paused());
    }

    #[test]
    fn test_pause_resume_toggles() {
        let bus = EventBus::new(8);
        let state = PauseState::new();

        assert!(state.pause(&bus));
        assert!(state.is_paused());
        assert!(!state.pause(&bus), "second pause is a no-op");

        assert!(state.resume(&bus));
        assert!(!state.is_paused());
        assert!(!state.resume(&bus), "second resume is a no-op");
    }

    #[test]
    fn test_clones_share_flag() {
        let bus = EventBus::new(8);
        let a = PauseState::new();
        let b = a.clone();
        a.pause(&bus);
        assert!(b.is_paused());
    }

    #[tokio::test]
    async fn test_emits_only_on_change() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let state = PauseState::new();

        state.pause(&bus);
        state.pause(&bus);
        state.resume(&bus);

        assert!(matches!(rx.recv().await.unwrap().payload, CoreEvent::AutoSavePaused));
        assert!(matches!(rx.recv().await.unwrap().payload, CoreEvent::AutoSaveResumed));
        assert!(rx.try_recv().is_err());
    }
}
