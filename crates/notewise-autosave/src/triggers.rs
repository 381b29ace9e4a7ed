//! Background tasks that drive the coordinator: the periodic interval and
//! the idle debounce.
//!
//! Both loops read the interval/threshold from the coordinator on every
//! iteration, so configuration updates apply without restarting them.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::coordinator::{AutoSaveHandle, Trigger};

/// Records user activity for the idle trigger.
#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    last: watch::Sender<Instant>,
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityMonitor {
    pub fn new() -> Self {
        let (last, _) = watch::channel(Instant::now());
        Self { last }
    }

    /// Note that the user just typed.
    pub fn record_activity(&self) {
        self.last.send_replace(Instant::now());
    }

    /// Time of the latest recorded activity.
    pub fn last_activity(&self) -> Instant {
        *self.last.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Instant> {
        self.last.subscribe()
    }
}

/// Drain the queue every `interval_secs` until `cancel` fires.
///
/// Ticks while paused are skipped by the coordinator handle.
pub fn spawn_interval_trigger(handle: AutoSaveHandle, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(interval_loop(handle, cancel))
}

#[instrument(skip_all, fields(subsystem = "autosave", component = "interval_trigger"))]
async fn interval_loop(handle: AutoSaveHandle, cancel: CancellationToken) {
    loop {
        let interval = match handle.configuration().await {
            Ok(config) => config.interval(),
            Err(e) => {
                debug!(error = %e, "Coordinator gone, stopping interval trigger");
                break;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }

        if let Err(e) = handle.trigger(Trigger::Interval).await {
            warn!(error = %e, "Interval trigger failed");
            break;
        }
    }
    debug!("Interval trigger stopped");
}

/// Drain the queue once the user has been idle for `idle_threshold_secs`.
///
/// Each recorded activity restarts the countdown; one drain fires per
/// quiet period.
pub fn spawn_idle_trigger(
    handle: AutoSaveHandle,
    monitor: &ActivityMonitor,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(idle_loop(handle, monitor.subscribe(), cancel))
}

#[instrument(skip_all, fields(subsystem = "autosave", component = "idle_trigger"))]
async fn idle_loop(
    handle: AutoSaveHandle,
    mut activity: watch::Receiver<Instant>,
    cancel: CancellationToken,
) {
    loop {
        // Wait for the next burst of typing
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = activity.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        // Debounce until the threshold passes with no new activity
        loop {
            let threshold = match handle.configuration().await {
                Ok(config) => config.idle_threshold(),
                Err(_) => return,
            };
            let deadline = *activity.borrow_and_update() + threshold;

            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = activity.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = sleep_until(deadline) => break,
            }
        }

        if let Err(e) = handle.trigger(Trigger::Idle).await {
            warn!(error = %e, "Idle trigger failed");
            break;
        }
    }
    debug!("Idle trigger stopped");
}

/// Running trigger tasks, stopped together.
#[derive(Debug)]
pub struct Triggers {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Triggers {
    /// Start both the interval and the idle trigger.
    pub fn spawn(handle: &AutoSaveHandle, monitor: &ActivityMonitor) -> Self {
        let cancel = CancellationToken::new();
        let tasks = vec![
            spawn_interval_trigger(handle.clone(), cancel.child_token()),
            spawn_idle_trigger(handle.clone(), monitor, cancel.child_token()),
        ];
        Self { cancel, tasks }
    }

    /// Cancel both loops and wait for them, up to `timeout`.
    pub async fn stop(self, timeout: Duration) {
        self.cancel.cancel();
        for task in self.tasks {
            if tokio::time::timeout(timeout, task).await.is_err() {
                warn!("Trigger task did not stop in time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::coordinator::AutoSaveBuilder;
    use crate::persistence::MemoryPersistence;
    use notewise_core::{AutoSaveConfiguration, NoteRef, SavePriority};

    fn start(store: &MemoryPersistence) -> AutoSaveHandle {
        AutoSaveBuilder::new(Arc::new(store.clone()))
            .with_config(
                AutoSaveConfiguration::default()
                    .with_interval_secs(5.0)
                    .with_idle_threshold_secs(2.0),
            )
            .start()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_trigger_drains() {
        let store = MemoryPersistence::new();
        let handle = start(&store);
        let cancel = CancellationToken::new();
        let task = spawn_interval_trigger(handle.clone(), cancel.clone());

        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();
        sleep(Duration::from_secs(4)).await;
        assert_eq!(store.draft_count(), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(store.draft_count(), 1);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_trigger_skips_while_paused() {
        let store = MemoryPersistence::new();
        let handle = start(&store);
        let cancel = CancellationToken::new();
        let task = spawn_interval_trigger(handle.clone(), cancel.clone());

        handle.pause();
        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();
        sleep(Duration::from_secs(12)).await;
        assert_eq!(store.draft_count(), 0);

        handle.resume();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.draft_count(), 1);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_trigger_debounces_activity() {
        let store = MemoryPersistence::new();
        let handle = start(&store);
        let monitor = ActivityMonitor::new();
        let cancel = CancellationToken::new();
        let task = spawn_idle_trigger(handle.clone(), &monitor, cancel.clone());

        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();

        // Keep typing every second; the 2s threshold never passes
        for _ in 0..4 {
            monitor.record_activity();
            sleep(Duration::from_secs(1)).await;
        }
        assert_eq!(store.draft_count(), 0);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(store.draft_count(), 1);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_trigger_waits_for_activity() {
        let store = MemoryPersistence::new();
        let handle = start(&store);
        let monitor = ActivityMonitor::new();
        let cancel = CancellationToken::new();
        let task = spawn_idle_trigger(handle.clone(), &monitor, cancel.clone());

        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();
        sleep(Duration::from_secs(10)).await;
        assert_eq!(store.draft_count(), 0, "no activity, no idle drain");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_stop() {
        let handle = start(&MemoryPersistence::new());
        let monitor = ActivityMonitor::new();
        let triggers = Triggers::spawn(&handle, &monitor);
        triggers.stop(Duration::from_secs(1)).await;
    }
}
