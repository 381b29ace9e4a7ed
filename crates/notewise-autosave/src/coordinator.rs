//! Auto-save coordinator task and its handle.
//!
//! A single task owns the [`SaveQueue`] and the statistics. Handles talk to
//! it over an mpsc command channel with oneshot replies, so the queue is
//! never shared or locked. Saves of one batch run concurrently; each is
//! bounded by the configured timeout and can be cancelled through the
//! current [`CancellationToken`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

use notewise_core::defaults::COMMAND_CHANNEL_CAPACITY;
use notewise_core::{
    new_v7, AutoSaveConfiguration, CoreEvent, DraftPersistence, Error, EventBus, EventEnvelope,
    NoteRef, Result, SavePriority, SaveStatistics,
};

use crate::pause::PauseState;
use crate::queue::{FailureOutcome, QueueCounts, SaveQueue, SaveQueueItem};

/// External stimulus asking the coordinator to drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Periodic timer fired.
    Interval,
    /// The user stopped typing.
    Idle,
}

/// Result of one persistence attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptResult {
    Completed { duration_ms: u64 },
    RetryScheduled { retry_count: u32, delay_ms: u64, error: String },
    Failed { retry_count: u32, error: String },
    /// Stopped by a clear; not counted as a failure.
    Cancelled,
}

/// One dispatched item and what became of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub item_id: Uuid,
    pub note_id: Uuid,
    pub priority: SavePriority,
    /// 1-based attempt number.
    pub attempt: u32,
    #[serde(flatten)]
    pub result: AttemptResult,
}

/// Outcomes of a drain, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessReport {
    pub outcomes: Vec<SaveOutcome>,
}

impl ProcessReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.count(|r| matches!(r, AttemptResult::Completed { .. }))
    }

    pub fn retried(&self) -> usize {
        self.count(|r| matches!(r, AttemptResult::RetryScheduled { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, AttemptResult::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|r| matches!(r, AttemptResult::Cancelled))
    }

    /// Note ids in dispatch order.
    pub fn note_order(&self) -> Vec<Uuid> {
        self.outcomes.iter().map(|o| o.note_id).collect()
    }

    fn count(&self, f: impl Fn(&AttemptResult) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.result)).count()
    }
}

/// Snapshot of queue health for the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueMetrics {
    pub queue_length: usize,
    #[serde(flatten)]
    pub counts: QueueCounts,
    pub is_paused: bool,
    pub last_successful_save: Option<DateTime<Utc>>,
    pub statistics: SaveStatistics,
}

enum Command {
    Enqueue {
        id: Uuid,
        note: NoteRef,
        priority: SavePriority,
    },
    Process {
        reply: oneshot::Sender<ProcessReport>,
    },
    ForceSaveAll {
        reply: oneshot::Sender<ProcessReport>,
    },
    Clear {
        delete_drafts: bool,
        reply: oneshot::Sender<Result<usize>>,
    },
    UpdateConfiguration {
        config: AutoSaveConfiguration,
        reply: oneshot::Sender<()>,
    },
    Configuration {
        reply: oneshot::Sender<AutoSaveConfiguration>,
    },
    Metrics {
        reply: oneshot::Sender<QueueMetrics>,
    },
    ResetStatistics {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<SaveQueueItem>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Token slot shared by handles and the coordinator task.
///
/// Handles cancel the current token; the task swaps in a fresh one once it
/// has processed the clear.
#[derive(Debug, Clone, Default)]
struct CancelSlot(Arc<Mutex<CancellationToken>>);

impl CancelSlot {
    fn lock(&self) -> MutexGuard<'_, CancellationToken> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current(&self) -> CancellationToken {
        self.lock().clone()
    }

    fn cancel(&self) {
        self.lock().cancel();
    }

    fn renew(&self) {
        *self.lock() = CancellationToken::new();
    }
}

/// Cloneable handle for talking to a running coordinator.
#[derive(Debug, Clone)]
pub struct AutoSaveHandle {
    tx: mpsc::Sender<Command>,
    cancel: CancelSlot,
    pause: PauseState,
    events: EventBus,
}

impl AutoSaveHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())
    }

    /// Hand a snapshot to the queue. Returns the new item id.
    ///
    /// The id is generated here, before the hand-off; when the snapshot is
    /// merged into an existing item, the queue keeps the older id and the
    /// `SaveQueued` event reports it.
    pub async fn enqueue(&self, note: NoteRef, priority: SavePriority) -> Result<Uuid> {
        let id = new_v7();
        self.tx
            .send(Command::Enqueue { id, note, priority })
            .await
            .map_err(|_| stopped())?;
        Ok(id)
    }

    /// Non-async variant of [`enqueue`](Self::enqueue); fails when the
    /// command channel is full.
    pub fn try_enqueue(&self, note: NoteRef, priority: SavePriority) -> Result<Uuid> {
        let id = new_v7();
        self.tx
            .try_send(Command::Enqueue { id, note, priority })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::Internal("auto-save command channel is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => stopped(),
            })?;
        Ok(id)
    }

    /// Drain up to `max_items_per_batch` ready items. Works while paused.
    pub async fn process_queue(&self) -> Result<ProcessReport> {
        self.request(|reply| Command::Process { reply }).await
    }

    /// Drain everything, promoting backoff retries, until each item has
    /// completed or failed terminally.
    pub async fn force_save_all(&self) -> Result<ProcessReport> {
        self.request(|reply| Command::ForceSaveAll { reply }).await
    }

    /// React to a trigger. Returns `None` when paused.
    pub async fn trigger(&self, trigger: Trigger) -> Result<Option<ProcessReport>> {
        if self.pause.is_paused() {
            debug!(?trigger, "Auto-save paused, ignoring trigger");
            return Ok(None);
        }
        trace!(?trigger, "Auto-save trigger");
        self.process_queue().await.map(Some)
    }

    /// Cancel in-flight saves and drop every queued item. Returns how many
    /// items were removed; a second call returns 0.
    pub async fn clear_queue(&self) -> Result<usize> {
        self.cancel.cancel();
        self.request(|reply| Command::Clear {
            delete_drafts: false,
            reply,
        })
        .await?
    }

    /// [`clear_queue`](Self::clear_queue) plus deleting stored drafts.
    pub async fn clear_all_drafts(&self) -> Result<usize> {
        self.cancel.cancel();
        self.request(|reply| Command::Clear {
            delete_drafts: true,
            reply,
        })
        .await?
    }

    pub fn pause(&self) -> bool {
        self.pause.pause(&self.events)
    }

    pub fn resume(&self) -> bool {
        self.pause.resume(&self.events)
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Replace the configuration; later batches use it.
    pub async fn update_configuration(&self, config: AutoSaveConfiguration) -> Result<()> {
        config.validate()?;
        self.request(|reply| Command::UpdateConfiguration { config, reply })
            .await
    }

    pub async fn configuration(&self) -> Result<AutoSaveConfiguration> {
        self.request(|reply| Command::Configuration { reply }).await
    }

    pub async fn metrics(&self) -> Result<QueueMetrics> {
        self.request(|reply| Command::Metrics { reply }).await
    }

    pub async fn statistics(&self) -> Result<SaveStatistics> {
        Ok(self.metrics().await?.statistics)
    }

    pub async fn reset_statistics(&self) -> Result<()> {
        self.request(|reply| Command::ResetStatistics { reply }).await
    }

    /// Copy of the live queue items.
    pub async fn snapshot(&self) -> Result<Vec<SaveQueueItem>> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to coordinator events.
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Stop the coordinator after the current command. Queued items are dropped.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

fn stopped() -> Error {
    Error::Internal("auto-save coordinator has stopped".to_string())
}

/// Owns the save queue; run it with [`start`](Self::start).
pub struct AutoSaveCoordinator {
    persistence: Arc<dyn DraftPersistence>,
    config: AutoSaveConfiguration,
    queue: SaveQueue,
    statistics: SaveStatistics,
    last_successful_save: Option<DateTime<Utc>>,
    pause: PauseState,
    events: EventBus,
    cancel: CancelSlot,
}

impl AutoSaveCoordinator {
    /// Create a coordinator. Fails if `config` is invalid.
    pub fn new(
        persistence: Arc<dyn DraftPersistence>,
        config: AutoSaveConfiguration,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            persistence,
            config,
            queue: SaveQueue::new(),
            statistics: SaveStatistics::default(),
            last_successful_save: None,
            pause: PauseState::new(),
            events: EventBus::default(),
            cancel: CancelSlot::default(),
        })
    }

    /// Publish events on a shared bus instead of a private one.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Spawn the coordinator task and return a handle for control.
    pub fn start(self) -> AutoSaveHandle {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let handle = AutoSaveHandle {
            tx,
            cancel: self.cancel.clone(),
            pause: self.pause.clone(),
            events: self.events.clone(),
        };
        tokio::spawn(self.run(rx));
        handle
    }

    #[instrument(skip(self, rx), fields(subsystem = "autosave", component = "coordinator"))]
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!(
            interval_secs = self.config.interval_secs,
            max_items_per_batch = self.config.max_items_per_batch,
            retry_attempts = self.config.retry_attempts,
            "Auto-save coordinator started"
        );

        while let Some(command) = rx.recv().await {
            match command {
                Command::Enqueue { id, note, priority } => self.enqueue(id, note, priority),
                Command::Process { reply } => {
                    let report = self.process_queue().await;
                    let _ = reply.send(report);
                }
                Command::ForceSaveAll { reply } => {
                    let report = self.force_save_all().await;
                    let _ = reply.send(report);
                }
                Command::Clear {
                    delete_drafts,
                    reply,
                } => {
                    let result = self.clear(delete_drafts).await;
                    let _ = reply.send(result);
                }
                Command::UpdateConfiguration { config, reply } => {
                    info!(
                        interval_secs = config.interval_secs,
                        retry_attempts = config.retry_attempts,
                        "Auto-save configuration updated"
                    );
                    self.config = config;
                    self.exhaust_retries();
                    self.events.emit(CoreEvent::ConfigurationUpdated);
                    let _ = reply.send(());
                }
                Command::Configuration { reply } => {
                    let _ = reply.send(self.config.clone());
                }
                Command::Metrics { reply } => {
                    let _ = reply.send(self.metrics());
                }
                Command::ResetStatistics { reply } => {
                    self.statistics = SaveStatistics::default();
                    debug!("Save statistics reset");
                    let _ = reply.send(());
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.queue.snapshot());
                }
                Command::Shutdown { reply } => {
                    if self.queue.has_outstanding() {
                        warn!(
                            remaining = self.queue.len(),
                            "Auto-save coordinator stopping with unsaved items"
                        );
                    }
                    let _ = reply.send(());
                    break;
                }
            }
        }

        info!("Auto-save coordinator stopped");
    }

    fn enqueue(&mut self, id: Uuid, note: NoteRef, priority: SavePriority) {
        let note_id = note.note_id;
        let outcome = self.queue.enqueue(id, note, priority);
        trace!(
            item_id = %outcome.id(),
            %note_id,
            %priority,
            coalesced = outcome.is_coalesced(),
            "Save queued"
        );
        self.events.emit(CoreEvent::SaveQueued {
            item_id: outcome.id(),
            note_id,
            priority,
            coalesced: outcome.is_coalesced(),
        });
    }

    async fn process_queue(&mut self) -> ProcessReport {
        let mut report = ProcessReport::default();
        let limit = self.config.max_items_per_batch;
        self.drain_batch(limit, false, &mut report).await;
        self.emit_status();
        report
    }

    async fn force_save_all(&mut self) -> ProcessReport {
        let mut report = ProcessReport::default();
        loop {
            if self.cancel.current().is_cancelled() {
                debug!("Force save interrupted by clear");
                break;
            }
            if self.drain_batch(usize::MAX, true, &mut report).await == 0 {
                break;
            }
        }
        info!(
            completed = report.completed(),
            failed = report.failed(),
            attempts = report.outcomes.len(),
            "Force save finished"
        );
        self.emit_status();
        report
    }

    /// Dispatch one batch concurrently and apply the results in dispatch
    /// order. Returns how many items were dispatched.
    async fn drain_batch(
        &mut self,
        limit: usize,
        ignore_backoff: bool,
        report: &mut ProcessReport,
    ) -> usize {
        let batch = self.queue.next_batch(limit, Instant::now(), ignore_backoff);
        if batch.is_empty() {
            return 0;
        }

        let token = self.cancel.current();
        let timeout = self.config.save_timeout();
        debug!(batch_size = batch.len(), ?timeout, "Dispatching save batch");

        let mut attempts = Vec::with_capacity(batch.len());
        for item in &batch {
            self.events.emit(CoreEvent::SaveStarted {
                item_id: item.id,
                note_id: item.note_id(),
                attempt: item.retry_count + 1,
            });
            attempts.push(attempt_save(
                self.persistence.clone(),
                item.note.clone(),
                timeout,
                token.clone(),
            ));
        }
        let results = join_all(attempts).await;

        let now = Instant::now();
        for (item, (result, elapsed)) in batch.iter().zip(results) {
            let outcome = self.apply(item, result, elapsed, now);
            report.outcomes.push(SaveOutcome {
                item_id: item.id,
                note_id: item.note_id(),
                priority: item.priority,
                attempt: item.retry_count + 1,
                result: outcome,
            });
        }
        batch.len()
    }

    fn apply(
        &mut self,
        item: &SaveQueueItem,
        result: Option<Result<()>>,
        elapsed: Duration,
        now: Instant,
    ) -> AttemptResult {
        let duration_ms = elapsed.as_millis() as u64;
        match result {
            None => {
                self.queue.release(item.id);
                debug!(item_id = %item.id, "Save attempt cancelled");
                AttemptResult::Cancelled
            }
            Some(Ok(())) => {
                let pending = self.queue.complete(item.id).map(|i| i.age()).unwrap_or_default();
                self.statistics.record_success(elapsed, pending);
                self.last_successful_save = Some(Utc::now());
                debug!(item_id = %item.id, note_id = %item.note_id(), duration_ms, "Save completed");
                self.events.emit(CoreEvent::SaveCompleted {
                    item_id: item.id,
                    note_id: item.note_id(),
                    duration_ms,
                });
                AttemptResult::Completed { duration_ms }
            }
            Some(Err(e)) => {
                let message = e.to_string();
                match self
                    .queue
                    .fail(item.id, message.clone(), e.is_retryable(), &self.config, now)
                {
                    Some(FailureOutcome::Retry { retry_count, delay }) => {
                        let delay_ms = delay.as_millis() as u64;
                        warn!(
                            item_id = %item.id,
                            note_id = %item.note_id(),
                            retry_count,
                            delay_ms,
                            error = %message,
                            "Save failed, retry scheduled"
                        );
                        self.events.emit(CoreEvent::SaveRetryScheduled {
                            item_id: item.id,
                            note_id: item.note_id(),
                            retry_count,
                            delay_ms,
                            error: message.clone(),
                        });
                        AttemptResult::RetryScheduled {
                            retry_count,
                            delay_ms,
                            error: message,
                        }
                    }
                    Some(FailureOutcome::Failed { retry_count }) => {
                        self.statistics.record_failure(item.age());
                        error!(
                            item_id = %item.id,
                            note_id = %item.note_id(),
                            retry_count,
                            error = %message,
                            "Save failed permanently"
                        );
                        self.events.emit(CoreEvent::SaveFailed {
                            item_id: item.id,
                            note_id: item.note_id(),
                            retry_count,
                            error: message.clone(),
                        });
                        AttemptResult::Failed {
                            retry_count,
                            error: message,
                        }
                    }
                    // Cleared while in flight
                    None => AttemptResult::Cancelled,
                }
            }
        }
    }

    /// Terminally fail retries the current configuration no longer allows.
    fn exhaust_retries(&mut self) {
        for item in self.queue.exhaust_retries(&self.config) {
            self.statistics.record_failure(item.age());
            let error = item
                .last_error
                .clone()
                .unwrap_or_else(|| "retry attempts exhausted".to_string());
            warn!(
                item_id = %item.id,
                note_id = %item.note_id(),
                retry_count = item.retry_count,
                "Retry limit lowered, failing waiting save"
            );
            self.events.emit(CoreEvent::SaveFailed {
                item_id: item.id,
                note_id: item.note_id(),
                retry_count: item.retry_count,
                error,
            });
        }
    }

    async fn clear(&mut self, delete_drafts: bool) -> Result<usize> {
        let cancelled = self.queue.clear();
        self.cancel.renew();

        let delete = delete_drafts || !self.config.preserve_drafts;
        let deleted = if delete {
            self.persistence.delete_drafts().await.map(|_| true)
        } else {
            Ok(false)
        };

        info!(cancelled, drafts_deleted = delete, "Save queue cleared");
        self.events.emit(CoreEvent::QueueCleared {
            cancelled,
            drafts_deleted: matches!(deleted, Ok(true)),
        });
        deleted.map(|_| cancelled)
    }

    fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            queue_length: self.queue.len(),
            counts: self.queue.counts(Instant::now()),
            is_paused: self.pause.is_paused(),
            last_successful_save: self.last_successful_save,
            statistics: self.statistics.clone(),
        }
    }

    fn emit_status(&self) {
        let counts = self.queue.counts(Instant::now());
        self.events.emit(CoreEvent::QueueStatus {
            pending: counts.pending + counts.awaiting_retry,
            in_progress: counts.in_progress,
            failed: counts.failed,
        });
    }
}

/// One bounded, cancellable save. `None` means cancelled.
async fn attempt_save(
    persistence: Arc<dyn DraftPersistence>,
    note: NoteRef,
    timeout: Duration,
    token: CancellationToken,
) -> (Option<Result<()>>, Duration) {
    let start = Instant::now();
    let result = tokio::select! {
        _ = token.cancelled() => None,
        outcome = tokio::time::timeout(timeout, persistence.save(&note)) => Some(match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(timeout.as_millis() as u64)),
        }),
    };
    (result, start.elapsed())
}

/// Builder for a coordinator with shared collaborators.
pub struct AutoSaveBuilder {
    persistence: Arc<dyn DraftPersistence>,
    config: AutoSaveConfiguration,
    events: Option<EventBus>,
}

impl AutoSaveBuilder {
    pub fn new(persistence: Arc<dyn DraftPersistence>) -> Self {
        Self {
            persistence,
            config: AutoSaveConfiguration::default(),
            events: None,
        }
    }

    pub fn with_config(mut self, config: AutoSaveConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Validate, spawn, and return the handle.
    pub fn start(self) -> Result<AutoSaveHandle> {
        let mut coordinator = AutoSaveCoordinator::new(self.persistence, self.config)?;
        if let Some(events) = self.events {
            coordinator = coordinator.with_event_bus(events);
        }
        Ok(coordinator.start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;
    use notewise_core::SaveStatus;

    fn config() -> AutoSaveConfiguration {
        AutoSaveConfiguration::default()
            .with_interval_secs(1.0)
            .with_retry_attempts(3)
            .with_retry_base_delay_secs(0.5)
    }

    fn start(store: &MemoryPersistence, config: AutoSaveConfiguration) -> AutoSaveHandle {
        AutoSaveBuilder::new(Arc::new(store.clone()))
            .with_config(config)
            .start()
            .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = AutoSaveCoordinator::new(
            Arc::new(MemoryPersistence::new()),
            AutoSaveConfiguration::default().with_retry_attempts(0),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_process_saves_and_records_statistics() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());
        let note_id = Uuid::new_v4();

        handle
            .enqueue(NoteRef::new(note_id, "hello"), SavePriority::Normal)
            .await
            .unwrap();
        let report = handle.process_queue().await.unwrap();

        assert_eq!(report.completed(), 1);
        assert_eq!(store.draft(note_id).map(|n| n.content), Some("hello".into()));

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.queue_length, 0);
        assert_eq!(metrics.statistics.successful_saves, 1);
        assert_eq!(metrics.statistics.total_saves, 1);
        assert!(metrics.last_successful_save.is_some());
    }

    #[tokio::test]
    async fn test_batch_limit() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config().with_max_items_per_batch(2));
        for _ in 0..5 {
            handle
                .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
                .await
                .unwrap();
        }
        assert_eq!(handle.process_queue().await.unwrap().outcomes.len(), 2);
        assert_eq!(handle.snapshot().await.unwrap().len(), 3);
        assert_eq!(handle.force_save_all().await.unwrap().completed(), 3);
    }

    #[tokio::test]
    async fn test_coalesced_enqueue_saves_latest() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());
        let mut events = handle.events();
        let note_id = Uuid::new_v4();

        let first = handle
            .enqueue(NoteRef::new(note_id, "v1"), SavePriority::Low)
            .await
            .unwrap();
        handle
            .enqueue(NoteRef::new(note_id, "v2"), SavePriority::High)
            .await
            .unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, first);
        assert_eq!(snapshot[0].priority, SavePriority::High);

        handle.process_queue().await.unwrap();
        assert_eq!(store.attempts_for(note_id), 1);
        assert_eq!(store.draft(note_id).map(|n| n.content), Some("v2".into()));

        let first_event = events.recv().await.unwrap();
        assert!(matches!(
            first_event.payload,
            CoreEvent::SaveQueued { coalesced: false, .. }
        ));
        let second_event = events.recv().await.unwrap();
        match second_event.payload {
            CoreEvent::SaveQueued {
                item_id, coalesced, ..
            } => {
                assert!(coalesced);
                assert_eq!(item_id, first);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_law() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config().with_retry_attempts(4));
        let note_id = Uuid::new_v4();
        store.fail_note(note_id, u32::MAX);

        let id = handle
            .enqueue(NoteRef::new(note_id, "x"), SavePriority::Normal)
            .await
            .unwrap();
        assert!(notewise_core::is_v7(&id), "queue ids are time-ordered");
        let report = handle.force_save_all().await.unwrap();

        assert_eq!(store.attempts_for(note_id), 4);
        assert_eq!(report.retried(), 3);
        assert_eq!(report.failed(), 1);

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot[0].id, id);
        assert_eq!(snapshot[0].status, SaveStatus::Failed);
        assert_eq!(snapshot[0].retry_count, 4);
        assert!(snapshot[0].last_error.is_some());

        let stats = handle.statistics().await.unwrap();
        assert_eq!(stats.failed_saves, 1);
        assert_eq!(stats.total_saves, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_backoff() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());
        let note_id = Uuid::new_v4();
        store.fail_note(note_id, 1);

        handle
            .enqueue(NoteRef::new(note_id, "x"), SavePriority::Normal)
            .await
            .unwrap();
        let first = handle.process_queue().await.unwrap();
        assert_eq!(first.retried(), 1);

        // Still inside the 0.5s backoff
        assert!(handle.process_queue().await.unwrap().is_empty());
        assert_eq!(handle.metrics().await.unwrap().counts.awaiting_retry, 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let second = handle.process_queue().await.unwrap();
        assert_eq!(second.completed(), 1);
        assert_eq!(second.outcomes[0].attempt, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let store = MemoryPersistence::new().with_delay(Duration::from_secs(5));
        let handle = start(&store, config().with_retry_attempts(1));

        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();
        let report = handle.process_queue().await.unwrap();

        assert_eq!(report.failed(), 1);
        match &report.outcomes[0].result {
            AttemptResult::Failed { error, .. } => assert!(error.contains("Timed out")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clear_queue_twice() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());
        for _ in 0..3 {
            handle
                .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
                .await
                .unwrap();
        }

        assert_eq!(handle.clear_queue().await.unwrap(), 3);
        assert_eq!(handle.clear_queue().await.unwrap(), 0);
        assert!(handle.snapshot().await.unwrap().is_empty());
        assert_eq!(store.drafts_deleted(), 0, "drafts preserved by default");

        // Token renewed: later saves still run
        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "y"), SavePriority::Normal)
            .await
            .unwrap();
        assert_eq!(handle.process_queue().await.unwrap().completed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_in_flight_saves() {
        let store = MemoryPersistence::new().with_delay(Duration::from_millis(800));
        let handle = start(&store, config().with_interval_secs(10.0));
        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();

        let processing = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.process_queue().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(handle.clear_queue().await.unwrap(), 1);
        let report = processing.await.unwrap().unwrap();
        assert_eq!(report.cancelled(), 1);

        let stats = handle.statistics().await.unwrap();
        assert_eq!(stats.total_saves, 0, "cancelled attempts are not failures");
    }

    #[tokio::test]
    async fn test_clear_all_drafts_deletes() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());
        let mut events = handle.events();
        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();
        handle.process_queue().await.unwrap();

        assert_eq!(handle.clear_all_drafts().await.unwrap(), 0);
        assert_eq!(store.draft_count(), 0);
        assert_eq!(store.drafts_deleted(), 1);

        let mut saw_clear = false;
        while let Ok(envelope) = events.try_recv() {
            if let CoreEvent::QueueCleared { drafts_deleted, .. } = envelope.payload {
                assert!(drafts_deleted);
                saw_clear = true;
            }
        }
        assert!(saw_clear);
    }

    #[tokio::test]
    async fn test_pause_ignores_triggers_but_not_explicit_process() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());
        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();

        assert!(handle.pause());
        assert!(handle.trigger(Trigger::Interval).await.unwrap().is_none());
        assert_eq!(handle.snapshot().await.unwrap().len(), 1);
        assert!(handle.metrics().await.unwrap().is_paused);

        assert_eq!(handle.process_queue().await.unwrap().completed(), 1);

        assert!(handle.resume());
        assert!(handle.trigger(Trigger::Idle).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_configuration() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());

        let invalid = config().with_max_items_per_batch(0);
        assert!(handle.update_configuration(invalid).await.is_err());

        handle
            .update_configuration(config().with_max_items_per_batch(1))
            .await
            .unwrap();
        assert_eq!(handle.configuration().await.unwrap().max_items_per_batch, 1);

        for _ in 0..3 {
            handle
                .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
                .await
                .unwrap();
        }
        assert_eq!(handle.process_queue().await.unwrap().outcomes.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lowering_retry_attempts_fails_waiting_items() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config().with_retry_attempts(5));
        let mut events = handle.events();
        let note_id = Uuid::new_v4();
        store.fail_note(note_id, u32::MAX);

        handle
            .enqueue(NoteRef::new(note_id, "x"), SavePriority::Normal)
            .await
            .unwrap();
        for _ in 0..2 {
            handle.process_queue().await.unwrap();
            tokio::time::advance(Duration::from_secs(5)).await;
        }
        assert_eq!(handle.snapshot().await.unwrap()[0].retry_count, 2);

        handle
            .update_configuration(config().with_retry_attempts(1))
            .await
            .unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot[0].status, SaveStatus::Failed);
        assert!(snapshot[0].retry_count <= 1);
        assert_eq!(handle.statistics().await.unwrap().failed_saves, 1);
        assert!(handle.process_queue().await.unwrap().is_empty());
        assert_eq!(store.attempts_for(note_id), 2);

        let mut saw_failed = false;
        while let Ok(envelope) = events.try_recv() {
            saw_failed |= envelope.event_type == "save.failed";
        }
        assert!(saw_failed);
    }

    #[tokio::test]
    async fn test_reset_statistics() {
        let store = MemoryPersistence::new();
        let handle = start(&store, config());
        handle
            .enqueue(NoteRef::new(Uuid::new_v4(), "x"), SavePriority::Normal)
            .await
            .unwrap();
        handle.process_queue().await.unwrap();
        assert_eq!(handle.statistics().await.unwrap().successful_saves, 1);

        handle.reset_statistics().await.unwrap();
        assert_eq!(handle.statistics().await.unwrap(), SaveStatistics::default());
    }

    #[tokio::test]
    async fn test_shutdown_stops_coordinator() {
        let handle = start(&MemoryPersistence::new(), config());
        handle.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        let err = handle.process_queue().await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = ProcessReport {
            outcomes: vec![SaveOutcome {
                item_id: Uuid::nil(),
                note_id: Uuid::nil(),
                priority: SavePriority::Critical,
                attempt: 1,
                result: AttemptResult::Completed { duration_ms: 12 },
            }],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""result":"completed""#));
        assert!(json.contains(r#""duration_ms":12"#));
    }
}
