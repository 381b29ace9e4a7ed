//! Priority queue of pending draft saves.
//!
//! The queue is plain data owned by the coordinator task; nothing here is
//! async or shared. Ordering is highest priority first, FIFO within a tier,
//! and at most one item per note is handed out at a time.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use notewise_core::{AutoSaveConfiguration, NoteRef, SavePriority, SaveStatus};

/// One draft save tracked by the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveQueueItem {
    pub id: Uuid,
    pub note: NoteRef,
    pub priority: SavePriority,
    pub status: SaveStatus,
    /// Failed attempts so far.
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
    /// Monotonic enqueue counter; FIFO tie-break within a priority.
    pub sequence: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When a scheduled retry becomes eligible again.
    #[serde(skip)]
    pub retry_at: Option<Instant>,
    #[serde(skip)]
    enqueued: Instant,
}

impl SaveQueueItem {
    pub fn note_id(&self) -> Uuid {
        self.note.note_id
    }

    /// Time since the note was first queued.
    pub fn age(&self) -> Duration {
        self.enqueued.elapsed()
    }

    /// Pending and past any backoff delay.
    pub fn is_ready(&self, now: Instant) -> bool {
        self.status == SaveStatus::Pending && self.retry_at.map_or(true, |at| at <= now)
    }

    /// Pending but still inside a backoff delay.
    pub fn is_awaiting_retry(&self, now: Instant) -> bool {
        self.status == SaveStatus::Pending && self.retry_at.map_or(false, |at| at > now)
    }
}

/// Result of [`SaveQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new item was appended.
    Queued(Uuid),
    /// The snapshot was merged into an existing item with this id.
    Coalesced(Uuid),
}

impl EnqueueOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            EnqueueOutcome::Queued(id) | EnqueueOutcome::Coalesced(id) => *id,
        }
    }

    pub fn is_coalesced(&self) -> bool {
        matches!(self, EnqueueOutcome::Coalesced(_))
    }
}

/// What happened to an item after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureOutcome {
    /// Back to pending once `delay` has passed.
    Retry { retry_count: u32, delay: Duration },
    /// Retries exhausted; the item stays visible as failed.
    Failed { retry_count: u32 },
}

/// Item counts by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub awaiting_retry: usize,
    pub in_progress: usize,
    pub failed: usize,
}

/// The live save queue.
#[derive(Debug, Default)]
pub struct SaveQueue {
    items: Vec<SaveQueueItem>,
    next_sequence: u64,
}

impl SaveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot, merging it into the note's waiting item if one exists.
    ///
    /// A waiting item (pending, or pending behind a backoff delay) takes the
    /// newer snapshot and the higher of the two priorities, keeping its id and
    /// place in line. A note whose only item is in progress gets a new item
    /// queued behind it.
    pub fn enqueue(&mut self, id: Uuid, note: NoteRef, priority: SavePriority) -> EnqueueOutcome {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.note_id() == note.note_id && i.status == SaveStatus::Pending)
        {
            existing.note = note;
            existing.priority = existing.priority.max(priority);
            return EnqueueOutcome::Coalesced(existing.id);
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.items.push(SaveQueueItem {
            id,
            note,
            priority,
            status: SaveStatus::Pending,
            retry_count: 0,
            enqueued_at: Utc::now(),
            sequence,
            last_error: None,
            retry_at: None,
            enqueued: Instant::now(),
        });
        EnqueueOutcome::Queued(id)
    }

    /// Mark up to `limit` ready items in progress and return snapshots of them
    /// in dispatch order.
    ///
    /// With `ignore_backoff`, items waiting on a retry delay count as ready.
    /// Notes that already have an item in progress are skipped.
    pub fn next_batch(&mut self, limit: usize, now: Instant, ignore_backoff: bool) -> Vec<SaveQueueItem> {
        let mut busy: HashSet<Uuid> = self
            .items
            .iter()
            .filter(|i| i.status == SaveStatus::InProgress)
            .map(|i| i.note_id())
            .collect();

        let mut ready: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, i)| {
                i.status == SaveStatus::Pending && (ignore_backoff || i.is_ready(now))
            })
            .map(|(idx, _)| idx)
            .collect();
        ready.sort_by(|a, b| {
            let (a, b) = (&self.items[*a], &self.items[*b]);
            b.priority.cmp(&a.priority).then(a.sequence.cmp(&b.sequence))
        });

        let mut batch = Vec::new();
        for idx in ready {
            if batch.len() >= limit {
                break;
            }
            let item = &mut self.items[idx];
            if !busy.insert(item.note_id()) {
                continue;
            }
            item.status = SaveStatus::InProgress;
            item.retry_at = None;
            batch.push(item.clone());
        }
        batch
    }

    /// Remove a completed item.
    pub fn complete(&mut self, id: Uuid) -> Option<SaveQueueItem> {
        let idx = self.items.iter().position(|i| i.id == id)?;
        let mut item = self.items.remove(idx);
        item.status = SaveStatus::Completed;
        Some(item)
    }

    /// Record a failed attempt and schedule a retry or fail terminally.
    ///
    /// Non-retryable errors fail terminally at once.
    pub fn fail(
        &mut self,
        id: Uuid,
        error: String,
        retryable: bool,
        config: &AutoSaveConfiguration,
        now: Instant,
    ) -> Option<FailureOutcome> {
        let item = self.items.iter_mut().find(|i| i.id == id)?;
        // The limit may have been lowered since the last attempt.
        item.retry_count = (item.retry_count + 1).min(config.retry_attempts.max(1));
        item.last_error = Some(error);

        if retryable && item.retry_count < config.retry_attempts {
            let delay = config.backoff_delay(item.retry_count);
            item.status = SaveStatus::Pending;
            item.retry_at = Some(now + delay);
            Some(FailureOutcome::Retry {
                retry_count: item.retry_count,
                delay,
            })
        } else {
            item.status = SaveStatus::Failed;
            item.retry_at = None;
            Some(FailureOutcome::Failed {
                retry_count: item.retry_count,
            })
        }
    }

    /// Fail terminally every item waiting on a retry that `config` no longer
    /// allows. Returns the items that were failed.
    pub fn exhaust_retries(&mut self, config: &AutoSaveConfiguration) -> Vec<SaveQueueItem> {
        let mut exhausted = Vec::new();
        for item in &mut self.items {
            if item.status == SaveStatus::Pending
                && item.retry_count > 0
                && item.retry_count >= config.retry_attempts
            {
                item.retry_count = item.retry_count.min(config.retry_attempts.max(1));
                item.status = SaveStatus::Failed;
                item.retry_at = None;
                exhausted.push(item.clone());
            }
        }
        exhausted
    }

    /// Return an in-progress item to pending without counting an attempt.
    pub fn release(&mut self, id: Uuid) {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.id == id && i.status == SaveStatus::InProgress)
        {
            item.status = SaveStatus::Pending;
        }
    }

    /// Cancel and remove every item. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    pub fn get(&self, id: Uuid) -> Option<&SaveQueueItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items that still need an attempt.
    pub fn has_outstanding(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i.status, SaveStatus::Pending | SaveStatus::InProgress))
    }

    pub fn counts(&self, now: Instant) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for item in &self.items {
            match item.status {
                SaveStatus::Pending if item.is_awaiting_retry(now) => counts.awaiting_retry += 1,
                SaveStatus::Pending => counts.pending += 1,
                SaveStatus::InProgress => counts.in_progress += 1,
                SaveStatus::Failed => counts.failed += 1,
                SaveStatus::Completed | SaveStatus::Cancelled => {}
            }
        }
        counts
    }

    /// Copy of the live items in queue order.
    pub fn snapshot(&self) -> Vec<SaveQueueItem> {
        self.items.clone()
    }
}
