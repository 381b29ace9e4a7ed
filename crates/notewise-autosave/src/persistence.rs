//! Ready-made [`DraftPersistence`] implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;
use uuid::Uuid;

use notewise_core::{DraftPersistence, Error, NoteRef, Result};

/// Persistence that accepts every save and stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPersistence;

#[async_trait]
impl DraftPersistence for NoOpPersistence {
    async fn save(&self, _note: &NoteRef) -> Result<()> {
        Ok(())
    }

    async fn delete_drafts(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    drafts: HashMap<Uuid, NoteRef>,
    attempts: Vec<Uuid>,
    failures: HashMap<Uuid, u32>,
    in_flight: HashMap<Uuid, usize>,
    max_in_flight_per_note: usize,
    in_flight_total: usize,
    max_in_flight_total: usize,
    drafts_deleted: usize,
}

/// In-memory draft store that records every attempt.
///
/// Failures and latency can be injected per note, which makes it the
/// persistence of choice for demos and tests of the coordinator.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
    delay: Option<Duration>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every save.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next `times` saves of `note_id`. `u32::MAX` fails forever.
    pub fn fail_note(&self, note_id: Uuid, times: u32) {
        self.lock().failures.insert(note_id, times);
    }

    /// Latest stored snapshot of `note_id`.
    pub fn draft(&self, note_id: Uuid) -> Option<NoteRef> {
        self.lock().drafts.get(&note_id).cloned()
    }

    pub fn draft_count(&self) -> usize {
        self.lock().drafts.len()
    }

    /// Note ids in the order their save attempts started.
    pub fn attempts(&self) -> Vec<Uuid> {
        self.lock().attempts.clone()
    }

    pub fn attempts_for(&self, note_id: Uuid) -> usize {
        self.lock().attempts.iter().filter(|id| **id == note_id).count()
    }

    /// Highest number of concurrent saves seen for a single note.
    pub fn max_in_flight_per_note(&self) -> usize {
        self.lock().max_in_flight_per_note
    }

    /// Highest number of concurrent saves seen overall.
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight_total
    }

    /// How many times `delete_drafts` ran.
    pub fn drafts_deleted(&self) -> usize {
        self.lock().drafts_deleted
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, note_id: Uuid) {
        let mut state = self.lock();
        state.attempts.push(note_id);
        let count = {
            let entry = state.in_flight.entry(note_id).or_insert(0);
            *entry += 1;
            *entry
        };
        state.max_in_flight_per_note = state.max_in_flight_per_note.max(count);
        state.in_flight_total += 1;
        state.max_in_flight_total = state.max_in_flight_total.max(state.in_flight_total);
    }

    fn finish(&self, note: &NoteRef) -> Result<()> {
        let mut state = self.lock();
        if let Some(count) = state.in_flight.get_mut(&note.note_id) {
            *count = count.saturating_sub(1);
        }
        state.in_flight_total = state.in_flight_total.saturating_sub(1);

        if let Some(remaining) = state.failures.get_mut(&note.note_id) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(Error::Persistence(format!(
                    "injected failure for note {}",
                    note.note_id
                )));
            }
        }

        state.drafts.insert(note.note_id, note.clone());
        Ok(())
    }
}

/// Decrements in-flight counters if a save is dropped mid-sleep.
struct InFlightGuard<'a> {
    store: &'a MemoryPersistence,
    note: &'a NoteRef,
    finished: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.store.lock();
            if let Some(count) = state.in_flight.get_mut(&self.note.note_id) {
                *count = count.saturating_sub(1);
            }
            state.in_flight_total = state.in_flight_total.saturating_sub(1);
        }
    }
}

#[async_trait]
impl DraftPersistence for MemoryPersistence {
    async fn save(&self, note: &NoteRef) -> Result<()> {
        trace!(note_id = %note.note_id, "Memory persistence save");
        self.begin(note.note_id);
        let mut guard = InFlightGuard {
            store: self,
            note,
            finished: false,
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        guard.finished = true;
        self.finish(note)
    }

    async fn delete_drafts(&self) -> Result<()> {
        let mut state = self.lock();
        state.drafts.clear();
        state.drafts_deleted += 1;
        Ok(())
    }
}
