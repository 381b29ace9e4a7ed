//! # notewise-autosave
//!
//! Draft auto-save for notewise.
//!
//! This crate provides:
//! - A priority save queue with per-note coalescing
//! - A coordinator task that drains the queue in bounded, concurrent batches
//! - Retry with exponential or fixed backoff
//! - Pause/resume, interval and idle triggers
//! - Save statistics and lifecycle events on the shared event bus
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use notewise_autosave::{AutoSaveBuilder, MemoryPersistence, NoteRef, SavePriority};
//!
//! let handle = AutoSaveBuilder::new(Arc::new(MemoryPersistence::new()))
//!     .with_config(AutoSaveConfiguration::from_env())
//!     .start()?;
//!
//! handle.enqueue(NoteRef::new(note_id, "draft text"), SavePriority::High).await?;
//! let report = handle.force_save_all().await?;
//! println!("saved {} notes", report.completed());
//!
//! handle.shutdown().await?;
//! ```

pub mod coordinator;
pub mod pause;
pub mod persistence;
pub mod queue;
pub mod triggers;

// Re-export core types
pub use notewise_core::*;

pub use coordinator::{
    AttemptResult, AutoSaveBuilder, AutoSaveCoordinator, AutoSaveHandle, ProcessReport,
    QueueMetrics, SaveOutcome, Trigger,
};
pub use pause::PauseState;
pub use persistence::{MemoryPersistence, NoOpPersistence};
pub use queue::{EnqueueOutcome, FailureOutcome, QueueCounts, SaveQueue, SaveQueueItem};
pub use triggers::{spawn_idle_trigger, spawn_interval_trigger, ActivityMonitor, Triggers};
