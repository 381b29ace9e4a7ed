//! # notewise-core
//!
//! Core types, traits, and abstractions for notewise.
//!
//! This crate provides the foundational data structures, collaborator traits,
//! error taxonomy, event bus, and preferences model that the other notewise
//! crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod preferences;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, ErrorKind, Result};
pub use events::{CoreEvent, EventBus, EventEnvelope};
pub use models::*;
pub use preferences::{
    export_preferences, import_preferences, AnalysisPreferences, FilePreferenceStore,
    LanguagePreferences, LlmSettings, MemoryPreferenceStore, Preferences, PreferencesManager,
};
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
