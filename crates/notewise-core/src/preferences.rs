//! User preferences: the serialized blob, its stores, and the manager.
//!
//! Loading never fails: missing or corrupt data yields defaults and a warning.
//! Saving goes through [`PreferencesManager`], which validates, stamps
//! `last_modified`, persists, and emits [`CoreEvent::PreferencesChanged`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::defaults;
use crate::error::{Error, Result};
use crate::events::{CoreEvent, EventBus};
use crate::models::AutoSaveConfiguration;
use crate::traits::PreferenceStore;

// =============================================================================
// PREFERENCE MODEL
// =============================================================================

/// Language detection preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePreferences {
    pub auto_detect: bool,
    /// Used when auto-detection is off or unreliable.
    pub preferred_language: String,
}

impl Default for LanguagePreferences {
    fn default() -> Self {
        Self {
            auto_detect: true,
            preferred_language: defaults::PREFERRED_LANGUAGE.to_string(),
        }
    }
}

/// Which analysis stages run on note text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPreferences {
    pub sentiment_enabled: bool,
    pub emotion_detection: bool,
    pub sarcasm_detection: bool,
}

impl Default for AnalysisPreferences {
    fn default() -> Self {
        Self {
            sentiment_enabled: true,
            emotion_detection: true,
            sarcasm_detection: false,
        }
    }
}

/// Local LLM connection and sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub num_predict: i32,
    pub num_ctx: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::LLM_URL.to_string(),
            model: defaults::LLM_MODEL.to_string(),
            temperature: defaults::LLM_TEMPERATURE,
            top_k: defaults::LLM_TOP_K,
            top_p: defaults::LLM_TOP_P,
            num_predict: defaults::LLM_NUM_PREDICT,
            num_ctx: defaults::LLM_NUM_CTX,
            timeout_secs: defaults::LLM_TIMEOUT_SECS,
        }
    }
}

/// Everything the user can configure, persisted as one JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub auto_save: AutoSaveConfiguration,
    pub language: LanguagePreferences,
    pub analysis: AnalysisPreferences,
    pub llm: LlmSettings,
    pub last_modified: DateTime<Utc>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_save: AutoSaveConfiguration::default(),
            language: LanguagePreferences::default(),
            analysis: AnalysisPreferences::default(),
            llm: LlmSettings::default(),
            last_modified: Utc::now(),
        }
    }
}

impl Preferences {
    /// Validate nested settings.
    pub fn validate(&self) -> Result<()> {
        self.auto_save.validate()?;
        if self.language.preferred_language.trim().is_empty() {
            return Err(Error::Config(
                "preferred language cannot be empty".to_string(),
            ));
        }
        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "LLM base_url must start with http:// or https://, got: {}",
                self.llm.base_url
            )));
        }
        Ok(())
    }

    /// Equality over every field except `last_modified`.
    pub fn same_settings(&self, other: &Preferences) -> bool {
        self.auto_save == other.auto_save
            && self.language == other.language
            && self.analysis == other.analysis
            && self.llm == other.llm
    }
}

/// Serialize preferences for export (pretty JSON).
pub fn export_preferences(prefs: &Preferences) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(prefs)?)
}

/// Parse and validate exported preferences, stamping `last_modified` now.
pub fn import_preferences(data: &[u8]) -> Result<Preferences> {
    let mut prefs: Preferences = serde_json::from_slice(data)?;
    prefs.validate()?;
    prefs.last_modified = Utc::now();
    Ok(prefs)
}

// =============================================================================
// STORES
// =============================================================================

/// In-memory store, used by tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Internal("preference store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    dir: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'))
            || key.starts_with('.')
        {
            return Err(Error::InvalidInput(format!("invalid preference key: {key}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        // Write-then-rename so readers never see a half-written blob.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MANAGER
// =============================================================================

/// Owns the current preferences and keeps the store in sync.
pub struct PreferencesManager {
    store: Arc<dyn PreferenceStore>,
    current: RwLock<Preferences>,
    events: Option<EventBus>,
}

impl PreferencesManager {
    /// Load preferences from `store`, falling back to defaults.
    pub async fn load(store: Arc<dyn PreferenceStore>, events: Option<EventBus>) -> Self {
        let prefs = match store.load(defaults::PREFERENCES_KEY).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Preferences>(&bytes) {
                Ok(prefs) if prefs.validate().is_ok() => {
                    debug!("Loaded persisted preferences");
                    prefs
                }
                Ok(_) => {
                    warn!("Persisted preferences failed validation, using defaults");
                    Preferences::default()
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse persisted preferences, using defaults");
                    Preferences::default()
                }
            },
            Ok(None) => {
                debug!("No persisted preferences found, using defaults");
                Preferences::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read preferences, using defaults");
                Preferences::default()
            }
        };

        Self {
            store,
            current: RwLock::new(prefs),
            events,
        }
    }

    /// Snapshot of the current preferences.
    pub async fn current(&self) -> Preferences {
        self.current.read().await.clone()
    }

    /// Apply `change`, validate, persist, and notify.
    pub async fn update<F>(&self, change: F) -> Result<Preferences>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut next = self.current().await;
        change(&mut next);
        next.validate()?;
        next.last_modified = Utc::now();
        self.replace(next).await
    }

    /// Export the current preferences as JSON bytes.
    pub async fn export(&self) -> Result<Vec<u8>> {
        export_preferences(&*self.current.read().await)
    }

    /// Replace the current preferences with an exported blob.
    pub async fn import(&self, data: &[u8]) -> Result<Preferences> {
        let prefs = import_preferences(data)?;
        info!("Importing preferences");
        self.replace(prefs).await
    }

    /// Restore defaults and persist them.
    pub async fn reset(&self) -> Result<Preferences> {
        info!("Resetting preferences to defaults");
        self.replace(Preferences::default()).await
    }

    async fn replace(&self, prefs: Preferences) -> Result<Preferences> {
        let bytes = serde_json::to_vec(&prefs)?;
        self.store.store(defaults::PREFERENCES_KEY, &bytes).await?;
        *self.current.write().await = prefs.clone();
        if let Some(events) = &self.events {
            events.emit(CoreEvent::PreferencesChanged {
                last_modified: prefs.last_modified,
            });
        }
        Ok(prefs)
    }
}
