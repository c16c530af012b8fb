use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use thiserror::Error;
use tracing::{debug, warn};

use crate::i18n::{resolve_language, LanguageCode, LANGUAGE_PREFERENCE_KEY};
use crate::playback::{PlaybackCheckpoint, CHECKPOINT_KEY};
use crate::sqlite::configure_connection;

const PREFERENCES_SCHEMA: &str = include_str!("../../sql/preferences.sql");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("preference store path not configured")]
    MissingStore,
    #[error("preference store lock poisoned")]
    Poisoned,
    #[error("failed to open database at {path}: {source}")]
    OpenDatabase {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Small key-value store for per-viewer state.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Returns whether the key existed.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Unreadable records are treated as absent.
    fn load_checkpoint(&self) -> StorageResult<Option<PlaybackCheckpoint>> {
        let Some(raw) = self.get(CHECKPOINT_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(err) => {
                warn!(target: "storage", error = %err, "ignoring unreadable playback checkpoint");
                Ok(None)
            }
        }
    }

    fn save_checkpoint(&self, checkpoint: &PlaybackCheckpoint) -> StorageResult<()> {
        self.set(CHECKPOINT_KEY, &serde_json::to_string(checkpoint)?)
    }

    fn clear_checkpoint(&self) -> StorageResult<bool> {
        self.remove(CHECKPOINT_KEY)
    }

    fn language(&self, fallback: LanguageCode) -> StorageResult<LanguageCode> {
        let stored = self.get(LANGUAGE_PREFERENCE_KEY)?;
        Ok(resolve_language(stored.as_deref(), fallback))
    }

    fn set_language(&self, language: LanguageCode) -> StorageResult<()> {
        self.set(LANGUAGE_PREFERENCE_KEY, language.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SqlitePreferenceStoreBuilder {
    path: Option<PathBuf>,
    read_only: bool,
    create_if_missing: bool,
}

impl Default for SqlitePreferenceStoreBuilder {
    fn default() -> Self {
        Self {
            path: None,
            read_only: false,
            create_if_missing: true,
        }
    }
}

impl SqlitePreferenceStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    pub fn build(self) -> StorageResult<SqlitePreferenceStore> {
        let path = self.path.ok_or(StorageError::MissingStore)?;
        let mut flags = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };

        if !self.read_only && self.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(SqlitePreferenceStore { path, flags })
    }
}

#[derive(Debug, Clone)]
pub struct SqlitePreferenceStore {
    path: PathBuf,
    flags: OpenFlags,
}

impl SqlitePreferenceStore {
    pub fn builder() -> SqlitePreferenceStoreBuilder {
        SqlitePreferenceStoreBuilder::new()
    }

    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        SqlitePreferenceStoreBuilder::new().path(path).build()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> StorageResult<Connection> {
        let conn = Connection::open_with_flags(&self.path, self.flags).map_err(|source| {
            StorageError::OpenDatabase {
                path: self.path.clone(),
                source,
            }
        })?;
        let read_only = self.flags.contains(OpenFlags::SQLITE_OPEN_READ_ONLY);
        configure_connection(&conn, read_only).map_err(|source| StorageError::OpenDatabase {
            path: self.path.clone(),
            source,
        })?;
        Ok(conn)
    }

    pub fn initialize(&self) -> StorageResult<()> {
        let conn = self.open()?;
        conn.execute_batch(PREFERENCES_SCHEMA)?;
        debug!(target: "storage", path = %self.path.display(), "preference store ready");
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let conn = self.open()?;
        let removed = conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

/// In-process store for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(values.remove(key).is_some())
    }
}
