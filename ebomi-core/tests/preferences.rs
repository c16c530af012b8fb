use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use ebomi_core::{
    LanguageCode, PlaybackCheckpoint, PreferenceStore, SqlitePreferenceStore, StorageError,
    CHECKPOINT_KEY, LANGUAGE_PREFERENCE_KEY,
};
use tempfile::TempDir;

fn temp_store(dir: &Path) -> SqlitePreferenceStore {
    let store = SqlitePreferenceStore::builder()
        .path(dir.join("preferences.sqlite"))
        .create_if_missing(true)
        .build()
        .expect("create store");
    store.initialize().expect("initialize store");
    store
}

#[test]
fn checkpoint_freshness_decides_resume() {
    let dir = TempDir::new().unwrap();
    let store = temp_store(dir.path());
    let now = Utc.with_ymd_and_hms(2025, 12, 8, 20, 0, 0).unwrap();
    let window = Duration::hours(24);

    store
        .save_checkpoint(&PlaybackCheckpoint::new("x", 1800.0, now - Duration::hours(25)))
        .unwrap();
    let loaded = store.load_checkpoint().unwrap().unwrap();
    assert_eq!(loaded.resume_position("x", now, window), None);

    store
        .save_checkpoint(&PlaybackCheckpoint::new("x", 1800.0, now - Duration::hours(1)))
        .unwrap();
    let loaded = store.load_checkpoint().unwrap().unwrap();
    assert_eq!(loaded.resume_position("x", now, window), Some(1800.0));
    assert_eq!(loaded.resume_position("other", now, window), None);
}

#[test]
fn checkpoint_is_stored_as_camel_case_json() {
    let dir = TempDir::new().unwrap();
    let store = temp_store(dir.path());
    let saved_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    store
        .save_checkpoint(&PlaybackCheckpoint::new("fb-podcast", 12.5, saved_at))
        .unwrap();
    let raw = store.get(CHECKPOINT_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["contentId"], "fb-podcast");
    assert_eq!(value["positionSeconds"], 12.5);
    assert_eq!(value["savedAtEpochMs"], saved_at.timestamp_millis());

    assert!(store.clear_checkpoint().unwrap());
    assert!(store.load_checkpoint().unwrap().is_none());
}

#[test]
fn language_preference_survives_reopen() {
    let dir = TempDir::new().unwrap();
    temp_store(dir.path()).set_language(LanguageCode::Ar).unwrap();

    let reopened = temp_store(dir.path());
    let language = reopened.language(LanguageCode::En).unwrap();
    assert_eq!(language, LanguageCode::Ar);
    assert!(language.is_rtl());

    reopened.set(LANGUAGE_PREFERENCE_KEY, "xx").unwrap();
    assert_eq!(reopened.language(LanguageCode::En).unwrap(), LanguageCode::En);
}

#[test]
fn read_only_store_requires_existing_database() {
    let dir = TempDir::new().unwrap();
    let store = SqlitePreferenceStore::builder()
        .path(dir.path().join("missing.sqlite"))
        .read_only(true)
        .build()
        .unwrap();
    assert!(matches!(
        store.get(LANGUAGE_PREFERENCE_KEY),
        Err(StorageError::OpenDatabase { .. })
    ));
}
