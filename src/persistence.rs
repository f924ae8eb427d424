//! Key/value persistence of the reading position, statistics and display
//! preferences. Every read treats missing or malformed data as "nothing
//! saved"; callers decide whether a failed write matters.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::session::Snapshot;
use crate::stats::ReadingStats;

pub const POSITION_KEY: &str = "lectio.lastPosition";
pub const STATS_KEY: &str = "lectio.stats";
pub const FONT_SIZE_KEY: &str = "lectio.fontSize";
pub const DARK_MODE_KEY: &str = "lectio.darkMode";

/// Saved positions older than this are not offered for resume.
pub const RESUME_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
    #[error("cannot encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait PersistenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store for tests and for running without a writable state dir.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed store under the state directory.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at the default location.
    pub fn new() -> Result<Self, StoreError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("lectio.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl PersistenceStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPosition {
    pub book: String,
    pub chapter: String,
    pub word_index: usize,
    pub version: String,
    pub speed: u32,
    pub timestamp_millis: i64,
}

impl SavedPosition {
    /// `None` when the snapshot has nothing worth resuming.
    pub fn from_snapshot(snapshot: &Snapshot, now: DateTime<Utc>) -> Option<Self> {
        let position = snapshot.position.as_ref().filter(|p| p.word_index > 0)?;
        Some(Self {
            book: position.book.clone(),
            chapter: position.chapter.clone(),
            word_index: position.word_index,
            version: snapshot.version.clone(),
            speed: snapshot.speed.wpm(),
            timestamp_millis: now.timestamp_millis(),
        })
    }

    pub fn is_resumable(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() - self.timestamp_millis
            <= Duration::days(RESUME_WINDOW_DAYS).num_milliseconds()
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    pub fn larger(self) -> Self {
        match self {
            Self::Small => Self::Medium,
            Self::Medium | Self::Large => Self::Large,
        }
    }

    pub fn smaller(self) -> Self {
        match self {
            Self::Large => Self::Medium,
            Self::Medium | Self::Small => Self::Small,
        }
    }

    /// Blank cells drawn between letters of the focus word.
    pub fn letter_spacing(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    pub font_size: FontSize,
    pub dark_mode: bool,
}

fn read_key<S: PersistenceStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("failed to read {key}: {e}");
            None
        }
    }
}

fn read_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: for<'de> Deserialize<'de>,
    S: PersistenceStore + ?Sized,
{
    let raw = read_key(store, key)?;
    serde_json::from_str(&raw)
        .inspect_err(|e| log::warn!("ignoring malformed {key}: {e}"))
        .ok()
}

pub fn load_position<S: PersistenceStore + ?Sized>(store: &S) -> Option<SavedPosition> {
    read_json(store, POSITION_KEY)
}

/// The saved position, if it is recent enough to offer.
pub fn resumable_position<S: PersistenceStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
) -> Option<SavedPosition> {
    load_position(store).filter(|p| {
        let fresh = p.is_resumable(now);
        if !fresh {
            log::info!("saved position {} {} is too old to resume", p.book, p.chapter);
        }
        fresh
    })
}

pub fn save_position<S: PersistenceStore + ?Sized>(
    store: &mut S,
    position: &SavedPosition,
) -> Result<(), StoreError> {
    store.set(POSITION_KEY, &serde_json::to_string(position)?)
}

pub fn load_stats<S: PersistenceStore + ?Sized>(store: &S) -> ReadingStats {
    read_json::<ReadingStats, _>(store, STATS_KEY)
        .unwrap_or_default()
        .restored()
}

pub fn save_stats<S: PersistenceStore + ?Sized>(
    store: &mut S,
    stats: &ReadingStats,
) -> Result<(), StoreError> {
    store.set(STATS_KEY, &serde_json::to_string(stats)?)
}

pub fn load_preferences<S: PersistenceStore + ?Sized>(store: &S) -> Preferences {
    Preferences {
        font_size: read_key(store, FONT_SIZE_KEY)
            .and_then(|v| FontSize::parse(&v))
            .unwrap_or_default(),
        dark_mode: read_key(store, DARK_MODE_KEY).is_some_and(|v| v.trim() == "true"),
    }
}

pub fn save_preferences<S: PersistenceStore + ?Sized>(
    store: &mut S,
    prefs: &Preferences,
) -> Result<(), StoreError> {
    store.set(FONT_SIZE_KEY, &prefs.font_size.to_string())?;
    store.set(DARK_MODE_KEY, if prefs.dark_mode { "true" } else { "false" })
}

/// Writes a session snapshot. Failures are logged and otherwise ignored.
pub fn persist_snapshot<S: PersistenceStore + ?Sized>(
    store: &mut S,
    snapshot: &Snapshot,
    now: DateTime<Utc>,
) {
    if let Some(position) = SavedPosition::from_snapshot(snapshot, now) {
        if let Err(e) = save_position(store, &position) {
            log::warn!("failed to save reading position: {e}");
        }
    }
    if let Err(e) = save_stats(store, &snapshot.stats) {
        log::warn!("failed to save reading stats: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ReadingPosition;
    use crate::speed::Speed;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn snapshot(word_index: usize) -> Snapshot {
        Snapshot {
            version: "KJV".into(),
            position: Some(ReadingPosition {
                book: "Genesis".into(),
                chapter: "1".into(),
                word_index,
            }),
            speed: Speed::new(500).unwrap(),
            stats: ReadingStats {
                total_words_read: 120,
                total_time_spent_seconds: 30.5,
                chapters_completed: 1,
                session_start_timestamp: Some(1),
            },
        }
    }

    struct BrokenStore;

    impl PersistenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable(rusqlite::Error::InvalidQuery))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable(rusqlite::Error::InvalidQuery))
        }
    }

    #[test]
    fn snapshot_roundtrip_through_memory() {
        let mut store = MemoryStore::default();
        persist_snapshot(&mut store, &snapshot(42), now());

        let position = load_position(&store).unwrap();
        assert_eq!(position.book, "Genesis");
        assert_eq!(position.word_index, 42);
        assert_eq!(position.version, "KJV");
        assert_eq!(position.speed, 500);
        assert_eq!(position.timestamp_millis, now().timestamp_millis());

        let stats = load_stats(&store);
        assert_eq!(stats.total_words_read, 120);
        // a dangling active stretch is not carried into a new run
        assert_eq!(stats.session_start_timestamp, None);
    }

    #[test]
    fn position_json_uses_camel_case_keys() {
        let mut store = MemoryStore::default();
        persist_snapshot(&mut store, &snapshot(3), now());
        let raw = store.get(POSITION_KEY).unwrap().unwrap();
        assert!(raw.contains("\"wordIndex\":3"));
        assert!(raw.contains("\"timestampMillis\""));

        let raw = store.get(STATS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"totalWordsRead\":120"));
    }

    #[test]
    fn zero_index_does_not_overwrite_position() {
        let mut store = MemoryStore::default();
        persist_snapshot(&mut store, &snapshot(7), now());
        persist_snapshot(&mut store, &snapshot(0), now());
        assert_eq!(load_position(&store).unwrap().word_index, 7);

        let mut stopped = snapshot(0);
        stopped.position = None;
        persist_snapshot(&mut store, &stopped, now());
        assert_eq!(load_position(&store).unwrap().word_index, 7);
    }

    #[test]
    fn stale_position_is_not_resumable_but_kept() {
        let mut store = MemoryStore::default();
        persist_snapshot(&mut store, &snapshot(7), now());

        assert!(resumable_position(&store, now() + Duration::days(30)).is_some());
        assert!(resumable_position(&store, now() + Duration::days(31)).is_none());
        assert!(load_position(&store).is_some());
    }

    #[test]
    fn malformed_values_read_as_nothing_saved() {
        let mut store = MemoryStore::default();
        store.set(POSITION_KEY, "{not json").unwrap();
        store.set(STATS_KEY, "\"oops\"").unwrap();
        store.set(FONT_SIZE_KEY, "enormous").unwrap();
        store.set(DARK_MODE_KEY, "yes").unwrap();

        assert!(load_position(&store).is_none());
        assert_eq!(load_stats(&store), ReadingStats::default());
        assert_eq!(load_preferences(&store), Preferences::default());
    }

    #[test]
    fn preferences_roundtrip() {
        let mut store = MemoryStore::default();
        let prefs = Preferences {
            font_size: FontSize::Large,
            dark_mode: true,
        };
        save_preferences(&mut store, &prefs).unwrap();
        assert_eq!(store.get(FONT_SIZE_KEY).unwrap().as_deref(), Some("large"));
        assert_eq!(store.get(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(load_preferences(&store), prefs);
    }

    #[test]
    fn font_size_steps_saturate() {
        assert_eq!(FontSize::Small.smaller(), FontSize::Small);
        assert_eq!(FontSize::Small.larger(), FontSize::Medium);
        assert_eq!(FontSize::Large.larger(), FontSize::Large);
        assert_eq!(FontSize::Medium.letter_spacing(), 1);
    }

    #[test]
    fn broken_store_is_best_effort() {
        let mut store = BrokenStore;
        persist_snapshot(&mut store, &snapshot(9), now());
        assert!(load_position(&store).is_none());
        assert_eq!(load_preferences(&store), Preferences::default());
    }

    #[test]
    fn sqlite_in_memory_upserts() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.get("missing").unwrap(), None);
        store.set(DARK_MODE_KEY, "false").unwrap();
        store.set(DARK_MODE_KEY, "true").unwrap();
        assert_eq!(store.get(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn sqlite_file_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("lectio.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            persist_snapshot(&mut store, &snapshot(11), now());
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(load_position(&store).unwrap().word_index, 11);
        assert_eq!(load_stats(&store).chapters_completed, 1);
    }
}
