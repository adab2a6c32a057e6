//! Persistence of the session snapshot.
//!
//! The session treats storage as an opaque key-value slot holding one
//! serialized [`Snapshot`]. Dates and timestamps are stored as ISO-8601
//! strings and parsed back on load.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::Snapshot;

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Backend able to hold one session snapshot.
pub trait SnapshotStore {
    /// `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Snapshot>, StorageError>;
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError>;
    fn purge(&mut self) -> Result<(), StorageError>;
}

/// Snapshot stored as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(TMP_SUFFIX);
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn purge(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process store keeping the serialized JSON, so loads go through the same
/// parsing as the file store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    json: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        self.json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.json = Some(serde_json::to_string(snapshot)?);
        Ok(())
    }

    fn purge(&mut self) -> Result<(), StorageError> {
        self.json = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::engine::DailyBudget;
    use crate::model::{Category, CategoryMap, NewTransaction, UserProfile};
    use chrono::{DateTime, NaiveDate};
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        let habits = CategoryMap::from_fn(|c| match c {
            Category::Lunch => Amount::from_float(20.0),
            _ => Amount::from_float(5.0),
        });
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let mut budget = DailyBudget::allocate(Amount::from_float(3000.0), &habits, date);
        budget
            .admit(
                1,
                NewTransaction::new(Amount::from_float(12.5), Category::Lunch),
                None,
                DateTime::from_timestamp(1_710_400_000, 123_000_000).unwrap(),
            )
            .unwrap();
        let mut closed = budget.clone();
        closed.close().unwrap();

        Snapshot {
            is_authenticated: true,
            is_setup_complete: true,
            current_step: 4,
            profile: Some(UserProfile {
                name: "Asha".to_string(),
                age: 24,
                contact: "asha@example.com".to_string(),
                monthly_income: Amount::from_float(5000.0),
                monthly_budget: Amount::from_float(3000.0),
            }),
            daily_habits: Some(habits),
            wallet: None,
            current_daily_budget: Some(budget),
            past_budgets: vec![closed],
            total_savings: Amount::from_float(20.0),
            next_tx_id: 2,
        }
    }

    #[test]
    fn file_store_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("session.json"));
        let snapshot = sample_snapshot();

        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot));
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn file_store_writes_iso_dates() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("session.json"));
        store.save(&sample_snapshot()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(r#""date": "2024-03-14""#));
        assert!(raw.contains(r#""timestamp": "2024-03-14T07:06:40.123Z""#));
    }

    #[test]
    fn file_store_purge() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("session.json"));
        store.save(&Snapshot::default()).unwrap();
        store.purge().unwrap();
        assert!(store.load().unwrap().is_none());
        // purging twice is fine
        store.purge().unwrap();
    }

    #[test]
    fn file_store_reports_corrupt_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(StorageError::Serde(_))));
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        let snapshot = sample_snapshot();
        store.save(&snapshot).unwrap();
        assert!(store.raw().unwrap().contains("\"isClosed\":true"));
        assert_eq!(store.load().unwrap(), Some(snapshot));
        store.purge().unwrap();
        assert!(store.raw().is_none());
    }
}
