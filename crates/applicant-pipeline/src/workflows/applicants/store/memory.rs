use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Fields, Record, RecordId, RecordStore, StoreError};

/// Serializable image of every table, used for snapshot files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Record>>,
    #[serde(default = "first_sequence")]
    pub next_sequence: u64,
}

fn first_sequence() -> u64 {
    1
}

#[derive(Debug)]
struct Tables {
    rows: BTreeMap<String, Vec<Record>>,
    next_sequence: u64,
}

/// Process-local store keeping rows in insertion order per table.
#[derive(Debug)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::from_snapshot(StoreSnapshot::default())
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let highest_known = snapshot
            .tables
            .values()
            .flatten()
            .filter_map(|record| sequence_of(&record.id))
            .max()
            .unwrap_or(0);

        Self {
            tables: Mutex::new(Tables {
                rows: snapshot.tables,
                next_sequence: snapshot.next_sequence.max(highest_known + 1),
            }),
        }
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let guard = self.lock()?;
        Ok(StoreSnapshot {
            tables: guard.rows.clone(),
            next_sequence: guard.next_sequence,
        })
    }

    /// Reads a snapshot file; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "snapshot missing, starting with an empty store");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .map_err(|err| StoreError::Snapshot(format!("read {}: {err}", path.display())))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)
            .map_err(|err| StoreError::Snapshot(format!("parse {}: {err}", path.display())))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot()?;
        let body = serde_json::to_string_pretty(&snapshot)
            .map_err(|err| StoreError::Snapshot(format!("encode snapshot: {err}")))?;
        fs::write(path, body)
            .map_err(|err| StoreError::Snapshot(format!("write {}: {err}", path.display())))
    }

    /// Row count for a table, mostly for reporting and assertions.
    pub fn count(&self, table: &str) -> Result<usize, StoreError> {
        let guard = self.lock()?;
        Ok(guard.rows.get(table).map(Vec::len).unwrap_or(0))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

fn sequence_of(id: &RecordId) -> Option<u64> {
    id.as_str()
        .strip_prefix("rec")
        .and_then(|digits| digits.parse::<u64>().ok())
}

fn not_found(table: &str, id: &RecordId) -> StoreError {
    StoreError::NotFound {
        table: table.to_string(),
        id: id.clone(),
    }
}

impl RecordStore for MemoryRecordStore {
    fn list_records(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.rows.get(table).cloned().unwrap_or_default())
    }

    fn get_record(&self, table: &str, id: &RecordId) -> Result<Record, StoreError> {
        let guard = self.lock()?;
        guard
            .rows
            .get(table)
            .and_then(|rows| rows.iter().find(|record| &record.id == id))
            .cloned()
            .ok_or_else(|| not_found(table, id))
    }

    fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId, StoreError> {
        let mut guard = self.lock()?;
        let id = RecordId(format!("rec{:06}", guard.next_sequence));
        guard.next_sequence += 1;
        guard
            .rows
            .entry(table.to_string())
            .or_default()
            .push(Record::new(id.clone(), fields));
        Ok(id)
    }

    fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let record = guard
            .rows
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|record| &record.id == id))
            .ok_or_else(|| not_found(table, id))?;
        record.fields.extend(fields);
        Ok(())
    }
}

/// Memory store that rewrites its snapshot file after every successful write.
#[derive(Debug)]
pub struct SnapshotStore {
    inner: MemoryRecordStore,
    path: PathBuf,
}

impl SnapshotStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = MemoryRecordStore::load(&path)?;
        Ok(Self { inner, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn inner(&self) -> &MemoryRecordStore {
        &self.inner
    }
}

impl RecordStore for SnapshotStore {
    fn list_records(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        self.inner.list_records(table)
    }

    fn get_record(&self, table: &str, id: &RecordId) -> Result<Record, StoreError> {
        self.inner.get_record(table, id)
    }

    fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId, StoreError> {
        let id = self.inner.create_record(table, fields)?;
        self.inner.save(&self.path)?;
        Ok(id)
    }

    fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<(), StoreError> {
        self.inner.update_record(table, id, fields)?;
        self.inner.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::applicants::store::FieldValue;

    fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn create_assigns_sequential_ids_and_preserves_order() {
        let store = MemoryRecordStore::new();
        let first = store
            .create_record("Work Experience", fields(&[("Company Name", FieldValue::text("Acme"))]))
            .expect("create");
        let second = store
            .create_record("Work Experience", fields(&[("Company Name", FieldValue::text("Globex"))]))
            .expect("create");

        assert_eq!(first, RecordId::new("rec000001"));
        assert_eq!(second, RecordId::new("rec000002"));

        let rows = store.list_records("Work Experience").expect("list");
        let companies: Vec<_> = rows.iter().filter_map(|row| row.text("Company Name")).collect();
        assert_eq!(companies, vec!["Acme", "Globex"]);
    }

    #[test]
    fn update_merges_fields() {
        let store = MemoryRecordStore::new();
        let id = store
            .create_record(
                "Personal Details",
                fields(&[
                    ("Full Name", FieldValue::text("Ada")),
                    ("Email", FieldValue::text("ada@example.com")),
                ]),
            )
            .expect("create");

        store
            .update_record(
                "Personal Details",
                &id,
                fields(&[("Full Name", FieldValue::text("Ada Lovelace"))]),
            )
            .expect("update");

        let record = store.get_record("Personal Details", &id).expect("get");
        assert_eq!(record.text("Full Name"), Some("Ada Lovelace"));
        assert_eq!(record.text("Email"), Some("ada@example.com"));
    }

    #[test]
    fn missing_rows_report_not_found() {
        let store = MemoryRecordStore::new();
        let missing = RecordId::new("rec404");
        assert!(store
            .get_record("Applications", &missing)
            .expect_err("missing")
            .is_not_found());
        assert!(store
            .update_record("Applications", &missing, Fields::new())
            .expect_err("missing")
            .is_not_found());
        assert!(store.list_records("Applications").expect("list").is_empty());
    }

    #[test]
    fn snapshot_store_persists_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        let store = SnapshotStore::open(&path).expect("open empty");
        let id = store
            .create_record("Applications", fields(&[("Application ID", FieldValue::text("APP-1"))]))
            .expect("create");

        let reopened = SnapshotStore::open(&path).expect("reopen");
        let record = reopened.get_record("Applications", &id).expect("persisted");
        assert_eq!(record.text("Application ID"), Some("APP-1"));

        let next = reopened
            .create_record("Applications", Fields::new())
            .expect("create after reopen");
        assert_ne!(next, id);
    }

    #[test]
    fn load_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").expect("write");

        match MemoryRecordStore::load(&path) {
            Err(StoreError::Snapshot(message)) => assert!(message.contains("parse")),
            other => panic!("expected snapshot error, got {other:?}"),
        }
    }
}
