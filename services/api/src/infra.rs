use applicant_pipeline::workflows::applicants::{
    Fields, MemoryRecordStore, Record, RecordId, RecordStore, SnapshotStore, StoreError,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Snapshot file used when neither `--store` nor `PIPELINE_STORE_PATH` is given.
pub(crate) const DEFAULT_STORE_PATH: &str = "pipeline-store.json";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Record store selected at startup: purely in memory, or backed by a snapshot file.
#[derive(Debug)]
pub(crate) enum PipelineStore {
    Memory(MemoryRecordStore),
    Snapshot(SnapshotStore),
}

impl PipelineStore {
    pub(crate) fn open(path: Option<&Path>) -> Result<Self, StoreError> {
        match path {
            Some(path) => Ok(Self::Snapshot(SnapshotStore::open(path)?)),
            None => Ok(Self::Memory(MemoryRecordStore::new())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            PipelineStore::Memory(_) => "in-memory".to_string(),
            PipelineStore::Snapshot(store) => store.path().display().to_string(),
        }
    }
}

impl RecordStore for PipelineStore {
    fn list_records(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        match self {
            PipelineStore::Memory(store) => store.list_records(table),
            PipelineStore::Snapshot(store) => store.list_records(table),
        }
    }

    fn get_record(&self, table: &str, id: &RecordId) -> Result<Record, StoreError> {
        match self {
            PipelineStore::Memory(store) => store.get_record(table, id),
            PipelineStore::Snapshot(store) => store.get_record(table, id),
        }
    }

    fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId, StoreError> {
        match self {
            PipelineStore::Memory(store) => store.create_record(table, fields),
            PipelineStore::Snapshot(store) => store.create_record(table, fields),
        }
    }

    fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<(), StoreError> {
        match self {
            PipelineStore::Memory(store) => store.update_record(table, id, fields),
            PipelineStore::Snapshot(store) => store.update_record(table, id, fields),
        }
    }
}

/// `--store` wins, then the configured snapshot path, then [`DEFAULT_STORE_PATH`].
pub(crate) fn resolve_store_path(flag: Option<PathBuf>, configured: Option<PathBuf>) -> PathBuf {
    flag.or(configured)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_path_prefers_flag_then_config() {
        assert_eq!(
            resolve_store_path(Some("a.json".into()), Some("b.json".into())),
            PathBuf::from("a.json")
        );
        assert_eq!(
            resolve_store_path(None, Some("b.json".into())),
            PathBuf::from("b.json")
        );
        assert_eq!(
            resolve_store_path(None, None),
            PathBuf::from(DEFAULT_STORE_PATH)
        );
    }

    #[test]
    fn dates_must_be_iso() {
        assert!(parse_date(" 2024-07-01 ").is_ok());
        assert!(parse_date("07/01/2024").is_err());
    }
}
