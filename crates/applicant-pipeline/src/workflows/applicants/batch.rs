use std::fmt::Display;

use serde::Serialize;
use tracing::{error, info};

use super::store::{Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub record_id: RecordId,
    pub status: ItemStatus,
    /// Outcome label, or the error message for failed items.
    pub detail: String,
}

/// Per-applicant results of a batch run. One failing item never stops the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub job: String,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, record_id: RecordId, status: ItemStatus, detail: impl Into<String>) {
        match status {
            ItemStatus::Completed => self.completed += 1,
            ItemStatus::Skipped => self.skipped += 1,
            ItemStatus::Failed => self.failed += 1,
        }
        self.items.push(BatchItem {
            record_id,
            status,
            detail: detail.into(),
        });
    }

    pub fn item(&self, record_id: &RecordId) -> Option<&BatchItem> {
        self.items.iter().find(|item| &item.record_id == record_id)
    }
}

/// Runs `process` over a snapshot of applicants, recording each result or error.
pub(crate) fn run_batch<F, E>(job: &str, applicants: &[Record], mut process: F) -> BatchReport
where
    F: FnMut(&Record) -> Result<(ItemStatus, &'static str), E>,
    E: Display,
{
    let mut report = BatchReport::new(job);

    for applicant in applicants {
        match process(applicant) {
            Ok((status, label)) => report.push(applicant.id.clone(), status, label),
            Err(err) => {
                error!(job, record_id = %applicant.id, error = %err, "batch item failed");
                report.push(applicant.id.clone(), ItemStatus::Failed, err.to_string());
            }
        }
    }

    info!(
        job,
        total = report.total(),
        completed = report.completed,
        skipped = report.skipped,
        failed = report.failed,
        "batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::applicants::store::Fields;

    #[test]
    fn failures_are_isolated_per_item() {
        let applicants: Vec<Record> = ["rec1", "rec2", "rec3"]
            .into_iter()
            .map(|id| Record::new(RecordId::new(id), Fields::new()))
            .collect();

        let report = run_batch("test", &applicants, |record| match record.id.as_str() {
            "rec2" => Err("boom"),
            "rec3" => Ok((ItemStatus::Skipped, "skipped")),
            _ => Ok((ItemStatus::Completed, "projected")),
        });

        assert_eq!(report.total(), 3);
        assert_eq!((report.completed, report.skipped, report.failed), (1, 1, 1));
        let failed = report.item(&RecordId::new("rec2")).expect("item");
        assert_eq!(failed.status, ItemStatus::Failed);
        assert_eq!(failed.detail, "boom");
    }
}
