//! Seeds the record store from a flat intake sheet with one row per experience entry.

mod normalizer;
mod parser;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::workflows::applicants::schema;
use crate::workflows::applicants::{
    ApplicantDocument, ApplicantId, FieldValue, Fields, Record, RecordId, RecordStore,
    RematerializeError, Rematerializer, Schema, StoreError,
};

#[derive(Debug)]
pub enum IntakeError {
    Io(std::io::Error),
    Csv(csv::Error),
    Store(StoreError),
    Write(RematerializeError),
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::Io(err) => write!(f, "failed to read intake sheet: {}", err),
            IntakeError::Csv(err) => write!(f, "invalid intake CSV data: {}", err),
            IntakeError::Store(err) => write!(f, "could not seed record store: {}", err),
            IntakeError::Write(err) => write!(f, "could not write applicant rows: {}", err),
        }
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Io(err) => Some(err),
            IntakeError::Csv(err) => Some(err),
            IntakeError::Store(err) => Some(err),
            IntakeError::Write(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for IntakeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<StoreError> for IntakeError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<RematerializeError> for IntakeError {
    fn from(err: RematerializeError) -> Self {
        Self::Write(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedApplicant {
    pub applicant_id: ApplicantId,
    pub record_id: RecordId,
    pub experience: usize,
}

/// Applicant whose rows could not be written. The rest of the sheet is still imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImport {
    pub applicant_id: ApplicantId,
    /// Applicant row created before the failure. The next import resumes onto it.
    pub record_id: Option<RecordId>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeSummary {
    pub imported: Vec<ImportedApplicant>,
    /// Applicants whose Application ID is already in the store.
    pub skipped: Vec<ApplicantId>,
    pub failed: Vec<FailedImport>,
    pub warnings: Vec<String>,
}

pub struct IntakeImporter {
    schema: Schema,
}

impl Default for IntakeImporter {
    fn default() -> Self {
        Self::new(Schema::default())
    }
}

impl IntakeImporter {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn import_path<S, P>(&self, store: &S, path: P) -> Result<IntakeSummary, IntakeError>
    where
        S: RecordStore + ?Sized,
        P: AsRef<Path>,
    {
        let file = std::fs::File::open(path)?;
        self.import_reader(store, file)
    }

    pub fn import_reader<S, R>(&self, store: &S, reader: R) -> Result<IntakeSummary, IntakeError>
    where
        S: RecordStore + ?Sized,
        R: Read,
    {
        let rows = parser::parse_rows(reader)?;
        let (applicants, orphans) = normalizer::group_rows(rows);

        // Applicant rows without any linked section are what an interrupted import leaves behind.
        let mut known = BTreeSet::new();
        let mut unwritten = BTreeMap::new();
        for record in store.list_records(&self.schema.applicants)? {
            let Some(applicant_id) = record.text(schema::applicant::APPLICANT_ID) else {
                continue;
            };
            let applicant_id = applicant_id.trim().to_string();
            if has_sections(&record) {
                known.insert(applicant_id);
            } else {
                unwritten.entry(applicant_id).or_insert(record.id);
            }
        }

        let rematerializer = Rematerializer::new(self.schema.clone());
        let mut summary = IntakeSummary {
            warnings: orphans,
            ..IntakeSummary::default()
        };

        for applicant in applicants {
            let mut document = applicant.document;
            summary.warnings.extend(applicant.warnings);

            if known.contains(&document.applicant_id.0) {
                info!(applicant_id = %document.applicant_id, "applicant already present, skipping");
                summary.skipped.push(document.applicant_id);
                continue;
            }

            let mut record_id = unwritten.remove(&document.applicant_id.0);
            if let Some(existing) = &record_id {
                info!(
                    applicant_id = %document.applicant_id,
                    record_id = %existing,
                    "resuming applicant row left without sections"
                );
            }

            match self.write_applicant(store, &rematerializer, &mut document, &mut record_id) {
                Ok(()) => {
                    known.insert(document.applicant_id.0.clone());
                    summary.imported.push(ImportedApplicant {
                        applicant_id: document.applicant_id,
                        record_id: document.source_record_id,
                        experience: document.experience.len(),
                    });
                }
                Err(err) => {
                    error!(
                        applicant_id = %document.applicant_id,
                        error = %err,
                        "failed to import applicant"
                    );
                    summary.failed.push(FailedImport {
                        applicant_id: document.applicant_id,
                        record_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        for warning in &summary.warnings {
            warn!(%warning, "intake data quality warning");
        }
        info!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "intake finished"
        );

        Ok(summary)
    }

    /// Creates the applicant row unless `record_id` already names one, then writes its sections.
    fn write_applicant<S>(
        &self,
        store: &S,
        rematerializer: &Rematerializer,
        document: &mut ApplicantDocument,
        record_id: &mut Option<RecordId>,
    ) -> Result<(), IntakeError>
    where
        S: RecordStore + ?Sized,
    {
        let applicant_record = match record_id.clone() {
            Some(existing) => existing,
            None => {
                let mut fields = Fields::new();
                fields.insert(
                    schema::applicant::APPLICANT_ID.to_string(),
                    FieldValue::text(document.applicant_id.0.clone()),
                );
                let created = store.create_record(&self.schema.applicants, fields)?;
                *record_id = Some(created.clone());
                created
            }
        };
        document.source_record_id = applicant_record;

        rematerializer.rematerialize(store, document)?;
        Ok(())
    }
}

fn has_sections(applicant: &Record) -> bool {
    [
        schema::applicant::PERSONAL_LINKS,
        schema::applicant::EXPERIENCE_LINKS,
        schema::applicant::SALARY_LINKS,
    ]
    .iter()
    .any(|field| !applicant.links(field).is_empty())
}
