use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::domain::{ApplicantDocument, DocumentError, ShortlistStatus};
use super::eligibility::{Classification, EligibilityEngine};
use super::schema::{self, Schema};
use super::store::{FieldValue, Fields, Record, RecordId, RecordStore, StoreError};

/// What happened to one applicant during a shortlist run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShortlistOutcome {
    Classified {
        classification: Classification,
        #[serde(skip_serializing_if = "Option::is_none")]
        lead: Option<RecordId>,
    },
    /// No stored document to evaluate yet.
    NotProjected,
    /// A classification is already recorded and stays terminal.
    AlreadyClassified { status: Option<ShortlistStatus> },
}

impl ShortlistOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ShortlistOutcome::Classified { classification, .. } => {
                if classification.is_shortlisted() {
                    "shortlisted"
                } else {
                    "rejected"
                }
            }
            ShortlistOutcome::NotProjected => "not_projected",
            ShortlistOutcome::AlreadyClassified { .. } => "already_classified",
        }
    }

    pub fn is_skip(&self) -> bool {
        !matches!(self, ShortlistOutcome::Classified { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShortlistError {
    #[error("stored document on {record_id} is malformed: {source}")]
    MalformedDocument {
        record_id: RecordId,
        #[source]
        source: DocumentError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Evaluates a projected applicant once and records the result on its row.
#[derive(Debug, Clone, Default)]
pub struct ShortlistWorkflow {
    schema: Schema,
    engine: EligibilityEngine,
}

impl ShortlistWorkflow {
    pub fn new(schema: Schema, engine: EligibilityEngine) -> Self {
        Self { schema, engine }
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    pub fn shortlist<S>(
        &self,
        store: &S,
        applicant: &Record,
        as_of: NaiveDate,
    ) -> Result<ShortlistOutcome, ShortlistError>
    where
        S: RecordStore + ?Sized,
    {
        if let Some(outcome) = guard(applicant) {
            info!(record_id = %applicant.id, outcome = outcome.label(), "skipping shortlist");
            return Ok(outcome);
        }

        let raw = applicant.text(schema::applicant::DOCUMENT).unwrap_or_default();
        let document = ApplicantDocument::from_json(raw).map_err(|source| {
            ShortlistError::MalformedDocument {
                record_id: applicant.id.clone(),
                source,
            }
        })?;

        let classification = self.engine.evaluate(&document, as_of);

        let current = store.get_record(&self.schema.applicants, &applicant.id)?;
        if let Some(outcome) = guard(&current) {
            info!(
                record_id = %applicant.id,
                outcome = outcome.label(),
                "classified concurrently, skipping"
            );
            return Ok(outcome);
        }

        let lead = if classification.is_shortlisted() {
            Some(self.ensure_lead(store, &applicant.id, &document, &classification)?)
        } else {
            None
        };

        let mut fields = Fields::new();
        fields.insert(
            schema::applicant::SHORTLIST_STATUS.to_string(),
            FieldValue::choice(classification.status.label()),
        );
        fields.insert(
            schema::applicant::SHORTLIST_REASON.to_string(),
            FieldValue::text(classification.rationale.clone()),
        );
        store.update_record(&self.schema.applicants, &applicant.id, fields)?;

        info!(
            applicant_id = %document.applicant_id,
            status = classification.status.label(),
            rationale = %classification.rationale,
            "classified applicant"
        );

        Ok(ShortlistOutcome::Classified {
            classification,
            lead,
        })
    }

    /// Returns the lead already linked to the applicant, creating one if none exists.
    fn ensure_lead<S>(
        &self,
        store: &S,
        applicant: &RecordId,
        document: &ApplicantDocument,
        classification: &Classification,
    ) -> Result<RecordId, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let existing = store
            .list_records(&self.schema.leads)?
            .into_iter()
            .find(|lead| lead.links(schema::lead::APPLICANTS).contains(applicant));
        if let Some(lead) = existing {
            info!(record_id = %applicant, lead = %lead.id, "lead already exists");
            return Ok(lead.id);
        }

        let mut fields = Fields::new();
        fields.insert(
            schema::lead::NAME.to_string(),
            FieldValue::text(document.display_name()),
        );
        fields.insert(
            schema::lead::SOURCE.to_string(),
            FieldValue::choice(schema::lead::SOURCE_LABEL),
        );
        fields.insert(
            schema::lead::REASON.to_string(),
            FieldValue::text(classification.rationale.clone()),
        );
        fields.insert(
            schema::lead::APPLICANTS.to_string(),
            FieldValue::links([applicant]),
        );

        let id = store.create_record(&self.schema.leads, fields)?;
        info!(record_id = %applicant, lead = %id, "created lead");
        Ok(id)
    }
}

fn guard(applicant: &Record) -> Option<ShortlistOutcome> {
    if !applicant.has_value(schema::applicant::DOCUMENT) {
        return Some(ShortlistOutcome::NotProjected);
    }
    if applicant.has_value(schema::applicant::SHORTLIST_STATUS) {
        return Some(ShortlistOutcome::AlreadyClassified {
            status: applicant
                .text(schema::applicant::SHORTLIST_STATUS)
                .and_then(ShortlistStatus::from_label),
        });
    }
    None
}
