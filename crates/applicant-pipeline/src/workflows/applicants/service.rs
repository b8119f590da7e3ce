use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::batch::{run_batch, BatchReport, ItemStatus};
use super::domain::ShortlistStatus;
use super::eligibility::{EligibilityEngine, ShortlistCriteria};
use super::projector::{ProjectionError, ProjectionOutcome, Projector};
use super::rematerializer::{RematerializeError, Rematerializer, WriteSummary};
use super::schema::{self, Schema};
use super::shortlist::{ShortlistError, ShortlistOutcome, ShortlistWorkflow};
use super::store::{FieldValue, Fields, Record, RecordId, RecordStore, StoreError};

/// Which stored results a reset clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetScope {
    Document,
    Classification,
    All,
}

impl ResetScope {
    fn clears_document(self) -> bool {
        matches!(self, ResetScope::Document | ResetScope::All)
    }

    fn clears_classification(self) -> bool {
        matches!(self, ResetScope::Classification | ResetScope::All)
    }
}

/// Read model used by the CLI and HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantStatusView {
    pub record_id: RecordId,
    pub applicant_id: Option<String>,
    pub projected: bool,
    pub status: Option<ShortlistStatus>,
    pub rationale: Option<String>,
}

impl ApplicantStatusView {
    fn from_record(record: &Record) -> Self {
        Self {
            record_id: record.id.clone(),
            applicant_id: record
                .text(schema::applicant::APPLICANT_ID)
                .map(str::to_string),
            projected: record.has_value(schema::applicant::DOCUMENT),
            status: record
                .text(schema::applicant::SHORTLIST_STATUS)
                .and_then(ShortlistStatus::from_label),
            rationale: record
                .text(schema::applicant::SHORTLIST_REASON)
                .map(str::to_string),
        }
    }
}

/// Result of the new-application flow: project, then shortlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewApplicationReport {
    pub record_id: RecordId,
    pub projection: &'static str,
    pub shortlist: ShortlistOutcome,
}

/// Facade composing the record store with the projection, rematerialization and shortlist
/// workflows.
pub struct ApplicantPipelineService<S> {
    store: Arc<S>,
    schema: Schema,
    projector: Projector,
    rematerializer: Rematerializer,
    shortlist: ShortlistWorkflow,
    evaluation_date: Option<NaiveDate>,
}

impl<S> ApplicantPipelineService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>, criteria: ShortlistCriteria) -> Self {
        Self::with_schema(store, Schema::default(), criteria)
    }

    pub fn with_schema(store: Arc<S>, schema: Schema, criteria: ShortlistCriteria) -> Self {
        Self {
            store,
            projector: Projector::new(schema.clone()),
            rematerializer: Rematerializer::new(schema.clone()),
            shortlist: ShortlistWorkflow::new(schema.clone(), EligibilityEngine::new(criteria)),
            schema,
            evaluation_date: None,
        }
    }

    /// Pins the date open-ended roles are measured to; defaults to today (UTC).
    pub fn with_evaluation_date(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = Some(date);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn criteria(&self) -> &ShortlistCriteria {
        self.shortlist.engine().criteria()
    }

    fn as_of(&self) -> NaiveDate {
        self.evaluation_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    fn applicant(&self, record_id: &RecordId) -> Result<Record, PipelineError> {
        self.store
            .get_record(&self.schema.applicants, record_id)
            .map_err(|err| {
                if err.is_not_found() {
                    PipelineError::ApplicantNotFound {
                        record_id: record_id.clone(),
                    }
                } else {
                    PipelineError::Store(err)
                }
            })
    }

    fn applicants(&self) -> Result<Vec<Record>, PipelineError> {
        Ok(self.store.list_records(&self.schema.applicants)?)
    }

    pub fn project(&self, record_id: &RecordId) -> Result<ProjectionOutcome, PipelineError> {
        let applicant = self.applicant(record_id)?;
        Ok(self.projector.project(self.store.as_ref(), &applicant)?)
    }

    /// Projects every applicant in one pass over a snapshot of the table.
    pub fn project_all(&self) -> Result<BatchReport, PipelineError> {
        let applicants = self.applicants()?;
        Ok(run_batch("project", &applicants, |applicant| {
            self.projector
                .project(self.store.as_ref(), applicant)
                .map(|outcome| match outcome {
                    ProjectionOutcome::Projected { .. } => (ItemStatus::Completed, outcome.label()),
                    ProjectionOutcome::Skipped => (ItemStatus::Skipped, outcome.label()),
                })
        }))
    }

    pub fn rematerialize(&self, record_id: &RecordId) -> Result<WriteSummary, PipelineError> {
        Ok(self
            .rematerializer
            .rematerialize_stored(self.store.as_ref(), record_id)?)
    }

    pub fn shortlist(&self, record_id: &RecordId) -> Result<ShortlistOutcome, PipelineError> {
        let applicant = self.applicant(record_id)?;
        Ok(self
            .shortlist
            .shortlist(self.store.as_ref(), &applicant, self.as_of())?)
    }

    pub fn shortlist_all(&self) -> Result<BatchReport, PipelineError> {
        let applicants = self.applicants()?;
        let as_of = self.as_of();
        Ok(run_batch("shortlist", &applicants, |applicant| {
            self.shortlist
                .shortlist(self.store.as_ref(), applicant, as_of)
                .map(|outcome| {
                    let status = if outcome.is_skip() {
                        ItemStatus::Skipped
                    } else {
                        ItemStatus::Completed
                    };
                    (status, outcome.label())
                })
        }))
    }

    /// Webhook flow for a freshly submitted application.
    pub fn process_new_application(
        &self,
        record_id: &RecordId,
    ) -> Result<NewApplicationReport, PipelineError> {
        let projection = self.project(record_id)?;
        let shortlist = self.shortlist(record_id)?;
        Ok(NewApplicationReport {
            record_id: record_id.clone(),
            projection: projection.label(),
            shortlist,
        })
    }

    /// Clears stored results so the applicant can be processed again. Leads are kept.
    pub fn reset(
        &self,
        record_id: &RecordId,
        scope: ResetScope,
    ) -> Result<ApplicantStatusView, PipelineError> {
        self.applicant(record_id)?;

        let mut fields = Fields::new();
        if scope.clears_document() {
            fields.insert(schema::applicant::DOCUMENT.to_string(), FieldValue::Null);
        }
        if scope.clears_classification() {
            fields.insert(schema::applicant::SHORTLIST_STATUS.to_string(), FieldValue::Null);
            fields.insert(schema::applicant::SHORTLIST_REASON.to_string(), FieldValue::Null);
        }
        self.store
            .update_record(&self.schema.applicants, record_id, fields)?;
        info!(record_id = %record_id, ?scope, "reset applicant");

        self.status(record_id)
    }

    pub fn status(&self, record_id: &RecordId) -> Result<ApplicantStatusView, PipelineError> {
        let applicant = self.applicant(record_id)?;
        Ok(ApplicantStatusView::from_record(&applicant))
    }

    pub fn statuses(&self) -> Result<Vec<ApplicantStatusView>, PipelineError> {
        Ok(self
            .applicants()?
            .iter()
            .map(ApplicantStatusView::from_record)
            .collect())
    }
}

/// Error raised by the pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("applicant record {record_id} not found")]
    ApplicantNotFound { record_id: RecordId },
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Rematerialize(RematerializeError),
    #[error(transparent)]
    Shortlist(#[from] ShortlistError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RematerializeError> for PipelineError {
    fn from(err: RematerializeError) -> Self {
        match err {
            RematerializeError::ApplicantNotFound { record_id } => {
                PipelineError::ApplicantNotFound { record_id }
            }
            other => PipelineError::Rematerialize(other),
        }
    }
}
