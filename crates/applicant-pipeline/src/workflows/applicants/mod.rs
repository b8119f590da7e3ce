//! Applicant projection, rematerialization and shortlisting over a spreadsheet-style store.
//!
//! Normalized personal, experience and salary rows are folded into one portable
//! [`ApplicantDocument`] stored on the applicant row. The document can be written back into
//! the normalized tables and is the input to the shortlist decision.

pub mod batch;
pub mod domain;
pub mod eligibility;
pub mod projector;
pub mod rematerializer;
pub mod router;
pub mod schema;
pub mod service;
pub mod shortlist;
pub mod store;

#[cfg(test)]
mod tests;

pub use batch::{BatchItem, BatchReport, ItemStatus};
pub use domain::{
    parse_date, ApplicantDocument, ApplicantId, CurrencyCode, DataQualityWarning, DocumentError,
    ExperienceEntry, PersonalSection, SalarySection, ShortlistStatus,
};
pub use eligibility::{
    Classification, DerivedMetrics, EligibilityEngine, FailedCriterion, ShortlistCriteria,
};
pub use projector::{build_document, ProjectionError, ProjectionOutcome, Projector};
pub use rematerializer::{
    plan_writes, CurrentLinks, PlannedWrite, RematerializeError, Rematerializer, Section,
    SectionWrites, WriteAction, WriteSummary,
};
pub use router::{pipeline_router, WebhookPayload};
pub use schema::Schema;
pub use service::{
    ApplicantPipelineService, ApplicantStatusView, NewApplicationReport, PipelineError,
    ResetScope,
};
pub use shortlist::{ShortlistError, ShortlistOutcome, ShortlistWorkflow};
pub use store::{
    Choice, FieldValue, Fields, MemoryRecordStore, Record, RecordId, RecordLink, RecordStore,
    SnapshotStore, StoreError, StoreSnapshot,
};
