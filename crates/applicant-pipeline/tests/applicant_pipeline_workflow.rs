//! End-to-end scenarios for the applicant pipeline, driven only through the public service
//! facade and the snapshot-backed store.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use applicant_pipeline::workflows::applicants::schema::{self, Schema};
    use applicant_pipeline::workflows::applicants::{
        ApplicantPipelineService, FieldValue, Fields, RecordId, RecordStore, ShortlistCriteria,
    };

    pub(super) fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date")
    }

    pub(super) fn service<S>(store: Arc<S>) -> ApplicantPipelineService<S>
    where
        S: RecordStore + 'static,
    {
        ApplicantPipelineService::new(store, ShortlistCriteria::default())
            .with_evaluation_date(as_of())
    }

    fn fields(pairs: Vec<(&str, FieldValue)>) -> Fields {
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    fn child<S>(store: &S, table: &str, applicant: &RecordId, mut row: Fields) -> RecordId
    where
        S: RecordStore + ?Sized,
    {
        row.insert(
            schema::APPLICANT_LINK.to_string(),
            FieldValue::links([applicant]),
        );
        store.create_record(table, row).expect("create child row")
    }

    /// Seeds an applicant with one personal row, one open-ended role and one salary row.
    pub(super) fn seed<S>(
        store: &S,
        applicant_id: &str,
        location: &str,
        started: &str,
        rate: f64,
        currency: &str,
    ) -> RecordId
    where
        S: RecordStore + ?Sized,
    {
        let tables = Schema::default();
        let applicant = store
            .create_record(
                &tables.applicants,
                fields(vec![(
                    schema::applicant::APPLICANT_ID,
                    FieldValue::text(applicant_id),
                )]),
            )
            .expect("create applicant");

        let personal = child(
            store,
            &tables.personal,
            &applicant,
            fields(vec![
                (schema::personal::NAME, FieldValue::text("Jordan Reyes")),
                (schema::personal::EMAIL, FieldValue::text("jordan@example.com")),
                (schema::personal::LOCATION, FieldValue::text(location)),
            ]),
        );
        let experience = child(
            store,
            &tables.experience,
            &applicant,
            fields(vec![
                (schema::experience::COMPANY, FieldValue::text("Initech")),
                (schema::experience::TITLE, FieldValue::text("Backend Engineer")),
                (schema::experience::START_DATE, FieldValue::text(started)),
                (
                    schema::experience::TECHNOLOGIES,
                    FieldValue::List(vec![FieldValue::choice("Rust"), FieldValue::choice("SQL")]),
                ),
            ]),
        );
        let salary = child(
            store,
            &tables.salary,
            &applicant,
            fields(vec![
                (schema::salary::PREFERRED_RATE, FieldValue::Number(rate)),
                (schema::salary::CURRENCY, FieldValue::choice(currency)),
                (schema::salary::WEEKLY_AVAILABILITY, FieldValue::Number(30.0)),
            ]),
        );

        store
            .update_record(
                &tables.applicants,
                &applicant,
                fields(vec![
                    (schema::applicant::PERSONAL_LINKS, FieldValue::links([&personal])),
                    (
                        schema::applicant::EXPERIENCE_LINKS,
                        FieldValue::links([&experience]),
                    ),
                    (schema::applicant::SALARY_LINKS, FieldValue::links([&salary])),
                ]),
            )
            .expect("link children");

        applicant
    }
}

use std::sync::Arc;

use applicant_pipeline::workflows::applicants::schema::{self, Schema};
use applicant_pipeline::workflows::applicants::{
    ApplicantDocument, FieldValue, Fields, ItemStatus, MemoryRecordStore, PipelineError,
    RecordId, RecordStore, ResetScope, ShortlistOutcome, ShortlistStatus, SnapshotStore,
};

use common::*;

#[test]
fn new_application_is_projected_shortlisted_and_becomes_a_lead() {
    let store = Arc::new(MemoryRecordStore::new());
    let record_id = seed(store.as_ref(), "APP-900", "Toronto, Canada", "2019-02-01", 95.0, "USD");
    let service = service(store.clone());

    let report = service
        .process_new_application(&record_id)
        .expect("flow succeeds");

    assert_eq!(report.projection, "projected");
    let ShortlistOutcome::Classified {
        classification,
        lead,
    } = report.shortlist
    else {
        panic!("expected a classification");
    };
    assert_eq!(classification.status, ShortlistStatus::Shortlisted);
    let lead = lead.expect("lead created");

    let leads = store.list_records(&Schema::default().leads).expect("leads");
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].id, lead);
    assert_eq!(leads[0].text(schema::lead::NAME), Some("Jordan Reyes"));
    assert_eq!(leads[0].links(schema::lead::APPLICANTS), vec![record_id.clone()]);

    let view = service.status(&record_id).expect("status");
    assert!(view.projected);
    assert_eq!(view.status, Some(ShortlistStatus::Shortlisted));

    // A second run leaves the terminal classification alone.
    let again = service.shortlist(&record_id).expect("shortlist");
    assert!(matches!(
        again,
        ShortlistOutcome::AlreadyClassified {
            status: Some(ShortlistStatus::Shortlisted)
        }
    ));
    assert_eq!(store.count(&Schema::default().leads).expect("count"), 1);
}

#[test]
fn edited_document_flows_back_into_the_normalized_rows() {
    let store = Arc::new(MemoryRecordStore::new());
    let record_id = seed(store.as_ref(), "APP-901", "Leeds, UK", "2020-01-15", 60.0, "GBP");
    let service = service(store.clone());
    service.project(&record_id).expect("project");

    let tables = Schema::default();
    let applicant = store
        .get_record(&tables.applicants, &record_id)
        .expect("applicant");
    let mut document = ApplicantDocument::from_json(
        applicant
            .text(schema::applicant::DOCUMENT)
            .expect("stored document"),
    )
    .expect("valid document");
    if let Some(salary) = document.salary.as_mut() {
        salary.preferred_rate = Some(70.0);
    }
    let mut edited = document.experience[0].clone();
    edited.source_record_id = None;
    edited.company = Some("Globex".to_string());
    document.experience.push(edited);

    let mut update = Fields::new();
    update.insert(
        schema::applicant::DOCUMENT.to_string(),
        FieldValue::text(document.to_json().expect("encode")),
    );
    store
        .update_record(&tables.applicants, &record_id, update)
        .expect("store edit");

    let summary = service.rematerialize(&record_id).expect("rematerialize");

    assert_eq!(summary.salary.updated, 1);
    assert_eq!(summary.experience.updated, 1);
    assert_eq!(summary.experience.created, 1);
    assert_eq!(store.count(&tables.experience).expect("count"), 2);

    let applicant = store
        .get_record(&tables.applicants, &record_id)
        .expect("applicant");
    let salary_id = applicant.links(schema::applicant::SALARY_LINKS)[0].clone();
    let salary = store.get_record(&tables.salary, &salary_id).expect("salary");
    assert_eq!(salary.number(schema::salary::PREFERRED_RATE), Some(70.0));
    assert_eq!(applicant.links(schema::applicant::EXPERIENCE_LINKS).len(), 2);
}

#[test]
fn reset_allows_a_fresh_classification_without_touching_leads() {
    let store = Arc::new(MemoryRecordStore::new());
    let record_id = seed(store.as_ref(), "APP-902", "Pune, India", "2018-06-01", 40.0, "USD");
    let service = service(store.clone());
    service
        .process_new_application(&record_id)
        .expect("first run");

    let view = service
        .reset(&record_id, ResetScope::Classification)
        .expect("reset");
    assert!(view.projected);
    assert_eq!(view.status, None);

    let outcome = service.shortlist(&record_id).expect("reclassify");
    let ShortlistOutcome::Classified { lead, .. } = outcome else {
        panic!("expected a fresh classification");
    };
    assert!(lead.is_some());
    assert_eq!(store.count(&Schema::default().leads).expect("count"), 1);

    let view = service.reset(&record_id, ResetScope::All).expect("reset all");
    assert!(!view.projected);
    assert!(matches!(
        service.shortlist(&record_id).expect("shortlist"),
        ShortlistOutcome::NotProjected
    ));
}

#[test]
fn batches_continue_past_unknown_and_broken_applicants() {
    let store = Arc::new(MemoryRecordStore::new());
    let good = seed(store.as_ref(), "APP-903", "Boston, USA", "2017-03-01", 120.0, "USD");
    let broken = seed(store.as_ref(), "APP-904", "Berlin, Germany", "2016-01-01", 80.0, "EUR");
    let tables = Schema::default();
    let mut malformed = Fields::new();
    malformed.insert(
        schema::applicant::DOCUMENT.to_string(),
        FieldValue::text("{ truncated"),
    );
    store
        .update_record(&tables.applicants, &broken, malformed)
        .expect("corrupt document");
    let service = service(store.clone());

    let projected = service.project_all().expect("project batch");
    assert_eq!(projected.completed, 1);
    assert_eq!(projected.skipped, 1);

    let shortlisted = service.shortlist_all().expect("shortlist batch");
    assert_eq!(shortlisted.completed, 1);
    assert_eq!(shortlisted.failed, 1);
    assert_eq!(
        shortlisted.item(&good).map(|item| item.status),
        Some(ItemStatus::Completed)
    );
    assert_eq!(
        shortlisted.item(&broken).map(|item| item.status),
        Some(ItemStatus::Failed)
    );

    let missing = service.status(&RecordId::new("rec999999"));
    assert!(matches!(
        missing,
        Err(PipelineError::ApplicantNotFound { .. })
    ));
}

#[test]
fn snapshot_store_persists_every_write() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("pipeline.json");

    let record_id = {
        let store = Arc::new(SnapshotStore::open(&path).expect("open snapshot"));
        let record_id = seed(store.as_ref(), "APP-905", "Ottawa, Canada", "2019-09-01", 70.0, "CAD");
        service(store)
            .process_new_application(&record_id)
            .expect("flow succeeds");
        record_id
    };

    let reopened = Arc::new(SnapshotStore::open(&path).expect("reopen snapshot"));
    let view = service(reopened).status(&record_id).expect("status");
    assert_eq!(view.applicant_id.as_deref(), Some("APP-905"));
    assert!(view.projected);
    assert!(view.status.is_some());
}
