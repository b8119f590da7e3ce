use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::{Days, NaiveDate};
use serde_json::Value;

use crate::workflows::applicants::schema::{self, Schema};
use crate::workflows::applicants::store::{
    FieldValue, Fields, MemoryRecordStore, Record, RecordId, RecordStore, StoreError,
};
use crate::workflows::applicants::{
    ApplicantDocument, ApplicantId, ApplicantPipelineService, CurrencyCode, ExperienceEntry,
    PersonalSection, SalarySection, ShortlistCriteria,
};

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date")
}

/// Start date giving `days` of open-ended tenure at [`as_of`].
pub(super) fn started_days_ago(days: u64) -> NaiveDate {
    as_of()
        .checked_sub_days(Days::new(days))
        .expect("valid date")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn fields(pairs: Vec<(&str, FieldValue)>) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub(super) fn personal_fields(name: &str, location: &str) -> Fields {
    fields(vec![
        (schema::personal::NAME, FieldValue::text(name)),
        (
            schema::personal::EMAIL,
            FieldValue::text(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        ),
        (schema::personal::LOCATION, FieldValue::text(location)),
        (
            schema::personal::PROFILE_URL,
            FieldValue::text("https://www.linkedin.com/in/example"),
        ),
    ])
}

pub(super) fn experience_fields(
    company: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    technologies: &[&str],
) -> Fields {
    fields(vec![
        (schema::experience::COMPANY, FieldValue::text(company)),
        (schema::experience::TITLE, FieldValue::text("Engineer")),
        (
            schema::experience::START_DATE,
            FieldValue::text(start.format("%Y-%m-%d").to_string()),
        ),
        (
            schema::experience::END_DATE,
            end.map(|end| FieldValue::text(end.format("%Y-%m-%d").to_string()))
                .unwrap_or(FieldValue::Null),
        ),
        (
            schema::experience::TECHNOLOGIES,
            FieldValue::List(technologies.iter().map(|t| FieldValue::choice(*t)).collect()),
        ),
    ])
}

pub(super) fn salary_fields(rate: f64, currency: &str) -> Fields {
    fields(vec![
        (schema::salary::PREFERRED_RATE, FieldValue::Number(rate)),
        (schema::salary::MINIMUM_RATE, FieldValue::Number(rate * 0.8)),
        (schema::salary::CURRENCY, FieldValue::choice(currency)),
        (schema::salary::WEEKLY_AVAILABILITY, FieldValue::Number(40.0)),
    ])
}

/// Linked rows to seed for one applicant.
#[derive(Default)]
pub(super) struct ApplicantSeed {
    pub(super) personal: Vec<Fields>,
    pub(super) experience: Vec<Fields>,
    pub(super) salary: Vec<Fields>,
}

impl ApplicantSeed {
    pub(super) fn eligible(name: &str) -> Self {
        Self {
            personal: vec![personal_fields(name, "Austin, United States")],
            experience: vec![
                experience_fields("Initech", date(2018, 1, 1), Some(date(2020, 1, 1)), &["Rust"]),
                experience_fields("Globex", started_days_ago(900), None, &["Go", "SQL"]),
            ],
            salary: vec![salary_fields(100.0, "USD")],
        }
    }

    pub(super) fn junior(name: &str) -> Self {
        Self {
            personal: vec![personal_fields(name, "Munich, Germany")],
            experience: vec![experience_fields(
                "Hooli",
                started_days_ago(360),
                None,
                &["Python"],
            )],
            salary: vec![salary_fields(200.0, "USD")],
        }
    }
}

/// Creates the applicant first, then its children with back-links, then links them.
pub(super) fn seed_applicant<S>(store: &S, applicant_id: &str, seed: ApplicantSeed) -> RecordId
where
    S: RecordStore + ?Sized,
{
    let tables = Schema::default();
    let applicant = store
        .create_record(
            &tables.applicants,
            fields(vec![(schema::applicant::APPLICANT_ID, FieldValue::text(applicant_id))]),
        )
        .expect("create applicant");

    let link = |table: &str, rows: Vec<Fields>, column: &str| {
        let ids: Vec<RecordId> = rows
            .into_iter()
            .map(|mut row| {
                row.insert(
                    schema::APPLICANT_LINK.to_string(),
                    FieldValue::links([&applicant]),
                );
                store.create_record(table, row).expect("create child")
            })
            .collect();
        store
            .update_record(
                &tables.applicants,
                &applicant,
                fields(vec![(column, FieldValue::links(&ids))]),
            )
            .expect("link children");
    };

    link(&tables.personal, seed.personal, schema::applicant::PERSONAL_LINKS);
    link(
        &tables.experience,
        seed.experience,
        schema::applicant::EXPERIENCE_LINKS,
    );
    link(&tables.salary, seed.salary, schema::applicant::SALARY_LINKS);

    applicant
}

pub(super) fn applicant_record(store: &MemoryRecordStore, record_id: &RecordId) -> Record {
    store
        .get_record(&Schema::default().applicants, record_id)
        .expect("applicant exists")
}

pub(super) fn stored_document(store: &MemoryRecordStore, record_id: &RecordId) -> String {
    applicant_record(store, record_id)
        .text(schema::applicant::DOCUMENT)
        .expect("document stored")
        .to_string()
}

pub(super) fn set_field(
    store: &MemoryRecordStore,
    table: &str,
    record_id: &RecordId,
    field: &str,
    value: FieldValue,
) {
    store
        .update_record(table, record_id, fields(vec![(field, value)]))
        .expect("update field");
}

pub(super) fn document(
    tenure_days: u64,
    rate: Option<f64>,
    currency: Option<&str>,
    location: &str,
) -> ApplicantDocument {
    let mut document =
        ApplicantDocument::new(ApplicantId("APP-100".to_string()), RecordId::new("rec000001"));
    document.personal = Some(PersonalSection {
        name: Some("Casey Jones".to_string()),
        location: Some(location.to_string()),
        ..PersonalSection::default()
    });
    document.experience = vec![ExperienceEntry {
        company: Some("Acme".to_string()),
        start_date: Some(started_days_ago(tenure_days)),
        ..ExperienceEntry::default()
    }];
    document.salary = Some(SalarySection {
        preferred_rate: rate,
        currency: currency.map(CurrencyCode::new),
        ..SalarySection::default()
    });
    document
}

pub(super) fn criteria() -> ShortlistCriteria {
    ShortlistCriteria::default()
}

pub(super) fn build_service() -> (
    ApplicantPipelineService<MemoryRecordStore>,
    Arc<MemoryRecordStore>,
) {
    let store = Arc::new(MemoryRecordStore::new());
    let service =
        ApplicantPipelineService::new(store.clone(), criteria()).with_evaluation_date(as_of());
    (service, store)
}

pub(super) fn count(store: &MemoryRecordStore, table: &str) -> usize {
    store.count(table).expect("count rows")
}

/// Store whose every call fails, for exercising error paths.
pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn list_records(&self, _table: &str) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("base offline".to_string()))
    }

    fn get_record(&self, _table: &str, _id: &RecordId) -> Result<Record, StoreError> {
        Err(StoreError::Unavailable("base offline".to_string()))
    }

    fn create_record(&self, _table: &str, _fields: Fields) -> Result<RecordId, StoreError> {
        Err(StoreError::Unavailable("base offline".to_string()))
    }

    fn update_record(
        &self,
        _table: &str,
        _id: &RecordId,
        _fields: Fields,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("base offline".to_string()))
    }
}

/// Memory store that rejects writes to one record.
pub(super) struct ReadOnlyRecordStore {
    pub(super) inner: MemoryRecordStore,
    pub(super) locked: RecordId,
}

impl RecordStore for ReadOnlyRecordStore {
    fn list_records(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        self.inner.list_records(table)
    }

    fn get_record(&self, table: &str, id: &RecordId) -> Result<Record, StoreError> {
        self.inner.get_record(table, id)
    }

    fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId, StoreError> {
        self.inner.create_record(table, fields)
    }

    fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<(), StoreError> {
        if id == &self.locked {
            return Err(StoreError::Unavailable(format!("{id} is locked")));
        }
        self.inner.update_record(table, id, fields)
    }
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub(super) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
