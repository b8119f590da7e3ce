//! Writes a stored document back into the normalized personal, experience and salary tables.
//!
//! Every section is an upsert keyed on record identity: rows already linked to the applicant
//! are updated in place, anything else is created and linked. Rows are never deleted, and a
//! section that is absent from the document is not touched at all.

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    ApplicantDocument, ApplicantId, DataQualityWarning, DocumentError, ExperienceEntry,
    PersonalSection, SalarySection,
};
use super::schema::{self, Schema};
use super::store::{FieldValue, Fields, Record, RecordId, RecordStore, StoreError};

/// Normalized table a planned write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Personal,
    Experience,
    Salary,
}

impl Section {
    fn table(self, schema: &Schema) -> &str {
        match self {
            Section::Personal => &schema.personal,
            Section::Experience => &schema.experience,
            Section::Salary => &schema.salary,
        }
    }

    fn link_field(self) -> &'static str {
        match self {
            Section::Personal => schema::applicant::PERSONAL_LINKS,
            Section::Experience => schema::applicant::EXPERIENCE_LINKS,
            Section::Salary => schema::applicant::SALARY_LINKS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAction {
    Update(RecordId),
    Create,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    pub section: Section,
    pub action: WriteAction,
    pub fields: Fields,
}

/// Links the applicant row carried when the plan was made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentLinks {
    pub personal: Vec<RecordId>,
    pub experience: Vec<RecordId>,
    pub salary: Vec<RecordId>,
}

impl CurrentLinks {
    pub fn from_applicant(applicant: &Record) -> Self {
        Self {
            personal: applicant.links(schema::applicant::PERSONAL_LINKS),
            experience: applicant.links(schema::applicant::EXPERIENCE_LINKS),
            salary: applicant.links(schema::applicant::SALARY_LINKS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionWrites {
    pub created: usize,
    pub updated: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub created_ids: Vec<RecordId>,
}

/// Created vs. updated counts per section, for reporting only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteSummary {
    pub applicant_id: Option<ApplicantId>,
    pub personal: SectionWrites,
    pub experience: SectionWrites,
    pub salary: SectionWrites,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DataQualityWarning>,
}

impl WriteSummary {
    fn section_mut(&mut self, section: Section) -> &mut SectionWrites {
        match section {
            Section::Personal => &mut self.personal,
            Section::Experience => &mut self.experience,
            Section::Salary => &mut self.salary,
        }
    }

    pub fn total_created(&self) -> usize {
        self.personal.created + self.experience.created + self.salary.created
    }

    pub fn total_updated(&self) -> usize {
        self.personal.updated + self.experience.updated + self.salary.updated
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RematerializeError {
    #[error("applicant record {record_id} not found")]
    ApplicantNotFound { record_id: RecordId },
    #[error("applicant record {record_id} has no stored document")]
    NoDocument { record_id: RecordId },
    #[error("stored document on {record_id} is malformed: {source}")]
    MalformedDocument {
        record_id: RecordId,
        #[source]
        source: DocumentError,
    },
    #[error("document stored on {record_id} belongs to {owner}")]
    OwnerMismatch { record_id: RecordId, owner: RecordId },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Computes the writes needed to bring the normalized rows in line with `document`.
pub fn plan_writes(document: &ApplicantDocument, links: &CurrentLinks) -> Vec<PlannedWrite> {
    let mut plan = Vec::new();

    if let Some(personal) = &document.personal {
        plan.push(PlannedWrite {
            section: Section::Personal,
            action: single_valued_action(&links.personal),
            fields: personal_fields(personal),
        });
    }

    for entry in &document.experience {
        let action = match &entry.source_record_id {
            Some(id) if links.experience.contains(id) => WriteAction::Update(id.clone()),
            _ => WriteAction::Create,
        };
        plan.push(PlannedWrite {
            section: Section::Experience,
            action,
            fields: experience_fields(entry),
        });
    }

    if let Some(salary) = &document.salary {
        plan.push(PlannedWrite {
            section: Section::Salary,
            action: single_valued_action(&links.salary),
            fields: salary_fields(salary),
        });
    }

    plan
}

fn single_valued_action(links: &[RecordId]) -> WriteAction {
    links
        .first()
        .cloned()
        .map(WriteAction::Update)
        .unwrap_or(WriteAction::Create)
}

/// Only populated values are written, so cells a partial document leaves out keep their
/// stored contents.
fn put_text(fields: &mut Fields, column: &str, value: Option<&str>) {
    if let Some(value) = value {
        fields.insert(column.to_string(), FieldValue::text(value));
    }
}

fn put_number(fields: &mut Fields, column: &str, value: Option<f64>) {
    if let Some(value) = value {
        fields.insert(column.to_string(), FieldValue::Number(value));
    }
}

fn personal_fields(personal: &PersonalSection) -> Fields {
    let mut fields = Fields::new();
    put_text(&mut fields, schema::personal::NAME, personal.name.as_deref());
    put_text(&mut fields, schema::personal::EMAIL, personal.email.as_deref());
    put_text(
        &mut fields,
        schema::personal::LOCATION,
        personal.location.as_deref(),
    );
    put_text(
        &mut fields,
        schema::personal::PROFILE_URL,
        personal.profile_url.as_deref(),
    );
    fields
}

fn experience_fields(entry: &ExperienceEntry) -> Fields {
    let iso = |date: chrono::NaiveDate| date.format("%Y-%m-%d").to_string();

    let mut fields = Fields::new();
    put_text(&mut fields, schema::experience::COMPANY, entry.company.as_deref());
    put_text(&mut fields, schema::experience::TITLE, entry.title.as_deref());
    put_text(
        &mut fields,
        schema::experience::START_DATE,
        entry.start_date.map(iso).as_deref(),
    );
    // A missing end date marks the current role and is written as an empty cell.
    fields.insert(
        schema::experience::END_DATE.to_string(),
        entry
            .end_date
            .map(|date| FieldValue::Text(iso(date)))
            .unwrap_or(FieldValue::Null),
    );
    if !entry.technologies.is_empty() {
        fields.insert(
            schema::experience::TECHNOLOGIES.to_string(),
            FieldValue::List(entry.technologies.iter().map(FieldValue::choice).collect()),
        );
    }
    fields
}

fn salary_fields(salary: &SalarySection) -> Fields {
    let currency = salary.currency.clone().unwrap_or_default();

    let mut fields = Fields::new();
    put_number(
        &mut fields,
        schema::salary::PREFERRED_RATE,
        salary.preferred_rate,
    );
    put_number(&mut fields, schema::salary::MINIMUM_RATE, salary.minimum_rate);
    fields.insert(
        schema::salary::CURRENCY.to_string(),
        FieldValue::choice(currency.as_str()),
    );
    put_number(
        &mut fields,
        schema::salary::WEEKLY_AVAILABILITY,
        salary.weekly_availability,
    );
    fields
}

#[derive(Debug, Clone, Default)]
pub struct Rematerializer {
    schema: Schema,
}

impl Rematerializer {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Reads and parses the document stored on `record_id`, then writes it back out.
    pub fn rematerialize_stored<S>(
        &self,
        store: &S,
        record_id: &RecordId,
    ) -> Result<WriteSummary, RematerializeError>
    where
        S: RecordStore + ?Sized,
    {
        let applicant = self.fetch_applicant(store, record_id)?;
        let raw = applicant
            .text(schema::applicant::DOCUMENT)
            .ok_or_else(|| RematerializeError::NoDocument {
                record_id: record_id.clone(),
            })?;

        let document = ApplicantDocument::from_json(raw).map_err(|source| {
            RematerializeError::MalformedDocument {
                record_id: record_id.clone(),
                source,
            }
        })?;

        if &document.source_record_id != record_id {
            return Err(RematerializeError::OwnerMismatch {
                record_id: record_id.clone(),
                owner: document.source_record_id,
            });
        }

        self.rematerialize(store, &document)
    }

    pub fn rematerialize<S>(
        &self,
        store: &S,
        document: &ApplicantDocument,
    ) -> Result<WriteSummary, RematerializeError>
    where
        S: RecordStore + ?Sized,
    {
        let record_id = &document.source_record_id;
        let applicant = self.fetch_applicant(store, record_id)?;

        let mut summary = WriteSummary {
            applicant_id: Some(document.applicant_id.clone()),
            ..WriteSummary::default()
        };

        if let Some(stored_id) = applicant.text(schema::applicant::APPLICANT_ID) {
            if stored_id.trim() != document.applicant_id.0 {
                let warning = DataQualityWarning::ApplicantIdMismatch {
                    document: document.applicant_id.clone(),
                    record: ApplicantId(stored_id.trim().to_string()),
                };
                warn!(record_id = %record_id, %warning, "data quality warning");
                summary.warnings.push(warning);
            }
        }

        let plan = plan_writes(document, &CurrentLinks::from_applicant(&applicant));
        for write in plan {
            self.apply(store, record_id, write, &mut summary)?;
        }

        info!(
            applicant_id = %document.applicant_id,
            created = summary.total_created(),
            updated = summary.total_updated(),
            "rematerialized document"
        );

        Ok(summary)
    }

    fn apply<S>(
        &self,
        store: &S,
        applicant_record: &RecordId,
        write: PlannedWrite,
        summary: &mut WriteSummary,
    ) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let table = write.section.table(&self.schema);
        match write.action {
            WriteAction::Update(id) => {
                store.update_record(table, &id, write.fields)?;
                summary.section_mut(write.section).updated += 1;
            }
            WriteAction::Create => {
                let mut fields = write.fields;
                fields.insert(
                    schema::APPLICANT_LINK.to_string(),
                    FieldValue::links([applicant_record]),
                );
                let id = store.create_record(table, fields)?;
                self.link_to_applicant(store, applicant_record, write.section, &id)?;

                let writes = summary.section_mut(write.section);
                writes.created += 1;
                writes.created_ids.push(id);
            }
        }
        Ok(())
    }

    /// Appends `child` to the applicant's link column, re-reading it so earlier writes in the
    /// same run are kept.
    fn link_to_applicant<S>(
        &self,
        store: &S,
        applicant_record: &RecordId,
        section: Section,
        child: &RecordId,
    ) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let applicant = store.get_record(&self.schema.applicants, applicant_record)?;
        let mut links = applicant.links(section.link_field());
        if links.contains(child) {
            return Ok(());
        }
        links.push(child.clone());

        let mut fields = Fields::new();
        fields.insert(section.link_field().to_string(), FieldValue::links(&links));
        store.update_record(&self.schema.applicants, applicant_record, fields)
    }

    fn fetch_applicant<S>(
        &self,
        store: &S,
        record_id: &RecordId,
    ) -> Result<Record, RematerializeError>
    where
        S: RecordStore + ?Sized,
    {
        store
            .get_record(&self.schema.applicants, record_id)
            .map_err(|err| {
                if err.is_not_found() {
                    RematerializeError::ApplicantNotFound {
                        record_id: record_id.clone(),
                    }
                } else {
                    RematerializeError::Store(err)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::applicants::domain::CurrencyCode;
    use chrono::NaiveDate;

    fn document() -> ApplicantDocument {
        let mut document = ApplicantDocument::new(
            ApplicantId("APP-9".to_string()),
            RecordId::new("rec000001"),
        );
        document.personal = Some(PersonalSection {
            name: Some("Grace Hopper".to_string()),
            ..PersonalSection::default()
        });
        document.experience = vec![
            ExperienceEntry {
                source_record_id: Some(RecordId::new("rec000010")),
                company: Some("Navy".to_string()),
                start_date: NaiveDate::from_ymd_opt(2015, 1, 1),
                ..ExperienceEntry::default()
            },
            ExperienceEntry {
                source_record_id: Some(RecordId::new("rec-stale")),
                company: Some("Univac".to_string()),
                ..ExperienceEntry::default()
            },
            ExperienceEntry {
                company: Some("Harvard".to_string()),
                technologies: vec!["COBOL".to_string()],
                ..ExperienceEntry::default()
            },
        ];
        document
    }

    #[test]
    fn plan_updates_linked_rows_and_creates_the_rest() {
        let links = CurrentLinks {
            personal: vec![RecordId::new("rec000002")],
            experience: vec![RecordId::new("rec000010")],
            salary: Vec::new(),
        };

        let plan = plan_writes(&document(), &links);
        let actions: Vec<_> = plan
            .iter()
            .map(|write| (write.section, write.action.clone()))
            .collect();

        assert_eq!(
            actions,
            vec![
                (
                    Section::Personal,
                    WriteAction::Update(RecordId::new("rec000002"))
                ),
                (
                    Section::Experience,
                    WriteAction::Update(RecordId::new("rec000010"))
                ),
                (Section::Experience, WriteAction::Create),
                (Section::Experience, WriteAction::Create),
            ]
        );
    }

    #[test]
    fn plan_skips_absent_sections() {
        let document = ApplicantDocument::new(
            ApplicantId("APP-0".to_string()),
            RecordId::new("rec000001"),
        );
        assert!(plan_writes(&document, &CurrentLinks::default()).is_empty());
    }

    #[test]
    fn salary_currency_defaults_to_reference_code() {
        let mut document = document();
        document.salary = Some(SalarySection {
            preferred_rate: Some(90.0),
            ..SalarySection::default()
        });

        let plan = plan_writes(&document, &CurrentLinks::default());
        let salary = plan
            .iter()
            .find(|write| write.section == Section::Salary)
            .expect("salary write planned");

        assert_eq!(salary.action, WriteAction::Create);
        assert_eq!(
            salary.fields[schema::salary::CURRENCY],
            FieldValue::choice(CurrencyCode::REFERENCE)
        );
        assert!(!salary.fields.contains_key(schema::salary::MINIMUM_RATE));
    }

    #[test]
    fn experience_fields_encode_dates_and_technologies() {
        let entry = ExperienceEntry {
            start_date: NaiveDate::from_ymd_opt(2019, 4, 2),
            technologies: vec!["Rust".to_string(), "SQL".to_string()],
            ..ExperienceEntry::default()
        };
        let fields = experience_fields(&entry);

        assert_eq!(
            fields[schema::experience::START_DATE],
            FieldValue::text("2019-04-02")
        );
        assert_eq!(fields[schema::experience::END_DATE], FieldValue::Null);
        assert!(!fields.contains_key(schema::experience::COMPANY));
        assert_eq!(
            fields[schema::experience::TECHNOLOGIES].as_names(),
            vec!["Rust".to_string(), "SQL".to_string()]
        );
    }
}
