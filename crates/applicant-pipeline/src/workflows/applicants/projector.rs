use tracing::{info, warn};

use super::domain::{
    parse_date, ApplicantDocument, ApplicantId, CurrencyCode, DataQualityWarning, DocumentError,
    ExperienceEntry, PersonalSection, SalarySection,
};
use super::schema::{self, Schema};
use super::store::{FieldValue, Fields, Record, RecordId, RecordStore, StoreError};

/// Result of projecting one applicant.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionOutcome {
    Projected {
        document: ApplicantDocument,
        warnings: Vec<DataQualityWarning>,
    },
    /// The applicant already carries a stored document.
    Skipped,
}

impl ProjectionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectionOutcome::Projected { .. } => "projected",
            ProjectionOutcome::Skipped => "skipped",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("applicant record {record_id} has no Application ID")]
    MissingApplicantId { record_id: RecordId },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Folds an applicant's linked personal, experience and salary rows into one document and
/// stores it on the applicant row.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    schema: Schema,
}

impl Projector {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn project<S>(
        &self,
        store: &S,
        applicant: &Record,
    ) -> Result<ProjectionOutcome, ProjectionError>
    where
        S: RecordStore + ?Sized,
    {
        // Checked before any linked row is read so repeat runs stay read-free.
        if applicant.has_value(schema::applicant::DOCUMENT) {
            info!(record_id = %applicant.id, "applicant already projected, skipping");
            return Ok(ProjectionOutcome::Skipped);
        }

        let applicant_id = applicant
            .text(schema::applicant::APPLICANT_ID)
            .map(|value| ApplicantId(value.trim().to_string()))
            .ok_or_else(|| ProjectionError::MissingApplicantId {
                record_id: applicant.id.clone(),
            })?;

        let mut warnings = Vec::new();

        let personal = first_linked(
            store,
            &self.schema.personal,
            "personal",
            &applicant.links(schema::applicant::PERSONAL_LINKS),
            &mut warnings,
        )?;
        let experience = fetch_linked(
            store,
            &self.schema.experience,
            &applicant.links(schema::applicant::EXPERIENCE_LINKS),
            &mut warnings,
        )?;
        let salary = first_linked(
            store,
            &self.schema.salary,
            "salary",
            &applicant.links(schema::applicant::SALARY_LINKS),
            &mut warnings,
        )?;

        let (document, field_warnings) = build_document(
            applicant_id,
            applicant.id.clone(),
            personal.as_ref(),
            &experience,
            salary.as_ref(),
        );
        warnings.extend(field_warnings);

        // Another run may have projected this applicant since the snapshot was taken.
        let current = store.get_record(&self.schema.applicants, &applicant.id)?;
        if current.has_value(schema::applicant::DOCUMENT) {
            info!(record_id = %applicant.id, "document written concurrently, skipping");
            return Ok(ProjectionOutcome::Skipped);
        }

        let mut fields = Fields::new();
        fields.insert(
            schema::applicant::DOCUMENT.to_string(),
            FieldValue::Text(document.to_json()?),
        );
        store.update_record(&self.schema.applicants, &applicant.id, fields)?;

        for warning in &warnings {
            warn!(applicant_id = %document.applicant_id, %warning, "data quality warning");
        }
        info!(
            applicant_id = %document.applicant_id,
            experience = document.experience.len(),
            "projected applicant"
        );

        Ok(ProjectionOutcome::Projected { document, warnings })
    }
}

/// Single-valued links: only the first is read, extras are reported.
fn first_linked<S>(
    store: &S,
    table: &str,
    section: &'static str,
    links: &[RecordId],
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<Option<Record>, StoreError>
where
    S: RecordStore + ?Sized,
{
    if links.len() > 1 {
        warnings.push(DataQualityWarning::ExtraLinks {
            section,
            count: links.len(),
        });
    }

    Ok(fetch_linked(store, table, &links[..links.len().min(1)], warnings)?
        .into_iter()
        .next())
}

/// Reads linked rows in link order; rows that no longer exist are reported and skipped.
fn fetch_linked<S>(
    store: &S,
    table: &str,
    links: &[RecordId],
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<Vec<Record>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let mut records = Vec::with_capacity(links.len());
    for id in links {
        match store.get_record(table, id) {
            Ok(record) => records.push(record),
            Err(err) if err.is_not_found() => warnings.push(DataQualityWarning::DanglingLink {
                table: table.to_string(),
                record_id: id.clone(),
            }),
            Err(err) => return Err(err),
        }
    }
    Ok(records)
}

/// Pure assembly of a document from already-fetched rows. Missing cells become `None`.
pub fn build_document(
    applicant_id: ApplicantId,
    source_record_id: RecordId,
    personal: Option<&Record>,
    experience: &[Record],
    salary: Option<&Record>,
) -> (ApplicantDocument, Vec<DataQualityWarning>) {
    let mut warnings = Vec::new();

    let personal = personal.map(|record| PersonalSection {
        name: owned_text(record, schema::personal::NAME),
        email: owned_text(record, schema::personal::EMAIL),
        location: owned_text(record, schema::personal::LOCATION),
        profile_url: owned_text(record, schema::personal::PROFILE_URL),
    });

    let experience = experience
        .iter()
        .map(|record| ExperienceEntry {
            source_record_id: Some(record.id.clone()),
            company: owned_text(record, schema::experience::COMPANY),
            title: owned_text(record, schema::experience::TITLE),
            start_date: read_date(record, schema::experience::START_DATE, &mut warnings),
            end_date: read_date(record, schema::experience::END_DATE, &mut warnings),
            technologies: record.names(schema::experience::TECHNOLOGIES),
        })
        .collect();

    let salary = salary.map(|record| SalarySection {
        preferred_rate: read_number(record, schema::salary::PREFERRED_RATE, &mut warnings),
        minimum_rate: read_number(record, schema::salary::MINIMUM_RATE, &mut warnings),
        currency: record.text(schema::salary::CURRENCY).map(CurrencyCode::new),
        weekly_availability: read_number(
            record,
            schema::salary::WEEKLY_AVAILABILITY,
            &mut warnings,
        ),
    });

    let document = ApplicantDocument {
        applicant_id,
        source_record_id,
        personal,
        experience,
        salary,
    };

    (document, warnings)
}

fn owned_text(record: &Record, field: &str) -> Option<String> {
    record.text(field).map(str::to_string)
}

fn read_date(
    record: &Record,
    field: &'static str,
    warnings: &mut Vec<DataQualityWarning>,
) -> Option<chrono::NaiveDate> {
    let raw = record.text(field)?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        warnings.push(DataQualityWarning::UnparsableDate {
            record_id: record.id.clone(),
            field,
            value: raw.to_string(),
        });
    }
    parsed
}

fn read_number(
    record: &Record,
    field: &'static str,
    warnings: &mut Vec<DataQualityWarning>,
) -> Option<f64> {
    let value = record.get(field).filter(|value| !value.is_blank())?;
    let parsed = value.as_number();
    if parsed.is_none() {
        warnings.push(DataQualityWarning::NonNumericValue {
            record_id: record.id.clone(),
            field,
        });
    }
    parsed
}
