use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use super::store::RecordId;

/// Stable external identifier of an applicant (the "Application ID" column).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub String);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Portable, denormalized snapshot of one applicant's linked records.
///
/// This is the only persisted artifact whose JSON shape must survive projection and
/// rematerialization cycles, so field names here are part of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantDocument {
    pub applicant_id: ApplicantId,
    #[serde(alias = "record_id")]
    pub source_record_id: RecordId,
    #[serde(default)]
    pub personal: Option<PersonalSection>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub salary: Option<SalarySection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalSection {
    pub name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "linkedin")]
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(alias = "record_id", skip_serializing_if = "Option::is_none")]
    pub source_record_id: Option<RecordId>,
    pub company: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "start", deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    /// `None` marks the current role.
    #[serde(alias = "end", deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(deserialize_with = "null_as_empty")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalarySection {
    pub preferred_rate: Option<f64>,
    pub minimum_rate: Option<f64>,
    pub currency: Option<CurrencyCode>,
    #[serde(alias = "availability")]
    pub weekly_availability: Option<f64>,
}

/// ISO-4217-like currency code. Missing codes resolve to the reference currency through
/// `Option::unwrap_or_default`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrencyCode {
    Code(String),
}

impl CurrencyCode {
    pub const REFERENCE: &'static str = "USD";

    pub fn new(code: impl AsRef<str>) -> Self {
        Self::Code(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        match self {
            CurrencyCode::Code(code) => code.as_str(),
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::Code(Self::REFERENCE.to_string())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApplicantDocument {
    pub fn new(applicant_id: ApplicantId, source_record_id: RecordId) -> Self {
        Self {
            applicant_id,
            source_record_id,
            personal: None,
            experience: Vec::new(),
            salary: None,
        }
    }

    /// Pretty-printed JSON, the form stored on the applicant row.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Encode)
    }

    pub fn from_json(raw: &str) -> Result<Self, DocumentError> {
        if raw.trim().is_empty() {
            return Err(DocumentError::Blank);
        }
        serde_json::from_str(raw).map_err(DocumentError::Malformed)
    }

    pub fn display_name(&self) -> &str {
        self.personal
            .as_ref()
            .and_then(|personal| personal.name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.applicant_id.0.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is blank")]
    Blank,
    #[error("document does not match the expected structure: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("document could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Terminal outcome written to the applicant row by the shortlist workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortlistStatus {
    Shortlisted,
    Rejected,
}

impl ShortlistStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ShortlistStatus::Shortlisted => "Shortlisted",
            ShortlistStatus::Rejected => "Rejected",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shortlisted" => Some(Self::Shortlisted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Recoverable data problems noticed while reading or writing records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    ExtraLinks {
        section: &'static str,
        count: usize,
    },
    DanglingLink {
        table: String,
        record_id: RecordId,
    },
    UnparsableDate {
        record_id: RecordId,
        field: &'static str,
        value: String,
    },
    NonNumericValue {
        record_id: RecordId,
        field: &'static str,
    },
    ApplicantIdMismatch {
        document: ApplicantId,
        record: ApplicantId,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::ExtraLinks { section, count } => write!(
                f,
                "{count} {section} links found, only the first is used"
            ),
            DataQualityWarning::DanglingLink { table, record_id } => {
                write!(f, "linked record {record_id} missing from {table}")
            }
            DataQualityWarning::UnparsableDate {
                record_id,
                field,
                value,
            } => write!(f, "{field} '{value}' on {record_id} is not a date"),
            DataQualityWarning::NonNumericValue { record_id, field } => {
                write!(f, "{field} on {record_id} is not numeric")
            }
            DataQualityWarning::ApplicantIdMismatch { document, record } => write!(
                f,
                "document belongs to {document} but the record carries {record}"
            ),
        }
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => parse_date(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{value}'"))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
