use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One line of the intake sheet: an applicant plus at most one experience entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct IntakeRow {
    #[serde(skip)]
    pub(crate) line: usize,
    #[serde(rename = "Application ID", default, deserialize_with = "empty_string_as_none")]
    pub(crate) applicant_id: Option<String>,
    #[serde(rename = "Full Name", default, deserialize_with = "empty_string_as_none")]
    pub(crate) name: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "empty_string_as_none")]
    pub(crate) email: Option<String>,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    pub(crate) location: Option<String>,
    #[serde(rename = "LinkedIn URL", default, deserialize_with = "empty_string_as_none")]
    pub(crate) profile_url: Option<String>,
    #[serde(rename = "Company Name", default, deserialize_with = "empty_string_as_none")]
    pub(crate) company: Option<String>,
    #[serde(rename = "Job Title", default, deserialize_with = "empty_string_as_none")]
    pub(crate) title: Option<String>,
    #[serde(rename = "Start Date", default, deserialize_with = "empty_string_as_none")]
    pub(crate) start_date: Option<String>,
    #[serde(rename = "End Date", default, deserialize_with = "empty_string_as_none")]
    pub(crate) end_date: Option<String>,
    #[serde(rename = "Technologies", default, deserialize_with = "empty_string_as_none")]
    pub(crate) technologies: Option<String>,
    #[serde(
        rename = "Preferred Hourly Rate",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) preferred_rate: Option<String>,
    #[serde(
        rename = "Minimum Hourly Rate",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) minimum_rate: Option<String>,
    #[serde(rename = "Currency", default, deserialize_with = "empty_string_as_none")]
    pub(crate) currency: Option<String>,
    #[serde(
        rename = "Weekly Availability",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) weekly_availability: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<IntakeRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<IntakeRow>().enumerate() {
        let mut row = record?;
        // Header is line 1.
        row.line = index + 2;
        rows.push(row);
    }

    Ok(rows)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
