use chrono::NaiveDate;

use super::parser::IntakeRow;
use crate::workflows::applicants::{
    parse_date, ApplicantDocument, ApplicantId, CurrencyCode, ExperienceEntry, PersonalSection,
    RecordId, SalarySection,
};

/// Rows of one applicant folded into a document, plus any cells that could not be read.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IntakeApplicant {
    pub(crate) document: ApplicantDocument,
    pub(crate) warnings: Vec<String>,
}

/// Groups rows by Application ID in first-seen order. Rows without an id are reported.
pub(crate) fn group_rows(rows: Vec<IntakeRow>) -> (Vec<IntakeApplicant>, Vec<String>) {
    let mut groups: Vec<(String, Vec<IntakeRow>)> = Vec::new();
    let mut orphans = Vec::new();

    for row in rows {
        let Some(applicant_id) = row.applicant_id.clone() else {
            orphans.push(format!("line {}: missing Application ID, row ignored", row.line));
            continue;
        };
        match groups.iter_mut().find(|(id, _)| *id == applicant_id) {
            Some((_, members)) => members.push(row),
            None => groups.push((applicant_id, vec![row])),
        }
    }

    let applicants = groups
        .into_iter()
        .map(|(applicant_id, members)| fold_group(applicant_id, &members))
        .collect();
    (applicants, orphans)
}

fn fold_group(applicant_id: String, rows: &[IntakeRow]) -> IntakeApplicant {
    let mut warnings = Vec::new();
    // The record id is only known once the applicant row exists.
    let mut document = ApplicantDocument::new(ApplicantId(applicant_id), RecordId::new(""));

    if let Some(first) = rows.first() {
        if first.name.is_some()
            || first.email.is_some()
            || first.location.is_some()
            || first.profile_url.is_some()
        {
            document.personal = Some(PersonalSection {
                name: first.name.clone(),
                email: first.email.clone(),
                location: first.location.clone(),
                profile_url: first.profile_url.clone(),
            });
        }

        if first.preferred_rate.is_some()
            || first.minimum_rate.is_some()
            || first.currency.is_some()
            || first.weekly_availability.is_some()
        {
            document.salary = Some(SalarySection {
                preferred_rate: number(
                    first,
                    "Preferred Hourly Rate",
                    &first.preferred_rate,
                    &mut warnings,
                ),
                minimum_rate: number(
                    first,
                    "Minimum Hourly Rate",
                    &first.minimum_rate,
                    &mut warnings,
                ),
                currency: first.currency.as_deref().map(CurrencyCode::new),
                weekly_availability: number(
                    first,
                    "Weekly Availability",
                    &first.weekly_availability,
                    &mut warnings,
                ),
            });
        }
    }

    document.experience = rows
        .iter()
        .filter(|row| row.company.is_some() || row.title.is_some())
        .map(|row| ExperienceEntry {
            source_record_id: None,
            company: row.company.clone(),
            title: row.title.clone(),
            start_date: date(row, "Start Date", &row.start_date, &mut warnings),
            end_date: date(row, "End Date", &row.end_date, &mut warnings),
            technologies: split_technologies(row.technologies.as_deref()),
        })
        .collect();

    IntakeApplicant { document, warnings }
}

pub(crate) fn split_technologies(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn number(
    row: &IntakeRow,
    column: &str,
    value: &Option<String>,
    warnings: &mut Vec<String>,
) -> Option<f64> {
    let raw = value.as_deref()?;
    let parsed = raw.trim_start_matches('$').replace(',', "").parse::<f64>().ok();
    if parsed.is_none() {
        warnings.push(format!("line {}: {column} '{raw}' is not a number", row.line));
    }
    parsed
}

fn date(
    row: &IntakeRow,
    column: &str,
    value: &Option<String>,
    warnings: &mut Vec<String>,
) -> Option<NaiveDate> {
    let raw = value.as_deref()?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        warnings.push(format!("line {}: {column} '{raw}' is not a date", row.line));
    }
    parsed
}
