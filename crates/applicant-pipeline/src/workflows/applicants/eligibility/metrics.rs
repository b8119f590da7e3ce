use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicantDocument, CurrencyCode, ExperienceEntry};

const DAYS_PER_MONTH: f64 = 30.0;

/// Ordered alias table; the first class with a matching alias wins.
const LOCATION_CLASSES: &[(&str, &[&str])] = &[
    ("USA", &["UNITED STATES", "USA", "US"]),
    ("CANADA", &["CANADA"]),
    ("UK", &["UNITED KINGDOM", "BRITAIN", "UK"]),
    ("GERMANY", &["GERMANY", "DEUTSCHLAND"]),
    ("INDIA", &["INDIA"]),
];

/// Multipliers into USD. Codes outside the table convert at par.
const CURRENCY_FACTORS: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 1.1),
    ("GBP", 1.25),
    ("INR", 0.012),
    ("CAD", 0.75),
];

/// Values the shortlist rule is evaluated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// `None` when no experience entry carries a start date.
    pub tenure_years: Option<f64>,
    pub location_class: Option<String>,
    /// Preferred rate in USD, `None` when no preferred rate was given.
    pub reference_rate: Option<f64>,
    pub currency: CurrencyCode,
}

impl DerivedMetrics {
    pub fn from_document(document: &ApplicantDocument, as_of: NaiveDate) -> Self {
        let salary = document.salary.as_ref();
        let currency = salary
            .and_then(|salary| salary.currency.clone())
            .unwrap_or_default();

        Self {
            tenure_years: tenure_years(&document.experience, as_of),
            location_class: document
                .personal
                .as_ref()
                .and_then(|personal| personal.location.as_deref())
                .and_then(classify_location),
            reference_rate: salary
                .and_then(|salary| salary.preferred_rate)
                .map(|rate| reference_rate(rate, &currency)),
            currency,
        }
    }
}

/// Sums every dated entry as `days / 30` months and converts to years. Open entries run to
/// `as_of`; entries ending before they start count as zero.
pub fn tenure_years(entries: &[ExperienceEntry], as_of: NaiveDate) -> Option<f64> {
    let mut dated = false;
    let mut months = 0.0;

    for entry in entries {
        let Some(start) = entry.start_date else {
            continue;
        };
        dated = true;
        let end = entry.end_date.unwrap_or(as_of);
        let days = (end - start).num_days().max(0) as f64;
        months += days / DAYS_PER_MONTH;
    }

    dated.then_some(months / 12.0)
}

/// Canonical location bucket for free text, or the upper-cased input when no alias matches.
/// Aliases match anywhere in the text, in table order.
pub fn classify_location(location: &str) -> Option<String> {
    let normalized = location.trim().to_uppercase();
    if normalized.is_empty() {
        return None;
    }

    let class = LOCATION_CLASSES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|alias| normalized.contains(alias)))
        .map(|(class, _)| class.to_string())
        .unwrap_or(normalized);

    Some(class)
}

pub fn conversion_factor(currency: &CurrencyCode) -> f64 {
    CURRENCY_FACTORS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(currency.as_str()))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

pub fn reference_rate(rate: f64, currency: &CurrencyCode) -> f64 {
    rate * conversion_factor(currency)
}
