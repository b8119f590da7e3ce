use serde::{Deserialize, Serialize};

use super::super::domain::{CurrencyCode, ShortlistStatus};
use super::config::ShortlistCriteria;
use super::metrics::DerivedMetrics;

/// Criterion an applicant fell short on, with the values that decided it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "criterion", rename_all = "snake_case")]
pub enum FailedCriterion {
    Experience { years: Option<f64>, required: f64 },
    Rate { rate: Option<f64>, max: f64 },
    Location { class: Option<String> },
}

impl FailedCriterion {
    pub fn summary(&self) -> String {
        match self {
            FailedCriterion::Experience {
                years: Some(years),
                required,
            } => format!(
                "Experience: {years:.1} years (need {}).",
                format_amount(*required)
            ),
            FailedCriterion::Experience {
                years: None,
                required,
            } => format!(
                "Experience: not provided (need {}).",
                format_amount(*required)
            ),
            FailedCriterion::Rate {
                rate: Some(rate),
                max,
            } => format!(
                "Rate: ${}/hr {} (max ${}).",
                format_amount(*rate),
                CurrencyCode::REFERENCE,
                format_amount(*max)
            ),
            FailedCriterion::Rate { rate: None, max } => {
                format!("Rate: not provided (max ${}).", format_amount(*max))
            }
            FailedCriterion::Location { class: Some(class) } => {
                format!("Location: {class} not in approved list.")
            }
            FailedCriterion::Location { class: None } => "Location: not provided.".to_string(),
        }
    }
}

pub(crate) fn failed_criteria(
    metrics: &DerivedMetrics,
    criteria: &ShortlistCriteria,
) -> Vec<FailedCriterion> {
    let mut failed = Vec::new();

    if !metrics
        .tenure_years
        .map(|years| years >= criteria.min_experience_years)
        .unwrap_or(false)
    {
        failed.push(FailedCriterion::Experience {
            years: metrics.tenure_years,
            required: criteria.min_experience_years,
        });
    }

    if !metrics
        .reference_rate
        .map(|rate| rate <= criteria.max_hourly_rate_reference_currency)
        .unwrap_or(false)
    {
        failed.push(FailedCriterion::Rate {
            rate: metrics.reference_rate,
            max: criteria.max_hourly_rate_reference_currency,
        });
    }

    if !metrics
        .location_class
        .as_deref()
        .map(|class| criteria.approves_location(class))
        .unwrap_or(false)
    {
        failed.push(FailedCriterion::Location {
            class: metrics.location_class.clone(),
        });
    }

    failed
}

pub(crate) fn decide(failed: &[FailedCriterion]) -> ShortlistStatus {
    if failed.is_empty() {
        ShortlistStatus::Shortlisted
    } else {
        ShortlistStatus::Rejected
    }
}

/// Rejections list every failed criterion; acceptances restate all three values.
pub(crate) fn rationale(metrics: &DerivedMetrics, failed: &[FailedCriterion]) -> String {
    if !failed.is_empty() {
        return failed
            .iter()
            .map(FailedCriterion::summary)
            .collect::<Vec<_>>()
            .join(" ");
    }

    format!(
        "Experience: {:.1} years. Rate: ${}/hr {}. Location: {}.",
        metrics.tenure_years.unwrap_or_default(),
        format_amount(metrics.reference_rate.unwrap_or_default()),
        CurrencyCode::REFERENCE,
        metrics.location_class.as_deref().unwrap_or_default()
    )
}

/// Whole amounts print without decimals, anything else with two.
/// Rounds to cents first so converted rates like `100.0 * 1.1` print as whole amounts.
fn format_amount(value: f64) -> String {
    let cents = (value * 100.0).round() / 100.0;
    if cents.fract().abs() < f64::EPSILON {
        format!("{cents:.0}")
    } else {
        format!("{cents:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_drop_trailing_zero_decimals() {
        assert_eq!(format_amount(150.0), "150");
        assert_eq!(format_amount(137.5), "137.50");
        assert_eq!(format_amount(1.0 / 3.0), "0.33");
    }

    #[test]
    fn converted_amounts_ignore_float_noise() {
        assert_eq!(format_amount(100.0 * 1.1), "110");
        assert_eq!(format_amount(80.0 * 1.1), "88");
        assert_eq!(format_amount(99.999_999), "100");
        assert_eq!(format_amount(3500.0 * 0.012), "42");
    }

    #[test]
    fn missing_values_read_as_not_provided() {
        let rate = FailedCriterion::Rate {
            rate: None,
            max: 150.0,
        };
        assert_eq!(rate.summary(), "Rate: not provided (max $150).");

        let experience = FailedCriterion::Experience {
            years: None,
            required: 2.5,
        };
        assert_eq!(experience.summary(), "Experience: not provided (need 2.50).");
    }
}
