use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Thresholds the shortlist rule compares derived metrics against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistCriteria {
    pub min_experience_years: f64,
    /// Upper bound on the preferred rate after conversion to USD.
    pub max_hourly_rate_reference_currency: f64,
    pub approved_location_classes: BTreeSet<String>,
}

impl ShortlistCriteria {
    pub fn approves_location(&self, class: &str) -> bool {
        self.approved_location_classes.contains(class)
    }
}

impl Default for ShortlistCriteria {
    fn default() -> Self {
        Self {
            min_experience_years: 3.0,
            max_hourly_rate_reference_currency: 150.0,
            approved_location_classes: ["USA", "CANADA", "UK", "GERMANY", "INDIA"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
