mod config;
mod metrics;
mod policy;

pub use config::ShortlistCriteria;
pub use metrics::{
    classify_location, conversion_factor, reference_rate, tenure_years, DerivedMetrics,
};
pub use policy::FailedCriterion;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicantDocument, ShortlistStatus};

/// Stateless evaluator applying the shortlist criteria to a document.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEngine {
    criteria: ShortlistCriteria,
}

impl EligibilityEngine {
    pub fn new(criteria: ShortlistCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &ShortlistCriteria {
        &self.criteria
    }

    /// Deterministic for a given document, criteria and `as_of` date.
    pub fn evaluate(&self, document: &ApplicantDocument, as_of: NaiveDate) -> Classification {
        let metrics = DerivedMetrics::from_document(document, as_of);
        let failed = policy::failed_criteria(&metrics, &self.criteria);

        Classification {
            status: policy::decide(&failed),
            rationale: policy::rationale(&metrics, &failed),
            metrics,
            failed,
        }
    }
}

/// Evaluation output with the metrics and failed criteria behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub status: ShortlistStatus,
    pub rationale: String,
    pub metrics: DerivedMetrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedCriterion>,
}

impl Classification {
    pub fn is_shortlisted(&self) -> bool {
        self.status == ShortlistStatus::Shortlisted
    }
}
