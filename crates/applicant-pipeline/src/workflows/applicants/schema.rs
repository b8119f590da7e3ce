//! Table and column names of the applicant base.

/// Table names, overridable when a base uses different labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub applicants: String,
    pub personal: String,
    pub experience: String,
    pub salary: String,
    pub leads: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            applicants: "Applications".to_string(),
            personal: "Personal Details".to_string(),
            experience: "Work Experience".to_string(),
            salary: "Salary Preferences".to_string(),
            leads: "Shortlisted Leads".to_string(),
        }
    }
}

pub mod applicant {
    pub const APPLICANT_ID: &str = "Application ID";
    pub const DOCUMENT: &str = "Compressed JSON";
    pub const SHORTLIST_STATUS: &str = "Shortlist Status";
    pub const SHORTLIST_REASON: &str = "Shortlist Reason";
    pub const PERSONAL_LINKS: &str = "Personal Details";
    pub const EXPERIENCE_LINKS: &str = "Work Experience";
    pub const SALARY_LINKS: &str = "Salary Preferences";
}

/// Back-link column every child table uses to point at its applicant.
pub const APPLICANT_LINK: &str = "Application ID";

pub mod personal {
    pub const NAME: &str = "Full Name";
    pub const EMAIL: &str = "Email";
    pub const LOCATION: &str = "Location";
    pub const PROFILE_URL: &str = "LinkedIn URL";
}

pub mod experience {
    pub const COMPANY: &str = "Company Name";
    pub const TITLE: &str = "Job Title";
    pub const START_DATE: &str = "Start Date";
    pub const END_DATE: &str = "End Date";
    pub const TECHNOLOGIES: &str = "Technologies";
}

pub mod salary {
    pub const PREFERRED_RATE: &str = "Preferred Hourly Rate";
    pub const MINIMUM_RATE: &str = "Minimum Hourly Rate";
    pub const CURRENCY: &str = "Currency";
    pub const WEEKLY_AVAILABILITY: &str = "Weekly Availability";
}

pub mod lead {
    pub const NAME: &str = "Lead Name";
    pub const SOURCE: &str = "Source";
    pub const REASON: &str = "Shortlist Reason";
    pub const APPLICANTS: &str = "Applicants";

    pub const SOURCE_LABEL: &str = "Applicant Pipeline";
}
