use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Names of the applicant fields, in the order they appear on the partner form.
pub const FIELD_NAMES: [&str; 9] = [
    "first_name",
    "last_name",
    "email",
    "phone",
    "country",
    "city",
    "address",
    "position",
    "additional_info",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub position: String,
    pub additional_info: String,
}

impl ApplicantFields {
    /// Field name/value pairs in form order.
    pub fn pairs(&self) -> [(&'static str, &str); 9] {
        [
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("country", self.country.as_str()),
            ("city", self.city.as_str()),
            ("address", self.address.as_str()),
            ("position", self.position.as_str()),
            ("additional_info", self.additional_info.as_str()),
        ]
    }

    /// Set a field by its form name. Unknown names are ignored and reported as `false`.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "first_name" => &mut self.first_name,
            "last_name" => &mut self.last_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "country" => &mut self.country,
            "city" => &mut self.city,
            "address" => &mut self.address,
            "position" => &mut self.position,
            "additional_info" => &mut self.additional_info,
            _ => return false,
        };
        *slot = value;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Error,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 5] = [
        SubmissionStatus::Pending,
        SubmissionStatus::Processing,
        SubmissionStatus::Completed,
        SubmissionStatus::Failed,
        SubmissionStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Failed => "failed",
            SubmissionStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "processing" => Some(SubmissionStatus::Processing),
            "completed" => Some(SubmissionStatus::Completed),
            "failed" => Some(SubmissionStatus::Failed),
            "error" => Some(SubmissionStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Completed | SubmissionStatus::Failed | SubmissionStatus::Error
        )
    }

    /// Status only moves forward: pending -> processing -> {completed, failed, error}.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (SubmissionStatus::Pending, SubmissionStatus::Processing)
                | (SubmissionStatus::Processing, SubmissionStatus::Completed)
                | (SubmissionStatus::Processing, SubmissionStatus::Failed)
                | (SubmissionStatus::Processing, SubmissionStatus::Error)
        )
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: ApplicantFields,
    pub resume_ref: Option<String>,
    pub status: SubmissionStatus,
    pub external_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What intake hands to the store; the store assigns id, status and timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub fields: ApplicantFields,
    pub resume_ref: Option<String>,
}
