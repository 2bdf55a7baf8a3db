//! Lifecycle status and fixed columns of a persisted flow chart.

use serde::{Deserialize, Serialize};

/// Column holding the owning patient's id.
pub const PATIENT_ID_COLUMN: &str = "patient_id";
/// Column holding the patient display name.
pub const PATIENT_NAME_COLUMN: &str = "patient_name";
/// Column holding the record status.
pub const STATUS_COLUMN: &str = "status";

/// Status of a persisted form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    /// Auto-saved, not yet submitted
    Draft,
    /// Submitted from the review summary
    Completed,
}

impl FormStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FormStatus::Draft => "draft",
            FormStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(FormStatus::Draft),
            "completed" => Some(FormStatus::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        for status in [FormStatus::Draft, FormStatus::Completed] {
            assert_eq!(FormStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FormStatus::parse("archived"), None);
    }
}
