//! Patient context models.

use serde::{Deserialize, Serialize};

/// Read-only patient identity supplied by the hosting page.
///
/// The form never mutates it; it only derives the display name and the
/// sex-dependent requirements from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientContext {
    /// Patient ID in the remote store
    pub id: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Gender as recorded by the practice (e.g., "female", "Male", "F")
    pub gender: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
}

impl PatientContext {
    /// Create a patient context with required fields.
    pub fn new(id: String, first_name: String, last_name: String) -> Self {
        Self {
            id,
            first_name,
            last_name,
            gender: None,
            date_of_birth: None,
        }
    }

    /// Full display name, or `None` when both name parts are blank.
    pub fn display_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// Whether pregnancy-specific questions apply to this patient.
    pub fn is_female(&self) -> bool {
        matches!(
            self.gender.as_deref().map(|g| g.trim().to_lowercase()).as_deref(),
            Some("female") | Some("f")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let patient = PatientContext::new("p-1".into(), "Jane".into(), "Doe".into());
        assert_eq!(patient.display_name(), Some("Jane Doe".into()));
    }

    #[test]
    fn test_display_name_blank() {
        let patient = PatientContext::new("p-1".into(), " ".into(), "".into());
        assert_eq!(patient.display_name(), None);
    }

    #[test]
    fn test_is_female() {
        let mut patient = PatientContext::new("p-1".into(), "Jane".into(), "Doe".into());
        assert!(!patient.is_female());

        patient.gender = Some("Female".into());
        assert!(patient.is_female());

        patient.gender = Some("F".into());
        assert!(patient.is_female());

        patient.gender = Some("male".into());
        assert!(!patient.is_female());
    }
}
