//! Review/Submit Controller and the read-only review summary.

use serde::{Deserialize, Serialize};

use crate::models::{
    format_minutes, Arch, ArchField, Bmi, Durations, FieldRegistry, FormStep, MedicationCatalog,
    SelectGroup, TextField, NO_TREATMENT, OTHER_OPTION,
};

use super::{FormError, FormResult};

/// Lifecycle of one form instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewPhase {
    Editing,
    Reviewing,
    Submitted,
}

impl ReviewPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewPhase::Editing => "editing",
            ReviewPhase::Reviewing => "reviewing",
            ReviewPhase::Submitted => "submitted",
        }
    }
}

/// `editing → reviewing → submitted`, with `reviewing → editing` as the only way back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewController {
    phase: ReviewPhase,
}

impl Default for ReviewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewController {
    pub fn new() -> Self {
        Self {
            phase: ReviewPhase::Editing,
        }
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    /// Close the form dialog and open the summary.
    pub fn begin_review(&mut self) -> FormResult<()> {
        self.transition(ReviewPhase::Editing, ReviewPhase::Reviewing, "review")
    }

    /// Return from the summary to the form.
    pub fn edit(&mut self) -> FormResult<()> {
        self.transition(ReviewPhase::Reviewing, ReviewPhase::Editing, "edit")
    }

    /// Check that a submit may start: reviewing, with a date on the record.
    pub fn ensure_submittable(&self, registry: &FieldRegistry) -> FormResult<()> {
        if self.phase != ReviewPhase::Reviewing {
            return Err(FormError::InvalidTransition {
                action: "submit",
                phase: self.phase.as_str(),
            });
        }
        if registry.text(TextField::Date).trim().is_empty() {
            return Err(FormError::MissingDate);
        }
        Ok(())
    }

    /// Record a successful final save.
    pub fn mark_submitted(&mut self) -> FormResult<()> {
        self.transition(ReviewPhase::Reviewing, ReviewPhase::Submitted, "submit")
    }

    fn transition(
        &mut self,
        from: ReviewPhase,
        to: ReviewPhase,
        action: &'static str,
    ) -> FormResult<()> {
        if self.phase != from {
            return Err(FormError::InvalidTransition {
                action,
                phase: self.phase.as_str(),
            });
        }
        self.phase = to;
        Ok(())
    }
}

const NOT_RECORDED: &str = "Not recorded";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    pub step: FormStep,
    pub title: String,
    pub rows: Vec<SummaryRow>,
}

/// A monitoring-log entry with medication names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEntrySummary {
    pub time: String,
    pub bp: String,
    pub heart_rate: String,
    pub rr: String,
    pub spo2: String,
    pub medications: String,
}

/// Read-only projection of the whole registry, grouped by step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub patient_name: String,
    pub sections: Vec<SummarySection>,
    pub flow_entries: Vec<FlowEntrySummary>,
    pub bmi: Option<Bmi>,
    pub durations: Durations,
}

impl ReviewSummary {
    pub fn build(registry: &FieldRegistry, catalog: &MedicationCatalog) -> Self {
        let bmi = Bmi::from_registry(registry);
        let durations = Durations::from_registry(registry);

        let sections = FormStep::ALL
            .iter()
            .map(|step| SummarySection {
                step: *step,
                title: step.title().to_string(),
                rows: section_rows(registry, *step, bmi.as_ref(), &durations),
            })
            .collect();

        let flow_entries = registry
            .flow_entries()
            .iter()
            .map(|e| FlowEntrySummary {
                time: e.time.clone(),
                bp: e.bp.clone(),
                heart_rate: e.heart_rate.clone(),
                rr: e.rr.clone(),
                spo2: e.spo2.clone(),
                medications: catalog.display_names(&e.medications),
            })
            .collect();

        Self {
            patient_name: registry.patient_name().to_string(),
            sections,
            flow_entries,
            bmi,
            durations,
        }
    }

    pub fn section(&self, step: FormStep) -> Option<&SummarySection> {
        self.sections.iter().find(|s| s.step == step)
    }

    /// Value shown for `label`, searching every section.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn row(label: &str, value: impl Into<String>) -> SummaryRow {
    let value = value.into();
    SummaryRow {
        label: label.to_string(),
        value: if value.trim().is_empty() {
            NOT_RECORDED.to_string()
        } else {
            value
        },
    }
}

fn text_row(registry: &FieldRegistry, field: TextField) -> SummaryRow {
    row(field.label(), registry.text(field))
}

fn selection_row(registry: &FieldRegistry, group: SelectGroup) -> SummaryRow {
    let mut value = registry.selection(group).join(", ");
    let other = registry.other_text(group).trim();
    if registry.is_selected(group, OTHER_OPTION) && !other.is_empty() {
        value.push_str(&format!(" (Other: {})", other));
    }
    row(group.label(), value)
}

fn section_rows(
    registry: &FieldRegistry,
    step: FormStep,
    bmi: Option<&Bmi>,
    durations: &Durations,
) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    match step {
        FormStep::BasicInfo => {
            rows.push(row("Patient", registry.patient_name()));
            rows.push(text_row(registry, TextField::Date));
            for arch in Arch::ALL {
                let treatment = registry.arch(ArchField::Treatment, arch);
                rows.push(row(ArchField::Treatment.label(arch), treatment));
                if !treatment.is_empty() && treatment != NO_TREATMENT {
                    rows.push(row(
                        ArchField::SurgeryType.label(arch),
                        registry.arch(ArchField::SurgeryType, arch),
                    ));
                }
            }
            let feet = registry.text(TextField::HeightFeet);
            let inches = registry.text(TextField::HeightInches);
            let height = if feet.is_empty() {
                String::new()
            } else {
                format!("{}' {}\"", feet, if inches.is_empty() { "0" } else { inches })
            };
            rows.push(row("Height", height));
            let weight = registry.text(TextField::Weight);
            rows.push(row(
                "Weight",
                if weight.is_empty() {
                    String::new()
                } else {
                    format!("{} lbs", weight)
                },
            ));
            rows.push(row(
                "BMI",
                bmi.map(|b| format!("{:.1} ({})", b.value, b.category.label()))
                    .unwrap_or_default(),
            ));
        }
        FormStep::PreAssessment => {
            rows.push(text_row(registry, TextField::NpoStatus));
            let morning = registry.morning_medications();
            let morning = match morning.taken {
                None => String::new(),
                Some(false) => "No".to_string(),
                Some(true) => format!("Yes: {}", morning.detail.trim()),
            };
            rows.push(row("Morning Medications", morning));
            if registry.patient_is_female() {
                rows.push(text_row(registry, TextField::PregnancyStatus));
                rows.push(text_row(registry, TextField::LastMenstrualPeriod));
            }
            for group in SelectGroup::ALL.iter().filter(|g| g.step() == step) {
                rows.push(selection_row(registry, *group));
                if *group == SelectGroup::EndocrineRenalProblems && registry.is_diabetic() {
                    rows.push(text_row(registry, TextField::LastA1cLevel));
                }
            }
            for field in [
                TextField::WellDevelopedNourished,
                TextField::PatientAnxious,
                TextField::AsaClassification,
                TextField::MallampatiScore,
            ] {
                rows.push(text_row(registry, field));
            }
        }
        FormStep::SedationPlan => {
            rows.push(text_row(registry, TextField::SedationType));
            for group in SelectGroup::ALL.iter().filter(|g| g.step() == step) {
                rows.push(selection_row(registry, *group));
            }
        }
        FormStep::FlowMonitoring => {
            for field in [
                TextField::TimeInRoom,
                TextField::SedationStartTime,
                TextField::SedationEndTime,
                TextField::OutOfRoomTime,
            ] {
                rows.push(text_row(registry, field));
            }
            rows.push(row(
                "Total Room Time",
                durations.room_minutes.map(format_minutes).unwrap_or_default(),
            ));
            rows.push(row(
                "Sedation Duration",
                durations.sedation_minutes.map(format_minutes).unwrap_or_default(),
            ));
            rows.push(text_row(registry, TextField::LevelOfSedation));
            rows.push(row(
                "Monitoring Log Entries",
                registry.flow_entries().len().to_string(),
            ));
        }
        FormStep::Recovery => {
            for field in TextField::ALL.iter().filter(|f| f.step() == step) {
                rows.push(text_row(registry, *field));
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlowEntry, Medication, MorningMedications};

    #[test]
    fn test_phase_transitions() {
        let mut controller = ReviewController::new();
        assert!(controller.edit().is_err());
        assert!(controller.mark_submitted().is_err());

        controller.begin_review().unwrap();
        assert_eq!(controller.phase(), ReviewPhase::Reviewing);
        assert!(controller.begin_review().is_err());

        controller.edit().unwrap();
        assert_eq!(controller.phase(), ReviewPhase::Editing);

        controller.begin_review().unwrap();
        controller.mark_submitted().unwrap();
        assert_eq!(controller.phase(), ReviewPhase::Submitted);
        assert!(controller.edit().is_err());
    }

    #[test]
    fn test_submit_requires_date() {
        let mut controller = ReviewController::new();
        let mut registry = FieldRegistry::default();
        assert!(matches!(
            controller.ensure_submittable(&registry),
            Err(FormError::InvalidTransition { .. })
        ));

        controller.begin_review().unwrap();
        assert!(matches!(
            controller.ensure_submittable(&registry),
            Err(FormError::MissingDate)
        ));

        registry.set_text(TextField::Date, "2025-03-01".into());
        assert!(controller.ensure_submittable(&registry).is_ok());
    }

    #[test]
    fn test_summary_projection() {
        let catalog = MedicationCatalog::new(vec![Medication::new(
            "midazolam".into(),
            "Midazolam".into(),
            "Benzodiazepine".into(),
        )]);
        let mut registry = FieldRegistry::default();
        registry.set_text(TextField::HeightFeet, "5".into());
        registry.set_text(TextField::HeightInches, "6".into());
        registry.set_text(TextField::Weight, "150".into());
        registry.set_arch(ArchField::Treatment, Arch::Upper, "FULL ARCH FIXED".into());
        registry.set_arch(ArchField::Treatment, Arch::Lower, NO_TREATMENT.into());
        registry.set_morning_medications(MorningMedications::yes("Metformin"));
        registry.set_selection(SelectGroup::Allergies, vec!["Latex".into(), "Other".into()]);
        registry.set_other_text(SelectGroup::Allergies, "Shellfish".into());
        registry.set_text(TextField::SedationStartTime, "08:10".into());
        registry.set_text(TextField::SedationEndTime, "09:25".into());
        registry.set_flow_entries(vec![FlowEntry {
            id: "e-1".into(),
            time: "08:15".into(),
            bp: "120/80".into(),
            heart_rate: "72".into(),
            rr: "14".into(),
            spo2: "98".into(),
            medications: vec!["midazolam".into(), "custom-med".into()],
        }]);

        let summary = ReviewSummary::build(&registry, &catalog);
        assert_eq!(summary.sections.len(), 5);
        assert_eq!(summary.value("BMI"), Some("24.2 (Normal)"));
        assert_eq!(summary.value("Height"), Some("5' 6\""));
        assert_eq!(summary.value("Upper Surgery Type"), Some(NOT_RECORDED));
        assert_eq!(summary.value("Lower Surgery Type"), None);
        assert_eq!(summary.value("Morning Medications"), Some("Yes: Metformin"));
        assert_eq!(summary.value("Allergies"), Some("Latex, Other (Other: Shellfish)"));
        assert_eq!(summary.value("Sedation Duration"), Some("1h 15m"));
        assert_eq!(summary.value("Total Room Time"), Some(NOT_RECORDED));
        assert_eq!(summary.value("Date"), Some(NOT_RECORDED));
        assert_eq!(summary.flow_entries[0].medications, "Midazolam, custom-med");
    }

    #[test]
    fn test_summary_hides_inapplicable_fields() {
        let registry = FieldRegistry::default();
        let summary = ReviewSummary::build(&registry, &MedicationCatalog::default());
        assert_eq!(summary.value("Pregnancy Status"), None);
        assert_eq!(summary.value("Last A1C Level"), None);
        assert!(summary.to_json().unwrap().contains("\"sections\""));
    }
}
