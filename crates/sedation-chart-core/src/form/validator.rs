//! Step Validator and Completion Checker.
//!
//! Both read the same requirement table, so a step shows a checkmark exactly
//! when forward navigation out of it is allowed.

use crate::models::{Arch, ArchField, FieldRegistry, FormStep, SelectGroup, TextField};

/// When a requirement applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Always,
    PatientIsFemale,
    DiabetesSelected,
}

impl Applicability {
    fn holds(self, registry: &FieldRegistry) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::PatientIsFemale => registry.patient_is_female(),
            Applicability::DiabetesSelected => registry.is_diabetic(),
        }
    }
}

/// What has to hold for a requirement to be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Present and well-formed for the field's format
    Text(TextField),
    /// Treatment or surgery type chosen for one arch
    Arch(ArchField, Arch),
    /// At least one option selected
    Select(SelectGroup),
    /// "No", or "yes" with the medications named
    MorningMedications,
    /// At least one monitoring-log entry
    FlowEntries,
}

impl Check {
    fn is_satisfied(self, registry: &FieldRegistry) -> bool {
        match self {
            Check::Text(field) => field.format().accepts(registry.text(field)),
            Check::Arch(field, arch) => !registry.arch(field, arch).trim().is_empty(),
            Check::Select(group) => !registry.selection(group).is_empty(),
            Check::MorningMedications => registry.morning_medications().is_complete(),
            Check::FlowEntries => !registry.flow_entries().is_empty(),
        }
    }
}

/// One required field of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub step: FormStep,
    pub check: Check,
    pub applies: Applicability,
}

impl Requirement {
    const fn always(step: FormStep, check: Check) -> Self {
        Self {
            step,
            check,
            applies: Applicability::Always,
        }
    }

    const fn when(step: FormStep, check: Check, applies: Applicability) -> Self {
        Self {
            step,
            check,
            applies,
        }
    }

    /// Human-readable name shown in the "missing fields" message.
    pub fn label(&self) -> &'static str {
        match self.check {
            Check::Text(field) => field.label(),
            Check::Arch(field, arch) => field.label(arch),
            Check::Select(group) => group.label(),
            Check::MorningMedications => "Morning Medications",
            Check::FlowEntries => "Monitoring Log Entries",
        }
    }

    pub fn applies_to(&self, registry: &FieldRegistry) -> bool {
        self.applies.holds(registry)
    }

    /// Met, or not applicable in the registry's current state.
    pub fn is_met(&self, registry: &FieldRegistry) -> bool {
        !self.applies_to(registry) || self.check.is_satisfied(registry)
    }
}

use Applicability::{DiabetesSelected, PatientIsFemale};
use FormStep::{BasicInfo, FlowMonitoring, PreAssessment, Recovery, SedationPlan};

/// Every required field, in display order.
pub const REQUIREMENTS: &[Requirement] = &[
    // Step 1
    Requirement::always(BasicInfo, Check::Text(TextField::Date)),
    Requirement::always(BasicInfo, Check::Arch(ArchField::Treatment, Arch::Upper)),
    Requirement::always(BasicInfo, Check::Arch(ArchField::Treatment, Arch::Lower)),
    Requirement::always(BasicInfo, Check::Text(TextField::HeightFeet)),
    Requirement::always(BasicInfo, Check::Text(TextField::HeightInches)),
    Requirement::always(BasicInfo, Check::Text(TextField::Weight)),
    // Step 2
    Requirement::always(PreAssessment, Check::Text(TextField::NpoStatus)),
    Requirement::always(PreAssessment, Check::MorningMedications),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::Allergies)),
    Requirement::when(PreAssessment, Check::Text(TextField::PregnancyStatus), PatientIsFemale),
    Requirement::when(PreAssessment, Check::Text(TextField::LastMenstrualPeriod), PatientIsFemale),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::RespiratoryProblems)),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::CardiovascularProblems)),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::GastrointestinalProblems)),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::NeurologicProblems)),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::EndocrineRenalProblems)),
    Requirement::when(PreAssessment, Check::Text(TextField::LastA1cLevel), DiabetesSelected),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::Miscellaneous)),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::SocialHistory)),
    Requirement::always(PreAssessment, Check::Text(TextField::WellDevelopedNourished)),
    Requirement::always(PreAssessment, Check::Text(TextField::PatientAnxious)),
    Requirement::always(PreAssessment, Check::Text(TextField::AsaClassification)),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::AirwayEvaluation)),
    Requirement::always(PreAssessment, Check::Text(TextField::MallampatiScore)),
    Requirement::always(PreAssessment, Check::Select(SelectGroup::HeartLungEvaluation)),
    // Step 3
    Requirement::always(SedationPlan, Check::Text(TextField::SedationType)),
    Requirement::always(SedationPlan, Check::Select(SelectGroup::MedicationsPlanned)),
    Requirement::always(SedationPlan, Check::Select(SelectGroup::AdministrationRoute)),
    Requirement::always(SedationPlan, Check::Select(SelectGroup::InstrumentsChecklist)),
    Requirement::always(SedationPlan, Check::Select(SelectGroup::EmergencyProtocols)),
    // Step 4
    Requirement::always(FlowMonitoring, Check::Text(TextField::TimeInRoom)),
    Requirement::always(FlowMonitoring, Check::Text(TextField::SedationStartTime)),
    Requirement::always(FlowMonitoring, Check::Text(TextField::SedationEndTime)),
    Requirement::always(FlowMonitoring, Check::Text(TextField::OutOfRoomTime)),
    Requirement::always(FlowMonitoring, Check::Text(TextField::LevelOfSedation)),
    Requirement::always(FlowMonitoring, Check::FlowEntries),
    // Step 5
    Requirement::always(Recovery, Check::Text(TextField::AlertAndOriented)),
    Requirement::always(Recovery, Check::Text(TextField::ProtectiveReflexesIntact)),
    Requirement::always(Recovery, Check::Text(TextField::VitalSignsStable)),
    Requirement::always(Recovery, Check::Text(TextField::Ambulatory)),
    Requirement::always(Recovery, Check::Text(TextField::EscortPresent)),
    Requirement::always(Recovery, Check::Text(TextField::DischargedTo)),
    Requirement::always(Recovery, Check::Text(TextField::PainScore)),
];

fn requirements_for(step: FormStep) -> impl Iterator<Item = &'static Requirement> {
    REQUIREMENTS.iter().filter(move |r| r.step == step)
}

/// Labels of the required fields of `step` that are not yet valid.
///
/// Empty iff the step is complete.
pub fn validate(registry: &FieldRegistry, step: FormStep) -> Vec<&'static str> {
    requirements_for(step)
        .filter(|r| !r.is_met(registry))
        .map(|r| r.label())
        .collect()
}

/// Whether every required field of `step` currently holds a valid value.
pub fn is_step_complete(registry: &FieldRegistry, step: FormStep) -> bool {
    requirements_for(step).all(|r| r.is_met(registry))
}

/// Completion flag per step, for the progress indicator.
pub fn step_completion(registry: &FieldRegistry) -> Vec<(FormStep, bool)> {
    FormStep::ALL
        .iter()
        .map(|step| (*step, is_step_complete(registry, *step)))
        .collect()
}

/// The aggregated message shown when forward navigation is blocked.
pub fn missing_fields_message(missing: &[&str]) -> String {
    format!("Please complete the required fields: {}", missing.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlowEntry, MorningMedications, PatientContext};

    fn basic_info_registry() -> FieldRegistry {
        let mut registry = FieldRegistry::default();
        registry.set_text(TextField::Date, "2025-03-01".into());
        registry.set_arch(ArchField::Treatment, Arch::Upper, "FULL ARCH FIXED".into());
        registry.set_arch(ArchField::Treatment, Arch::Lower, "NO TREATMENT".into());
        registry.set_text(TextField::HeightFeet, "5".into());
        registry.set_text(TextField::HeightInches, "6".into());
        registry.set_text(TextField::Weight, "150".into());
        registry
    }

    fn pre_assessment_registry(patient: &PatientContext) -> FieldRegistry {
        let mut registry = FieldRegistry::for_patient(patient);
        registry.set_text(TextField::NpoStatus, "NPO since midnight".into());
        registry.set_morning_medications(MorningMedications::no());
        for group in SelectGroup::ALL {
            if group.step() == PreAssessment {
                registry.set_selection(group, vec![group.options()[0].to_string()]);
            }
        }
        registry.set_text(TextField::WellDevelopedNourished, "Yes".into());
        registry.set_text(TextField::PatientAnxious, "No".into());
        registry.set_text(TextField::AsaClassification, "ASA II".into());
        registry.set_text(TextField::MallampatiScore, "Class I".into());
        registry
    }

    #[test]
    fn test_basic_info_complete() {
        let mut registry = basic_info_registry();
        assert!(is_step_complete(&registry, BasicInfo));
        assert!(validate(&registry, BasicInfo).is_empty());

        registry.set_text(TextField::Weight, String::new());
        assert!(!is_step_complete(&registry, BasicInfo));
        assert_eq!(validate(&registry, BasicInfo), vec!["Weight"]);
    }

    #[test]
    fn test_out_of_range_values_are_missing() {
        let mut registry = basic_info_registry();
        registry.set_text(TextField::HeightInches, "14".into());
        assert_eq!(validate(&registry, BasicInfo), vec!["Height (inches)"]);
    }

    #[test]
    fn test_empty_registry_lists_all_labels_in_order() {
        let registry = FieldRegistry::default();
        assert_eq!(
            validate(&registry, BasicInfo),
            vec![
                "Date",
                "Upper Treatment",
                "Lower Treatment",
                "Height (feet)",
                "Height (inches)",
                "Weight"
            ]
        );
    }

    #[test]
    fn test_a1c_required_only_for_diabetics() {
        let patient = PatientContext::new("p-1".into(), "Sam".into(), "Lee".into());
        let mut registry = pre_assessment_registry(&patient);
        assert!(validate(&registry, PreAssessment).is_empty());

        registry.set_selection(SelectGroup::EndocrineRenalProblems, vec!["Diabetes".into()]);
        let missing = validate(&registry, PreAssessment);
        assert!(missing.contains(&"Last A1C Level"));
        assert!(!is_step_complete(&registry, PreAssessment));

        registry.set_text(TextField::LastA1cLevel, "6.8".into());
        assert!(is_step_complete(&registry, PreAssessment));
    }

    #[test]
    fn test_pregnancy_fields_required_for_female_patients() {
        let mut patient = PatientContext::new("p-1".into(), "Ana".into(), "Lopez".into());
        patient.gender = Some("female".into());
        let mut registry = pre_assessment_registry(&patient);

        let missing = validate(&registry, PreAssessment);
        assert_eq!(missing, vec!["Pregnancy Status", "Last Menstrual Period"]);

        registry.set_text(TextField::PregnancyStatus, "Not pregnant".into());
        registry.set_text(TextField::LastMenstrualPeriod, "2025-02-14".into());
        assert!(is_step_complete(&registry, PreAssessment));
    }

    #[test]
    fn test_morning_medications_yes_without_detail_is_incomplete() {
        let patient = PatientContext::new("p-1".into(), "Sam".into(), "Lee".into());
        let mut registry = pre_assessment_registry(&patient);
        registry.set_morning_medications(MorningMedications::yes(""));
        assert_eq!(validate(&registry, PreAssessment), vec!["Morning Medications"]);

        registry.set_morning_medications(MorningMedications::yes("Metoprolol 25mg"));
        assert!(validate(&registry, PreAssessment).is_empty());
    }

    #[test]
    fn test_flow_monitoring_needs_an_entry() {
        let mut registry = FieldRegistry::default();
        registry.set_text(TextField::TimeInRoom, "08:00".into());
        registry.set_text(TextField::SedationStartTime, "08:10".into());
        registry.set_text(TextField::SedationEndTime, "09:00".into());
        registry.set_text(TextField::OutOfRoomTime, "09:20".into());
        registry.set_text(TextField::LevelOfSedation, "Moderate".into());
        assert_eq!(validate(&registry, FlowMonitoring), vec!["Monitoring Log Entries"]);

        registry.set_flow_entries(vec![FlowEntry {
            id: "e-1".into(),
            time: "08:15".into(),
            bp: "120/80".into(),
            heart_rate: String::new(),
            rr: String::new(),
            spo2: String::new(),
            medications: vec![],
        }]);
        assert!(is_step_complete(&registry, FlowMonitoring));
    }

    #[test]
    fn test_step_completion_covers_all_steps() {
        let registry = basic_info_registry();
        let completion = step_completion(&registry);
        assert_eq!(completion.len(), 5);
        assert_eq!(completion[0], (BasicInfo, true));
        assert!(completion[1..].iter().all(|(_, done)| !done));
    }

    #[test]
    fn test_missing_fields_message() {
        assert_eq!(
            missing_fields_message(&["Date", "Weight"]),
            "Please complete the required fields: Date, Weight"
        );
    }
}
