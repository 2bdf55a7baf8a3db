//! The field registry: every value backing one flow-chart instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fields::{Arch, ArchField, SelectGroup, TextField, DIABETES_OPTION};
use super::flow::FlowEntry;
use super::patient::PatientContext;

/// Whether the patient took their usual medications this morning, and which.
///
/// The legacy column stores this as one string: `""` (unanswered), `"no"`,
/// or the medication text when the answer is yes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MorningMedications {
    pub taken: Option<bool>,
    pub detail: String,
}

impl MorningMedications {
    pub fn no() -> Self {
        Self {
            taken: Some(false),
            detail: String::new(),
        }
    }

    pub fn yes(detail: impl Into<String>) -> Self {
        Self {
            taken: Some(true),
            detail: detail.into(),
        }
    }

    /// Answered "no", or answered "yes" and named the medications.
    pub fn is_complete(&self) -> bool {
        match self.taken {
            Some(false) => true,
            Some(true) => !self.detail.trim().is_empty(),
            None => false,
        }
    }

    /// A "yes" detail that would read back as a bare answer from the column.
    pub fn has_reserved_detail(&self) -> bool {
        let detail = self.detail.trim();
        self.taken == Some(true)
            && (detail.eq_ignore_ascii_case("yes") || detail.eq_ignore_ascii_case("no"))
    }

    pub fn to_column(&self) -> String {
        match self.taken {
            None => String::new(),
            Some(false) => "no".to_string(),
            Some(true) if self.detail.trim().is_empty() => "yes".to_string(),
            Some(true) => self.detail.clone(),
        }
    }

    pub fn from_column(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::default()
        } else if trimmed.eq_ignore_ascii_case("no") {
            Self::no()
        } else if trimmed.eq_ignore_ascii_case("yes") {
            Self::yes("")
        } else {
            Self::yes(value)
        }
    }
}

/// A value recorded per dental arch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchValues {
    #[serde(default)]
    pub upper: String,
    #[serde(default)]
    pub lower: String,
}

impl ArchValues {
    pub fn get(&self, arch: Arch) -> &str {
        match arch {
            Arch::Upper => &self.upper,
            Arch::Lower => &self.lower,
        }
    }

    pub fn set(&mut self, arch: Arch, value: String) {
        match arch {
            Arch::Upper => self.upper = value,
            Arch::Lower => self.lower = value,
        }
    }
}

/// Flat, typed map of every form field to its current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRegistry {
    patient_name: String,
    patient_is_female: bool,
    treatment: ArchValues,
    surgery_type: ArchValues,
    texts: BTreeMap<TextField, String>,
    selections: BTreeMap<SelectGroup, Vec<String>>,
    other_texts: BTreeMap<SelectGroup, String>,
    morning_medications: MorningMedications,
    flow_entries: Vec<FlowEntry>,
}

impl FieldRegistry {
    /// Empty registry bound to a patient.
    pub fn for_patient(patient: &PatientContext) -> Self {
        Self {
            patient_name: patient.display_name().unwrap_or_default(),
            patient_is_female: patient.is_female(),
            ..Default::default()
        }
    }

    /// Patient display name, derived from the patient context.
    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn patient_is_female(&self) -> bool {
        self.patient_is_female
    }

    pub fn text(&self, field: TextField) -> &str {
        self.texts.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set_text(&mut self, field: TextField, value: String) {
        if value.is_empty() {
            self.texts.remove(&field);
        } else {
            self.texts.insert(field, value);
        }
    }

    pub fn arch(&self, field: ArchField, arch: Arch) -> &str {
        self.arch_values(field).get(arch)
    }

    pub fn arch_values(&self, field: ArchField) -> &ArchValues {
        match field {
            ArchField::Treatment => &self.treatment,
            ArchField::SurgeryType => &self.surgery_type,
        }
    }

    pub fn set_arch(&mut self, field: ArchField, arch: Arch, value: String) {
        match field {
            ArchField::Treatment => self.treatment.set(arch, value),
            ArchField::SurgeryType => self.surgery_type.set(arch, value),
        }
    }

    pub fn set_arch_values(&mut self, field: ArchField, values: ArchValues) {
        match field {
            ArchField::Treatment => self.treatment = values,
            ArchField::SurgeryType => self.surgery_type = values,
        }
    }

    pub fn selection(&self, group: SelectGroup) -> &[String] {
        self.selections.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_selected(&self, group: SelectGroup, option: &str) -> bool {
        self.selection(group).iter().any(|o| o == option)
    }

    pub fn set_selection(&mut self, group: SelectGroup, options: Vec<String>) {
        if options.is_empty() {
            self.selections.remove(&group);
        } else {
            self.selections.insert(group, options);
        }
    }

    pub fn other_text(&self, group: SelectGroup) -> &str {
        self.other_texts.get(&group).map(String::as_str).unwrap_or("")
    }

    pub fn set_other_text(&mut self, group: SelectGroup, value: String) {
        if value.is_empty() {
            self.other_texts.remove(&group);
        } else {
            self.other_texts.insert(group, value);
        }
    }

    pub fn morning_medications(&self) -> &MorningMedications {
        &self.morning_medications
    }

    pub fn set_morning_medications(&mut self, value: MorningMedications) {
        self.morning_medications = value;
    }

    pub fn flow_entries(&self) -> &[FlowEntry] {
        &self.flow_entries
    }

    pub fn set_flow_entries(&mut self, entries: Vec<FlowEntry>) {
        self.flow_entries = entries;
    }

    /// Whether the endocrine/renal history lists diabetes.
    pub fn is_diabetic(&self) -> bool {
        self.is_selected(SelectGroup::EndocrineRenalProblems, DIABETES_OPTION)
    }
}
