//! Field keys, option tables and value formats for the IV sedation flow chart.
//!
//! Every key doubles as the external column name used by the persistence
//! mapping, so renaming a variant's key is a schema change.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Treatment value meaning the arch receives no work.
pub const NO_TREATMENT: &str = "NO TREATMENT";

/// Literal option that activates a group's free-text companion.
pub const OTHER_OPTION: &str = "Other";

/// Endocrine/renal option that makes the A1C level required.
pub const DIABETES_OPTION: &str = "Diabetes";

pub const TREATMENT_OPTIONS: &[&str] = &[
    NO_TREATMENT,
    "FULL ARCH FIXED",
    "FULL ARCH REMOVABLE",
    "SINGLE IMPLANT",
    "MULTIPLE IMPLANTS",
    "EXTRACTIONS",
    "BONE GRAFTING",
];

const YES_NO: &[&str] = &["Yes", "No"];

const NPO_OPTIONS: &[&str] = &[
    "NPO since midnight",
    "NPO 6+ hours",
    "NPO less than 6 hours",
    "Not NPO",
];

const ASA_OPTIONS: &[&str] = &["ASA I", "ASA II", "ASA III", "ASA IV"];

const MALLAMPATI_OPTIONS: &[&str] = &["Class I", "Class II", "Class III", "Class IV"];

const PREGNANCY_OPTIONS: &[&str] = &["Not pregnant", "Pregnant", "Possibly pregnant"];

const SEDATION_TYPE_OPTIONS: &[&str] = &[
    "IV Sedation",
    "IV Sedation with Nitrous Oxide",
    "Oral Sedation",
    "Nitrous Oxide",
];

pub const LEVEL_OF_SEDATION_OPTIONS: &[&str] = &["Minimal", "Moderate", "Deep", "General Anesthesia"];

const ALLERGY_OPTIONS: &[&str] = &[
    "NKDA",
    "Penicillin",
    "Sulfa",
    "Codeine",
    "Latex",
    "Local Anesthetics",
    "Iodine",
    OTHER_OPTION,
];

const RESPIRATORY_OPTIONS: &[&str] = &[
    "No known respiratory problems",
    "Asthma",
    "COPD",
    "Sleep Apnea",
    "Recent URI",
    OTHER_OPTION,
];

const CARDIOVASCULAR_OPTIONS: &[&str] = &[
    "No known cardiovascular problems",
    "Hypertension",
    "Heart Murmur",
    "Arrhythmia",
    "Prior MI",
    "Angina",
    "CHF",
    "Pacemaker",
    OTHER_OPTION,
];

const GASTROINTESTINAL_OPTIONS: &[&str] = &[
    "No known gastrointestinal problems",
    "GERD",
    "Ulcers",
    "Hepatitis",
    "Liver Disease",
    OTHER_OPTION,
];

const NEUROLOGIC_OPTIONS: &[&str] = &[
    "No known neurologic problems",
    "Seizures",
    "Stroke",
    "Syncope",
    OTHER_OPTION,
];

const ENDOCRINE_RENAL_OPTIONS: &[&str] = &[
    "No known endocrine/renal problems",
    DIABETES_OPTION,
    "Thyroid Disease",
    "Kidney Disease",
    "Adrenal Insufficiency",
    OTHER_OPTION,
];

const MISCELLANEOUS_OPTIONS: &[&str] = &[
    "None",
    "Anemia",
    "Bleeding Disorder",
    "Bisphosphonate Use",
    "Anticoagulant Therapy",
    OTHER_OPTION,
];

const SOCIAL_HISTORY_OPTIONS: &[&str] = &[
    "None",
    "Tobacco",
    "Alcohol",
    "Recreational Drugs",
    OTHER_OPTION,
];

const AIRWAY_OPTIONS: &[&str] = &[
    "Normal",
    "Limited Neck Extension",
    "Limited Mouth Opening",
    "Short Thick Neck",
    "Facial Hair",
    OTHER_OPTION,
];

const HEART_LUNG_OPTIONS: &[&str] = &[
    "Heart RRR",
    "Lungs Clear",
    "Murmur",
    "Wheezing",
    "Diminished Breath Sounds",
    OTHER_OPTION,
];

const MEDICATIONS_PLANNED_OPTIONS: &[&str] = &[
    "Midazolam",
    "Fentanyl",
    "Propofol",
    "Ketamine",
    "Dexmedetomidine",
    "Dexamethasone",
    "Ondansetron",
    OTHER_OPTION,
];

const ADMINISTRATION_ROUTE_OPTIONS: &[&str] = &["IV", "IM", "PO", "Intranasal", "Inhalation"];

const INSTRUMENT_OPTIONS: &[&str] = &[
    "pulse_oximeter",
    "bp_monitor",
    "capnography",
    "ecg_monitor",
    "oxygen_supply",
    "suction",
    "bag_valve_mask",
    "airway_adjuncts",
];

const EMERGENCY_PROTOCOL_OPTIONS: &[&str] = &[
    "reversal_agents_available",
    "aed_available",
    "emergency_drug_kit",
    "ems_protocol_posted",
    "staff_bls_certified",
];

/// One page of the flow chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormStep {
    BasicInfo = 1,
    PreAssessment = 2,
    SedationPlan = 3,
    FlowMonitoring = 4,
    Recovery = 5,
}

impl FormStep {
    pub const ALL: [FormStep; 5] = [
        FormStep::BasicInfo,
        FormStep::PreAssessment,
        FormStep::SedationPlan,
        FormStep::FlowMonitoring,
        FormStep::Recovery,
    ];

    pub const FIRST: FormStep = FormStep::BasicInfo;
    pub const LAST: FormStep = FormStep::Recovery;

    /// 1-based step number.
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.number() == number)
    }

    pub fn title(self) -> &'static str {
        match self {
            FormStep::BasicInfo => "Basic Info",
            FormStep::PreAssessment => "Pre-Assessment",
            FormStep::SedationPlan => "Sedation Plan",
            FormStep::FlowMonitoring => "Flow/Monitoring",
            FormStep::Recovery => "Recovery",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }
}

/// Accepted format of a single-valued field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// ISO date, YYYY-MM-DD
    Date,
    /// 24-hour HH:MM
    Time,
    /// Whole number within an inclusive range
    Integer { min: u32, max: u32 },
    /// One of a fixed list
    Choice(&'static [&'static str]),
    /// Any non-blank text
    Text,
}

impl ValueFormat {
    /// Whether `value` is present and well-formed for this format.
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        match self {
            ValueFormat::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            ValueFormat::Time => parse_clock_time(value).is_some(),
            ValueFormat::Integer { min, max } => value
                .parse::<u32>()
                .map(|n| n >= *min && n <= *max)
                .unwrap_or(false),
            ValueFormat::Choice(options) => options.contains(&value),
            ValueFormat::Text => true,
        }
    }
}

/// Parse a 24-hour "HH:MM" time of day.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Single-valued fields (free text, numbers, dates, times and single selects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextField {
    // Step 1
    Date,
    HeightFeet,
    HeightInches,
    Weight,
    // Step 2
    NpoStatus,
    LastA1cLevel,
    PregnancyStatus,
    LastMenstrualPeriod,
    WellDevelopedNourished,
    PatientAnxious,
    AsaClassification,
    MallampatiScore,
    // Step 3
    SedationType,
    // Step 4
    TimeInRoom,
    SedationStartTime,
    SedationEndTime,
    OutOfRoomTime,
    LevelOfSedation,
    // Step 5
    AlertAndOriented,
    ProtectiveReflexesIntact,
    VitalSignsStable,
    Ambulatory,
    EscortPresent,
    DischargedTo,
    DischargeInstructions,
    PainScore,
    RecoveryRemarks,
}

impl TextField {
    pub const ALL: [TextField; 27] = [
        TextField::Date,
        TextField::HeightFeet,
        TextField::HeightInches,
        TextField::Weight,
        TextField::NpoStatus,
        TextField::LastA1cLevel,
        TextField::PregnancyStatus,
        TextField::LastMenstrualPeriod,
        TextField::WellDevelopedNourished,
        TextField::PatientAnxious,
        TextField::AsaClassification,
        TextField::MallampatiScore,
        TextField::SedationType,
        TextField::TimeInRoom,
        TextField::SedationStartTime,
        TextField::SedationEndTime,
        TextField::OutOfRoomTime,
        TextField::LevelOfSedation,
        TextField::AlertAndOriented,
        TextField::ProtectiveReflexesIntact,
        TextField::VitalSignsStable,
        TextField::Ambulatory,
        TextField::EscortPresent,
        TextField::DischargedTo,
        TextField::DischargeInstructions,
        TextField::PainScore,
        TextField::RecoveryRemarks,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TextField::Date => "date",
            TextField::HeightFeet => "height_feet",
            TextField::HeightInches => "height_inches",
            TextField::Weight => "weight",
            TextField::NpoStatus => "npo_status",
            TextField::LastA1cLevel => "last_a1c_level",
            TextField::PregnancyStatus => "pregnancy_status",
            TextField::LastMenstrualPeriod => "last_menstrual_period",
            TextField::WellDevelopedNourished => "well_developed_nourished",
            TextField::PatientAnxious => "patient_anxious",
            TextField::AsaClassification => "asa_classification",
            TextField::MallampatiScore => "mallampati_score",
            TextField::SedationType => "sedation_type",
            TextField::TimeInRoom => "time_in_room",
            TextField::SedationStartTime => "sedation_start_time",
            TextField::SedationEndTime => "sedation_end_time",
            TextField::OutOfRoomTime => "out_of_room_time",
            TextField::LevelOfSedation => "level_of_sedation",
            TextField::AlertAndOriented => "alert_and_oriented",
            TextField::ProtectiveReflexesIntact => "protective_reflexes_intact",
            TextField::VitalSignsStable => "vital_signs_stable",
            TextField::Ambulatory => "ambulatory",
            TextField::EscortPresent => "escort_present",
            TextField::DischargedTo => "discharged_to",
            TextField::DischargeInstructions => "discharge_instructions",
            TextField::PainScore => "pain_score",
            TextField::RecoveryRemarks => "recovery_remarks",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextField::Date => "Date",
            TextField::HeightFeet => "Height (feet)",
            TextField::HeightInches => "Height (inches)",
            TextField::Weight => "Weight",
            TextField::NpoStatus => "NPO Status",
            TextField::LastA1cLevel => "Last A1C Level",
            TextField::PregnancyStatus => "Pregnancy Status",
            TextField::LastMenstrualPeriod => "Last Menstrual Period",
            TextField::WellDevelopedNourished => "Well Developed/Nourished",
            TextField::PatientAnxious => "Patient Anxious",
            TextField::AsaClassification => "ASA Classification",
            TextField::MallampatiScore => "Mallampati Score",
            TextField::SedationType => "Sedation Type",
            TextField::TimeInRoom => "Time In Room",
            TextField::SedationStartTime => "Sedation Start Time",
            TextField::SedationEndTime => "Sedation End Time",
            TextField::OutOfRoomTime => "Out of Room Time",
            TextField::LevelOfSedation => "Level of Sedation",
            TextField::AlertAndOriented => "Alert and Oriented",
            TextField::ProtectiveReflexesIntact => "Protective Reflexes Intact",
            TextField::VitalSignsStable => "Vital Signs Stable",
            TextField::Ambulatory => "Ambulatory",
            TextField::EscortPresent => "Escort Present",
            TextField::DischargedTo => "Discharged To",
            TextField::DischargeInstructions => "Discharge Instructions",
            TextField::PainScore => "Pain Score",
            TextField::RecoveryRemarks => "Remarks",
        }
    }

    pub fn step(self) -> FormStep {
        use TextField::*;
        match self {
            Date | HeightFeet | HeightInches | Weight => FormStep::BasicInfo,
            NpoStatus | LastA1cLevel | PregnancyStatus | LastMenstrualPeriod
            | WellDevelopedNourished | PatientAnxious | AsaClassification | MallampatiScore => {
                FormStep::PreAssessment
            }
            SedationType => FormStep::SedationPlan,
            TimeInRoom | SedationStartTime | SedationEndTime | OutOfRoomTime | LevelOfSedation => {
                FormStep::FlowMonitoring
            }
            AlertAndOriented | ProtectiveReflexesIntact | VitalSignsStable | Ambulatory
            | EscortPresent | DischargedTo | DischargeInstructions | PainScore
            | RecoveryRemarks => FormStep::Recovery,
        }
    }

    pub fn format(self) -> ValueFormat {
        use TextField::*;
        match self {
            Date | LastMenstrualPeriod => ValueFormat::Date,
            HeightFeet => ValueFormat::Integer { min: 4, max: 8 },
            HeightInches => ValueFormat::Integer { min: 0, max: 11 },
            Weight => ValueFormat::Integer { min: 1, max: 1500 },
            PainScore => ValueFormat::Integer { min: 0, max: 10 },
            TimeInRoom | SedationStartTime | SedationEndTime | OutOfRoomTime => ValueFormat::Time,
            NpoStatus => ValueFormat::Choice(NPO_OPTIONS),
            PregnancyStatus => ValueFormat::Choice(PREGNANCY_OPTIONS),
            AsaClassification => ValueFormat::Choice(ASA_OPTIONS),
            MallampatiScore => ValueFormat::Choice(MALLAMPATI_OPTIONS),
            SedationType => ValueFormat::Choice(SEDATION_TYPE_OPTIONS),
            LevelOfSedation => ValueFormat::Choice(LEVEL_OF_SEDATION_OPTIONS),
            WellDevelopedNourished | PatientAnxious | AlertAndOriented
            | ProtectiveReflexesIntact | VitalSignsStable | Ambulatory | EscortPresent => {
                ValueFormat::Choice(YES_NO)
            }
            LastA1cLevel | DischargedTo | DischargeInstructions | RecoveryRemarks => {
                ValueFormat::Text
            }
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

/// Multi-select option groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SelectGroup {
    // Step 2
    Allergies,
    RespiratoryProblems,
    CardiovascularProblems,
    GastrointestinalProblems,
    NeurologicProblems,
    EndocrineRenalProblems,
    Miscellaneous,
    SocialHistory,
    AirwayEvaluation,
    HeartLungEvaluation,
    // Step 3
    MedicationsPlanned,
    AdministrationRoute,
    InstrumentsChecklist,
    EmergencyProtocols,
}

impl SelectGroup {
    pub const ALL: [SelectGroup; 14] = [
        SelectGroup::Allergies,
        SelectGroup::RespiratoryProblems,
        SelectGroup::CardiovascularProblems,
        SelectGroup::GastrointestinalProblems,
        SelectGroup::NeurologicProblems,
        SelectGroup::EndocrineRenalProblems,
        SelectGroup::Miscellaneous,
        SelectGroup::SocialHistory,
        SelectGroup::AirwayEvaluation,
        SelectGroup::HeartLungEvaluation,
        SelectGroup::MedicationsPlanned,
        SelectGroup::AdministrationRoute,
        SelectGroup::InstrumentsChecklist,
        SelectGroup::EmergencyProtocols,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SelectGroup::Allergies => "allergies",
            SelectGroup::RespiratoryProblems => "respiratory_problems",
            SelectGroup::CardiovascularProblems => "cardiovascular_problems",
            SelectGroup::GastrointestinalProblems => "gastrointestinal_problems",
            SelectGroup::NeurologicProblems => "neurologic_problems",
            SelectGroup::EndocrineRenalProblems => "endocrine_renal_problems",
            SelectGroup::Miscellaneous => "miscellaneous",
            SelectGroup::SocialHistory => "social_history",
            SelectGroup::AirwayEvaluation => "airway_evaluation",
            SelectGroup::HeartLungEvaluation => "heart_lung_evaluation",
            SelectGroup::MedicationsPlanned => "medications_planned",
            SelectGroup::AdministrationRoute => "administration_route",
            SelectGroup::InstrumentsChecklist => "instruments_checklist",
            SelectGroup::EmergencyProtocols => "emergency_protocols",
        }
    }

    /// Column of the free-text "Other" companion, for groups that offer one.
    pub fn other_key(self) -> Option<&'static str> {
        match self {
            SelectGroup::Allergies => Some("allergies_other"),
            SelectGroup::RespiratoryProblems => Some("respiratory_problems_other"),
            SelectGroup::CardiovascularProblems => Some("cardiovascular_problems_other"),
            SelectGroup::GastrointestinalProblems => Some("gastrointestinal_problems_other"),
            SelectGroup::NeurologicProblems => Some("neurologic_problems_other"),
            SelectGroup::EndocrineRenalProblems => Some("endocrine_renal_problems_other"),
            SelectGroup::Miscellaneous => Some("miscellaneous_other"),
            SelectGroup::SocialHistory => Some("social_history_other"),
            SelectGroup::AirwayEvaluation => Some("airway_evaluation_other"),
            SelectGroup::HeartLungEvaluation => Some("heart_lung_evaluation_other"),
            SelectGroup::MedicationsPlanned => Some("medications_planned_other"),
            SelectGroup::AdministrationRoute
            | SelectGroup::InstrumentsChecklist
            | SelectGroup::EmergencyProtocols => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SelectGroup::Allergies => "Allergies",
            SelectGroup::RespiratoryProblems => "Respiratory Problems",
            SelectGroup::CardiovascularProblems => "Cardiovascular Problems",
            SelectGroup::GastrointestinalProblems => "Gastrointestinal Problems",
            SelectGroup::NeurologicProblems => "Neurologic Problems",
            SelectGroup::EndocrineRenalProblems => "Endocrine/Renal Problems",
            SelectGroup::Miscellaneous => "Miscellaneous",
            SelectGroup::SocialHistory => "Social History",
            SelectGroup::AirwayEvaluation => "Airway Evaluation",
            SelectGroup::HeartLungEvaluation => "Heart/Lung Evaluation",
            SelectGroup::MedicationsPlanned => "Medications Planned",
            SelectGroup::AdministrationRoute => "Administration Route",
            SelectGroup::InstrumentsChecklist => "Instruments Checklist",
            SelectGroup::EmergencyProtocols => "Emergency Protocols",
        }
    }

    pub fn step(self) -> FormStep {
        match self {
            SelectGroup::MedicationsPlanned
            | SelectGroup::AdministrationRoute
            | SelectGroup::InstrumentsChecklist
            | SelectGroup::EmergencyProtocols => FormStep::SedationPlan,
            _ => FormStep::PreAssessment,
        }
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            SelectGroup::Allergies => ALLERGY_OPTIONS,
            SelectGroup::RespiratoryProblems => RESPIRATORY_OPTIONS,
            SelectGroup::CardiovascularProblems => CARDIOVASCULAR_OPTIONS,
            SelectGroup::GastrointestinalProblems => GASTROINTESTINAL_OPTIONS,
            SelectGroup::NeurologicProblems => NEUROLOGIC_OPTIONS,
            SelectGroup::EndocrineRenalProblems => ENDOCRINE_RENAL_OPTIONS,
            SelectGroup::Miscellaneous => MISCELLANEOUS_OPTIONS,
            SelectGroup::SocialHistory => SOCIAL_HISTORY_OPTIONS,
            SelectGroup::AirwayEvaluation => AIRWAY_OPTIONS,
            SelectGroup::HeartLungEvaluation => HEART_LUNG_OPTIONS,
            SelectGroup::MedicationsPlanned => MEDICATIONS_PLANNED_OPTIONS,
            SelectGroup::AdministrationRoute => ADMINISTRATION_ROUTE_OPTIONS,
            SelectGroup::InstrumentsChecklist => INSTRUMENT_OPTIONS,
            SelectGroup::EmergencyProtocols => EMERGENCY_PROTOCOL_OPTIONS,
        }
    }

    /// The option that excludes every other choice in the group.
    pub fn negating_option(self) -> Option<&'static str> {
        match self {
            SelectGroup::Allergies
            | SelectGroup::RespiratoryProblems
            | SelectGroup::CardiovascularProblems
            | SelectGroup::GastrointestinalProblems
            | SelectGroup::NeurologicProblems
            | SelectGroup::EndocrineRenalProblems
            | SelectGroup::Miscellaneous
            | SelectGroup::SocialHistory => Some(self.options()[0]),
            _ => None,
        }
    }

    pub fn has_other(self) -> bool {
        self.other_key().is_some()
    }

    pub fn accepts(self, option: &str) -> bool {
        self.options().contains(&option)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.key() == key)
    }

    /// Find the group whose "Other" companion is stored under `key`.
    pub fn from_other_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.other_key() == Some(key))
    }
}

/// Dental arch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Upper,
    Lower,
}

impl Arch {
    pub const ALL: [Arch; 2] = [Arch::Upper, Arch::Lower];

    pub fn label(self) -> &'static str {
        match self {
            Arch::Upper => "Upper",
            Arch::Lower => "Lower",
        }
    }
}

/// Fields recorded independently for the upper and lower arch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArchField {
    Treatment,
    SurgeryType,
}

impl ArchField {
    pub const ALL: [ArchField; 2] = [ArchField::Treatment, ArchField::SurgeryType];

    pub fn key(self) -> &'static str {
        match self {
            ArchField::Treatment => "treatment_type",
            ArchField::SurgeryType => "surgery_type",
        }
    }

    pub fn label(self, arch: Arch) -> &'static str {
        match (self, arch) {
            (ArchField::Treatment, Arch::Upper) => "Upper Treatment",
            (ArchField::Treatment, Arch::Lower) => "Lower Treatment",
            (ArchField::SurgeryType, Arch::Upper) => "Upper Surgery Type",
            (ArchField::SurgeryType, Arch::Lower) => "Lower Surgery Type",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

/// Any persisted field of the registry, as tracked by the auto-save gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Text(TextField),
    Select(SelectGroup),
    OtherText(SelectGroup),
    Arch(ArchField),
    MorningMedications,
    FlowEntries,
}

impl Field {
    pub const MORNING_MEDICATIONS_KEY: &'static str = "morning_medications";
    pub const FLOW_ENTRIES_KEY: &'static str = "flow_entries";

    /// External column name, or `None` for an "Other" companion the group does not have.
    pub fn key(self) -> Option<&'static str> {
        match self {
            Field::Text(f) => Some(f.key()),
            Field::Select(g) => Some(g.key()),
            Field::OtherText(g) => g.other_key(),
            Field::Arch(f) => Some(f.key()),
            Field::MorningMedications => Some(Self::MORNING_MEDICATIONS_KEY),
            Field::FlowEntries => Some(Self::FLOW_ENTRIES_KEY),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(f) = TextField::from_key(key) {
            return Some(Field::Text(f));
        }
        if let Some(g) = SelectGroup::from_key(key) {
            return Some(Field::Select(g));
        }
        if let Some(g) = SelectGroup::from_other_key(key) {
            return Some(Field::OtherText(g));
        }
        if let Some(f) = ArchField::from_key(key) {
            return Some(Field::Arch(f));
        }
        match key {
            Self::MORNING_MEDICATIONS_KEY => Some(Field::MorningMedications),
            Self::FLOW_ENTRIES_KEY => Some(Field::FlowEntries),
            _ => None,
        }
    }

    /// Every persisted field, in form order.
    pub fn all() -> Vec<Field> {
        let mut fields: Vec<Field> = ArchField::ALL.iter().map(|f| Field::Arch(*f)).collect();
        fields.extend(TextField::ALL.iter().map(|f| Field::Text(*f)));
        fields.push(Field::MorningMedications);
        for group in SelectGroup::ALL {
            fields.push(Field::Select(group));
            if group.has_other() {
                fields.push(Field::OtherText(group));
            }
        }
        fields.push(Field::FlowEntries);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_step_numbering() {
        assert_eq!(FormStep::from_number(1), Some(FormStep::BasicInfo));
        assert_eq!(FormStep::from_number(5), Some(FormStep::Recovery));
        assert_eq!(FormStep::from_number(0), None);
        assert_eq!(FormStep::from_number(6), None);
        assert_eq!(FormStep::BasicInfo.previous(), None);
        assert_eq!(FormStep::Recovery.next(), None);
        assert_eq!(FormStep::SedationPlan.next(), Some(FormStep::FlowMonitoring));
    }

    #[test]
    fn test_value_formats() {
        assert!(ValueFormat::Date.accepts("2025-03-01"));
        assert!(!ValueFormat::Date.accepts("03/01/2025"));
        assert!(ValueFormat::Time.accepts("14:30"));
        assert!(!ValueFormat::Time.accepts("25:00"));
        assert!(!ValueFormat::Time.accepts(""));

        let feet = TextField::HeightFeet.format();
        assert!(feet.accepts("5"));
        assert!(!feet.accepts("3"));
        assert!(!feet.accepts("9"));
        assert!(!feet.accepts("five"));

        assert!(TextField::HeightInches.format().accepts("0"));
        assert!(!TextField::HeightInches.format().accepts("12"));
        assert!(TextField::PainScore.format().accepts("10"));
        assert!(!TextField::PainScore.format().accepts("11"));

        assert!(TextField::LevelOfSedation.format().accepts("Deep"));
        assert!(!TextField::LevelOfSedation.format().accepts("Very Deep"));
        assert!(TextField::DischargedTo.format().accepts("Home"));
        assert!(!TextField::DischargedTo.format().accepts("   "));
    }

    #[test]
    fn test_keys_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for field in Field::all() {
            let key = field.key().unwrap();
            assert!(seen.insert(key), "duplicate key {}", key);
            assert_eq!(Field::from_key(key), Some(field));
        }
        assert_eq!(Field::from_key("not_a_field"), None);
    }

    #[test]
    fn test_negating_options_belong_to_group() {
        for group in SelectGroup::ALL {
            if let Some(negating) = group.negating_option() {
                assert!(group.accepts(negating));
                assert_ne!(negating, OTHER_OPTION);
            }
            assert_eq!(group.has_other(), group.accepts(OTHER_OPTION));
        }
        assert_eq!(SelectGroup::Allergies.negating_option(), Some("NKDA"));
        assert_eq!(SelectGroup::AdministrationRoute.negating_option(), None);
    }
}
