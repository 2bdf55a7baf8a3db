//! Sedation Chart Core Library
//!
//! Multi-step IV sedation flow chart with draft auto-save and conditional
//! validation.
//!
//! # Architecture
//!
//! ```text
//! user edit ──► FieldRegistry ──┬──► AutoSaver ──► RecordStore (create once, then update by id)
//!                               │        │
//!                               │        └──► save status / last saved / toasts
//!                               │
//!                               └──► Completion Checker (progress checkmarks)
//!
//! Next ──► Step Validator ──► StepNavigator ──► (last step) ReviewController
//!                                                      │
//!                                   review ──► submit (status = completed)
//! ```
//!
//! # Core Principle
//!
//! **Never claim data was saved when it wasn't.** A failed save leaves the
//! local values in place, keeps the last good save time, and marks the
//! fields for resending.
//!
//! # Modules
//!
//! - [`models`]: Field keys and options, FieldRegistry, FlowEntry, derived values
//! - [`form`]: Step Validator, Completion Checker, navigation, review, monitoring log
//! - [`gateway`]: Column mapping and the Draft Persistence Gateway
//! - [`store`]: Record store contract with SQLite and in-memory backends
//! - [`session`]: One open form wiring everything together

pub mod clock;
pub mod config;
pub mod form;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, FormConfig};
pub use form::{FieldEdit, FormError, FormResult, NavOutcome, ReviewPhase, ReviewSummary};
pub use gateway::{AutoSaver, SaveStatus};
pub use models::{
    FieldRegistry, FlowEntry, FormStatus, FormStep, MedicationCatalog, PatientContext,
};
pub use notify::{Notification, NotificationKind};
pub use session::{FormSession, RecordListing};
pub use store::{MemoryStore, RecordStore, SqliteStore, StoreError, StoredRecord};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use models::{Arch, Field, FlowEntryDraft, MorningMedications};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SedationChartError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<StoreError> for SedationChartError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => SedationChartError::NotFound(id),
            other => SedationChartError::StoreError(other.to_string()),
        }
    }
}

impl From<FormError> for SedationChartError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::Store(e) => e.into(),
            FormError::Json(e) => e.into(),
            FormError::EntryNotFound(id) => SedationChartError::NotFound(id),
            other @ (FormError::MissingDate | FormError::EntryIncomplete) => {
                SedationChartError::ValidationError(other.to_string())
            }
            other => SedationChartError::InvalidInput(other.to_string()),
        }
    }
}

impl From<ConfigError> for SedationChartError {
    fn from(e: ConfigError) -> Self {
        SedationChartError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for SedationChartError {
    fn from(e: serde_json::Error) -> Self {
        SedationChartError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SedationChartError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SedationChartError::StoreError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a flow chart for a patient, backed by the SQLite database at `db_path`.
///
/// With `resume_record_id`, the stored record is reopened and edits write
/// back to it; otherwise a fresh form starts and nothing is stored until the
/// first edit.
#[uniffi::export]
pub fn open_form(
    db_path: String,
    patient: FfiPatientContext,
    catalog_json: Option<String>,
    config_json: Option<String>,
    resume_record_id: Option<String>,
) -> Result<Arc<SedationForm>, SedationChartError> {
    let store = SqliteStore::open(&db_path)?;
    open_with_store(store, patient, catalog_json, config_json, resume_record_id)
}

/// Open a flow chart on an in-memory database (for testing).
#[uniffi::export]
pub fn open_form_in_memory(
    patient: FfiPatientContext,
    catalog_json: Option<String>,
) -> Result<Arc<SedationForm>, SedationChartError> {
    let store = SqliteStore::open_in_memory()?;
    open_with_store(store, patient, catalog_json, None, None)
}

fn open_with_store(
    store: SqliteStore,
    patient: FfiPatientContext,
    catalog_json: Option<String>,
    config_json: Option<String>,
    resume_record_id: Option<String>,
) -> Result<Arc<SedationForm>, SedationChartError> {
    let catalog = match catalog_json {
        Some(json) => MedicationCatalog::from_json(&json)?,
        None => MedicationCatalog::default(),
    };
    let config = match config_json {
        Some(json) => FormConfig::from_json(&json)?,
        None => FormConfig::default(),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let patient = patient.into();

    let session = match resume_record_id {
        Some(id) => FormSession::resume_by_id(store, patient, catalog, config, clock, &id)?,
        None => FormSession::new(store, patient, catalog, config, clock),
    };
    Ok(Arc::new(SedationForm {
        session: Mutex::new(session),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe form session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct SedationForm {
    session: Mutex<FormSession<SqliteStore>>,
}

#[uniffi::export]
impl SedationForm {
    // =========================================================================
    // Field Editing
    // =========================================================================

    /// Set a text, single-select or "Other" companion field by column key.
    pub fn set_text(&self, key: String, value: String) -> Result<(), SedationChartError> {
        let edit = match Field::from_key(&key) {
            Some(Field::Text(field)) => FieldEdit::Text(field, value),
            Some(Field::OtherText(group)) => FieldEdit::OtherText(group, value),
            _ => return Err(SedationChartError::InvalidInput(format!("not a text field: {key}"))),
        };
        let mut session = self.session.lock()?;
        session.edit(edit)?;
        Ok(())
    }

    /// Set a per-arch field (`treatment_type` or `surgery_type`); `arch` is "upper" or "lower".
    pub fn set_arch(
        &self,
        key: String,
        arch: String,
        value: String,
    ) -> Result<(), SedationChartError> {
        let Some(Field::Arch(field)) = Field::from_key(&key) else {
            return Err(SedationChartError::InvalidInput(format!("not a per-arch field: {key}")));
        };
        let arch = match arch.to_lowercase().as_str() {
            "upper" => Arch::Upper,
            "lower" => Arch::Lower,
            other => return Err(SedationChartError::InvalidInput(format!("unknown arch: {other}"))),
        };
        let mut session = self.session.lock()?;
        session.edit(FieldEdit::Arch(field, arch, value))?;
        Ok(())
    }

    /// Toggle an option of a multi-select group.
    pub fn toggle_option(&self, key: String, option: String) -> Result<(), SedationChartError> {
        let Some(Field::Select(group)) = Field::from_key(&key) else {
            return Err(SedationChartError::InvalidInput(format!("not a multi-select: {key}")));
        };
        let mut session = self.session.lock()?;
        session.edit(FieldEdit::Toggle(group, option))?;
        Ok(())
    }

    /// Whether an option can be chosen (disabled while its group's negating option is selected).
    pub fn is_option_enabled(&self, key: String, option: String) -> Result<bool, SedationChartError> {
        let Some(Field::Select(group)) = Field::from_key(&key) else {
            return Err(SedationChartError::InvalidInput(format!("not a multi-select: {key}")));
        };
        let session = self.session.lock()?;
        Ok(form::is_option_enabled(session.registry(), group, &option))
    }

    /// Answer the morning-medications question; `taken = None` clears the answer.
    pub fn set_morning_medications(
        &self,
        taken: Option<bool>,
        detail: String,
    ) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.edit(FieldEdit::MorningMedications(MorningMedications { taken, detail }))?;
        Ok(())
    }

    /// Current value of a field, as its stored JSON.
    pub fn field_json(&self, key: String) -> Result<String, SedationChartError> {
        let field = Field::from_key(&key)
            .ok_or_else(|| SedationChartError::InvalidInput(format!("unknown field: {key}")))?;
        let session = self.session.lock()?;
        Ok(serde_json::to_string(&gateway::column_value(session.registry(), field))?)
    }

    // =========================================================================
    // Monitoring Log
    // =========================================================================

    pub fn flow_entries(&self) -> Result<Vec<FfiFlowEntry>, SedationChartError> {
        let session = self.session.lock()?;
        Ok(session
            .registry()
            .flow_entries()
            .iter()
            .cloned()
            .map(|e| e.into())
            .collect())
    }

    /// Add an entry through the entry dialog; the time must be set.
    pub fn add_flow_entry(&self, entry: FfiFlowEntryInput) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.open_new_entry()?;
        *session.entry_buffer_mut()? = entry.into();
        let result = session.confirm_entry();
        session.cancel_entry();
        Ok(result?)
    }

    pub fn update_flow_entry(
        &self,
        id: String,
        entry: FfiFlowEntryInput,
    ) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.open_edit_entry(&id)?;
        *session.entry_buffer_mut()? = entry.into();
        let result = session.confirm_entry();
        session.cancel_entry();
        Ok(result?)
    }

    pub fn remove_flow_entry(&self, id: String) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.remove_entry(&id)?;
        Ok(())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn current_step(&self) -> Result<u8, SedationChartError> {
        let session = self.session.lock()?;
        Ok(session.current_step().number())
    }

    pub fn next(&self) -> Result<FfiNavOutcome, SedationChartError> {
        let mut session = self.session.lock()?;
        let outcome = session.next()?;
        Ok(FfiNavOutcome::new(outcome, session.current_step()))
    }

    pub fn previous(&self) -> Result<FfiNavOutcome, SedationChartError> {
        let mut session = self.session.lock()?;
        let outcome = session.previous()?;
        Ok(FfiNavOutcome::new(outcome, session.current_step()))
    }

    pub fn jump_to(&self, step: u8) -> Result<FfiNavOutcome, SedationChartError> {
        let mut session = self.session.lock()?;
        let outcome = session.jump_to(step)?;
        Ok(FfiNavOutcome::new(outcome, session.current_step()))
    }

    /// Completion flag per step, in step order.
    pub fn step_completion(&self) -> Result<Vec<bool>, SedationChartError> {
        let session = self.session.lock()?;
        Ok(session.step_completion().into_iter().map(|(_, done)| done).collect())
    }

    /// Labels of the missing required fields of a step.
    pub fn validate_step(&self, step: u8) -> Result<Vec<String>, SedationChartError> {
        let step = FormStep::from_number(step)
            .ok_or_else(|| SedationChartError::InvalidInput(format!("invalid step: {step}")))?;
        let session = self.session.lock()?;
        Ok(form::validate(session.registry(), step)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    // =========================================================================
    // Review and Submit
    // =========================================================================

    /// Open the read-only summary; returns it as JSON.
    pub fn review(&self) -> Result<String, SedationChartError> {
        let mut session = self.session.lock()?;
        Ok(session.review()?.to_json()?)
    }

    pub fn review_summary_json(&self) -> Result<String, SedationChartError> {
        let session = self.session.lock()?;
        Ok(session.review_summary().to_json()?)
    }

    pub fn edit_again(&self) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.edit_again()?;
        Ok(())
    }

    pub fn submit(&self) -> Result<FfiRecordListing, SedationChartError> {
        let mut session = self.session.lock()?;
        let stored = session.submit()?;
        Ok(RecordListing::from(&stored).into())
    }

    /// Close without submitting; the form starts over as a blank chart.
    pub fn close(&self) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.close();
        Ok(())
    }

    /// "editing", "reviewing" or "submitted".
    pub fn phase(&self) -> Result<String, SedationChartError> {
        let session = self.session.lock()?;
        Ok(session.phase().as_str().to_string())
    }

    // =========================================================================
    // Auto-save
    // =========================================================================

    /// Send debounced edits whose inactivity window has passed. Hosts call this on a timer.
    pub fn poll(&self) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.poll();
        Ok(())
    }

    pub fn retry_unsaved(&self) -> Result<(), SedationChartError> {
        let mut session = self.session.lock()?;
        session.retry_unsaved();
        Ok(())
    }

    pub fn save_status(&self) -> Result<FfiSaveStatus, SedationChartError> {
        let session = self.session.lock()?;
        Ok(FfiSaveStatus {
            status: session.save_status().as_str().to_string(),
            last_saved: session.last_saved_label(),
            has_unsaved_changes: session.has_unsaved_changes(),
            draft_id: session.draft_id().map(str::to_string),
        })
    }

    pub fn drain_notifications(&self) -> Result<Vec<FfiNotification>, SedationChartError> {
        let mut session = self.session.lock()?;
        Ok(session
            .drain_notifications()
            .into_iter()
            .map(|n| n.into())
            .collect())
    }

    // =========================================================================
    // Record Listing
    // =========================================================================

    /// The patient's flow charts, newest first, drafts included.
    pub fn load_records(&self) -> Result<Vec<FfiRecordListing>, SedationChartError> {
        let mut session = self.session.lock()?;
        Ok(session
            .load_records()?
            .into_iter()
            .map(|r| r.into())
            .collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient context.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientContext {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
}

impl From<FfiPatientContext> for PatientContext {
    fn from(p: FfiPatientContext) -> Self {
        PatientContext {
            id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
            gender: p.gender,
            date_of_birth: p.date_of_birth,
        }
    }
}

/// FFI-safe monitoring-log entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFlowEntry {
    pub id: String,
    pub time: String,
    pub bp: String,
    pub heart_rate: String,
    pub rr: String,
    pub spo2: String,
    pub medications: Vec<String>,
}

impl From<FlowEntry> for FfiFlowEntry {
    fn from(e: FlowEntry) -> Self {
        Self {
            id: e.id,
            time: e.time,
            bp: e.bp,
            heart_rate: e.heart_rate,
            rr: e.rr,
            spo2: e.spo2,
            medications: e.medications,
        }
    }
}

/// FFI-safe entry dialog contents.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFlowEntryInput {
    pub time: String,
    pub systolic: String,
    pub diastolic: String,
    pub heart_rate: String,
    pub respiratory_rate: String,
    pub spo2: String,
    pub medications: Vec<String>,
}

impl From<FfiFlowEntryInput> for FlowEntryDraft {
    fn from(e: FfiFlowEntryInput) -> Self {
        FlowEntryDraft {
            time: e.time,
            systolic: e.systolic,
            diastolic: e.diastolic,
            heart_rate: e.heart_rate,
            respiratory_rate: e.respiratory_rate,
            spo2: e.spo2,
            medications: e.medications,
        }
    }
}

/// FFI-safe navigation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNavOutcome {
    /// "moved", "blocked", "review" or "stayed"
    pub kind: String,
    pub step: u8,
    pub missing: Vec<String>,
}

impl FfiNavOutcome {
    fn new(outcome: NavOutcome, current: FormStep) -> Self {
        let (kind, missing) = match outcome {
            NavOutcome::Moved { .. } => ("moved", Vec::new()),
            NavOutcome::Blocked { missing } => {
                ("blocked", missing.into_iter().map(str::to_string).collect())
            }
            NavOutcome::ReadyForReview => ("review", Vec::new()),
            NavOutcome::Stayed => ("stayed", Vec::new()),
        };
        Self {
            kind: kind.to_string(),
            step: current.number(),
            missing,
        }
    }
}

/// FFI-safe save status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaveStatus {
    /// "idle", "saving", "saved" or "error"
    pub status: String,
    /// Local time of the last successful save (HH:MM:SS)
    pub last_saved: Option<String>,
    pub has_unsaved_changes: bool,
    pub draft_id: Option<String>,
}

/// FFI-safe toast.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub kind: String,
    pub text: String,
    pub duration_ms: u64,
}

impl From<Notification> for FfiNotification {
    fn from(n: Notification) -> Self {
        Self {
            kind: n.kind.as_str().to_string(),
            text: n.text,
            duration_ms: n.duration_ms,
        }
    }
}

/// FFI-safe record list row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordListing {
    pub id: String,
    pub date: String,
    pub status: String,
    pub is_draft: bool,
    pub updated_at: String,
}

impl From<RecordListing> for FfiRecordListing {
    fn from(r: RecordListing) -> Self {
        Self {
            id: r.id,
            date: r.date,
            status: r.status,
            is_draft: r.is_draft,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> FfiPatientContext {
        FfiPatientContext {
            id: "p-1".into(),
            first_name: "Ana".into(),
            last_name: "Lopez".into(),
            gender: Some("female".into()),
            date_of_birth: None,
        }
    }

    #[test]
    fn test_ffi_edit_and_status() {
        let form = open_form_in_memory(patient(), None).unwrap();
        form.set_text("weight".into(), "150".into()).unwrap();

        let status = form.save_status().unwrap();
        assert_eq!(status.status, "saved");
        assert!(status.draft_id.is_some());
        assert_eq!(form.field_json("weight".into()).unwrap(), "\"150\"");
    }

    #[test]
    fn test_ffi_rejects_wrong_field_kind() {
        let form = open_form_in_memory(patient(), None).unwrap();
        assert!(matches!(
            form.set_text("allergies".into(), "NKDA".into()),
            Err(SedationChartError::InvalidInput(_))
        ));
        assert!(matches!(
            form.toggle_option("weight".into(), "NKDA".into()),
            Err(SedationChartError::InvalidInput(_))
        ));
        assert!(matches!(
            form.set_arch("treatment_type".into(), "middle".into(), "NO TREATMENT".into()),
            Err(SedationChartError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ffi_negating_option_disables_others() {
        let form = open_form_in_memory(patient(), None).unwrap();
        form.toggle_option("allergies".into(), "NKDA".into()).unwrap();
        assert!(!form.is_option_enabled("allergies".into(), "Latex".into()).unwrap());
        assert!(form.is_option_enabled("allergies".into(), "NKDA".into()).unwrap());
    }

    #[test]
    fn test_ffi_flow_entry_requires_time() {
        let form = open_form_in_memory(patient(), None).unwrap();
        let mut input = FfiFlowEntryInput {
            time: String::new(),
            systolic: "120".into(),
            diastolic: "80".into(),
            heart_rate: String::new(),
            respiratory_rate: String::new(),
            spo2: String::new(),
            medications: vec![],
        };
        assert!(matches!(
            form.add_flow_entry(input.clone()),
            Err(SedationChartError::ValidationError(_))
        ));

        input.time = "14:30".into();
        form.add_flow_entry(input).unwrap();
        let entries = form.flow_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bp, "120/80");
    }

    #[test]
    fn test_ffi_navigation_blocked() {
        let form = open_form_in_memory(patient(), None).unwrap();
        let outcome = form.next().unwrap();
        assert_eq!(outcome.kind, "blocked");
        assert_eq!(outcome.step, 1);
        assert!(outcome.missing.contains(&"Weight".to_string()));

        let jumped = form.jump_to(4).unwrap();
        assert_eq!(jumped.kind, "moved");
        assert_eq!(form.current_step().unwrap(), 4);
        assert!(matches!(form.jump_to(9), Err(SedationChartError::InvalidInput(_))));
    }
}
