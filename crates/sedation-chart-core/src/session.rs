//! Form session: one open IV sedation flow chart.
//!
//! Wires the field registry, navigator, review controller, monitoring editor
//! and auto-saver to a [`RecordStore`]. Store failures never escape as
//! errors from editing or navigation; they are logged, turned into a toast
//! and reflected in the save status.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::FormConfig;
use crate::form::{
    apply_edit, missing_fields_message, remove_entry, step_completion, validate, EditorCommit,
    FieldEdit, FormError, FormResult, MonitoringEditor, NavOutcome, ReviewController,
    ReviewPhase, ReviewSummary, StepNavigator,
};
use crate::gateway::{all_columns, registry_from_record, AutoSaver, RecordHeader, SaveOutcome, SaveStatus, SaveTicket, SaveOp};
use crate::models::{
    Field, FieldRegistry, FlowEntry, FlowEntryDraft, FormStatus, FormStep, MedicationCatalog,
    PatientContext, TextField, PATIENT_ID_COLUMN, STATUS_COLUMN,
};
use crate::notify::{Notification, Notifications};
use crate::store::{RecordFilter, RecordStore, StoreError, StoredRecord};

const SAVE_FAILED: &str = "Failed to save draft";
const SAVED_AS_DRAFT: &str = "Flow chart saved as draft";
const SUBMITTED: &str = "IV sedation flow chart submitted";

/// One row of the patient's flow-chart list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordListing {
    pub id: String,
    pub date: String,
    pub status: String,
    pub is_draft: bool,
    pub updated_at: String,
}

impl From<&StoredRecord> for RecordListing {
    fn from(record: &StoredRecord) -> Self {
        let status = record.get_str(STATUS_COLUMN).unwrap_or_default().to_string();
        Self {
            id: record.id.clone(),
            date: record
                .get_str(TextField::Date.key())
                .unwrap_or_default()
                .to_string(),
            is_draft: FormStatus::parse(&status) != Some(FormStatus::Completed),
            status,
            updated_at: record.updated_at.clone(),
        }
    }
}

/// One open form.
pub struct FormSession<S: RecordStore> {
    store: S,
    clock: Arc<dyn Clock>,
    config: FormConfig,
    patient: PatientContext,
    catalog: MedicationCatalog,
    registry: FieldRegistry,
    navigator: StepNavigator,
    review: ReviewController,
    editor: MonitoringEditor,
    saver: AutoSaver,
    notifications: Notifications,
    /// Edits waiting for the debounce window to pass.
    pending: BTreeSet<Field>,
    last_edit_at: Option<NaiveDateTime>,
}

impl<S: RecordStore> FormSession<S> {
    /// Open an empty form for `patient`. Nothing is stored until the first edit.
    pub fn new(
        store: S,
        patient: PatientContext,
        catalog: MedicationCatalog,
        config: FormConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let header = RecordHeader::for_patient(&patient, |id| config.placeholder_name(id));
        let saver = AutoSaver::new(header, config.save_error_display());
        Self {
            registry: FieldRegistry::for_patient(&patient),
            notifications: Notifications::new(&config),
            store,
            clock,
            config,
            patient,
            catalog,
            navigator: StepNavigator::new(),
            review: ReviewController::new(),
            editor: MonitoringEditor::new(),
            saver,
            pending: BTreeSet::new(),
            last_edit_at: None,
        }
    }

    /// Reopen a stored flow chart; edits and submit write back to the same record.
    pub fn resume(
        store: S,
        patient: PatientContext,
        catalog: MedicationCatalog,
        config: FormConfig,
        clock: Arc<dyn Clock>,
        record: &StoredRecord,
    ) -> FormResult<Self> {
        if record.get_str(PATIENT_ID_COLUMN) != Some(patient.id.as_str()) {
            return Err(FormError::Store(StoreError::NotFound(format!(
                "{} for patient {}",
                record.id, patient.id
            ))));
        }
        let mut session = Self::new(store, patient, catalog, config, clock);
        session.registry = registry_from_record(&session.patient, record);
        session.saver.resume(record.id.clone());
        info!(record_id = %record.id, "Resumed flow chart");
        Ok(session)
    }

    /// Look up one of the patient's records by id and reopen it.
    pub fn resume_by_id(
        store: S,
        patient: PatientContext,
        catalog: MedicationCatalog,
        config: FormConfig,
        clock: Arc<dyn Clock>,
        record_id: &str,
    ) -> FormResult<Self> {
        let filter = RecordFilter::new().eq(PATIENT_ID_COLUMN, patient.id.as_str());
        let record = store
            .query(config.table(), &filter)?
            .into_iter()
            .find(|r| r.id == record_id)
            .ok_or_else(|| StoreError::NotFound(record_id.to_string()))?;
        Self::resume(store, patient, catalog, config, clock, &record)
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn patient(&self) -> &PatientContext {
        &self.patient
    }

    pub fn catalog(&self) -> &MedicationCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_step(&self) -> FormStep {
        self.navigator.current()
    }

    pub fn phase(&self) -> ReviewPhase {
        self.review.phase()
    }

    pub fn draft_id(&self) -> Option<&str> {
        self.saver.draft_id()
    }

    // Editing

    /// Apply one user edit and save the fields it changed.
    pub fn edit(&mut self, edit: FieldEdit) -> FormResult<()> {
        self.ensure_editing("edit")?;
        let changed = apply_edit(&mut self.registry, edit)?;
        self.record_change(changed);
        Ok(())
    }

    fn ensure_editing(&self, action: &'static str) -> FormResult<()> {
        match self.review.phase() {
            ReviewPhase::Editing => Ok(()),
            phase => Err(FormError::InvalidTransition {
                action,
                phase: phase.as_str(),
            }),
        }
    }

    fn record_change<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        let debounce = self.config.autosave_debounce();
        if debounce.is_zero() {
            self.save(fields);
        } else {
            self.pending.extend(fields);
            self.last_edit_at = Some(self.clock.now());
        }
    }

    /// Send debounced edits once the inactivity window has passed.
    pub fn poll(&mut self) {
        let Some(last_edit) = self.last_edit_at else {
            return;
        };
        if self.clock.now() - last_edit >= self.config.autosave_debounce() {
            self.flush();
        }
    }

    /// Send debounced edits now.
    pub fn flush(&mut self) {
        self.last_edit_at = None;
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            self.save(pending);
        }
    }

    /// Resend every field the store has not confirmed.
    pub fn retry_unsaved(&mut self) {
        self.flush();
        self.save([]);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.pending.is_empty() || self.saver.has_unsaved_changes()
    }

    fn save<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        let mut ticket = self.saver.begin(&self.registry, fields, self.clock.now());
        while let Some(SaveTicket { seq, op, payload }) = ticket.take() {
            let table = self.config.table();
            let result = match &op {
                SaveOp::Create => self.store.create(table, payload),
                SaveOp::Update(id) => self.store.update(table, id, payload),
            };
            match self.saver.complete(seq, result, self.clock.now()) {
                SaveOutcome::Failed { stale: false } => self.notifications.error(SAVE_FAILED),
                SaveOutcome::Saved { .. } if self.saver.has_deferred() => {
                    ticket = self.saver.begin(&self.registry, [], self.clock.now());
                }
                _ => {}
            }
        }
    }

    /// Save status as shown now.
    pub fn save_status(&self) -> SaveStatus {
        self.saver.status(self.clock.now())
    }

    /// Last successful save time (`HH:MM:SS`), hidden while saving.
    pub fn last_saved_label(&self) -> Option<String> {
        self.saver.last_saved_label()
    }

    pub fn auto_saver(&self) -> &AutoSaver {
        &self.saver
    }

    // Monitoring log

    pub fn open_new_entry(&mut self) -> FormResult<()> {
        self.ensure_editing("add a monitoring entry")?;
        self.editor.open_new();
        Ok(())
    }

    pub fn open_edit_entry(&mut self, id: &str) -> FormResult<()> {
        self.ensure_editing("edit a monitoring entry")?;
        self.editor.open_edit(self.registry.flow_entries(), id)
    }

    pub fn entry_editor(&self) -> &MonitoringEditor {
        &self.editor
    }

    /// Mutable edit buffer of the open entry dialog.
    pub fn entry_buffer_mut(&mut self) -> FormResult<&mut FlowEntryDraft> {
        self.editor.buffer_mut().ok_or(FormError::NoOpenEntry)
    }

    /// Stamp the open entry with the current time of day.
    pub fn stamp_entry_time(&mut self) -> FormResult<()> {
        let now = self.clock.now();
        self.entry_buffer_mut()?.stamp_time(now);
        Ok(())
    }

    pub fn cancel_entry(&mut self) {
        self.editor.cancel();
    }

    /// Fold the open entry into the log and save the whole array.
    pub fn confirm_entry(&mut self) -> FormResult<()> {
        let commit = self.editor.confirm()?;
        self.commit_entries(commit)
    }

    pub fn add_entry(&mut self, entry: FlowEntry) -> FormResult<()> {
        self.ensure_editing("add a monitoring entry")?;
        self.commit_entries(EditorCommit::Add(entry))
    }

    pub fn update_entry(&mut self, id: &str, entry: FlowEntry) -> FormResult<()> {
        self.ensure_editing("edit a monitoring entry")?;
        self.commit_entries(EditorCommit::Update {
            id: id.to_string(),
            entry,
        })
    }

    pub fn remove_entry(&mut self, id: &str) -> FormResult<()> {
        self.ensure_editing("remove a monitoring entry")?;
        let entries = remove_entry(self.registry.flow_entries(), id)?;
        self.registry.set_flow_entries(entries);
        self.record_change([Field::FlowEntries]);
        Ok(())
    }

    fn commit_entries(&mut self, commit: EditorCommit) -> FormResult<()> {
        let entries = commit.apply(self.registry.flow_entries())?;
        self.registry.set_flow_entries(entries);
        self.record_change([Field::FlowEntries]);
        Ok(())
    }

    // Navigation

    /// Advance if the current step is complete; from the last step, open the review.
    pub fn next(&mut self) -> FormResult<NavOutcome> {
        self.ensure_editing("navigate")?;
        self.flush();
        let registry = &self.registry;
        let outcome = self.navigator.next(|step| validate(registry, step));
        match &outcome {
            NavOutcome::Blocked { missing } => {
                debug!(step = self.navigator.current().number(), ?missing, "Next blocked");
                self.notifications.error(missing_fields_message(missing));
            }
            NavOutcome::ReadyForReview => {
                self.review.begin_review()?;
                self.notifications.clear();
            }
            NavOutcome::Moved { from, to } => {
                debug!(from = from.number(), to = to.number(), "Moved to next step");
                self.notifications.clear();
            }
            NavOutcome::Stayed => {}
        }
        Ok(outcome)
    }

    pub fn previous(&mut self) -> FormResult<NavOutcome> {
        self.ensure_editing("navigate")?;
        let outcome = self.navigator.previous();
        if outcome.moved() {
            self.notifications.clear();
        }
        Ok(outcome)
    }

    /// Go straight to a step from the progress indicator, without validation.
    pub fn jump_to(&mut self, step: u8) -> FormResult<NavOutcome> {
        self.ensure_editing("navigate")?;
        let outcome = self.navigator.jump_to(step)?;
        self.flush();
        if outcome.moved() {
            self.notifications.clear();
        }
        Ok(outcome)
    }

    pub fn step_completion(&self) -> Vec<(FormStep, bool)> {
        step_completion(&self.registry)
    }

    // Review and submit

    /// Open the read-only summary directly from any step.
    pub fn review(&mut self) -> FormResult<ReviewSummary> {
        self.flush();
        self.review.begin_review()?;
        self.notifications.clear();
        Ok(self.review_summary())
    }

    pub fn review_summary(&self) -> ReviewSummary {
        ReviewSummary::build(&self.registry, &self.catalog)
    }

    /// Leave the summary and return to the form.
    pub fn edit_again(&mut self) -> FormResult<()> {
        self.review.edit()
    }

    /// Store the full record as completed, updating the current record when one exists.
    pub fn submit(&mut self) -> FormResult<StoredRecord> {
        self.flush();
        if let Err(e) = self.review.ensure_submittable(&self.registry) {
            if matches!(e, FormError::MissingDate) {
                self.notifications.error(e.to_string());
            }
            return Err(e);
        }

        let today = self.clock.now().date().format("%Y-%m-%d").to_string();
        let mut record = self
            .saver
            .header()
            .columns(&self.registry, &today, FormStatus::Completed);
        record.extend(all_columns(&self.registry));

        let table = self.config.table();
        let (action, result) = match self.saver.draft_id() {
            Some(id) => ("update", self.store.update(table, id, record)),
            None => ("save", self.store.create(table, record)),
        };

        match result {
            Ok(stored) => {
                info!(record_id = %stored.id, "Flow chart submitted");
                self.saver.upsert_record(stored.clone());
                self.saver.clear_draft();
                self.review.mark_submitted()?;
                self.notifications.success(SUBMITTED);
                Ok(stored)
            }
            Err(e) => {
                warn!(action, error = %e, "Submit failed");
                self.notifications
                    .error(format!("Failed to {action} flow chart"));
                Err(e.into())
            }
        }
    }

    /// Close the form without submitting.
    ///
    /// The session starts over as a blank chart for the same patient, so a
    /// later edit creates a new record instead of writing a partial one.
    pub fn close(&mut self) {
        self.flush();
        if self.saver.has_unsaved_changes() {
            warn!(fields = self.saver.unconfirmed().len(), "Closing with unsaved changes");
        }
        if let Some(id) = self.saver.draft_id() {
            info!(record_id = %id, "Flow chart closed as draft");
            self.notifications.info(SAVED_AS_DRAFT);
        }
        self.reset();
    }

    fn reset(&mut self) {
        let records = self.saver.records().to_vec();
        self.saver = AutoSaver::new(self.saver.header().clone(), self.config.save_error_display());
        self.saver.set_records(records);
        self.registry = FieldRegistry::for_patient(&self.patient);
        self.navigator.reset();
        self.review = ReviewController::new();
        self.editor.cancel();
        self.pending.clear();
        self.last_edit_at = None;
    }

    // Listing

    /// Fetch the patient's flow charts, newest first.
    pub fn load_records(&mut self) -> FormResult<Vec<RecordListing>> {
        let filter = RecordFilter::new().eq(PATIENT_ID_COLUMN, self.patient.id.as_str());
        let records = self.store.query(self.config.table(), &filter)?;
        self.saver.set_records(records);
        Ok(self.record_list())
    }

    /// The in-memory list, kept current by saves and submit.
    pub fn record_list(&self) -> Vec<RecordListing> {
        self.saver.records().iter().map(RecordListing::from).collect()
    }

    // Notifications

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.pending()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }
}
