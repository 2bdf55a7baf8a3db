//! Draft Persistence Gateway.
//!
//! Every save goes out as a [`SaveTicket`] numbered from a local counter. The
//! caller performs the store call for the ticket and reports the result back
//! with [`AutoSaver::complete`]; the two halves may be separated by other
//! edits. Responses for tickets older than the newest one issued are stale
//! and never move the save status.

mod mapping;

pub use mapping::*;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::{Field, FieldRegistry, FormStatus};
use crate::store::{StoreResult, StoredRecord};

/// Save status shown next to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        }
    }
}

/// Store call a ticket asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOp {
    Create,
    Update(String),
}

/// One outgoing save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    pub seq: u64,
    pub op: SaveOp,
    pub payload: Map<String, Value>,
}

/// What a completed ticket did to local state.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { created: bool, stale: bool },
    Failed { stale: bool },
    /// The ticket was never issued or was already completed.
    Unknown,
}

/// Auto-save state for one form session.
#[derive(Debug, Clone)]
pub struct AutoSaver {
    header: RecordHeader,
    error_display: Duration,
    draft_id: Option<String>,
    /// Newest ticket issued.
    issued: u64,
    /// Newest ticket whose response was applied to the record list.
    landed: u64,
    create_in_flight: Option<u64>,
    in_flight: BTreeMap<u64, BTreeSet<Field>>,
    /// Edits made while a create was in flight.
    deferred: BTreeSet<Field>,
    /// Fields carried by failed saves, resent with their current values.
    unconfirmed: BTreeSet<Field>,
    status: SaveStatus,
    error_at: Option<NaiveDateTime>,
    last_saved: Option<NaiveDateTime>,
    records: Vec<StoredRecord>,
}

impl AutoSaver {
    pub fn new(header: RecordHeader, error_display: Duration) -> Self {
        Self {
            header,
            error_display,
            draft_id: None,
            issued: 0,
            landed: 0,
            create_in_flight: None,
            in_flight: BTreeMap::new(),
            deferred: BTreeSet::new(),
            unconfirmed: BTreeSet::new(),
            status: SaveStatus::Idle,
            error_at: None,
            last_saved: None,
            records: Vec::new(),
        }
    }

    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    /// Id of the record this session writes to, once one exists.
    pub fn draft_id(&self) -> Option<&str> {
        self.draft_id.as_deref()
    }

    /// Continue writing to an existing record.
    pub fn resume(&mut self, id: String) {
        self.draft_id = Some(id);
    }

    /// Forget the current record, after submit or close.
    pub fn clear_draft(&mut self) {
        self.draft_id = None;
        self.deferred.clear();
        self.unconfirmed.clear();
    }

    /// Issue a save for `changed` plus anything deferred or unconfirmed.
    ///
    /// Returns `None` when there is nothing to send, or when a create is still
    /// in flight; in that case the fields wait and go out as an update once
    /// the create returns.
    pub fn begin<I>(&mut self, registry: &FieldRegistry, changed: I, now: NaiveDateTime) -> Option<SaveTicket>
    where
        I: IntoIterator<Item = Field>,
    {
        let mut fields: BTreeSet<Field> = changed.into_iter().collect();
        if let Some(seq) = self.create_in_flight {
            if !fields.is_empty() {
                debug!(seq, count = fields.len(), "Deferring edits until the draft exists");
                self.deferred.append(&mut fields);
                self.status = SaveStatus::Saving;
            }
            return None;
        }

        fields.append(&mut self.deferred);
        fields.append(&mut self.unconfirmed);
        if fields.is_empty() {
            return None;
        }

        self.issued += 1;
        let seq = self.issued;
        let op = match &self.draft_id {
            Some(id) => SaveOp::Update(id.clone()),
            None => {
                self.create_in_flight = Some(seq);
                SaveOp::Create
            }
        };

        let today = now.date().format("%Y-%m-%d").to_string();
        let mut payload = self.header.columns(registry, &today, FormStatus::Draft);
        payload.extend(columns_for(registry, fields.iter().copied()));

        debug!(seq, op = ?op, count = fields.len(), "Auto-saving draft");
        self.in_flight.insert(seq, fields);
        self.status = SaveStatus::Saving;
        Some(SaveTicket { seq, op, payload })
    }

    /// Apply the store's answer for ticket `seq`.
    pub fn complete(
        &mut self,
        seq: u64,
        result: StoreResult<StoredRecord>,
        now: NaiveDateTime,
    ) -> SaveOutcome {
        let Some(fields) = self.in_flight.remove(&seq) else {
            return SaveOutcome::Unknown;
        };
        let was_create = self.create_in_flight == Some(seq);
        if was_create {
            self.create_in_flight = None;
        }
        let stale = seq < self.issued;

        match result {
            Ok(record) => {
                let created = was_create && self.draft_id.is_none();
                if created {
                    info!(seq, record_id = %record.id, "Draft created");
                    self.draft_id = Some(record.id.clone());
                } else {
                    debug!(seq, record_id = %record.id, "Draft updated");
                }
                for field in &fields {
                    self.unconfirmed.remove(field);
                }
                if seq > self.landed {
                    self.landed = seq;
                    self.upsert_record(record);
                }
                if !stale {
                    self.status = SaveStatus::Saved;
                    self.error_at = None;
                    self.last_saved = Some(now);
                }
                SaveOutcome::Saved { created, stale }
            }
            Err(e) => {
                warn!(seq, stale, error = %e, "Auto-save failed");
                self.unconfirmed.extend(fields);
                if was_create {
                    // The next save has to create again, so pending edits ride along with it.
                    self.unconfirmed.append(&mut self.deferred);
                }
                if !stale {
                    self.status = SaveStatus::Error;
                    self.error_at = Some(now);
                }
                SaveOutcome::Failed { stale }
            }
        }
    }

    /// Status as of `now`: an error reverts to idle once its display time has passed.
    pub fn status(&self, now: NaiveDateTime) -> SaveStatus {
        match (self.status, self.error_at) {
            (SaveStatus::Error, Some(at)) if now - at >= self.error_display => SaveStatus::Idle,
            (status, _) => status,
        }
    }

    /// Last successful save, hidden while a save is running.
    pub fn displayed_last_saved(&self) -> Option<NaiveDateTime> {
        match self.status {
            SaveStatus::Saving => None,
            _ => self.last_saved,
        }
    }

    /// Local time of the last successful save, `HH:MM:SS`.
    pub fn last_saved_label(&self) -> Option<String> {
        self.displayed_last_saved()
            .map(|at| at.format("%H:%M:%S").to_string())
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Fields whose latest value the store has not confirmed.
    pub fn unconfirmed(&self) -> &BTreeSet<Field> {
        &self.unconfirmed
    }

    /// Local and remote copies may differ.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.unconfirmed.is_empty() || !self.deferred.is_empty() || !self.in_flight.is_empty()
    }

    /// The user's records for this table, newest first.
    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    pub fn set_records(&mut self, records: Vec<StoredRecord>) {
        self.records = records;
    }

    /// Replace the record with the same id, or prepend it.
    pub fn upsert_record(&mut self, record: StoredRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.insert(0, record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextField;
    use crate::store::StoreError;
    use chrono::NaiveDate;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    fn saver() -> AutoSaver {
        AutoSaver::new(
            RecordHeader {
                patient_id: "p-1".into(),
                patient_name: "Ana Lopez".into(),
            },
            Duration::seconds(3),
        )
    }

    fn stored(id: &str, payload: &Map<String, Value>) -> StoredRecord {
        StoredRecord {
            id: id.into(),
            table: "iv_sedation_flow_charts".into(),
            fields: payload.clone(),
            created_at: "t".into(),
            updated_at: "t".into(),
        }
    }

    fn edit_weight(
        saver: &mut AutoSaver,
        registry: &mut FieldRegistry,
        value: &str,
        now: NaiveDateTime,
    ) -> Option<SaveTicket> {
        registry.set_text(TextField::Weight, value.into());
        saver.begin(registry, [Field::Text(TextField::Weight)], now)
    }

    #[test]
    fn test_create_then_update() {
        let mut saver = saver();
        let mut registry = FieldRegistry::default();

        let first = edit_weight(&mut saver, &mut registry, "150", at(0)).unwrap();
        assert_eq!(first.op, SaveOp::Create);
        assert_eq!(first.payload["status"], "draft");
        assert_eq!(first.payload["date"], "2025-03-01");
        assert_eq!(first.payload["patient_name"], "Ana Lopez");
        assert_eq!(first.payload["weight"], "150");
        assert_eq!(saver.status(at(0)), SaveStatus::Saving);

        let outcome = saver.complete(first.seq, Ok(stored("rec-1", &first.payload)), at(1));
        assert_eq!(outcome, SaveOutcome::Saved { created: true, stale: false });
        assert_eq!(saver.draft_id(), Some("rec-1"));
        assert_eq!(saver.status(at(1)), SaveStatus::Saved);
        assert_eq!(saver.last_saved_label().as_deref(), Some("10:00:01"));
        assert_eq!(saver.records().len(), 1);

        let second = edit_weight(&mut saver, &mut registry, "151", at(2)).unwrap();
        assert_eq!(second.op, SaveOp::Update("rec-1".into()));
        assert!(second.seq > first.seq);
    }

    #[test]
    fn test_nothing_to_send() {
        let mut saver = saver();
        assert!(saver.begin(&FieldRegistry::default(), [], at(0)).is_none());
        assert_eq!(saver.status(at(0)), SaveStatus::Idle);
    }

    #[test]
    fn test_failure_keeps_last_saved_and_reverts() {
        let mut saver = saver();
        let mut registry = FieldRegistry::default();

        let ok = edit_weight(&mut saver, &mut registry, "150", at(0)).unwrap();
        saver.complete(ok.seq, Ok(stored("rec-1", &ok.payload)), at(1));

        let failing = edit_weight(&mut saver, &mut registry, "155", at(5)).unwrap();
        assert_eq!(saver.displayed_last_saved(), None);
        let outcome = saver.complete(
            failing.seq,
            Err(StoreError::Unavailable("offline".into())),
            at(6),
        );
        assert_eq!(outcome, SaveOutcome::Failed { stale: false });
        assert_eq!(saver.status(at(6)), SaveStatus::Error);
        assert_eq!(saver.displayed_last_saved(), Some(at(1)));
        assert_eq!(saver.status(at(8)), SaveStatus::Error);
        assert_eq!(saver.status(at(9)), SaveStatus::Idle);
        assert_eq!(saver.displayed_last_saved(), Some(at(1)));
        assert!(saver.has_unsaved_changes());
        assert!(saver.unconfirmed().contains(&Field::Text(TextField::Weight)));
    }

    #[test]
    fn test_unconfirmed_fields_resent() {
        let mut saver = saver();
        let mut registry = FieldRegistry::default();

        let failing = edit_weight(&mut saver, &mut registry, "150", at(0)).unwrap();
        saver.complete(failing.seq, Err(StoreError::Unavailable("offline".into())), at(1));
        assert_eq!(saver.draft_id(), None);

        registry.set_text(TextField::PainScore, "2".into());
        let retry = saver
            .begin(&registry, [Field::Text(TextField::PainScore)], at(2))
            .unwrap();
        assert_eq!(retry.op, SaveOp::Create);
        assert_eq!(retry.payload["weight"], "150");
        assert_eq!(retry.payload["pain_score"], "2");

        saver.complete(retry.seq, Ok(stored("rec-1", &retry.payload)), at(3));
        assert!(!saver.has_unsaved_changes());
    }

    #[test]
    fn test_stale_response_does_not_move_status() {
        let mut saver = saver();
        let mut registry = FieldRegistry::default();
        saver.resume("rec-1".into());

        let older = edit_weight(&mut saver, &mut registry, "150", at(0)).unwrap();
        let newer = edit_weight(&mut saver, &mut registry, "151", at(1)).unwrap();

        let newer_record = stored("rec-1", &newer.payload);
        saver.complete(newer.seq, Ok(newer_record.clone()), at(2));
        assert_eq!(saver.status(at(2)), SaveStatus::Saved);

        let outcome = saver.complete(
            older.seq,
            Err(StoreError::Unavailable("timeout".into())),
            at(3),
        );
        assert_eq!(outcome, SaveOutcome::Failed { stale: true });
        assert_eq!(saver.status(at(3)), SaveStatus::Saved);
        assert_eq!(saver.records(), &[newer_record]);
    }

    #[test]
    fn test_stale_success_does_not_overwrite_newer_record() {
        let mut saver = saver();
        let mut registry = FieldRegistry::default();
        saver.resume("rec-1".into());

        let older = edit_weight(&mut saver, &mut registry, "150", at(0)).unwrap();
        let newer = edit_weight(&mut saver, &mut registry, "151", at(1)).unwrap();
        assert_eq!(saver.in_flight_count(), 2);

        saver.complete(newer.seq, Ok(stored("rec-1", &newer.payload)), at(2));
        assert_eq!(saver.in_flight_count(), 1);
        let outcome = saver.complete(older.seq, Ok(stored("rec-1", &older.payload)), at(3));
        assert_eq!(saver.in_flight_count(), 0);
        assert_eq!(outcome, SaveOutcome::Saved { created: false, stale: true });
        assert_eq!(saver.records()[0].get_str("weight"), Some("151"));
        assert_eq!(saver.last_saved_label().as_deref(), Some("10:00:02"));
    }

    #[test]
    fn test_single_create_while_in_flight() {
        let mut saver = saver();
        let mut registry = FieldRegistry::default();

        let create = edit_weight(&mut saver, &mut registry, "150", at(0)).unwrap();
        assert!(edit_weight(&mut saver, &mut registry, "151", at(1)).is_none());
        assert!(saver.has_deferred());

        let outcome = saver.complete(create.seq, Ok(stored("rec-1", &create.payload)), at(2));
        assert_eq!(outcome, SaveOutcome::Saved { created: true, stale: false });

        let follow_up = saver.begin(&registry, [], at(2)).unwrap();
        assert_eq!(follow_up.op, SaveOp::Update("rec-1".into()));
        assert_eq!(follow_up.payload["weight"], "151");
        assert!(!saver.has_deferred());
    }

    #[test]
    fn test_unknown_ticket() {
        let mut saver = saver();
        let record = stored("rec-1", &Map::new());
        assert_eq!(saver.complete(42, Ok(record), at(0)), SaveOutcome::Unknown);
    }

    #[test]
    fn test_upsert_record_replaces_or_prepends() {
        let mut saver = saver();
        saver.set_records(vec![stored("rec-1", &Map::new())]);

        let mut payload = Map::new();
        payload.insert("status".into(), Value::String("completed".into()));
        saver.upsert_record(stored("rec-1", &payload));
        saver.upsert_record(stored("rec-2", &Map::new()));

        let ids: Vec<&str> = saver.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["rec-2", "rec-1"]);
        assert_eq!(saver.records()[1].get_str("status"), Some("completed"));
    }
}
