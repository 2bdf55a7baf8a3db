//! Monitoring-log models: stored entries and the transient edit buffer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One timestamped vital-signs + medications observation.
///
/// Entries round-trip inside the parent record's `flow_entries` JSON column;
/// they are never persisted on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowEntry {
    /// Locally generated id, stable for the session
    pub id: String,
    /// Time of day, HH:MM
    pub time: String,
    /// Blood pressure as "SYS/DIA"
    #[serde(default)]
    pub bp: String,
    #[serde(default)]
    pub heart_rate: String,
    /// Respiratory rate
    #[serde(default)]
    pub rr: String,
    #[serde(default)]
    pub spo2: String,
    /// Medication ids from the catalog, in administration order
    #[serde(default)]
    pub medications: Vec<String>,
}

impl FlowEntry {
    /// Split the stored blood pressure back into (systolic, diastolic).
    pub fn split_bp(&self) -> (String, String) {
        match self.bp.split_once('/') {
            Some((sys, dia)) => (sys.trim().to_string(), dia.trim().to_string()),
            None => (self.bp.trim().to_string(), String::new()),
        }
    }
}

/// Edit buffer backing the add/edit dialog of the monitoring log.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowEntryDraft {
    pub time: String,
    pub systolic: String,
    pub diastolic: String,
    pub heart_rate: String,
    pub respiratory_rate: String,
    pub spo2: String,
    pub medications: Vec<String>,
}

impl FlowEntryDraft {
    /// Load an existing entry into the buffer for editing.
    pub fn from_entry(entry: &FlowEntry) -> Self {
        let (systolic, diastolic) = entry.split_bp();
        Self {
            time: entry.time.clone(),
            systolic,
            diastolic,
            heart_rate: entry.heart_rate.clone(),
            respiratory_rate: entry.rr.clone(),
            spo2: entry.spo2.clone(),
            medications: entry.medications.clone(),
        }
    }

    /// The confirm action is enabled only once a time is present.
    pub fn can_confirm(&self) -> bool {
        !self.time.trim().is_empty()
    }

    /// Stamp the time with the wall clock, truncated to minutes.
    pub fn stamp_time(&mut self, now: NaiveDateTime) {
        self.time = now.format("%H:%M").to_string();
    }

    /// Add or remove a medication id.
    pub fn toggle_medication(&mut self, medication_id: &str) {
        if let Some(pos) = self.medications.iter().position(|m| m == medication_id) {
            self.medications.remove(pos);
        } else {
            self.medications.push(medication_id.to_string());
        }
    }

    /// Joined "SYS/DIA" blood pressure; empty when neither part was entered.
    pub fn blood_pressure(&self) -> String {
        let sys = self.systolic.trim();
        let dia = self.diastolic.trim();
        if sys.is_empty() && dia.is_empty() {
            String::new()
        } else {
            format!("{}/{}", sys, dia)
        }
    }

    /// Fold the buffer into an entry with the given id.
    pub fn into_entry(self, id: String) -> FlowEntry {
        let bp = self.blood_pressure();
        FlowEntry {
            id,
            time: self.time.trim().to_string(),
            bp,
            heart_rate: self.heart_rate.trim().to_string(),
            rr: self.respiratory_rate.trim().to_string(),
            spo2: self.spo2.trim().to_string(),
            medications: self.medications,
        }
    }
}

/// Generate a fresh local entry id.
pub fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_bp_joined_on_confirm() {
        let draft = FlowEntryDraft {
            time: "14:30".into(),
            systolic: "120".into(),
            diastolic: "80".into(),
            ..Default::default()
        };
        let entry = draft.into_entry("e-1".into());
        assert_eq!(entry.bp, "120/80");
        assert_eq!(entry.time, "14:30");
    }

    #[test]
    fn test_bp_empty_when_not_entered() {
        let draft = FlowEntryDraft {
            time: "14:30".into(),
            ..Default::default()
        };
        assert_eq!(draft.into_entry("e-1".into()).bp, "");
    }

    #[test]
    fn test_round_trip_through_buffer() {
        let entry = FlowEntry {
            id: "e-1".into(),
            time: "09:15".into(),
            bp: "118/76".into(),
            heart_rate: "72".into(),
            rr: "14".into(),
            spo2: "98".into(),
            medications: vec!["midazolam".into()],
        };
        let draft = FlowEntryDraft::from_entry(&entry);
        assert_eq!(draft.systolic, "118");
        assert_eq!(draft.diastolic, "76");
        assert_eq!(draft.into_entry("e-1".into()), entry);
    }

    #[test]
    fn test_can_confirm_requires_time() {
        let mut draft = FlowEntryDraft::default();
        assert!(!draft.can_confirm());
        draft.time = "  ".into();
        assert!(!draft.can_confirm());
        draft.time = "10:00".into();
        assert!(draft.can_confirm());
    }

    #[test]
    fn test_stamp_time_truncates_to_minutes() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(14, 30, 59)
            .unwrap();
        let mut draft = FlowEntryDraft::default();
        draft.stamp_time(now);
        assert_eq!(draft.time, "14:30");
    }

    #[test]
    fn test_toggle_medication() {
        let mut draft = FlowEntryDraft::default();
        draft.toggle_medication("fentanyl");
        draft.toggle_medication("midazolam");
        assert_eq!(draft.medications, vec!["fentanyl", "midazolam"]);
        draft.toggle_medication("fentanyl");
        assert_eq!(draft.medications, vec!["midazolam"]);
    }

    #[test]
    fn test_entry_json_uses_camel_case() {
        let entry = FlowEntry {
            id: "e-1".into(),
            time: "09:15".into(),
            bp: String::new(),
            heart_rate: "72".into(),
            rr: String::new(),
            spo2: String::new(),
            medications: vec![],
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"heartRate\":\"72\""));
    }
}
