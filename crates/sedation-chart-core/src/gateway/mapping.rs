//! Registry ↔ external column mapping.

use serde_json::{Map, Value};
use tracing::warn;

use crate::form::normalize_selection;
use crate::models::{
    ArchValues, Field, FieldRegistry, FlowEntry, FormStatus, MorningMedications, PatientContext,
    TextField, PATIENT_ID_COLUMN, PATIENT_NAME_COLUMN, STATUS_COLUMN,
};
use crate::store::StoredRecord;

/// Columns written with every save regardless of what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub patient_id: String,
    pub patient_name: String,
}

impl RecordHeader {
    /// Header for `patient`, using `placeholder` when the context has no name.
    pub fn for_patient(patient: &PatientContext, placeholder: impl FnOnce(&str) -> String) -> Self {
        let patient_name = patient
            .display_name()
            .unwrap_or_else(|| placeholder(&patient.id));
        Self {
            patient_id: patient.id.clone(),
            patient_name,
        }
    }

    /// Patient id, name, date and status. An empty date falls back to `today` (YYYY-MM-DD).
    pub fn columns(&self, registry: &FieldRegistry, today: &str, status: FormStatus) -> Map<String, Value> {
        let mut columns = Map::new();
        columns.insert(PATIENT_ID_COLUMN.into(), Value::String(self.patient_id.clone()));
        columns.insert(PATIENT_NAME_COLUMN.into(), Value::String(self.patient_name.clone()));
        let date = registry.text(TextField::Date);
        let date = if date.trim().is_empty() { today } else { date };
        columns.insert(TextField::Date.key().into(), Value::String(date.to_string()));
        columns.insert(STATUS_COLUMN.into(), Value::String(status.as_str().to_string()));
        columns
    }
}

/// Current value of one field in its column shape.
pub fn column_value(registry: &FieldRegistry, field: Field) -> Value {
    match field {
        Field::Text(f) => Value::String(registry.text(f).to_string()),
        Field::Select(g) => Value::from(registry.selection(g).to_vec()),
        Field::OtherText(g) => Value::String(registry.other_text(g).to_string()),
        Field::Arch(f) => serde_json::to_value(registry.arch_values(f)).unwrap_or(Value::Null),
        Field::MorningMedications => Value::String(registry.morning_medications().to_column()),
        Field::FlowEntries => {
            serde_json::to_value(registry.flow_entries()).unwrap_or_else(|_| Value::Array(vec![]))
        }
    }
}

/// Columns for the given fields only.
pub fn columns_for<I>(registry: &FieldRegistry, fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = Field>,
{
    let mut columns = Map::new();
    for field in fields {
        if let Some(key) = field.key() {
            columns.insert(key.to_string(), column_value(registry, field));
        }
    }
    columns
}

/// Every persisted field.
pub fn all_columns(registry: &FieldRegistry) -> Map<String, Value> {
    columns_for(registry, Field::all())
}

/// Rebuild a registry from a stored record.
///
/// Unknown columns are ignored and malformed values are skipped, so a record
/// written by an older form version still opens.
pub fn registry_from_record(patient: &PatientContext, record: &StoredRecord) -> FieldRegistry {
    let mut registry = FieldRegistry::for_patient(patient);
    for (key, value) in &record.fields {
        let Some(field) = Field::from_key(key) else {
            continue;
        };
        if !read_field(&mut registry, field, value) {
            warn!(record_id = %record.id, column = %key, "Skipping malformed column");
        }
    }
    registry
}

fn read_field(registry: &mut FieldRegistry, field: Field, value: &Value) -> bool {
    match field {
        Field::Text(f) => match scalar_string(value) {
            Some(s) => {
                registry.set_text(f, s);
                true
            }
            None => false,
        },
        Field::Select(g) => match string_list(value) {
            Some(options) => {
                registry.set_selection(g, normalize_selection(g, options));
                true
            }
            None => false,
        },
        Field::OtherText(g) => match value.as_str() {
            Some(s) => {
                registry.set_other_text(g, s.to_string());
                true
            }
            None => value.is_null(),
        },
        Field::Arch(f) => match serde_json::from_value::<ArchValues>(value.clone()) {
            Ok(values) => {
                registry.set_arch_values(f, values);
                true
            }
            Err(_) => value.is_null(),
        },
        Field::MorningMedications => match value.as_str() {
            Some(s) => {
                registry.set_morning_medications(MorningMedications::from_column(s));
                true
            }
            None => value.is_null(),
        },
        Field::FlowEntries => match flow_entries(value) {
            Some(entries) => {
                registry.set_flow_entries(entries);
                true
            }
            None => false,
        },
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// The monitoring log column holds a JSON array, or that array encoded as a string.
fn flow_entries(value: &Value) -> Option<Vec<FlowEntry>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Some(Vec::new()),
        Value::String(s) => serde_json::from_str(s).ok(),
        other => serde_json::from_value(other.clone()).ok(),
    }
}
