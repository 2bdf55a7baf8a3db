//! Monitoring Log Sub-editor.
//!
//! List operations are pure: they return the new entry list and leave saving
//! the whole array to the caller.

use crate::models::{new_entry_id, FlowEntry, FlowEntryDraft};

use super::{FormError, FormResult};

pub fn add_entry(entries: &[FlowEntry], entry: FlowEntry) -> Vec<FlowEntry> {
    let mut next = entries.to_vec();
    next.push(entry);
    next
}

pub fn update_entry(entries: &[FlowEntry], id: &str, entry: FlowEntry) -> FormResult<Vec<FlowEntry>> {
    if !entries.iter().any(|e| e.id == id) {
        return Err(FormError::EntryNotFound(id.to_string()));
    }
    Ok(entries
        .iter()
        .map(|e| if e.id == id { entry.clone() } else { e.clone() })
        .collect())
}

pub fn remove_entry(entries: &[FlowEntry], id: &str) -> FormResult<Vec<FlowEntry>> {
    if !entries.iter().any(|e| e.id == id) {
        return Err(FormError::EntryNotFound(id.to_string()));
    }
    Ok(entries.iter().filter(|e| e.id != id).cloned().collect())
}

/// What the open dialog will do on confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Adding,
    Editing(String),
}

/// A confirmed dialog, ready to fold into the entry list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommit {
    Add(FlowEntry),
    Update { id: String, entry: FlowEntry },
}

impl EditorCommit {
    pub fn apply(self, entries: &[FlowEntry]) -> FormResult<Vec<FlowEntry>> {
        match self {
            EditorCommit::Add(entry) => Ok(add_entry(entries, entry)),
            EditorCommit::Update { id, entry } => update_entry(entries, &id, entry),
        }
    }
}

/// Modal-backed add/edit flow over a transient edit buffer.
#[derive(Debug, Clone, Default)]
pub struct MonitoringEditor {
    open: Option<(EditorMode, FlowEntryDraft)>,
}

impl MonitoringEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn mode(&self) -> Option<&EditorMode> {
        self.open.as_ref().map(|(mode, _)| mode)
    }

    /// Open an empty buffer for a new entry.
    pub fn open_new(&mut self) {
        self.open = Some((EditorMode::Adding, FlowEntryDraft::default()));
    }

    /// Open the buffer pre-filled from an existing entry.
    pub fn open_edit(&mut self, entries: &[FlowEntry], id: &str) -> FormResult<()> {
        let entry = entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| FormError::EntryNotFound(id.to_string()))?;
        self.open = Some((
            EditorMode::Editing(id.to_string()),
            FlowEntryDraft::from_entry(entry),
        ));
        Ok(())
    }

    pub fn buffer(&self) -> Option<&FlowEntryDraft> {
        self.open.as_ref().map(|(_, draft)| draft)
    }

    pub fn buffer_mut(&mut self) -> Option<&mut FlowEntryDraft> {
        self.open.as_mut().map(|(_, draft)| draft)
    }

    /// Whether the confirm action is enabled.
    pub fn can_confirm(&self) -> bool {
        self.buffer().map(FlowEntryDraft::can_confirm).unwrap_or(false)
    }

    pub fn cancel(&mut self) {
        self.open = None;
    }

    /// Close the dialog and produce the entry. An incomplete buffer stays open.
    pub fn confirm(&mut self) -> FormResult<EditorCommit> {
        match self.open.take() {
            None => Err(FormError::NoOpenEntry),
            Some((mode, draft)) if !draft.can_confirm() => {
                self.open = Some((mode, draft));
                Err(FormError::EntryIncomplete)
            }
            Some((EditorMode::Adding, draft)) => {
                Ok(EditorCommit::Add(draft.into_entry(new_entry_id())))
            }
            Some((EditorMode::Editing(id), draft)) => {
                let entry = draft.into_entry(id.clone());
                Ok(EditorCommit::Update { id, entry })
            }
        }
    }
}
