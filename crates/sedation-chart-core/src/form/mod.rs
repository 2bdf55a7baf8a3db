//! Form logic: input rules, step validation, navigation, review/submit and
//! the monitoring-log sub-editor.
//!
//! Everything here is a pure transformation of local state; persistence lives
//! in [`crate::gateway`] and the wiring in [`crate::session`].

mod input;
mod monitoring;
mod navigator;
mod review;
mod validator;

pub use input::*;
pub use monitoring::*;
pub use navigator::*;
pub use review::*;
pub use validator::*;

use thiserror::Error;

use crate::store::StoreError;

/// Form errors.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown option '{option}' for {field}")]
    UnknownOption { field: &'static str, option: String },

    #[error("'{0}' cannot be used as the medication list")]
    ReservedDetail(String),

    #[error("{0} does not apply in the current state")]
    NotApplicable(&'static str),

    #[error("Invalid step: {0}")]
    InvalidStep(u8),

    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("Date is required before submitting")]
    MissingDate,

    #[error("Monitoring entry not found: {0}")]
    EntryNotFound(String),

    #[error("Monitoring entry needs a time")]
    EntryIncomplete,

    #[error("No monitoring entry is open for editing")]
    NoOpenEntry,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FormResult<T> = Result<T, FormError>;
