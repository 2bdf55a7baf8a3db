//! Step Navigator: guarded forward motion, free backward motion and
//! unguarded jumps from the progress indicator.

use crate::models::FormStep;

use super::{FormError, FormResult};

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// Moved to another step; the view scrolls to the top and transient messages clear.
    Moved { from: FormStep, to: FormStep },
    /// The current step is incomplete; nothing moved.
    Blocked { missing: Vec<&'static str> },
    /// The last step validated; control passes to review.
    ReadyForReview,
    /// Already at the boundary (or at the requested step).
    Stayed,
}

impl NavOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, NavOutcome::Moved { .. })
    }
}

/// State machine over the form's steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNavigator {
    current: FormStep,
}

impl Default for StepNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl StepNavigator {
    pub fn new() -> Self {
        Self {
            current: FormStep::FIRST,
        }
    }

    pub fn current(&self) -> FormStep {
        self.current
    }

    /// Advance if `validate` reports nothing missing for the current step.
    pub fn next<F>(&mut self, validate: F) -> NavOutcome
    where
        F: FnOnce(FormStep) -> Vec<&'static str>,
    {
        let missing = validate(self.current);
        if !missing.is_empty() {
            return NavOutcome::Blocked { missing };
        }
        match self.current.next() {
            Some(to) => self.move_to(to),
            None => NavOutcome::ReadyForReview,
        }
    }

    /// Go back one step; never validated.
    pub fn previous(&mut self) -> NavOutcome {
        match self.current.previous() {
            Some(to) => self.move_to(to),
            None => NavOutcome::Stayed,
        }
    }

    /// Jump straight to a step number from the progress indicator; never validated.
    pub fn jump_to(&mut self, number: u8) -> FormResult<NavOutcome> {
        let to = FormStep::from_number(number).ok_or(FormError::InvalidStep(number))?;
        if to == self.current {
            return Ok(NavOutcome::Stayed);
        }
        Ok(self.move_to(to))
    }

    pub fn reset(&mut self) {
        self.current = FormStep::FIRST;
    }

    fn move_to(&mut self, to: FormStep) -> NavOutcome {
        let from = self.current;
        self.current = to;
        NavOutcome::Moved { from, to }
    }
}
