#![forbid(unsafe_code)]

//! The form orchestrator: N field controllers, one submit gate.
//!
//! The form recomputes aggregate submittability from current field outcomes
//! (never cached), re-validates dependent fields when their dependencies
//! change, and re-runs every rule synchronously on submit as a final guard
//! against the race between the last keystroke and the click.

use std::time::Instant;

use muniport_validate::debounce::DebounceConfig;
use muniport_validate::lookup::{AccountMatch, DirectoryError};
use muniport_validate::outcome::ValidationOutcome;
use muniport_validate::rules::RuleContext;
use tracing::debug;

use crate::field::{FieldController, FieldSpec};

/// A due lookup, tagged with the field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLookup {
    pub field: &'static str,
    pub generation: u64,
    pub value: String,
}

/// Why a submit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// At least one field is invalid or a required field is incomplete.
    Incomplete,
    /// Every field checks out structurally but a remote confirmation is
    /// still outstanding.
    ChecksPending,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incomplete => write!(f, "form has invalid or incomplete fields"),
            Self::ChecksPending => write!(f, "account verification is still in progress"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// A submit-gated aggregation of field controllers.
#[derive(Debug)]
pub struct Form {
    fields: Vec<FieldController>,
}

impl Form {
    /// Build a form from field specs, in display order.
    #[must_use]
    pub fn new(specs: Vec<FieldSpec>, config: &DebounceConfig) -> Self {
        Self {
            fields: specs
                .into_iter()
                .map(|spec| FieldController::new(spec, config))
                .collect(),
        }
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == field)
    }

    /// Snapshot of `(name, trimmed value)` for cross-field rule contexts.
    fn snapshot(&self) -> Vec<(&'static str, String)> {
        self.fields
            .iter()
            .map(|f| (f.name(), f.value().to_string()))
            .collect()
    }

    /// Route a keystroke to the named field, then re-validate any field that
    /// declares a dependency on it. Returns `false` for an unknown field.
    pub fn on_change(&mut self, field: &str, value: &str, now: Instant) -> bool {
        let Some(index) = self.position(field) else {
            debug!(field, "change for unknown field ignored");
            return false;
        };

        let snapshot = self.snapshot();
        self.fields[index].on_change(value, &RuleContext::new(&snapshot), now);

        // Dependent fields see the new value.
        let changed = self.fields[index].name();
        let snapshot = self.snapshot();
        for i in 0..self.fields.len() {
            if i != index && self.fields[i].spec().dependencies().contains(&changed) {
                self.fields[i].revalidate(&RuleContext::new(&snapshot));
            }
        }
        true
    }

    /// The current trimmed value of a field.
    #[must_use]
    pub fn value_of(&self, field: &str) -> Option<&str> {
        self.position(field).map(|i| self.fields[i].value())
    }

    /// The current outcome of a field.
    #[must_use]
    pub fn outcome_of(&self, field: &str) -> Option<ValidationOutcome> {
        self.position(field).map(|i| self.fields[i].outcome())
    }

    /// All `(name, outcome)` pairs, in display order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<(&'static str, ValidationOutcome)> {
        self.fields
            .iter()
            .map(|f| (f.name(), f.outcome()))
            .collect()
    }

    /// True iff every required field is `Valid`, no field is `Pending`, and
    /// no optional field is `Invalid`. Derived, never stored.
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        self.fields.iter().all(|f| {
            let outcome = f.outcome();
            if outcome.is_pending() {
                return false;
            }
            if f.spec().is_required() {
                outcome.is_valid()
            } else {
                !outcome.is_invalid()
            }
        })
    }

    /// Fire due lookups and expire timed-out ones across all fields.
    pub fn poll(&mut self, now: Instant) -> Vec<FieldLookup> {
        let mut due = Vec::new();
        for field in &mut self.fields {
            if let Some(request) = field.poll(now) {
                due.push(FieldLookup {
                    field: field.name(),
                    generation: request.generation,
                    value: request.value,
                });
            }
        }
        due
    }

    /// Deliver a lookup resolution to the named field. Returns `true` if it
    /// was applied, `false` if stale or the field is unknown.
    pub fn resolve(
        &mut self,
        field: &str,
        generation: u64,
        value: &str,
        result: Result<AccountMatch, DirectoryError>,
    ) -> bool {
        let Some(index) = self.position(field) else {
            debug!(field, "resolution for unknown field ignored");
            return false;
        };
        self.fields[index].resolve(generation, value, result)
    }

    /// Attempt to submit. Every field is re-validated synchronously from its
    /// current value first; a refusal leaves the fresh per-field messages in
    /// place for display.
    pub fn submit(&mut self) -> Result<Vec<(&'static str, String)>, SubmitError> {
        let snapshot = self.snapshot();
        for field in &mut self.fields {
            field.revalidate_for_submit(&RuleContext::new(&snapshot));
        }

        let mut pending = false;
        let mut incomplete = false;
        for field in &self.fields {
            let outcome = field.outcome();
            if outcome.is_pending() {
                pending = true;
            } else if field.spec().is_required() {
                incomplete |= !outcome.is_valid();
            } else {
                incomplete |= outcome.is_invalid();
            }
        }

        if incomplete {
            debug!("submit refused: invalid or incomplete fields");
            return Err(SubmitError::Incomplete);
        }
        if pending {
            debug!("submit refused: remote confirmation outstanding");
            return Err(SubmitError::ChecksPending);
        }

        debug!("submit accepted");
        Ok(self
            .fields
            .iter()
            .map(|f| (f.name(), f.value().to_string()))
            .collect())
    }

    /// Earliest instant at which [`poll`](Self::poll) could produce work.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.fields
            .iter()
            .filter_map(FieldController::next_deadline)
            .min()
    }

    /// Cancel all outstanding work across the form's fields.
    pub fn dispose(&mut self) {
        for field in &mut self.fields {
            field.dispose();
        }
    }
}
