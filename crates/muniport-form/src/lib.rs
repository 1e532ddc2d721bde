#![forbid(unsafe_code)]

//! Validated field controllers and the submit-gated form orchestrator.
//!
//! A [`FieldController`](field::FieldController) binds one input to the rule
//! engine and (for remote-checked fields) the debounced directory lookup,
//! exposing a single [`ValidationOutcome`](muniport_validate::ValidationOutcome)
//! per field. A [`Form`](form::Form) aggregates controllers, recomputes
//! submittability on every change, and produces a clean value map on submit.
//!
//! The crate is driven entirely by its caller: explicit `Instant`s, explicit
//! [`poll`](form::Form::poll) calls, explicit resolution delivery. No timers,
//! no threads, no I/O.

pub mod field;
pub mod form;

pub use field::{FieldController, FieldSpec};
pub use form::{FieldLookup, Form, SubmitError};
