#![forbid(unsafe_code)]

//! Validation primitives for the muniport self-service portal.
//!
//! This crate holds the leaf pieces of the account-verification pipeline:
//!
//! - [`outcome`]: the per-field [`ValidationOutcome`](outcome::ValidationOutcome)
//!   value, tagged with the input it was produced for so stale results can be
//!   rejected.
//! - [`rules`]: pure, synchronous structural validation (required, format,
//!   length, cross-field equality) safe to run on every keystroke.
//! - [`password`]: the five independent password criteria, exposed as a
//!   checklist rather than a single pass/fail.
//! - [`debounce`]: the quiet-period scheduler with generation-based
//!   cancellation and a bounded in-flight wait.
//! - [`lookup`]: the account-directory boundary the remote check calls into.
//!
//! Nothing here performs I/O or reads the clock; callers inject `Instant`s
//! and execute lookups themselves.

pub mod debounce;
pub mod lookup;
pub mod outcome;
pub mod password;
pub mod rules;

pub use debounce::{DebounceConfig, DebounceEvent, DebounceTicket, Debouncer, LookupRequest};
pub use lookup::{AccountDirectory, AccountMatch, DirectoryError, StaticDirectory};
pub use outcome::{ValidationOutcome, ValidationStatus};
pub use password::PasswordCriteria;
pub use rules::{FieldRule, RuleContext, RuleSet};
