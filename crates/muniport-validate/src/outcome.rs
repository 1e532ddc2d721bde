#![forbid(unsafe_code)]

//! Per-field validation outcomes.
//!
//! A [`ValidationOutcome`] is the single visible result of validating one
//! field. It is replaced atomically, never merged, and carries the input
//! value it was produced for ([`ValidationOutcome::for_value`]) so that a
//! result arriving after the field has changed can be recognized as stale
//! and discarded.
//!
//! # Invariants
//!
//! 1. An outcome may only be applied to a field whose current trimmed value
//!    equals `for_value`.
//! 2. `Idle` carries no message; it is the state of an empty or not-yet-
//!    validated field, never an error.
//! 3. `Pending` means a remote confirmation is outstanding; a field is never
//!    reported `Valid` while `Pending`.

/// The four externally visible states of a validated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationStatus {
    /// Nothing to report: empty field, or input too short to judge.
    Idle,
    /// A remote confirmation is in flight for the current value.
    Pending,
    /// Every applicable rule passed (including remote confirmation, where
    /// required).
    Valid,
    /// At least one rule failed; the outcome message says which.
    Invalid,
}

impl ValidationStatus {
    /// Stable name for tracing and diagnostics.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

/// The result of validating one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationOutcome {
    status: ValidationStatus,
    /// Human-readable message; empty for `Idle` and for messageless `Valid`.
    message: String,
    /// The trimmed input value this outcome was produced for.
    for_value: String,
}

impl ValidationOutcome {
    /// An idle outcome (empty field, nothing shown).
    #[must_use]
    pub fn idle() -> Self {
        Self {
            status: ValidationStatus::Idle,
            message: String::new(),
            for_value: String::new(),
        }
    }

    /// A pending outcome for the given value.
    #[must_use]
    pub fn pending(for_value: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Pending,
            message: String::new(),
            for_value: for_value.into(),
        }
    }

    /// A valid outcome for the given value, with an optional message
    /// (e.g. "Verified: Jane Smith"). Pass an empty string for no message.
    #[must_use]
    pub fn valid(for_value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Valid,
            message: message.into(),
            for_value: for_value.into(),
        }
    }

    /// An invalid outcome for the given value with the failing rule's message.
    #[must_use]
    pub fn invalid(for_value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Invalid,
            message: message.into(),
            for_value: for_value.into(),
        }
    }

    /// The status of this outcome.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    /// The user-facing message. Empty when there is nothing to show.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The trimmed input value this outcome was produced for.
    #[inline]
    #[must_use]
    pub fn for_value(&self) -> &str {
        &self.for_value
    }

    /// Whether this outcome still corresponds to the given current value.
    ///
    /// The anti-staleness check: an outcome must not be shown for a field
    /// whose value has moved on since the outcome was produced.
    #[inline]
    #[must_use]
    pub fn is_current(&self, current_value: &str) -> bool {
        self.for_value == current_value
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ValidationStatus::Pending
    }

    #[inline]
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.status == ValidationStatus::Invalid
    }
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_empty() {
        let outcome = ValidationOutcome::idle();
        assert_eq!(outcome.status(), ValidationStatus::Idle);
        assert!(outcome.message().is_empty());
        assert!(outcome.for_value().is_empty());
    }

    #[test]
    fn valid_carries_value_and_message() {
        let outcome = ValidationOutcome::valid("ACC0012", "Verified: Jane Smith");
        assert!(outcome.is_valid());
        assert_eq!(outcome.message(), "Verified: Jane Smith");
        assert_eq!(outcome.for_value(), "ACC0012");
    }

    #[test]
    fn staleness_check_compares_for_value() {
        let outcome = ValidationOutcome::valid("ACC0012", "");
        assert!(outcome.is_current("ACC0012"));
        assert!(!outcome.is_current("ACC0099"));
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(ValidationOutcome::default(), ValidationOutcome::idle());
    }

    #[test]
    fn status_names_are_stable() {
        assert_eq!(ValidationStatus::Idle.as_str(), "idle");
        assert_eq!(ValidationStatus::Pending.as_str(), "pending");
        assert_eq!(ValidationStatus::Valid.as_str(), "valid");
        assert_eq!(ValidationStatus::Invalid.as_str(), "invalid");
    }
}
