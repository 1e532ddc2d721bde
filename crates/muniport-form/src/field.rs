#![forbid(unsafe_code)]

//! One reactive unit per input element.
//!
//! A [`FieldController`] owns the field's draft value, its structural
//! outcome, and (for remote-checked fields) the debounce/staleness state of
//! the directory lookup. Composition rules for the visible status:
//!
//! - structural failures win immediately;
//! - `Pending` wins over a structurally valid value while a lookup is
//!   outstanding — a remote-checked field is never `Valid` without a
//!   confirmation for its current value;
//! - empty or below-minimum values are `Idle`, never `Invalid`, so the user
//!   is not flashed errors mid-type;
//! - a resolution is applied only if its generation is current *and* its
//!   originating value equals the current trimmed value.
//!
//! Disposal must go through [`FieldController::dispose`]; it cancels the
//! debouncer so no deadline survives the field.

use std::time::Instant;

use muniport_validate::debounce::{DebounceConfig, DebounceEvent, Debouncer, LookupRequest};
use muniport_validate::lookup::{AccountMatch, DirectoryError};
use muniport_validate::outcome::ValidationOutcome;
use muniport_validate::rules::{RuleContext, RuleSet};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Message shown when the directory failed or the lookup timed out. The
/// underlying cause is logged, never surfaced.
pub const COULD_NOT_VERIFY: &str = "Could not verify account number";

/// Message shown when the directory has no matching record.
pub const ACCOUNT_NOT_FOUND: &str = "Account number not found";

// ---------------------------------------------------------------------------
// FieldSpec
// ---------------------------------------------------------------------------

/// Static description of one field: its rules and validation behavior.
///
/// Rules are defined at startup and shared read-only; the spec itself is
/// cheap to clone into each controller.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    rules: RuleSet,
    required: bool,
    remote_checked: bool,
    depends_on: &'static [&'static str],
}

impl FieldSpec {
    /// A required field with the given rules.
    #[must_use]
    pub fn new(name: &'static str, rules: RuleSet) -> Self {
        Self {
            name,
            rules,
            required: true,
            remote_checked: false,
            depends_on: &[],
        }
    }

    /// Mark the field optional: it may be left empty at submit time.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Mark the field as needing remote directory confirmation.
    #[must_use]
    pub fn remote_checked(mut self) -> Self {
        self.remote_checked = true;
        self
    }

    /// Re-validate this field whenever one of the named fields changes
    /// (cross-field rules such as confirm-password).
    #[must_use]
    pub fn depends_on(mut self, names: &'static [&'static str]) -> Self {
        self.depends_on = names;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[inline]
    #[must_use]
    pub fn is_remote_checked(&self) -> bool {
        self.remote_checked
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &'static [&'static str] {
        self.depends_on
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

// ---------------------------------------------------------------------------
// FieldController
// ---------------------------------------------------------------------------

/// The reactive validation unit bound to one input.
#[derive(Debug)]
pub struct FieldController {
    spec: FieldSpec,
    raw_value: String,
    trimmed: String,
    structural: ValidationOutcome,
    /// Last applied remote outcome; only shown while it matches the current
    /// trimmed value.
    remote: Option<ValidationOutcome>,
    /// Present iff the field is remote-checked.
    debouncer: Option<Debouncer>,
}

impl FieldController {
    #[must_use]
    pub fn new(spec: FieldSpec, config: &DebounceConfig) -> Self {
        let debouncer = spec
            .is_remote_checked()
            .then(|| Debouncer::new(config.clone()));
        Self {
            spec,
            raw_value: String::new(),
            trimmed: String::new(),
            structural: ValidationOutcome::idle(),
            remote: None,
            debouncer,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.spec.name()
    }

    #[inline]
    #[must_use]
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// The draft exactly as typed.
    #[inline]
    #[must_use]
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// The trimmed draft — what validation and lookups run against.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.trimmed
    }

    /// Record a keystroke: update the draft, re-run structural rules
    /// immediately, and (re)arm the debounced lookup when eligible.
    pub fn on_change(&mut self, value: &str, ctx: &RuleContext<'_>, now: Instant) {
        self.raw_value = value.to_string();
        self.trimmed = value.trim().to_string();
        self.structural = self.spec.rules.validate(&self.trimmed, ctx);
        // Any prior confirmation is for a value the user has moved past.
        self.remote = None;

        let Some(debouncer) = &mut self.debouncer else {
            return;
        };
        let eligible = self.structural.is_valid()
            && self.trimmed.graphemes(true).count() >= debouncer.config().min_graphemes;
        if eligible {
            let generation = debouncer.schedule(self.trimmed.clone(), now);
            debug!(
                field = self.spec.name(),
                generation,
                "scheduled directory lookup"
            );
        } else {
            debouncer.cancel();
        }
    }

    /// Re-run structural rules against the current draft without touching
    /// the lookup state. Used when a dependency (e.g. the password under a
    /// confirm-password field) changes.
    pub fn revalidate(&mut self, ctx: &RuleContext<'_>) {
        self.structural = self.spec.rules.validate(&self.trimmed, ctx);
    }

    /// Re-run structural rules with submit-time policy: an empty required
    /// field becomes `Invalid` with its required message.
    pub fn revalidate_for_submit(&mut self, ctx: &RuleContext<'_>) {
        self.structural = if self.spec.is_required() {
            self.spec.rules.validate_for_submit(&self.trimmed, ctx)
        } else {
            self.spec.rules.validate(&self.trimmed, ctx)
        };
    }

    /// Fire a due lookup or expire one that exceeded the bounded wait.
    pub fn poll(&mut self, now: Instant) -> Option<LookupRequest> {
        let debouncer = self.debouncer.as_mut()?;
        match debouncer.poll(now)? {
            DebounceEvent::Due(request) => Some(request),
            DebounceEvent::TimedOut { generation, value } => {
                debug!(
                    field = self.spec.name(),
                    generation, "directory lookup timed out"
                );
                self.remote = Some(ValidationOutcome::invalid(value, COULD_NOT_VERIFY));
                None
            }
        }
    }

    /// Deliver a lookup resolution. Returns `true` if it was applied,
    /// `false` if it was stale (superseded generation or changed value) and
    /// discarded.
    pub fn resolve(
        &mut self,
        generation: u64,
        value: &str,
        result: Result<AccountMatch, DirectoryError>,
    ) -> bool {
        let Some(debouncer) = &mut self.debouncer else {
            return false;
        };
        if !debouncer.acknowledge(generation) {
            debug!(
                field = self.spec.name(),
                generation, "discarded stale lookup resolution"
            );
            return false;
        }
        if value != self.trimmed {
            // The generation guard should already have caught this; the
            // value comparison is the second, independent line of defense.
            debug!(
                field = self.spec.name(),
                generation, "discarded resolution for superseded value"
            );
            return false;
        }

        self.remote = Some(match result {
            Ok(found) if found.found => {
                let message = match found.display_name {
                    Some(name) => format!("Verified: {name}"),
                    None => String::new(),
                };
                ValidationOutcome::valid(value, message)
            }
            Ok(_) => ValidationOutcome::invalid(value, ACCOUNT_NOT_FOUND),
            Err(error) => {
                debug!(
                    field = self.spec.name(),
                    %error,
                    "directory lookup failed"
                );
                ValidationOutcome::invalid(value, COULD_NOT_VERIFY)
            }
        });
        true
    }

    /// The externally visible outcome for this field.
    #[must_use]
    pub fn outcome(&self) -> ValidationOutcome {
        let Some(debouncer) = &self.debouncer else {
            return self.structural.clone();
        };

        if self.structural.is_invalid() {
            return self.structural.clone();
        }
        if self.trimmed.is_empty()
            || self.trimmed.graphemes(true).count() < debouncer.config().min_graphemes
        {
            return ValidationOutcome::idle();
        }
        if !debouncer.is_quiet() {
            return ValidationOutcome::pending(self.trimmed.clone());
        }
        if let Some(remote) = &self.remote
            && remote.is_current(&self.trimmed)
        {
            return remote.clone();
        }
        ValidationOutcome::idle()
    }

    /// Earliest instant at which [`poll`](Self::poll) could produce work.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.as_ref().and_then(Debouncer::next_deadline)
    }

    /// Cancel outstanding work. Required when the field is unmounted; after
    /// this no deadline remains and any late resolution is discarded.
    pub fn dispose(&mut self) {
        if let Some(debouncer) = &mut self.debouncer {
            debouncer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muniport_validate::outcome::ValidationStatus;
    use muniport_validate::rules;
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(500);

    fn account_field() -> FieldController {
        FieldController::new(
            FieldSpec::new(rules::fields::ACCOUNT_NUMBER, rules::account_number_rules())
                .remote_checked(),
            &DebounceConfig::default(),
        )
    }

    fn plain_field() -> FieldController {
        FieldController::new(
            FieldSpec::new(rules::fields::ID_NUMBER, rules::id_number_rules()),
            &DebounceConfig::default(),
        )
    }

    fn change(field: &mut FieldController, value: &str, now: Instant) {
        field.on_change(value, &RuleContext::empty(), now);
    }

    // --- Structural-only fields ---

    #[test]
    fn plain_field_reflects_structural_outcome() {
        let mut field = plain_field();
        let t0 = Instant::now();

        change(&mut field, "8501015026082", t0);
        assert!(field.outcome().is_valid());

        change(&mut field, "850101", t0);
        assert_eq!(
            field.outcome().message(),
            "ID number must be exactly 13 digits"
        );
    }

    #[test]
    fn plain_field_never_polls() {
        let mut field = plain_field();
        let t0 = Instant::now();
        change(&mut field, "8501015026082", t0);
        assert_eq!(field.poll(t0 + DELAY * 2), None);
        assert_eq!(field.next_deadline(), None);
    }

    // --- Idle edges ---

    #[test]
    fn empty_value_is_idle_not_invalid() {
        let mut field = account_field();
        change(&mut field, "", Instant::now());
        assert_eq!(field.outcome().status(), ValidationStatus::Idle);
    }

    #[test]
    fn below_minimum_length_stays_idle_and_schedules_nothing() {
        let mut field = account_field();
        let t0 = Instant::now();
        change(&mut field, "AB1", t0);
        assert_eq!(field.outcome().status(), ValidationStatus::Idle);
        assert_eq!(field.poll(t0 + DELAY * 2), None);
    }

    #[test]
    fn whitespace_only_input_is_idle() {
        let mut field = account_field();
        change(&mut field, "   ", Instant::now());
        assert_eq!(field.outcome().status(), ValidationStatus::Idle);
        assert_eq!(field.value(), "");
    }

    // --- Remote-check lifecycle ---

    #[test]
    fn structurally_valid_value_goes_pending_until_resolved() {
        let mut field = account_field();
        let t0 = Instant::now();

        change(&mut field, "ACC0012", t0);
        assert_eq!(field.outcome().status(), ValidationStatus::Pending);

        let request = field.poll(t0 + DELAY).expect("lookup due");
        assert_eq!(request.value, "ACC0012");
        // Still pending while in flight.
        assert_eq!(field.outcome().status(), ValidationStatus::Pending);

        let applied = field.resolve(
            request.generation,
            &request.value,
            Ok(AccountMatch::named("Jane Smith")),
        );
        assert!(applied);
        let outcome = field.outcome();
        assert!(outcome.is_valid());
        assert_eq!(outcome.message(), "Verified: Jane Smith");
    }

    #[test]
    fn miss_reports_account_not_found() {
        let mut field = account_field();
        let t0 = Instant::now();
        change(&mut field, "9999", t0);
        let request = field.poll(t0 + DELAY).expect("lookup due");
        field.resolve(request.generation, &request.value, Ok(AccountMatch::miss()));
        let outcome = field.outcome();
        assert!(outcome.is_invalid());
        assert_eq!(outcome.message(), "Account number not found");
    }

    #[test]
    fn directory_error_maps_to_generic_message() {
        let mut field = account_field();
        let t0 = Instant::now();
        change(&mut field, "1001", t0);
        let request = field.poll(t0 + DELAY).expect("lookup due");
        field.resolve(
            request.generation,
            &request.value,
            Err(DirectoryError::Unavailable {
                detail: "socket closed".to_string(),
            }),
        );
        assert_eq!(field.outcome().message(), COULD_NOT_VERIFY);
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let mut field = account_field();
        let t0 = Instant::now();

        change(&mut field, "ACC0012", t0);
        let request = field.poll(t0 + DELAY).expect("lookup due");

        // User keeps typing before the lookup resolves.
        change(&mut field, "ACC0099", t0 + DELAY + Duration::from_millis(50));

        let applied = field.resolve(
            request.generation,
            &request.value,
            Ok(AccountMatch::named("Jane Smith")),
        );
        assert!(!applied);
        // The field is pending on the new value, not valid for the old one.
        let outcome = field.outcome();
        assert_eq!(outcome.status(), ValidationStatus::Pending);
        assert_eq!(outcome.for_value(), "ACC0099");
    }

    #[test]
    fn timeout_expires_to_invalid() {
        let mut field = account_field();
        let t0 = Instant::now();
        change(&mut field, "1001", t0);
        field.poll(t0 + DELAY).expect("lookup due");

        let expired = t0 + DELAY + Duration::from_secs(5);
        assert_eq!(field.poll(expired), None);
        let outcome = field.outcome();
        assert!(outcome.is_invalid());
        assert_eq!(outcome.message(), COULD_NOT_VERIFY);
    }

    #[test]
    fn reediting_after_timeout_gives_a_fresh_chance() {
        let mut field = account_field();
        let t0 = Instant::now();
        change(&mut field, "1001", t0);
        field.poll(t0 + DELAY).expect("lookup due");
        field.poll(t0 + DELAY + Duration::from_secs(5));
        assert!(field.outcome().is_invalid());

        let t1 = t0 + Duration::from_secs(10);
        change(&mut field, "1001", t1);
        assert_eq!(field.outcome().status(), ValidationStatus::Pending);
        let request = field.poll(t1 + DELAY).expect("fresh lookup");
        field.resolve(
            request.generation,
            &request.value,
            Ok(AccountMatch::named("John Doe")),
        );
        assert!(field.outcome().is_valid());
    }

    #[test]
    fn structural_failure_suppresses_lookup() {
        let mut field = account_field();
        let t0 = Instant::now();
        change(&mut field, "ACC-0012", t0);
        assert_eq!(
            field.outcome().message(),
            "Account number may only contain letters and digits"
        );
        assert_eq!(field.poll(t0 + DELAY * 2), None);
    }

    #[test]
    fn dispose_cancels_outstanding_work() {
        let mut field = account_field();
        let t0 = Instant::now();
        change(&mut field, "ACC0012", t0);
        let request = field.poll(t0 + DELAY).expect("lookup due");

        field.dispose();
        assert_eq!(field.next_deadline(), None);
        assert!(!field.resolve(
            request.generation,
            &request.value,
            Ok(AccountMatch::named("Jane Smith"))
        ));
    }

    // --- Submit-time policy ---

    #[test]
    fn submit_revalidation_surfaces_required_message() {
        let mut field = plain_field();
        field.revalidate_for_submit(&RuleContext::empty());
        let outcome = field.outcome();
        assert!(outcome.is_invalid());
        assert_eq!(outcome.message(), "ID number is required");
    }

    #[test]
    fn optional_field_may_stay_empty_at_submit() {
        let mut field = FieldController::new(
            FieldSpec::new(rules::fields::EMAIL, rules::email_rules()).optional(),
            &DebounceConfig::default(),
        );
        field.revalidate_for_submit(&RuleContext::empty());
        assert_eq!(field.outcome().status(), ValidationStatus::Idle);
    }
}
