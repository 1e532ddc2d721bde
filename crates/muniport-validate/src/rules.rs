#![forbid(unsafe_code)]

//! The field rule engine: pure, synchronous structural validation.
//!
//! Rules are total functions over `(value, context)` — no I/O, no panics,
//! cheap enough to run on every keystroke. A [`RuleSet`] evaluates its rules
//! in order and reports the first failure.
//!
//! Two entry points with different empty-value policy:
//!
//! - [`RuleSet::validate`] is the keystroke path: an empty value yields
//!   `Idle` so the user is not shouted at while the field is untouched.
//! - [`RuleSet::validate_for_submit`] is the final guard: an empty value on
//!   a required field yields `Invalid` with the field's required message.
//!
//! Cross-field rules (confirm password) read sibling values through the
//! [`RuleContext`] supplied by the form.

use crate::outcome::ValidationOutcome;
use crate::password;
use unicode_segmentation::UnicodeSegmentation;

/// Canonical field names used by the portal's signup form.
pub mod fields {
    pub const FULL_NAME: &str = "full_name";
    pub const EMAIL: &str = "email";
    pub const ID_NUMBER: &str = "id_number";
    pub const CELLPHONE: &str = "cellphone";
    pub const ACCOUNT_NUMBER: &str = "account_number";
    pub const PASSWORD: &str = "password";
    pub const CONFIRM_PASSWORD: &str = "confirm_password";
}

/// Read-only view of sibling field values for cross-field rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    entries: &'a [(&'static str, String)],
}

impl<'a> RuleContext<'a> {
    /// A context with no sibling values.
    #[must_use]
    pub fn empty() -> Self {
        Self { entries: &[] }
    }

    /// Build a context over a snapshot of `(field name, trimmed value)` pairs.
    #[must_use]
    pub fn new(entries: &'a [(&'static str, String)]) -> Self {
        Self { entries }
    }

    /// The current trimmed value of the named sibling field, if present.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A rule predicate. Returns `true` when the value passes.
pub type RulePredicate = fn(&str, &RuleContext<'_>) -> bool;

/// One structural rule: an id for diagnostics, the message shown on
/// failure, and the predicate.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    id: &'static str,
    message: &'static str,
    predicate: RulePredicate,
}

impl FieldRule {
    #[must_use]
    pub const fn new(id: &'static str, message: &'static str, predicate: RulePredicate) -> Self {
        Self {
            id,
            message,
            predicate,
        }
    }

    /// Evaluate the rule against a value.
    #[inline]
    #[must_use]
    pub fn check(&self, value: &str, ctx: &RuleContext<'_>) -> bool {
        (self.predicate)(value, ctx)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.message
    }
}

/// An ordered set of rules for one field type, shared read-only across all
/// instances of that field.
#[derive(Debug, Clone)]
pub struct RuleSet {
    required_message: &'static str,
    rules: Vec<FieldRule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(required_message: &'static str, rules: Vec<FieldRule>) -> Self {
        Self {
            required_message,
            rules,
        }
    }

    /// The message shown when a required field is submitted empty.
    #[inline]
    #[must_use]
    pub fn required_message(&self) -> &'static str {
        self.required_message
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Keystroke-time validation. Empty values are `Idle`, never `Invalid`.
    #[must_use]
    pub fn validate(&self, value: &str, ctx: &RuleContext<'_>) -> ValidationOutcome {
        if value.is_empty() {
            return ValidationOutcome::idle();
        }
        self.check_rules(value, ctx)
    }

    /// Submit-time validation. Empty values on a required field fail with
    /// the required message.
    #[must_use]
    pub fn validate_for_submit(&self, value: &str, ctx: &RuleContext<'_>) -> ValidationOutcome {
        if value.is_empty() {
            return ValidationOutcome::invalid(value, self.required_message);
        }
        self.check_rules(value, ctx)
    }

    fn check_rules(&self, value: &str, ctx: &RuleContext<'_>) -> ValidationOutcome {
        for rule in &self.rules {
            if !rule.check(value, ctx) {
                return ValidationOutcome::invalid(value, rule.message());
            }
        }
        ValidationOutcome::valid(value, "")
    }
}

// ---------------------------------------------------------------------------
// Built-in rule sets
// ---------------------------------------------------------------------------

/// Full name: non-empty is the only structural requirement.
#[must_use]
pub fn full_name_rules() -> RuleSet {
    RuleSet::new("Full name is required", Vec::new())
}

/// Email: simple `local@domain.tld` shape.
#[must_use]
pub fn email_rules() -> RuleSet {
    RuleSet::new(
        "Email address is required",
        vec![FieldRule::new(
            "email_format",
            "Invalid email format",
            is_email_shape,
        )],
    )
}

/// National ID number: exactly 13 digits.
#[must_use]
pub fn id_number_rules() -> RuleSet {
    RuleSet::new(
        "ID number is required",
        vec![FieldRule::new(
            "id_digits",
            "ID number must be exactly 13 digits",
            |v, _| is_exact_digits(v, 13),
        )],
    )
}

/// Cellphone number: exactly 10 digits.
#[must_use]
pub fn cellphone_rules() -> RuleSet {
    RuleSet::new(
        "Cellphone number is required",
        vec![FieldRule::new(
            "phone_digits",
            "Phone number must be 10 digits",
            |v, _| is_exact_digits(v, 10),
        )],
    )
}

/// Account number: alphanumeric, 1–20 characters. Full validity also needs
/// the remote directory confirmation, which lives outside this engine.
#[must_use]
pub fn account_number_rules() -> RuleSet {
    RuleSet::new(
        "Account number is required",
        vec![
            FieldRule::new(
                "account_alnum",
                "Account number may only contain letters and digits",
                |v, _| v.chars().all(|c| c.is_ascii_alphanumeric()),
            ),
            FieldRule::new(
                "account_length",
                "Account number must be at most 20 characters",
                |v, _| v.graphemes(true).count() <= 20,
            ),
        ],
    )
}

/// Password: the five independent criteria, in checklist order, so the
/// first failure message is the first unmet checklist line.
#[must_use]
pub fn password_rules() -> RuleSet {
    RuleSet::new(
        "Password is required",
        vec![
            FieldRule::new("length", "At least 8 characters", |v, _| {
                password::satisfied(v).contains(password::PasswordCriteria::MIN_LENGTH)
            }),
            FieldRule::new("uppercase", "One uppercase letter", |v, _| {
                password::satisfied(v).contains(password::PasswordCriteria::UPPERCASE)
            }),
            FieldRule::new("lowercase", "One lowercase letter", |v, _| {
                password::satisfied(v).contains(password::PasswordCriteria::LOWERCASE)
            }),
            FieldRule::new("number", "One number", |v, _| {
                password::satisfied(v).contains(password::PasswordCriteria::DIGIT)
            }),
            FieldRule::new("special", "One special character (!@#$%^&*)", |v, _| {
                password::satisfied(v).contains(password::PasswordCriteria::SYMBOL)
            }),
        ],
    )
}

/// Confirm password: must equal the current password value. Re-run whenever
/// either field changes.
#[must_use]
pub fn confirm_password_rules() -> RuleSet {
    RuleSet::new(
        "Please confirm your password",
        vec![FieldRule::new(
            "password_match",
            "Passwords do not match",
            |v, ctx| ctx.value_of(fields::PASSWORD) == Some(v),
        )],
    )
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn is_email_shape(value: &str, _: &RuleContext<'_>) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some(at) = value.find('@') else {
        return false;
    };
    let local = &value[..at];
    let rest = &value[at + 1..];
    let Some(dot) = rest.rfind('.') else {
        return false;
    };
    let domain = &rest[..dot];
    let tld = &rest[dot + 1..];
    !local.is_empty() && !domain.is_empty() && !tld.is_empty()
}

fn is_exact_digits(value: &str, n: usize) -> bool {
    value.len() == n && value.bytes().all(|b| b.is_ascii_digit())
}
