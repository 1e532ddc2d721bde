#![forbid(unsafe_code)]

//! Password strength criteria.
//!
//! The portal shows a live checklist while the user types a password, so the
//! five criteria are evaluated independently rather than collapsed into a
//! single pass/fail. [`satisfied`] returns the met set as bitflags;
//! [`PasswordCriteria::label`] gives the checklist line for each criterion.

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;

/// Characters accepted by the [`PasswordCriteria::SYMBOL`] criterion.
pub const SYMBOL_SET: &str = "!@#$%^&*(),.?\":{}|<>";

/// Minimum password length in graphemes.
pub const MIN_PASSWORD_GRAPHEMES: usize = 8;

bitflags! {
    /// The independent password criteria. A password is strong when all
    /// criteria are met.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PasswordCriteria: u8 {
        /// At least [`MIN_PASSWORD_GRAPHEMES`] characters.
        const MIN_LENGTH = 1 << 0;
        /// At least one ASCII uppercase letter.
        const UPPERCASE = 1 << 1;
        /// At least one ASCII lowercase letter.
        const LOWERCASE = 1 << 2;
        /// At least one ASCII digit.
        const DIGIT = 1 << 3;
        /// At least one character from [`SYMBOL_SET`].
        const SYMBOL = 1 << 4;
    }
}

impl PasswordCriteria {
    /// Checklist ordering, as presented to the user.
    pub const CHECKLIST: [PasswordCriteria; 5] = [
        PasswordCriteria::MIN_LENGTH,
        PasswordCriteria::UPPERCASE,
        PasswordCriteria::LOWERCASE,
        PasswordCriteria::DIGIT,
        PasswordCriteria::SYMBOL,
    ];

    /// The user-facing checklist label for a single criterion.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not exactly one criterion.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            c if c == Self::MIN_LENGTH => "At least 8 characters",
            c if c == Self::UPPERCASE => "One uppercase letter",
            c if c == Self::LOWERCASE => "One lowercase letter",
            c if c == Self::DIGIT => "One number",
            c if c == Self::SYMBOL => "One special character (!@#$%^&*)",
            _ => panic!("label() requires a single criterion"),
        }
    }
}

/// Evaluate which criteria the given password meets.
#[must_use]
pub fn satisfied(password: &str) -> PasswordCriteria {
    let mut met = PasswordCriteria::empty();
    if password.graphemes(true).count() >= MIN_PASSWORD_GRAPHEMES {
        met |= PasswordCriteria::MIN_LENGTH;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        met |= PasswordCriteria::UPPERCASE;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        met |= PasswordCriteria::LOWERCASE;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        met |= PasswordCriteria::DIGIT;
    }
    if password.chars().any(|c| SYMBOL_SET.contains(c)) {
        met |= PasswordCriteria::SYMBOL;
    }
    met
}

/// Whether the password meets every criterion.
#[inline]
#[must_use]
pub fn is_strong(password: &str) -> bool {
    satisfied(password).is_all()
}

/// The first unmet criterion in checklist order, if any.
///
/// Used as the aggregate failure message when a single line is wanted.
#[must_use]
pub fn first_unmet(password: &str) -> Option<PasswordCriteria> {
    let met = satisfied(password);
    PasswordCriteria::CHECKLIST
        .into_iter()
        .find(|c| !met.contains(*c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lowercase_only_meets_one_criterion() {
        // "abc": too short, no upper, no digit, no symbol; only lowercase.
        let met = satisfied("abc");
        assert_eq!(met, PasswordCriteria::LOWERCASE);
    }

    #[test]
    fn strong_password_meets_all() {
        assert!(is_strong("Abcdef1!"));
        assert_eq!(satisfied("Abcdef1!"), PasswordCriteria::all());
    }

    #[test]
    fn empty_password_meets_none() {
        assert!(satisfied("").is_empty());
        assert!(!is_strong(""));
    }

    #[test]
    fn symbol_set_matches_observed_characters() {
        for c in "!@#$%^&*(),.?\":{}|<>".chars() {
            let pw = format!("Abcdefg1{c}");
            assert!(is_strong(&pw), "symbol {c:?} should satisfy SYMBOL");
        }
        // Characters outside the set do not count as symbols.
        assert!(!satisfied("Abcdefg1-").contains(PasswordCriteria::SYMBOL));
        assert!(!satisfied("Abcdefg1_").contains(PasswordCriteria::SYMBOL));
    }

    #[test]
    fn first_unmet_follows_checklist_order() {
        assert_eq!(first_unmet("abc"), Some(PasswordCriteria::MIN_LENGTH));
        assert_eq!(first_unmet("abcdefgh"), Some(PasswordCriteria::UPPERCASE));
        assert_eq!(first_unmet("ABCDEFGH"), Some(PasswordCriteria::LOWERCASE));
        assert_eq!(first_unmet("Abcdefgh"), Some(PasswordCriteria::DIGIT));
        assert_eq!(first_unmet("Abcdefg1"), Some(PasswordCriteria::SYMBOL));
        assert_eq!(first_unmet("Abcdef1!"), None);
    }

    #[test]
    fn labels_match_checklist() {
        let labels: Vec<&str> = PasswordCriteria::CHECKLIST
            .into_iter()
            .map(PasswordCriteria::label)
            .collect();
        assert_eq!(
            labels,
            [
                "At least 8 characters",
                "One uppercase letter",
                "One lowercase letter",
                "One number",
                "One special character (!@#$%^&*)",
            ]
        );
    }

    #[test]
    fn length_counts_graphemes_not_bytes() {
        // Four two-byte characters plus the rest: 8 graphemes total.
        assert!(satisfied("Ãéîõü1!x").contains(PasswordCriteria::MIN_LENGTH));
    }
}
