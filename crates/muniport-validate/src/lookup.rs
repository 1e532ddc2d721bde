#![forbid(unsafe_code)]

//! The account-directory boundary.
//!
//! The remote check behind account-number verification is abstracted as
//! [`AccountDirectory`]: given a trimmed account number, report whether a
//! matching record exists. Implementations may query a document store, call
//! an HTTP service, or serve from memory — the pipeline only requires that
//! the call is idempotent, that a clean miss is `found = false` rather than
//! an error, and that it resolves (the bounded wait in
//! [`debounce`](crate::debounce) handles the ones that don't).
//!
//! [`StaticDirectory`] is the in-memory implementation used by tests and
//! fixtures. It is injected like any other directory; nothing in the
//! pipeline reaches for a global table.

use std::collections::BTreeMap;

/// Result of a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMatch {
    /// Whether at least one record matched.
    pub found: bool,
    /// Display name from the matched record, when the directory carries one.
    pub display_name: Option<String>,
}

impl AccountMatch {
    /// A match with a display name.
    #[must_use]
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            found: true,
            display_name: Some(display_name.into()),
        }
    }

    /// A match without a display name.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            found: true,
            display_name: None,
        }
    }

    /// A clean miss.
    #[must_use]
    pub fn miss() -> Self {
        Self {
            found: false,
            display_name: None,
        }
    }
}

/// Infrastructure failure while querying the directory.
///
/// A miss is not an error; this type is reserved for the directory being
/// unreachable or the query itself failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The directory could not be reached or the query failed.
    Unavailable { detail: String },
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { detail } => {
                write!(f, "account directory unavailable: {detail}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

/// The record-lookup capability the validation pipeline consumes.
///
/// `Send + Sync` because drivers execute lookups off the update loop.
pub trait AccountDirectory: Send + Sync {
    /// Find a record whose account number equals `account_number`.
    fn find_account(&self, account_number: &str) -> Result<AccountMatch, DirectoryError>;
}

/// In-memory directory over a fixed account table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    accounts: BTreeMap<String, String>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account number with its holder's display name (builder).
    #[must_use]
    pub fn with_account(
        mut self,
        account_number: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        self.accounts
            .insert(account_number.into(), display_name.into());
        self
    }

    /// Number of accounts in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountDirectory for StaticDirectory {
    fn find_account(&self, account_number: &str) -> Result<AccountMatch, DirectoryError> {
        Ok(match self.accounts.get(account_number) {
            Some(name) => AccountMatch::named(name.clone()),
            None => AccountMatch::miss(),
        })
    }
}
