#![forbid(unsafe_code)]

//! Collaborator traits for the auth flow.
//!
//! Login and password reset are external capabilities: the flow only emits
//! [`Effect::Authenticate`](crate::flow::Effect::Authenticate) and
//! [`Effect::SendReset`](crate::flow::Effect::SendReset); the driver executes
//! them against these traits and feeds the results back as messages. Both
//! ship a deterministic implementation for tests and fixtures.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// Why a credential check did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The email/password pair does not match an account.
    Rejected,
    /// The authentication service could not be reached.
    Unavailable { detail: String },
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected => write!(f, "credentials rejected"),
            Self::Unavailable { detail } => {
                write!(f, "authentication service unavailable: {detail}")
            }
        }
    }
}

impl std::error::Error for CredentialError {}

/// Why a reset hand-off failed. A reset for an unknown email is not a
/// failure; the service stays silent about which addresses exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetError {
    /// The reset mail could not be handed off.
    Unavailable { detail: String },
}

impl std::fmt::Display for ResetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { detail } => write!(f, "reset service unavailable: {detail}"),
        }
    }
}

impl std::error::Error for ResetError {}

/// The credential-check capability behind the login view.
pub trait CredentialGate: Send + Sync {
    /// Check one email/password pair. `Ok(())` starts a session.
    fn authenticate(&self, email: &str, password: &str) -> Result<(), CredentialError>;
}

/// The password-reset capability behind the forgot-password view.
pub trait ResetGate: Send + Sync {
    /// Hand the email off for a reset mail.
    fn send_reset(&self, email: &str) -> Result<(), ResetError>;
}

/// Credential gate over a fixed email/password table.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialGate {
    accounts: BTreeMap<String, String>,
}

impl StaticCredentialGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account (builder).
    #[must_use]
    pub fn with_account(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.accounts.insert(email.into(), password.into());
        self
    }
}

impl CredentialGate for StaticCredentialGate {
    fn authenticate(&self, email: &str, password: &str) -> Result<(), CredentialError> {
        match self.accounts.get(email) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(CredentialError::Rejected),
        }
    }
}

/// Reset gate that records every request and answers from a script.
///
/// With an empty script every request succeeds; pushed responses are
/// consumed front-to-back.
#[derive(Debug, Default)]
pub struct ScriptedResetGate {
    script: Mutex<VecDeque<Result<(), ResetError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedResetGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response for the next request.
    pub fn push_response(&self, response: Result<(), ResetError>) {
        self.script
            .lock()
            .expect("reset gate script lock")
            .push_back(response);
    }

    /// Every email handed to [`ResetGate::send_reset`], in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("reset gate request lock")
            .clone()
    }
}

impl ResetGate for ScriptedResetGate {
    fn send_reset(&self, email: &str) -> Result<(), ResetError> {
        self.requests
            .lock()
            .expect("reset gate request lock")
            .push(email.to_string());
        self.script
            .lock()
            .expect("reset gate script lock")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
