#![forbid(unsafe_code)]

//! The auth view state machine: login, signup, forgot-password.
//!
//! [`AuthFlow`] is a reducer: [`update`](AuthFlow::update) consumes one
//! [`AuthMsg`] and returns an [`Effect`] describing the side effects the
//! driver must execute (run a directory lookup, check credentials, send a
//! reset mail, hand off a completed signup, wake up at an instant). The flow
//! itself performs no I/O and renders nothing.
//!
//! View transitions are user-triggered only. Switching views preserves the
//! other views' in-progress drafts; a successful signup clears the signup
//! draft and returns to `Login`.

use std::time::Instant;

use muniport_form::field::FieldSpec;
use muniport_form::form::{FieldLookup, Form};
use muniport_validate::debounce::DebounceConfig;
use muniport_validate::lookup::{AccountMatch, DirectoryError};
use muniport_validate::outcome::ValidationOutcome;
use muniport_validate::rules::{self, RuleContext, fields};
use tracing::debug;

use crate::services::{CredentialError, ResetError};

/// Aggregate message for a rejected login. Per-field detail is deliberately
/// withheld.
pub const LOGIN_FAILED: &str = "Invalid email or password";

/// Shown when a reset is requested with an empty email field.
pub const RESET_EMAIL_REQUIRED: &str = "Please enter your email address";

/// Shown when a reset is requested for a malformed email.
pub const RESET_EMAIL_INVALID: &str = "Please enter a valid email address";

/// Shown after the reset mail was handed off successfully.
pub const RESET_SENT: &str = "Password reset link has been sent to your email";

/// Shown when the reset collaborator failed.
pub const RESET_FAILED: &str = "Failed to send reset email. Please try again.";

// ---------------------------------------------------------------------------
// Views, messages, effects
// ---------------------------------------------------------------------------

/// The three views of the auth surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthView {
    #[default]
    Login,
    Signup,
    ForgotPassword,
}

impl AuthView {
    /// Stable name for tracing and diagnostics.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::ForgotPassword => "forgot_password",
        }
    }
}

/// The clean output of a completed signup.
///
/// Only emitted when every field's outcome, including the remote-confirmed
/// account number, is `Valid`. What the caller does with it (persistence,
/// session start) is outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignupPayload {
    pub full_name: String,
    pub email: String,
    pub id_number: String,
    pub cellphone: String,
    pub account_number: String,
    pub password: String,
}

/// Everything that can happen to the auth surface.
#[derive(Debug, Clone)]
pub enum AuthMsg {
    /// Switch to the login view ("Back to login", "Login").
    ShowLogin,
    /// Switch to the signup view ("Sign up").
    ShowSignup,
    /// Switch to the forgot-password view ("Forgot password?").
    ShowForgotPassword,

    /// Keystroke in the login email field.
    LoginEmailChanged(String),
    /// Keystroke in the login password field.
    LoginPasswordChanged(String),
    /// Keystroke in a signup field, by field name.
    SignupFieldChanged {
        field: &'static str,
        value: String,
    },
    /// Keystroke in the forgot-password email field.
    ResetEmailChanged(String),

    /// Time advanced; fire due lookups and expire timed-out ones.
    Tick,
    /// A directory lookup the driver executed has resolved.
    LookupResolved {
        field: &'static str,
        generation: u64,
        value: String,
        result: Result<AccountMatch, DirectoryError>,
    },

    /// Login form submitted.
    SubmitLogin,
    /// The credential check the driver executed has resolved.
    LoginResolved(Result<(), CredentialError>),

    /// Signup form submitted.
    SubmitSignup,
    /// The emitted signup payload was rejected downstream; shown as a
    /// form-level message, distinct from per-field errors.
    SignupRejected(String),

    /// Forgot-password form submitted.
    SubmitReset,
    /// The reset hand-off the driver executed has resolved.
    ResetResolved(Result<(), ResetError>),
}

/// A side effect for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Effect {
    /// Nothing to do.
    #[default]
    None,
    /// Execute a directory lookup, then feed back
    /// [`AuthMsg::LookupResolved`].
    Lookup(FieldLookup),
    /// Check credentials, then feed back [`AuthMsg::LoginResolved`].
    Authenticate {
        email: String,
        password: String,
    },
    /// Hand the email to the reset collaborator, then feed back
    /// [`AuthMsg::ResetResolved`].
    SendReset {
        email: String,
    },
    /// A signup completed; hand the payload to the caller.
    EmitSignup(SignupPayload),
    /// Wake the flow with [`AuthMsg::Tick`] no later than this instant.
    Schedule(Instant),
    /// Execute several effects.
    Batch(Vec<Effect>),
}

impl Effect {
    /// Create a no-op effect.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a batch, collapsing the trivial cases.
    #[must_use]
    pub fn batch(effects: Vec<Self>) -> Self {
        let mut effects: Vec<Self> = effects
            .into_iter()
            .filter(|e| !matches!(e, Self::None))
            .collect();
        match effects.len() {
            0 => Self::None,
            1 => effects.remove(0),
            _ => Self::Batch(effects),
        }
    }

    /// Return a stable name for telemetry and tracing.
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Lookup(_) => "Lookup",
            Self::Authenticate { .. } => "Authenticate",
            Self::SendReset { .. } => "SendReset",
            Self::EmitSignup(_) => "EmitSignup",
            Self::Schedule(_) => "Schedule",
            Self::Batch(_) => "Batch",
        }
    }
}

// ---------------------------------------------------------------------------
// Field specs
// ---------------------------------------------------------------------------

/// The signup form's seven fields, in display order. The account number is
/// remote-checked; the confirmation re-validates whenever the password
/// changes.
#[must_use]
pub fn signup_field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(fields::FULL_NAME, rules::full_name_rules()),
        FieldSpec::new(fields::EMAIL, rules::email_rules()),
        FieldSpec::new(fields::ID_NUMBER, rules::id_number_rules()),
        FieldSpec::new(fields::CELLPHONE, rules::cellphone_rules()),
        FieldSpec::new(fields::ACCOUNT_NUMBER, rules::account_number_rules()).remote_checked(),
        FieldSpec::new(fields::PASSWORD, rules::password_rules()),
        FieldSpec::new(fields::CONFIRM_PASSWORD, rules::confirm_password_rules())
            .depends_on(&[fields::PASSWORD]),
    ]
}

// ---------------------------------------------------------------------------
// AuthFlow
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LoginDraft {
    email: String,
    password: String,
    error: Option<String>,
}

#[derive(Debug, Default)]
struct ResetDraft {
    email: String,
    error: Option<String>,
    notice: Option<String>,
}

/// The auth surface reducer.
#[derive(Debug)]
pub struct AuthFlow {
    view: AuthView,
    login: LoginDraft,
    signup: Form,
    signup_error: Option<String>,
    reset: ResetDraft,
    /// Email of the authenticated user after a successful login.
    session: Option<String>,
    config: DebounceConfig,
}

impl AuthFlow {
    /// A flow starting on the login view with an empty signup form.
    #[must_use]
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            view: AuthView::Login,
            login: LoginDraft::default(),
            signup: Form::new(signup_field_specs(), &config),
            signup_error: None,
            reset: ResetDraft::default(),
            session: None,
            config,
        }
    }

    /// Consume one message, mutate state, and return the effects to run.
    pub fn update(&mut self, msg: AuthMsg, now: Instant) -> Effect {
        match msg {
            AuthMsg::ShowLogin => self.switch_view(AuthView::Login),
            AuthMsg::ShowSignup => self.switch_view(AuthView::Signup),
            AuthMsg::ShowForgotPassword => self.switch_view(AuthView::ForgotPassword),

            AuthMsg::LoginEmailChanged(value) => {
                self.login.email = value;
                Effect::None
            }
            AuthMsg::LoginPasswordChanged(value) => {
                self.login.password = value;
                Effect::None
            }
            AuthMsg::SignupFieldChanged { field, value } => {
                self.signup.on_change(field, &value, now);
                self.wake_effect()
            }
            AuthMsg::ResetEmailChanged(value) => {
                self.reset.email = value;
                Effect::None
            }

            AuthMsg::Tick => {
                let due = self.signup.poll(now);
                let mut effects: Vec<Effect> = due.into_iter().map(Effect::Lookup).collect();
                effects.push(self.wake_effect());
                Effect::batch(effects)
            }
            AuthMsg::LookupResolved {
                field,
                generation,
                value,
                result,
            } => {
                self.signup.resolve(field, generation, &value, result);
                Effect::None
            }

            AuthMsg::SubmitLogin => {
                self.login.error = None;
                debug!(email = %self.login.email, "credential check dispatched");
                Effect::Authenticate {
                    email: self.login.email.trim().to_string(),
                    password: self.login.password.clone(),
                }
            }
            AuthMsg::LoginResolved(Ok(())) => {
                self.session = Some(self.login.email.trim().to_string());
                self.login.password.clear();
                debug!("login accepted");
                Effect::None
            }
            AuthMsg::LoginResolved(Err(error)) => {
                debug!(%error, "login rejected");
                self.login.error = Some(LOGIN_FAILED.to_string());
                Effect::None
            }

            AuthMsg::SubmitSignup => self.submit_signup(),
            AuthMsg::SignupRejected(message) => {
                self.signup_error = Some(message);
                Effect::None
            }

            AuthMsg::SubmitReset => self.submit_reset(),
            AuthMsg::ResetResolved(Ok(())) => {
                self.reset.notice = Some(RESET_SENT.to_string());
                self.reset.email.clear();
                Effect::None
            }
            AuthMsg::ResetResolved(Err(error)) => {
                debug!(%error, "reset hand-off failed");
                self.reset.error = Some(RESET_FAILED.to_string());
                Effect::None
            }
        }
    }

    fn switch_view(&mut self, to: AuthView) -> Effect {
        if self.view != to {
            debug!(from = self.view.as_str(), to = to.as_str(), "view switch");
            self.view = to;
        }
        // Drafts in the other views are preserved.
        Effect::None
    }

    fn submit_signup(&mut self) -> Effect {
        self.signup_error = None;
        match self.signup.submit() {
            Ok(values) => {
                let payload = SignupPayload {
                    full_name: value_of(&values, fields::FULL_NAME),
                    email: value_of(&values, fields::EMAIL),
                    id_number: value_of(&values, fields::ID_NUMBER),
                    cellphone: value_of(&values, fields::CELLPHONE),
                    account_number: value_of(&values, fields::ACCOUNT_NUMBER),
                    password: value_of(&values, fields::PASSWORD),
                };
                // Fresh draft for the next visitor, and back to login.
                self.signup.dispose();
                self.signup = Form::new(signup_field_specs(), &self.config);
                self.view = AuthView::Login;
                debug!("signup completed");
                Effect::EmitSignup(payload)
            }
            Err(reason) => {
                debug!(%reason, "signup refused");
                Effect::None
            }
        }
    }

    fn submit_reset(&mut self) -> Effect {
        self.reset.error = None;
        self.reset.notice = None;

        let email = self.reset.email.trim().to_string();
        if email.is_empty() {
            self.reset.error = Some(RESET_EMAIL_REQUIRED.to_string());
            return Effect::None;
        }
        if !rules::email_rules()
            .validate(&email, &RuleContext::empty())
            .is_valid()
        {
            self.reset.error = Some(RESET_EMAIL_INVALID.to_string());
            return Effect::None;
        }
        debug!("reset hand-off dispatched");
        Effect::SendReset { email }
    }

    /// A `Schedule` effect for the form's next deadline, or `None`.
    fn wake_effect(&self) -> Effect {
        match self.signup.next_deadline() {
            Some(at) => Effect::Schedule(at),
            None => Effect::None,
        }
    }

    // --- Accessors ---

    /// The currently shown view.
    #[inline]
    #[must_use]
    pub fn view(&self) -> AuthView {
        self.view
    }

    /// The signup form, for reading field outcomes and values.
    #[inline]
    #[must_use]
    pub fn signup_form(&self) -> &Form {
        &self.signup
    }

    /// The form-level signup error from a downstream rejection, if any.
    #[must_use]
    pub fn signup_error(&self) -> Option<&str> {
        self.signup_error.as_deref()
    }

    /// Outcome of one signup field, by name.
    #[must_use]
    pub fn signup_outcome(&self, field: &str) -> Option<ValidationOutcome> {
        self.signup.outcome_of(field)
    }

    /// The login email draft.
    #[must_use]
    pub fn login_email(&self) -> &str {
        &self.login.email
    }

    /// The aggregate login error, if the last attempt was rejected.
    #[must_use]
    pub fn login_error(&self) -> Option<&str> {
        self.login.error.as_deref()
    }

    /// Email of the authenticated user after a successful login.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// The forgot-password email draft.
    #[must_use]
    pub fn reset_email(&self) -> &str {
        &self.reset.email
    }

    /// The forgot-password error message, if any.
    #[must_use]
    pub fn reset_error(&self) -> Option<&str> {
        self.reset.error.as_deref()
    }

    /// The forgot-password success notice, if any.
    #[must_use]
    pub fn reset_notice(&self) -> Option<&str> {
        self.reset.notice.as_deref()
    }

    /// Earliest instant at which a [`AuthMsg::Tick`] could produce work.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.signup.next_deadline()
    }

    /// Cancel all outstanding validation work. Required when the surface is
    /// torn down.
    pub fn dispose(&mut self) {
        self.signup.dispose();
    }
}

impl Default for AuthFlow {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

fn value_of(values: &[(&'static str, String)], name: &str) -> String {
    values
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}
