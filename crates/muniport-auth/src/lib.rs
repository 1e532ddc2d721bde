#![forbid(unsafe_code)]

//! The auth surface of the muniport self-service portal.
//!
//! [`AuthFlow`](flow::AuthFlow) is an Elm-style reducer over the three auth
//! views (login, signup, forgot-password): messages in, state transition,
//! effects out. The signup view owns the debounced, race-safe validation
//! form from `muniport-form`; login and forgot-password use their own,
//! simpler paths. External capabilities — the account directory, the
//! credential check, the reset mail — are traits executed by the driver,
//! never called from the reducer.
//!
//! [`FlowSimulator`](harness::FlowSimulator) drives a flow deterministically
//! for tests: virtual clock, queued lookups, scripted collaborators.

pub mod flow;
pub mod harness;
pub mod services;

pub use flow::{AuthFlow, AuthMsg, AuthView, Effect, SignupPayload};
pub use harness::{EffectRecord, FlowSimulator};
pub use services::{
    CredentialError, CredentialGate, ResetError, ResetGate, ScriptedResetGate,
    StaticCredentialGate,
};
