#![forbid(unsafe_code)]

//! Deterministic driver for testing the auth flow.
//!
//! [`FlowSimulator`] runs an [`AuthFlow`] without timers, threads, or I/O: a
//! virtual clock advances only through [`advance`](FlowSimulator::advance),
//! and due lookups are queued rather than executed so tests control exactly
//! when and with what each one resolves — the only way to exercise the
//! stale-response paths reliably.
//!
//! Credential checks and reset hand-offs run synchronously against the
//! injected gates, with the result fed straight back into the flow. Emitted
//! signup payloads and every executed effect are captured for assertion.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use muniport_form::form::FieldLookup;
use muniport_validate::debounce::DebounceConfig;
use muniport_validate::lookup::{AccountDirectory, AccountMatch, DirectoryError};

use crate::flow::{AuthFlow, AuthMsg, Effect, SignupPayload};
use crate::services::{CredentialGate, ResetGate};

/// Record of an effect the simulator executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectRecord {
    /// No-op effect.
    None,
    /// Lookup queued for the named field.
    Lookup { field: &'static str },
    /// Credential check executed synchronously.
    Authenticate,
    /// Reset hand-off executed synchronously.
    SendReset,
    /// Signup payload captured.
    EmitSignup,
    /// Wake-up requested.
    Schedule,
    /// Batch of effects.
    Batch(usize),
}

/// Deterministic simulator for [`AuthFlow`] testing.
pub struct FlowSimulator {
    flow: AuthFlow,
    now: Instant,
    directory: Arc<dyn AccountDirectory>,
    credentials: Arc<dyn CredentialGate>,
    reset: Arc<dyn ResetGate>,
    /// Lookups the flow asked for, awaiting explicit execution.
    pending_lookups: VecDeque<FieldLookup>,
    emitted: Vec<SignupPayload>,
    effect_log: Vec<EffectRecord>,
    next_wake: Option<Instant>,
}

impl FlowSimulator {
    /// A simulator over a fresh flow with default debounce tuning.
    #[must_use]
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        credentials: Arc<dyn CredentialGate>,
        reset: Arc<dyn ResetGate>,
    ) -> Self {
        Self::with_config(DebounceConfig::default(), directory, credentials, reset)
    }

    /// A simulator with explicit debounce tuning.
    #[must_use]
    pub fn with_config(
        config: DebounceConfig,
        directory: Arc<dyn AccountDirectory>,
        credentials: Arc<dyn CredentialGate>,
        reset: Arc<dyn ResetGate>,
    ) -> Self {
        Self {
            flow: AuthFlow::new(config),
            now: Instant::now(),
            directory,
            credentials,
            reset,
            pending_lookups: VecDeque::new(),
            emitted: Vec::new(),
            effect_log: Vec::new(),
            next_wake: None,
        }
    }

    /// The virtual clock's current instant.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Dispatch one message and execute the returned effects.
    pub fn send(&mut self, msg: AuthMsg) {
        let effect = self.flow.update(msg, self.now);
        self.execute(effect);
    }

    /// Advance the virtual clock and tick the flow, firing due lookups into
    /// the pending queue and expiring timed-out ones.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        self.send(AuthMsg::Tick);
    }

    /// Execute every queued lookup against the directory and feed each
    /// resolution back into the flow, in order.
    pub fn run_pending_lookups(&mut self) {
        while let Some(lookup) = self.pending_lookups.pop_front() {
            let result = self.directory.find_account(&lookup.value);
            self.send(AuthMsg::LookupResolved {
                field: lookup.field,
                generation: lookup.generation,
                value: lookup.value,
                result,
            });
        }
    }

    /// Resolve the oldest queued lookup with an explicit result, bypassing
    /// the directory. For scripting races and failures.
    ///
    /// Returns `false` if no lookup was queued.
    pub fn resolve_next_lookup(
        &mut self,
        result: Result<AccountMatch, DirectoryError>,
    ) -> bool {
        let Some(lookup) = self.pending_lookups.pop_front() else {
            return false;
        };
        self.send(AuthMsg::LookupResolved {
            field: lookup.field,
            generation: lookup.generation,
            value: lookup.value,
            result,
        });
        true
    }

    /// Drop the oldest queued lookup without resolving it (a request lost in
    /// transit).
    pub fn drop_next_lookup(&mut self) -> bool {
        self.pending_lookups.pop_front().is_some()
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::None => {
                self.effect_log.push(EffectRecord::None);
            }
            Effect::Lookup(lookup) => {
                self.effect_log.push(EffectRecord::Lookup {
                    field: lookup.field,
                });
                self.pending_lookups.push_back(lookup);
            }
            Effect::Authenticate { email, password } => {
                self.effect_log.push(EffectRecord::Authenticate);
                let result = self.credentials.authenticate(&email, &password);
                self.send(AuthMsg::LoginResolved(result));
            }
            Effect::SendReset { email } => {
                self.effect_log.push(EffectRecord::SendReset);
                let result = self.reset.send_reset(&email);
                self.send(AuthMsg::ResetResolved(result));
            }
            Effect::EmitSignup(payload) => {
                self.effect_log.push(EffectRecord::EmitSignup);
                self.emitted.push(payload);
            }
            Effect::Schedule(at) => {
                self.effect_log.push(EffectRecord::Schedule);
                self.next_wake = Some(match self.next_wake {
                    Some(existing) => existing.min(at),
                    None => at,
                });
            }
            Effect::Batch(effects) => {
                self.effect_log.push(EffectRecord::Batch(effects.len()));
                for effect in effects {
                    self.execute(effect);
                }
            }
        }
    }

    // --- Accessors ---

    /// The flow under test.
    #[inline]
    #[must_use]
    pub fn flow(&self) -> &AuthFlow {
        &self.flow
    }

    /// Mutable access to the flow under test.
    #[inline]
    #[must_use]
    pub fn flow_mut(&mut self) -> &mut AuthFlow {
        &mut self.flow
    }

    /// Lookups fired but not yet resolved.
    #[must_use]
    pub fn pending_lookups(&self) -> &VecDeque<FieldLookup> {
        &self.pending_lookups
    }

    /// Signup payloads the flow has emitted.
    #[must_use]
    pub fn emitted(&self) -> &[SignupPayload] {
        &self.emitted
    }

    /// Every effect executed, in order.
    #[must_use]
    pub fn effect_log(&self) -> &[EffectRecord] {
        &self.effect_log
    }

    /// The earliest wake-up the flow has requested.
    #[must_use]
    pub fn next_wake(&self) -> Option<Instant> {
        self.next_wake
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ScriptedResetGate, StaticCredentialGate};
    use muniport_validate::lookup::StaticDirectory;
    use muniport_validate::rules::fields;

    fn simulator() -> FlowSimulator {
        FlowSimulator::new(
            Arc::new(StaticDirectory::new().with_account("1002", "Jane Smith")),
            Arc::new(StaticCredentialGate::new().with_account("jane@example.com", "Abcdef1!")),
            Arc::new(ScriptedResetGate::new()),
        )
    }

    #[test]
    fn due_lookups_queue_until_run() {
        let mut sim = simulator();
        sim.send(AuthMsg::SignupFieldChanged {
            field: fields::ACCOUNT_NUMBER,
            value: "1002".to_string(),
        });
        assert!(sim.pending_lookups().is_empty());

        sim.advance(Duration::from_millis(500));
        assert_eq!(sim.pending_lookups().len(), 1);

        sim.run_pending_lookups();
        assert!(sim.pending_lookups().is_empty());
        let outcome = sim.flow().signup_outcome(fields::ACCOUNT_NUMBER).expect("field");
        assert_eq!(outcome.message(), "Verified: Jane Smith");
    }

    #[test]
    fn authenticate_executes_synchronously() {
        let mut sim = simulator();
        sim.send(AuthMsg::LoginEmailChanged("jane@example.com".to_string()));
        sim.send(AuthMsg::LoginPasswordChanged("Abcdef1!".to_string()));
        sim.send(AuthMsg::SubmitLogin);
        assert_eq!(sim.flow().session(), Some("jane@example.com"));
        assert!(sim.effect_log().contains(&EffectRecord::Authenticate));
    }

    #[test]
    fn schedule_effects_track_the_earliest_wake() {
        let mut sim = simulator();
        sim.send(AuthMsg::SignupFieldChanged {
            field: fields::ACCOUNT_NUMBER,
            value: "1002".to_string(),
        });
        let wake = sim.next_wake().expect("wake requested");
        assert_eq!(wake, sim.now() + Duration::from_millis(500));
    }
}
