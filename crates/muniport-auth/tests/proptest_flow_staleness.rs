//! Property tests driving the auth flow with arbitrary interleavings of
//! edits, clock advances, and lookup resolutions. Whatever the schedule, a
//! field must never show `Valid` for a value other than its current one,
//! and the form must never be submittable with an unconfirmed account.

use std::sync::Arc;
use std::time::Duration;

use muniport_auth::flow::AuthMsg;
use muniport_auth::harness::FlowSimulator;
use muniport_auth::services::{ScriptedResetGate, StaticCredentialGate};
use muniport_validate::lookup::{AccountMatch, DirectoryError, StaticDirectory};
use muniport_validate::rules::fields;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    /// Type a value into the account field.
    Edit(String),
    /// Advance the virtual clock.
    Advance(u64),
    /// Execute every queued lookup against the directory.
    RunLookups,
    /// Resolve the oldest queued lookup found, with a name.
    ResolveFound,
    /// Resolve the oldest queued lookup as a miss.
    ResolveMiss,
    /// Resolve the oldest queued lookup as a directory failure.
    ResolveError,
    /// Lose the oldest queued lookup in transit.
    DropLookup,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[A-Za-z0-9]{0,8}".prop_map(Step::Edit),
        (0u64..2_000).prop_map(Step::Advance),
        Just(Step::RunLookups),
        Just(Step::ResolveFound),
        Just(Step::ResolveMiss),
        Just(Step::ResolveError),
        Just(Step::DropLookup),
    ]
}

fn simulator() -> FlowSimulator {
    FlowSimulator::new(
        Arc::new(
            StaticDirectory::new()
                .with_account("1001", "John Doe")
                .with_account("1002", "Jane Smith"),
        ),
        Arc::new(StaticCredentialGate::new()),
        Arc::new(ScriptedResetGate::new()),
    )
}

proptest! {
    #[test]
    fn account_field_never_shows_a_stale_outcome(
        steps in prop::collection::vec(step_strategy(), 1..40),
    ) {
        let mut sim = simulator();

        // Fill the structural fields so submittability hinges on the
        // account confirmation alone.
        for (field, value) in [
            (fields::FULL_NAME, "Jane Smith"),
            (fields::EMAIL, "jane@example.com"),
            (fields::ID_NUMBER, "9001015026083"),
            (fields::CELLPHONE, "0123456790"),
            (fields::PASSWORD, "Abcdef1!"),
            (fields::CONFIRM_PASSWORD, "Abcdef1!"),
        ] {
            sim.send(AuthMsg::SignupFieldChanged {
                field,
                value: value.to_string(),
            });
        }

        for step in steps {
            match step {
                Step::Edit(value) => sim.send(AuthMsg::SignupFieldChanged {
                    field: fields::ACCOUNT_NUMBER,
                    value,
                }),
                Step::Advance(ms) => sim.advance(Duration::from_millis(ms)),
                Step::RunLookups => sim.run_pending_lookups(),
                Step::ResolveFound => {
                    sim.resolve_next_lookup(Ok(AccountMatch::named("Jane Smith")));
                }
                Step::ResolveMiss => {
                    sim.resolve_next_lookup(Ok(AccountMatch::miss()));
                }
                Step::ResolveError => {
                    sim.resolve_next_lookup(Err(DirectoryError::Unavailable {
                        detail: "flaky".to_string(),
                    }));
                }
                Step::DropLookup => {
                    sim.drop_next_lookup();
                }
            }

            let current = sim
                .flow()
                .signup_form()
                .value_of(fields::ACCOUNT_NUMBER)
                .expect("account field exists")
                .to_string();
            let outcome = sim
                .flow()
                .signup_outcome(fields::ACCOUNT_NUMBER)
                .expect("account field exists");

            // Any non-idle outcome must be about the value on screen.
            if !matches!(
                outcome.status(),
                muniport_validate::outcome::ValidationStatus::Idle
            ) {
                prop_assert_eq!(outcome.for_value(), current.as_str());
            }
            // A submittable form implies a confirmed account.
            if sim.flow().signup_form().is_submittable() {
                prop_assert!(outcome.is_valid());
            }
        }
    }
}
