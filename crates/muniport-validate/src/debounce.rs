#![forbid(unsafe_code)]

//! Debounced scheduling for remote field checks.
//!
//! A [`Debouncer`] coalesces rapid re-validations of one field into a single
//! lookup: each [`schedule`](Debouncer::schedule) supersedes the previous
//! ticket, and the lookup only fires once the configured quiet period has
//! elapsed. Every schedule advances a generation counter; a resolution is
//! only accepted for the generation currently in flight, which is the
//! stale-response guard the whole pipeline rests on.
//!
//! Deadlines are plain values checked by [`poll`](Debouncer::poll) against a
//! caller-supplied `Instant` — there are no timers to leak, and
//! [`cancel`](Debouncer::cancel) verifiably leaves nothing armed
//! ([`next_deadline`](Debouncer::next_deadline) returns `None`).
//!
//! # Invariants
//!
//! 1. At most one ticket is live per debouncer: a pending ticket and an
//!    in-flight lookup never coexist.
//! 2. A superseded ticket can never fire; a superseded lookup's resolution
//!    is rejected by [`acknowledge`](Debouncer::acknowledge).
//! 3. A fired lookup resolves exactly once: acknowledged, expired by the
//!    bounded wait, or cancelled — whichever comes first.

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning for the debounced remote check.
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Quiet period between the last input change and the lookup firing.
    /// A UX tuning parameter, not a correctness one. Default: 500ms.
    pub delay: Duration,

    /// Minimum input length (in graphemes) before a lookup is worth
    /// scheduling; shorter values stay `Idle` rather than flashing errors
    /// mid-type. Default: 4.
    pub min_graphemes: usize,

    /// Bounded wait for an in-flight lookup. Once elapsed the lookup is
    /// expired and reported failed rather than left pending forever.
    /// Default: 5s.
    pub lookup_timeout: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            min_graphemes: 4,
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

// ---------------------------------------------------------------------------
// Tickets and events
// ---------------------------------------------------------------------------

/// A scheduled-but-not-yet-fired lookup: one armed deadline for one value.
///
/// Creating a new ticket (via [`Debouncer::schedule`]) retires the previous
/// one; a retired ticket's deadline can never fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceTicket {
    generation: u64,
    value: String,
    deadline: Instant,
}

impl DebounceTicket {
    /// The generation this ticket belongs to.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The input value the lookup will run for.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the ticket fires.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// A lookup that is due to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    /// Generation to hand back to [`Debouncer::acknowledge`] on resolution.
    pub generation: u64,
    /// The value to look up.
    pub value: String,
}

/// What [`Debouncer::poll`] observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceEvent {
    /// The quiet period elapsed; execute this lookup now.
    Due(LookupRequest),
    /// An in-flight lookup exceeded the bounded wait and was expired.
    TimedOut {
        generation: u64,
        value: String,
    },
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    value: String,
    expires_at: Instant,
}

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

/// Per-field debounce and cancellation state.
///
/// Owned exclusively by one field controller; no cross-field state is
/// shared, so no locking is needed anywhere in the pipeline.
#[derive(Debug)]
pub struct Debouncer {
    config: DebounceConfig,
    generation: u64,
    pending: Option<DebounceTicket>,
    in_flight: Option<InFlight>,
}

impl Debouncer {
    #[must_use]
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            generation: 0,
            pending: None,
            in_flight: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// Arm a ticket for `value`, superseding any previous ticket and
    /// logically cancelling any in-flight lookup. Returns the new
    /// generation.
    pub fn schedule(&mut self, value: impl Into<String>, now: Instant) -> u64 {
        self.generation += 1;
        self.in_flight = None;
        self.pending = Some(DebounceTicket {
            generation: self.generation,
            value: value.into(),
            deadline: now + self.config.delay,
        });
        self.generation
    }

    /// Check the armed deadline and the bounded in-flight wait.
    ///
    /// Fires a due ticket (moving it in flight and returning the
    /// [`LookupRequest`] to execute), or expires an in-flight lookup whose
    /// wait has elapsed. Each ticket fires at most once.
    pub fn poll(&mut self, now: Instant) -> Option<DebounceEvent> {
        if let Some(ticket) = self.pending.take_if(|t| now >= t.deadline) {
            self.in_flight = Some(InFlight {
                generation: ticket.generation,
                value: ticket.value.clone(),
                expires_at: now + self.config.lookup_timeout,
            });
            return Some(DebounceEvent::Due(LookupRequest {
                generation: ticket.generation,
                value: ticket.value,
            }));
        }

        if let Some(flight) = self.in_flight.take_if(|f| now >= f.expires_at) {
            return Some(DebounceEvent::TimedOut {
                generation: flight.generation,
                value: flight.value,
            });
        }

        None
    }

    /// Accept a lookup resolution iff `generation` is the one currently in
    /// flight. Returns `false` for stale generations (superseded, expired,
    /// or cancelled), whose results must be discarded.
    pub fn acknowledge(&mut self, generation: u64) -> bool {
        match &self.in_flight {
            Some(flight) if flight.generation == generation => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending ticket and invalidate any in-flight lookup.
    ///
    /// After this call [`next_deadline`](Self::next_deadline) is `None`:
    /// nothing remains armed, and any late resolution will be rejected.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.in_flight = None;
    }

    /// Whether nothing is pending or in flight.
    #[inline]
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.pending.is_none() && self.in_flight.is_none()
    }

    /// The armed-but-unfired ticket, if any.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<&DebounceTicket> {
        self.pending.as_ref()
    }

    /// Generation of the fired, unresolved lookup, if any.
    #[inline]
    #[must_use]
    pub fn in_flight_generation(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|f| f.generation)
    }

    /// The next instant at which [`poll`](Self::poll) could produce an
    /// event, for drivers that want to sleep precisely.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (&self.pending, &self.in_flight) {
            (Some(ticket), _) => Some(ticket.deadline),
            (None, Some(flight)) => Some(flight.expires_at),
            (None, None) => None,
        }
    }
}
