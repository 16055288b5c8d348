//! Ledger of recoverable faults.
//!
//! Configuration-integrity faults abort a run through `Result`; everything
//! else that goes wrong mid-run (a computed transition the edge table
//! rejects, a curve evaluated outside its domain, a capacity overflow handled
//! by the overflow policy) is recorded here and summarised when the run
//! completes.  Recording never interrupts the step that produced the event.

use std::fmt;

use crate::{AgentId, Category, PlaceId, Tick};

/// Events kept verbatim per log; later events only bump the counters.
const DEFAULT_MAX_EVENTS: usize = 10_000;

/// Coarse classification used for aggregation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AuditKind {
    InvalidTransition,
    DomainClamp,
    Rerouted,
    FellBack,
}

impl AuditKind {
    pub const ALL: [AuditKind; 4] = [
        AuditKind::InvalidTransition,
        AuditKind::DomainClamp,
        AuditKind::Rerouted,
        AuditKind::FellBack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AuditKind::InvalidTransition => "invalid_transition",
            AuditKind::DomainClamp       => "domain_clamp",
            AuditKind::Rerouted          => "rerouted",
            AuditKind::FellBack          => "fell_back",
        }
    }
}

/// One recoverable fault.
#[derive(Clone, Debug, PartialEq)]
pub enum AuditEvent {
    /// A computed transition was rejected by the edge table and dropped.
    InvalidTransition {
        tick:     Tick,
        agent:    AgentId,
        category: Category,
        detail:   String,
    },
    /// An input fell outside a curve's domain (or a probability outside
    /// [0, 1]) and was clamped.
    DomainClamp {
        tick:  Tick,
        agent: Option<AgentId>,
        what:  &'static str,
        input: f64,
        used:  f64,
    },
    /// A full place turned the agent away to another place of the same kind.
    Rerouted {
        tick:  Tick,
        agent: AgentId,
        from:  PlaceId,
        to:    PlaceId,
    },
    /// A full place turned the agent away to its fallback location.
    FellBack {
        tick:  Tick,
        agent: AgentId,
        from:  PlaceId,
        to:    PlaceId,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> AuditKind {
        match self {
            AuditEvent::InvalidTransition { .. } => AuditKind::InvalidTransition,
            AuditEvent::DomainClamp { .. }       => AuditKind::DomainClamp,
            AuditEvent::Rerouted { .. }          => AuditKind::Rerouted,
            AuditEvent::FellBack { .. }          => AuditKind::FellBack,
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::InvalidTransition { tick, agent, category, detail } => {
                write!(f, "{tick} {agent}: dropped {category} transition: {detail}")
            }
            AuditEvent::DomainClamp { tick, agent: Some(agent), what, input, used } => {
                write!(f, "{tick} {agent}: {what} input {input} clamped to {used}")
            }
            AuditEvent::DomainClamp { tick, agent: None, what, input, used } => {
                write!(f, "{tick}: {what} input {input} clamped to {used}")
            }
            AuditEvent::Rerouted { tick, agent, from, to } => {
                write!(f, "{tick} {agent}: {from} full, rerouted to {to}")
            }
            AuditEvent::FellBack { tick, agent, from, to } => {
                write!(f, "{tick} {agent}: {from} full, fell back to {to}")
            }
        }
    }
}

/// Append-only record of recoverable faults for one run.
#[derive(Debug)]
pub struct AuditLog {
    events:     Vec<AuditEvent>,
    counts:     [u64; AuditKind::ALL.len()],
    max_events: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity_limit(DEFAULT_MAX_EVENTS)
    }

    /// Keep at most `max_events` events verbatim; counts are always complete.
    pub fn with_capacity_limit(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            counts: [0; AuditKind::ALL.len()],
            max_events,
        }
    }

    pub fn record(&mut self, event: AuditEvent) {
        match event.kind() {
            AuditKind::InvalidTransition => log::warn!("{event}"),
            AuditKind::DomainClamp       => log::debug!("{event}"),
            AuditKind::Rerouted | AuditKind::FellBack => log::trace!("{event}"),
        }
        self.counts[event.kind() as usize] += 1;
        if self.events.len() < self.max_events {
            self.events.push(event);
        }
    }

    /// Total events of `kind`, including ones not kept verbatim.
    pub fn count(&self, kind: AuditKind) -> u64 {
        self.counts[kind as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// `true` when some events were counted but not kept.
    pub fn truncated(&self) -> bool {
        self.total() > self.events.len() as u64
    }
}
