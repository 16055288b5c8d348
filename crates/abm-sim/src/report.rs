//! End-of-run summary.

use std::fmt;

use abm_core::{AuditKind, AuditLog, Tick};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub ticks_run:             u64,
    pub final_tick:            Tick,
    pub cumulative_infections: u64,
    pub tests:                 u64,
    pub confirmed:             u64,
    pub doses:                 u64,
    pub traced:                u64,
    pub invalid_transitions:   u64,
    pub domain_clamps:         u64,
    pub rerouted:              u64,
    pub fell_back:             u64,
    /// Some audit events were counted but not kept verbatim.
    pub audit_truncated:       bool,
}

impl RunReport {
    pub(crate) fn with_audit(mut self, audit: &AuditLog) -> Self {
        self.invalid_transitions = audit.count(AuditKind::InvalidTransition);
        self.domain_clamps = audit.count(AuditKind::DomainClamp);
        self.rerouted = audit.count(AuditKind::Rerouted);
        self.fell_back = audit.count(AuditKind::FellBack);
        self.audit_truncated = audit.truncated();
        self
    }

    /// Dropped transitions and clamped inputs.
    pub fn recoverable_faults(&self) -> u64 {
        self.invalid_transitions + self.domain_clamps
    }

    pub fn log(&self) {
        log::info!("{self}");
        if self.invalid_transitions > 0 {
            log::warn!("{} computed transitions were rejected and dropped", self.invalid_transitions);
        }
        if self.domain_clamps > 0 {
            log::warn!("{} curve inputs were outside their domain and clamped", self.domain_clamps);
        }
        if self.fell_back > 0 {
            log::warn!("{} arrivals at full places fell back home", self.fell_back);
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks to {}: {} infected, {} tests ({} positive), {} doses, {} traced, {} rerouted",
            self.ticks_run,
            self.final_tick,
            self.cumulative_infections,
            self.tests,
            self.confirmed,
            self.doses,
            self.traced,
            self.rerouted,
        )
    }
}
