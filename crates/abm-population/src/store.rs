//! Core agent storage: `AgentStore` (SoA data) and `AgentRngs` (per-agent RNG).
//!
//! # Why two structs?
//!
//! The infection draw phase needs `&mut AgentRngs` (each agent's own RNG) and
//! `&AgentStore` (shared read access to attributes) at the same time.  Keeping
//! RNGs in a separate struct lets the borrow checker see the two as disjoint,
//! and lets the `parallel` feature hand `par_iter_mut()` over the RNGs while
//! the store stays shared.

use abm_core::{AgentId, AgentRng, PlaceId};

use crate::{AgentKind, Protection};

// ── AgentRngs ─────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG state, indexed by `AgentId`.
pub struct AgentRngs {
    pub inner: Vec<AgentRng>,
}

impl AgentRngs {
    /// Allocate and seed `count` per-agent RNGs from `global_seed`.
    pub fn new(count: usize, global_seed: u64) -> Self {
        let inner = (0..count as u32)
            .map(|i| AgentRng::new(global_seed, AgentId(i)))
            .collect();
        Self { inner }
    }

    /// Mutable reference to one agent's RNG.
    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> &mut AgentRng {
        &mut self.inner[agent.index()]
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ── AgentStore ────────────────────────────────────────────────────────────────

/// Structure-of-Arrays storage for agent attributes and modifiers.
///
/// Every `Vec` field has exactly `count` elements and the `AgentId` value is
/// the index into all of them.  Unassigned place references hold
/// `PlaceId::INVALID`.  Composite state is not stored here: it belongs to the
/// states manager.
pub struct AgentStore {
    /// Number of agents.  Equals the length of every SoA `Vec`.
    pub count: usize,

    // ── Static attributes ─────────────────────────────────────────────────
    pub kind:            Vec<AgentKind>,
    pub age:             Vec<u8>,
    pub household:       Vec<PlaceId>,
    pub school:          Vec<PlaceId>,
    /// Workplace, school (staff), retirement home (staff) or hospital (staff).
    pub work:            Vec<PlaceId>,
    /// Hospital the agent is admitted to when hospitalized; staff and
    /// patients have it set by construction.
    pub hospital:        Vec<PlaceId>,
    pub transit:         Vec<PlaceId>,
    pub works_from_home: Vec<bool>,

    // ── Modifiers ─────────────────────────────────────────────────────────
    /// Base relative susceptibility.
    pub susceptibility:  Vec<f64>,
    /// Individual infectiousness variability (mean 1).
    pub variability:     Vec<f64>,
    /// Vaccine protection, `None` until the first dose.
    pub protection:      Vec<Option<Protection>>,
}

impl AgentStore {
    /// Allocate `count` agents with sentinel attributes.
    pub fn new(count: usize) -> Self {
        Self {
            count,
            kind:            vec![AgentKind::Regular; count],
            age:             vec![0; count],
            household:       vec![PlaceId::INVALID; count],
            school:          vec![PlaceId::INVALID; count],
            work:            vec![PlaceId::INVALID; count],
            hospital:        vec![PlaceId::INVALID; count],
            transit:         vec![PlaceId::INVALID; count],
            works_from_home: vec![false; count],
            susceptibility:  vec![1.0; count],
            variability:     vec![1.0; count],
            protection:      vec![None; count],
        }
    }

    /// Iterator over all `AgentId`s in ascending order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + use<> {
        (0..self.count as u32).map(AgentId)
    }

    #[inline]
    pub fn contains(&self, agent: AgentId) -> bool {
        agent.index() < self.count
    }

    /// Where the agent spends the home slot: its residence, or its hospital
    /// for hospital patients.
    #[inline]
    pub fn home(&self, agent: AgentId) -> PlaceId {
        let i = agent.index();
        match self.kind[i] {
            AgentKind::HospitalPatient => self.hospital[i],
            _ => self.household[i],
        }
    }

    // ── Derived multipliers ───────────────────────────────────────────────

    /// Susceptibility after vaccine protection at simulated `day`.
    #[inline]
    pub fn susceptibility_at(&self, agent: AgentId, day: f64) -> f64 {
        let i = agent.index();
        let reduction = self.protection[i]
            .as_ref()
            .map_or(0.0, |p| p.susceptibility_reduction(day));
        self.susceptibility[i] * (1.0 - reduction)
    }

    /// Individual infectiousness after vaccine protection at `day`, before the
    /// health state's own infectiousness is applied.
    #[inline]
    pub fn infectiousness_at(&self, agent: AgentId, day: f64) -> f64 {
        let i = agent.index();
        let reduction = self.protection[i]
            .as_ref()
            .map_or(0.0, |p| p.transmission_reduction(day));
        self.variability[i] * (1.0 - reduction)
    }

    /// Multiplier on severe-outcome probabilities at `day` (1.0 unvaccinated).
    #[inline]
    pub fn severity_multiplier(&self, agent: AgentId, day: f64) -> f64 {
        self.protection[agent.index()]
            .as_ref()
            .map_or(1.0, |p| 1.0 - p.severity_reduction(day))
    }
}
