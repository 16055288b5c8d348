//! `Occupancy`: who is where during one step.

use abm_core::{AgentId, PlaceId};
use abm_population::PlaceStore;

/// Per-place occupant lists for one step plus the reverse per-agent index.
///
/// Agents are admitted in ascending id order, so every occupant list is
/// sorted and a repeated admission of the same agent is a no-op.
#[derive(Clone, Debug)]
pub struct Occupancy {
    occupants: Vec<Vec<AgentId>>,
    capacity:  Vec<u32>,
    visits:    Vec<Vec<PlaceId>>,
    /// Arrivals sent to another place of the same kind this step.
    pub rerouted:  u32,
    /// Arrivals sent to their fallback location this step.
    pub fell_back: u32,
}

/// Returned by [`Occupancy::admit`] when the place has no room left.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Full;

impl Occupancy {
    pub fn new(places: &PlaceStore, agent_count: usize) -> Self {
        Self {
            occupants: vec![Vec::new(); places.len()],
            capacity:  places.iter().map(|p| p.capacity).collect(),
            visits:    vec![Vec::new(); agent_count],
            rerouted:  0,
            fell_back: 0,
        }
    }

    /// Empty every list, keeping allocations for the next step.
    pub fn clear(&mut self) {
        self.occupants.iter_mut().for_each(Vec::clear);
        self.visits.iter_mut().for_each(Vec::clear);
        self.rerouted = 0;
        self.fell_back = 0;
    }

    #[inline]
    pub fn is_present(&self, place: PlaceId, agent: AgentId) -> bool {
        self.occupants[place.index()].binary_search(&agent).is_ok()
    }

    #[inline]
    pub fn has_room(&self, place: PlaceId) -> bool {
        (self.occupants[place.index()].len() as u32) < self.capacity[place.index()]
    }

    /// Record `agent` at `place`.  Admitting an agent already present
    /// succeeds without using capacity.
    pub fn admit(&mut self, place: PlaceId, agent: AgentId) -> Result<(), Full> {
        if self.is_present(place, agent) {
            return Ok(());
        }
        if !self.has_room(place) {
            return Err(Full);
        }
        let list = &mut self.occupants[place.index()];
        match list.binary_search(&agent) {
            Ok(_) => {}
            Err(pos) => list.insert(pos, agent),
        }
        self.visits[agent.index()].push(place);
        Ok(())
    }

    #[inline]
    pub fn occupants(&self, place: PlaceId) -> &[AgentId] {
        &self.occupants[place.index()]
    }

    #[inline]
    pub fn count(&self, place: PlaceId) -> usize {
        self.occupants[place.index()].len()
    }

    /// Places the agent was admitted to this step, in admission order.
    #[inline]
    pub fn places_of(&self, agent: AgentId) -> &[PlaceId] {
        &self.visits[agent.index()]
    }

    /// `(place, occupants)` for every place with at least one occupant,
    /// ascending by place id.
    pub fn occupied(&self) -> impl Iterator<Item = (PlaceId, &[AgentId])> {
        self.occupants
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.is_empty())
            .map(|(i, o)| (PlaceId(i as u32), o.as_slice()))
    }

    pub fn place_count(&self) -> usize {
        self.occupants.len()
    }

    /// Does every place hold no more agents than its capacity?
    pub fn within_capacity(&self) -> bool {
        self.occupants
            .iter()
            .zip(&self.capacity)
            .all(|(o, &cap)| o.len() as u32 <= cap)
    }
}
