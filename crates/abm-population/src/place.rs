//! Places: the closed set of location kinds and the place arena.

use std::fmt;

use serde::{Deserialize, Serialize};

use abm_core::PlaceId;

/// Closed set of location kinds.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Household,
    Workplace,
    School,
    Hospital,
    RetirementHome,
    Transit,
    Leisure,
}

impl PlaceKind {
    pub const COUNT: usize = 7;

    pub const ALL: [PlaceKind; PlaceKind::COUNT] = [
        PlaceKind::Household,
        PlaceKind::Workplace,
        PlaceKind::School,
        PlaceKind::Hospital,
        PlaceKind::RetirementHome,
        PlaceKind::Transit,
        PlaceKind::Leisure,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PlaceKind::Household      => "household",
            PlaceKind::Workplace      => "workplace",
            PlaceKind::School         => "school",
            PlaceKind::Hospital       => "hospital",
            PlaceKind::RetirementHome => "retirement_home",
            PlaceKind::Transit        => "transit",
            PlaceKind::Leisure        => "leisure",
        }
    }

    /// Kinds that accept agents who are not assigned to them (leisure
    /// visitors, transit riders, hospital admissions).
    pub fn admits_visitors(self) -> bool {
        matches!(self, PlaceKind::Leisure | PlaceKind::Transit | PlaceKind::Hospital)
    }

    /// Kinds an agent can live in.
    pub fn is_residence(self) -> bool {
        matches!(self, PlaceKind::Household | PlaceKind::RetirementHome)
    }
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Contact intensity and dwell time for one place (or one place kind).
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TransmissionParams {
    /// Transmission rate per unit of infectious presence (β).
    pub contact_intensity: f64,
    /// Fraction of a day an occupant typically spends there.
    pub dwell_days:        f64,
}

/// A place.  Agents present during a step are tracked by mobility, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub id:           PlaceId,
    pub kind:         PlaceKind,
    pub capacity:     u32,
    /// Per-place override of the kind's transmission parameters.
    pub transmission: Option<TransmissionParams>,
}

/// Arena of all places, indexed by `PlaceId`.
#[derive(Clone, Debug, Default)]
pub struct PlaceStore {
    places:  Vec<Place>,
    by_kind: [Vec<PlaceId>; PlaceKind::COUNT],
}

impl PlaceStore {
    /// Build from places whose ids are already `0..n` in order.
    pub(crate) fn from_sorted(places: Vec<Place>) -> Self {
        let mut by_kind: [Vec<PlaceId>; PlaceKind::COUNT] = Default::default();
        for p in &places {
            by_kind[p.kind.index()].push(p.id);
        }
        Self { places, by_kind }
    }

    #[inline]
    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(id.index())
    }

    /// Indexing accessor for ids known to be valid (all ids handed out by a
    /// validated population are).
    #[inline]
    pub fn place(&self, id: PlaceId) -> &Place {
        &self.places[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: PlaceId) -> PlaceKind {
        self.places[id.index()].kind
    }

    #[inline]
    pub fn capacity(&self, id: PlaceId) -> u32 {
        self.places[id.index()].capacity
    }

    /// Ids of every place of `kind`, ascending.
    pub fn of_kind(&self, kind: PlaceKind) -> &[PlaceId] {
        &self.by_kind[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}
