//! Time-of-day slots and the places an agent occupies in one.

use abm_core::PlaceId;

/// The parts of a step an agent may spend somewhere different.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Slot {
    Home,
    Commute,
    Daytime,
    Leisure,
}

impl Slot {
    pub const COUNT: usize = 4;

    /// Placement order within a step.
    pub const ALL: [Slot; Slot::COUNT] = [Slot::Home, Slot::Daytime, Slot::Commute, Slot::Leisure];
}

/// Up to two places (a student who also works has both a school and a
/// workplace in the daytime slot).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct PlaceSet {
    places: [PlaceId; 2],
    len:    u8,
}

impl PlaceSet {
    pub const EMPTY: PlaceSet = PlaceSet { places: [PlaceId::INVALID; 2], len: 0 };

    pub fn one(place: PlaceId) -> Self {
        let mut s = Self::EMPTY;
        s.push(place);
        s
    }

    /// Add `place` unless it is invalid, already present, or the set is full.
    pub fn push(&mut self, place: PlaceId) {
        if place.is_valid() && !self.contains(place) && (self.len as usize) < self.places.len() {
            self.places[self.len as usize] = place;
            self.len += 1;
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[PlaceId] {
        &self.places[..self.len as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.as_slice().iter().copied()
    }

    #[inline]
    pub fn contains(&self, place: PlaceId) -> bool {
        self.as_slice().contains(&place)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
