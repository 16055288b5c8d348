//! Identifiers for the things a run indexes by position.
//!
//! | ID           | Indexes                                  | Width |
//! |--------------|------------------------------------------|-------|
//! | `AgentId`    | agent columns and per-agent RNG streams  | `u32` |
//! | `PlaceId`    | the place arena and occupancy lists      | `u32` |
//! | `StateValue` | state names of one `Category`            | `u16` |
//! | `ProductId`  | vaccine products of the campaign         | `u16` |
//!
//! Agents and places are dense: ids run `0..n` in load order, so the inner
//! integer doubles as a column index and ascending id is the processing order
//! wherever a step must be deterministic.  `INVALID` marks an unassigned slot
//! (an agent without a school, a place id not yet resolved).
use std::fmt;

/// Newtype over `$inner` with the index, sentinel and conversion impls every
/// id above shares.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so unassigned IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// One simulated person; also selects the agent's private RNG stream.
    pub struct AgentId(u32);
}

typed_id! {
    /// A household, school, workplace, hospital, leisure venue or vehicle.
    pub struct PlaceId(u32);
}

typed_id! {
    /// Index of a configured state value within one category.
    ///
    /// Values are only meaningful together with their `Category`; the
    /// taxonomy maps them back to names.
    pub struct StateValue(u16);
}

typed_id! {
    /// A vaccine product, in the order the campaign lists them.  Protection
    /// curves and booster targets are looked up by this index.
    pub struct ProductId(u16);
}
