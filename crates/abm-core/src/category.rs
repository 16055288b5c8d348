//! The four independent dimensions of an agent's composite state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AbmError;

/// One independent state dimension.
///
/// The set of categories is closed; the values each category can take are
/// configuration-driven (see `abm-states::Taxonomy`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Health,
    Role,
    Testing,
    Vaccination,
}

impl Category {
    pub const COUNT: usize = 4;

    /// All categories in storage order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Health,
        Category::Role,
        Category::Testing,
        Category::Vaccination,
    ];

    /// Position in per-agent `[_; Category::COUNT]` arrays.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Health      => "health",
            Category::Role        => "role",
            Category::Testing     => "testing",
            Category::Vaccination => "vaccination",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = AbmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "health"      => Ok(Category::Health),
            "role"        => Ok(Category::Role),
            "testing"     => Ok(Category::Testing),
            "vaccination" => Ok(Category::Vaccination),
            other => Err(AbmError::Parse(format!("unknown category {other:?}"))),
        }
    }
}
