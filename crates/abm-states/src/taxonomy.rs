//! Configuration-driven state values.
//!
//! No disease model is hard-coded.  Each category lists its state names; the
//! engine only ever asks what *traits* a value carries ("is this health state
//! infectious?", "does this role state keep the agent home?").
//!
//! ```json
//! "health": {
//!   "initial": "susceptible",
//!   "states": [
//!     { "name": "susceptible", "traits": ["susceptible"] },
//!     { "name": "exposed",     "traits": ["infected", "infectious"], "infectiousness": 0.5 },
//!     { "name": "symptomatic", "traits": ["infected", "infectious", "symptomatic"], "infectiousness": 1.0 },
//!     { "name": "recovered" },
//!     { "name": "dead",        "traits": ["dead"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use abm_core::{Category, StateValue};

use crate::{StateError, StateResult};

// ── Traits ────────────────────────────────────────────────────────────────────

/// Behavioural meaning attached to a configured state value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    /// Can acquire infection.
    Susceptible,
    /// Truly carries the pathogen (what a test detects).
    Infected,
    /// Contributes to place exposure.
    Infectious,
    /// Presents symptoms.
    Symptomatic,
    /// Admitted to hospital; routed to the hospital only.
    Hospitalized,
    /// Removed permanently; placed nowhere, never selected.
    Dead,
    /// Stays home (home isolation, quarantine, leave).
    Isolated,
    /// Awaiting a test result.
    Pending,
    /// Confirmed positive.
    Confirmed,
    /// Has received at least one dose.
    Vaccinated,
}

/// Compact set of [`Trait`]s.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Traits(u16);

impl Traits {
    pub const NONE: Traits = Traits(0);

    #[inline]
    fn bit(t: Trait) -> u16 {
        1 << (t as u16)
    }

    #[inline]
    pub fn contains(self, t: Trait) -> bool {
        self.0 & Self::bit(t) != 0
    }

    #[inline]
    pub fn insert(&mut self, t: Trait) {
        self.0 |= Self::bit(t);
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Trait> for Traits {
    fn from_iter<I: IntoIterator<Item = Trait>>(iter: I) -> Self {
        let mut t = Traits::NONE;
        for x in iter {
            t.insert(x);
        }
        t
    }
}

// ── Specs (deserialized) ──────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateSpec {
    pub name: String,
    #[serde(default)]
    pub traits: Vec<Trait>,
    /// Relative infectiousness while in this state (health only).
    #[serde(default)]
    pub infectiousness: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategorySpec {
    pub initial: String,
    pub states:  Vec<StateSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaxonomySpec {
    pub health:      CategorySpec,
    pub role:        CategorySpec,
    pub testing:     CategorySpec,
    pub vaccination: CategorySpec,
}

impl TaxonomySpec {
    fn get(&self, category: Category) -> &CategorySpec {
        match category {
            Category::Health      => &self.health,
            Category::Role        => &self.role,
            Category::Testing     => &self.testing,
            Category::Vaccination => &self.vaccination,
        }
    }
}

// ── Taxonomy ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct CategorySchema {
    names:          Vec<String>,
    traits:         Vec<Traits>,
    infectiousness: Vec<f64>,
    initial:        StateValue,
}

/// Resolved state names and traits for all four categories.
#[derive(Clone, Debug)]
pub struct Taxonomy {
    schemas: [CategorySchema; Category::COUNT],
}

impl Taxonomy {
    pub fn from_spec(spec: &TaxonomySpec) -> StateResult<Self> {
        let schemas = Category::ALL.map(|c| build_schema(c, spec.get(c)));
        let [h, r, t, v] = schemas;
        Ok(Self { schemas: [h?, r?, t?, v?] })
    }

    #[inline]
    fn schema(&self, category: Category) -> &CategorySchema {
        &self.schemas[category.index()]
    }

    /// Value for `name`, if configured.
    pub fn lookup(&self, category: Category, name: &str) -> Option<StateValue> {
        self.schema(category)
            .names
            .iter()
            .position(|n| n == name)
            .map(|i| StateValue(i as u16))
    }

    /// Value for `name`, or a configuration error naming the missing state.
    pub fn require(&self, category: Category, name: &str) -> StateResult<StateValue> {
        self.lookup(category, name).ok_or_else(|| StateError::UnknownState {
            category,
            name: name.to_owned(),
        })
    }

    pub fn name(&self, category: Category, value: StateValue) -> &str {
        self.schema(category)
            .names
            .get(value.index())
            .map_or("<invalid>", String::as_str)
    }

    #[inline]
    pub fn traits(&self, category: Category, value: StateValue) -> Traits {
        self.schema(category)
            .traits
            .get(value.index())
            .copied()
            .unwrap_or_default()
    }

    #[inline]
    pub fn has(&self, category: Category, value: StateValue, t: Trait) -> bool {
        self.traits(category, value).contains(t)
    }

    /// Relative infectiousness of a health value.
    #[inline]
    pub fn infectiousness(&self, value: StateValue) -> f64 {
        self.schema(Category::Health)
            .infectiousness
            .get(value.index())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn initial(&self, category: Category) -> StateValue {
        self.schema(category).initial
    }

    /// Number of configured values in `category`.
    pub fn len(&self, category: Category) -> usize {
        self.schema(category).names.len()
    }

    pub fn values(&self, category: Category) -> impl Iterator<Item = StateValue> + use<> {
        (0..self.len(category) as u16).map(StateValue)
    }

    /// Every value of `category` carrying trait `t`.
    pub fn values_with(&self, category: Category, t: Trait) -> Vec<StateValue> {
        self.values(category).filter(|&v| self.has(category, v, t)).collect()
    }
}

fn build_schema(category: Category, spec: &CategorySpec) -> StateResult<CategorySchema> {
    if spec.states.is_empty() {
        return Err(StateError::Config(format!("category {category} has no states")));
    }
    if spec.states.len() >= u16::MAX as usize {
        return Err(StateError::Config(format!("category {category} has too many states")));
    }

    let mut names = Vec::with_capacity(spec.states.len());
    let mut traits = Vec::with_capacity(spec.states.len());
    let mut infectiousness = Vec::with_capacity(spec.states.len());

    for s in &spec.states {
        if s.name.trim().is_empty() {
            return Err(StateError::Config(format!("category {category} has an unnamed state")));
        }
        if names.contains(&s.name) {
            return Err(StateError::Config(format!(
                "category {category} declares state {:?} twice",
                s.name
            )));
        }
        if !s.infectiousness.is_finite() || s.infectiousness < 0.0 {
            return Err(StateError::Config(format!(
                "{category} state {:?}: infectiousness must be a non-negative number",
                s.name
            )));
        }
        names.push(s.name.clone());
        traits.push(s.traits.iter().copied().collect::<Traits>());
        infectiousness.push(s.infectiousness);
    }

    let initial = names
        .iter()
        .position(|n| *n == spec.initial)
        .map(|i| StateValue(i as u16))
        .ok_or_else(|| StateError::UnknownState { category, name: spec.initial.clone() })?;

    Ok(CategorySchema { names, traits, infectiousness, initial })
}
