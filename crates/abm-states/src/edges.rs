//! Edge tables and cross-category coupling rules.
//!
//! ```json
//! "states": {
//!   "regular": {
//!     "edges": {
//!       "health":  [["susceptible", "exposed"], ["exposed", "symptomatic"], ["exposed", "recovered"]],
//!       "role":    [["active", "isolated"], ["isolated", "active"]],
//!       "testing": [["untested", "awaiting"], ["awaiting", "positive"], ["awaiting", "negative"]]
//!     },
//!     "coupling": [
//!       { "when": { "category": "testing", "state": "positive" },
//!         "then": { "category": "role", "state": "isolated" },
//!         "from": ["active"] }
//!     ]
//!   },
//!   "hospital_employee": { ... }
//! }
//! ```
//!
//! A category absent from `edges` permits no transitions at all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use abm_core::{Category, StateValue};

use crate::{StateError, StateResult, Taxonomy, Trait};

// ── Specs (deserialized) ──────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VariantSpec {
    #[serde(default)]
    pub edges:    HashMap<Category, Vec<[String; 2]>>,
    #[serde(default)]
    pub coupling: Vec<CouplingSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub category: Category,
    #[serde(default)]
    pub state:    Option<String>,
    #[serde(default, rename = "trait")]
    pub has:      Option<Trait>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetSpec {
    pub category: Category,
    pub state:    String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CouplingSpec {
    pub when: ConditionSpec,
    pub then: TargetSpec,
    /// Only fire when the forced category currently holds one of these.
    #[serde(default)]
    pub from: Option<Vec<String>>,
}

/// Edge tables and coupling rules for the two states-manager variants.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatesSpec {
    pub regular: VariantSpec,
    /// Falls back to `regular` when absent.
    #[serde(default)]
    pub hospital_employee: Option<VariantSpec>,
}

// ── EdgeTable ─────────────────────────────────────────────────────────────────

/// Allowed `from → to` pairs for one category, as a dense boolean matrix.
#[derive(Clone, Debug)]
pub struct EdgeTable {
    n:       usize,
    allowed: Vec<bool>,
}

impl EdgeTable {
    pub fn empty(n: usize) -> Self {
        Self { n, allowed: vec![false; n * n] }
    }

    pub fn allow(&mut self, from: StateValue, to: StateValue) {
        self.allowed[from.index() * self.n + to.index()] = true;
    }

    #[inline]
    pub fn permits(&self, from: StateValue, to: StateValue) -> bool {
        from.index() < self.n && to.index() < self.n && self.allowed[from.index() * self.n + to.index()]
    }

    /// Number of permitted edges.
    pub fn len(&self) -> usize {
        self.allowed.iter().filter(|&&a| a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── CouplingRule ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    State(StateValue),
    Trait(Trait),
}

/// "When `category` takes a value matching `condition`, force `target` to
/// `value`."
#[derive(Clone, Debug, PartialEq)]
pub struct CouplingRule {
    pub category:  Category,
    pub condition: Condition,
    pub target:    Category,
    pub value:     StateValue,
    pub from:      Option<Vec<StateValue>>,
}

impl CouplingRule {
    #[inline]
    pub fn matches(&self, taxonomy: &Taxonomy, category: Category, value: StateValue) -> bool {
        category == self.category
            && match self.condition {
                Condition::State(v) => v == value,
                Condition::Trait(t) => taxonomy.has(category, value, t),
            }
    }
}

// ── Compiled variant ──────────────────────────────────────────────────────────

/// Edge tables for all categories plus coupling rules, for one variant.
#[derive(Clone, Debug)]
pub struct VariantTables {
    pub edges:    [EdgeTable; Category::COUNT],
    pub coupling: Vec<CouplingRule>,
}

impl VariantTables {
    pub fn compile(taxonomy: &Taxonomy, spec: &VariantSpec, label: &str) -> StateResult<Self> {
        let mut edges = Category::ALL.map(|c| EdgeTable::empty(taxonomy.len(c)));

        for (&category, pairs) in &spec.edges {
            for [from, to] in pairs {
                let f = taxonomy.require(category, from)?;
                let t = taxonomy.require(category, to)?;
                if f == t {
                    return Err(StateError::Config(format!(
                        "{label}: {category} self-edge {from:?} -> {to:?} is not allowed"
                    )));
                }
                edges[category.index()].allow(f, t);
            }
        }

        let mut coupling = Vec::with_capacity(spec.coupling.len());
        for rule in &spec.coupling {
            let condition = match (&rule.when.state, rule.when.has) {
                (Some(name), None) => Condition::State(taxonomy.require(rule.when.category, name)?),
                (None, Some(t)) => Condition::Trait(t),
                _ => {
                    return Err(StateError::Config(format!(
                        "{label}: coupling condition on {} needs exactly one of `state` or `trait`",
                        rule.when.category
                    )));
                }
            };
            if rule.then.category == rule.when.category {
                return Err(StateError::Config(format!(
                    "{label}: coupling rule may not force its own category {}",
                    rule.then.category
                )));
            }
            let value = taxonomy.require(rule.then.category, &rule.then.state)?;
            let from = match &rule.from {
                None => None,
                Some(names) => Some(
                    names
                        .iter()
                        .map(|n| taxonomy.require(rule.then.category, n))
                        .collect::<StateResult<Vec<_>>>()?,
                ),
            };
            coupling.push(CouplingRule {
                category: rule.when.category,
                condition,
                target: rule.then.category,
                value,
                from,
            });
        }

        Ok(Self { edges, coupling })
    }
}
