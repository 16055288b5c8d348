//! Scalar parameters that are either constants or curves over an input.

use serde::{Deserialize, Serialize};

use crate::{Evaluated, TransitionFunction};

/// Which agent/world quantity a curve is keyed by.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveInput {
    /// Agent age in years.
    #[default]
    Age,
    /// Simulated days since the start of the run.
    SimDay,
}

/// Values a `Param` may be keyed by, gathered once per evaluation.
#[derive(Copy, Clone, Debug, Default)]
pub struct CurveInputs {
    pub age:     f64,
    pub sim_day: f64,
}

impl CurveInputs {
    #[inline]
    pub fn get(&self, input: CurveInput) -> f64 {
        match input {
            CurveInput::Age    => self.age,
            CurveInput::SimDay => self.sim_day,
        }
    }
}

/// A number in the parameter set: either a constant (`0.3`) or a transition
/// function of an input (`{"input": "age", "function": {...}}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Const(f64),
    Curve {
        #[serde(default)]
        input:    CurveInput,
        function: TransitionFunction,
    },
}

impl Param {
    pub fn eval(&self, inputs: &CurveInputs) -> Evaluated {
        match self {
            Param::Const(v) => Evaluated { value: *v, clamped: false },
            Param::Curve { input, function } => function.eval(inputs.get(*input)),
        }
    }

    /// Smallest and largest value the parameter can produce.
    pub fn range(&self) -> (f64, f64) {
        match self {
            Param::Const(v) => (*v, *v),
            Param::Curve { function, .. } => {
                let mut lo = f64::INFINITY;
                let mut hi = f64::NEG_INFINITY;
                for &(_, y) in function.points() {
                    lo = lo.min(y);
                    hi = hi.max(y);
                }
                if let Some(d) = function.default_value() {
                    lo = lo.min(d);
                    hi = hi.max(d);
                }
                (lo, hi)
            }
        }
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Const(v)
    }
}
