//! Piecewise transition functions.
//!
//! A `TransitionFunction` is an ordered list of `(x, y)` breakpoints with
//! either four points (three segments) or five points (four segments).  It is
//! used as a deterministic probability lookup (e.g. hospitalization
//! probability by age) and as the mean/shape parameter of duration draws.
//!
//! Vaccine protection curves are authored in days since the dose and shifted
//! to absolute simulated days with [`TransitionFunction::shifted`].
//!
//! # JSON form
//!
//! ```json
//! { "points": [[0, 0.0], [14, 0.6], [180, 0.6], [365, 0.0]],
//!   "interpolation": "linear",
//!   "default": 0.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::{AbmError, AbmResult};

/// How values between breakpoints are computed.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Straight line between neighbouring breakpoints.
    #[default]
    Linear,
    /// Hold the left breakpoint's value until the next breakpoint.
    Step,
}

/// Result of evaluating a curve.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Evaluated {
    pub value:   f64,
    /// `true` when the input was outside the domain and no default was
    /// configured, so the nearest end point was used instead.
    pub clamped: bool,
}

/// Raw deserialized form, validated by `TryFrom`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CurveSpec {
    points: Vec<(f64, f64)>,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default)]
    default: Option<f64>,
}

/// A validated three- or four-segment piecewise curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveSpec", into = "CurveSpec")]
pub struct TransitionFunction {
    points:        Vec<(f64, f64)>,
    interpolation: Interpolation,
    default:       Option<f64>,
}

impl TransitionFunction {
    /// Build a curve from 4 or 5 breakpoints with strictly increasing x.
    pub fn new(points: Vec<(f64, f64)>, interpolation: Interpolation) -> AbmResult<Self> {
        if !(4..=5).contains(&points.len()) {
            return Err(AbmError::MalformedCurve(format!(
                "expected 4 or 5 breakpoints (3 or 4 segments), got {}",
                points.len()
            )));
        }
        if let Some((x, y)) = points.iter().find(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(AbmError::MalformedCurve(format!(
                "non-finite breakpoint ({x}, {y})"
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(AbmError::MalformedCurve(format!(
                "breakpoints must be strictly increasing: {} then {}",
                w[0].0, w[1].0
            )));
        }
        Ok(Self { points, interpolation, default: None })
    }

    /// Three segments.
    pub fn three_part(points: [(f64, f64); 4]) -> AbmResult<Self> {
        Self::new(points.to_vec(), Interpolation::Linear)
    }

    /// Four segments.
    pub fn four_part(points: [(f64, f64); 5]) -> AbmResult<Self> {
        Self::new(points.to_vec(), Interpolation::Linear)
    }

    /// Value returned for any input outside the breakpoint domain.
    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn segments(&self) -> usize {
        self.points.len() - 1
    }

    pub fn default_value(&self) -> Option<f64> {
        self.default
    }

    /// `(first x, last x)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.points[0].0, self.points[self.points.len() - 1].0)
    }

    /// Largest configured value.
    pub fn peak(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Value at the start of the final segment (the plateau level of a
    /// ramp/plateau/wane curve).
    pub fn plateau(&self) -> f64 {
        self.points[self.points.len() - 2].1
    }

    /// A copy with every breakpoint moved right by `dx`.
    pub fn shifted(&self, dx: f64) -> Self {
        Self {
            points:        self.points.iter().map(|&(x, y)| (x + dx, y)).collect(),
            interpolation: self.interpolation,
            default:       self.default,
        }
    }

    /// Evaluate at `x`.
    ///
    /// Breakpoints return their configured value exactly.  Outside the domain
    /// the configured default is returned; without a default the nearest end
    /// point is used and `clamped` is set.
    pub fn eval(&self, x: f64) -> Evaluated {
        let (lo, hi) = self.domain();
        if x.is_nan() || x < lo || x > hi {
            if let Some(d) = self.default {
                return Evaluated { value: d, clamped: false };
            }
            let value = if x > hi {
                self.points[self.points.len() - 1].1
            } else {
                self.points[0].1
            };
            return Evaluated { value, clamped: true };
        }

        // Index of the last breakpoint with x_i <= x.
        let i = self.points.partition_point(|p| p.0 <= x) - 1;
        let (x0, y0) = self.points[i];
        if x == x0 || i + 1 == self.points.len() {
            return Evaluated { value: y0, clamped: false };
        }
        let value = match self.interpolation {
            Interpolation::Step => y0,
            Interpolation::Linear => {
                let (x1, y1) = self.points[i + 1];
                y0 + (y1 - y0) * (x - x0) / (x1 - x0)
            }
        };
        Evaluated { value, clamped: false }
    }

    /// Evaluate and discard the clamp flag.
    #[inline]
    pub fn value_at(&self, x: f64) -> f64 {
        self.eval(x).value
    }
}

impl TryFrom<CurveSpec> for TransitionFunction {
    type Error = AbmError;

    fn try_from(spec: CurveSpec) -> Result<Self, Self::Error> {
        let mut f = TransitionFunction::new(spec.points, spec.interpolation)?;
        f.default = spec.default;
        Ok(f)
    }
}

impl From<TransitionFunction> for CurveSpec {
    fn from(f: TransitionFunction) -> Self {
        CurveSpec {
            points:        f.points,
            interpolation: f.interpolation,
            default:       f.default,
        }
    }
}
