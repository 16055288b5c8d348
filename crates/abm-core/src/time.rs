//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  One tick is one step of
//! the pipeline and spans `step_days` simulated days:
//!
//!   time_days = tick * step_days
//!
//! All scheduling is done on integer ticks so comparisons are exact; the
//! floating-point day value is only used as the input to rate curves.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and simulated days.
///
/// Only the driver advances the clock; every other component receives the
/// current `Tick` as an argument.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Simulated days per tick (e.g. 0.25 for four steps a day).
    pub step_days:    f64,
    /// The current tick, advanced once per completed pipeline.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(step_days: f64) -> Self {
        Self {
            step_days,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Simulated days at the current tick.
    #[inline]
    pub fn now_days(&self) -> f64 {
        self.days_at(self.current_tick)
    }

    /// Simulated days at an arbitrary tick.
    #[inline]
    pub fn days_at(&self, tick: Tick) -> f64 {
        tick.0 as f64 * self.step_days
    }

    /// Days between two ticks.
    #[inline]
    pub fn days_between(&self, earlier: Tick, later: Tick) -> f64 {
        later.since(earlier) as f64 * self.step_days
    }

    /// How many ticks span `days`?  Rounds up so a duration never ends early;
    /// non-positive or non-finite input yields zero.
    #[inline]
    pub fn ticks_for_days(&self, days: f64) -> u64 {
        if !days.is_finite() || days <= 0.0 {
            return 0;
        }
        (days / self.step_days - 1e-9).ceil().max(0.0) as u64
    }

    /// First tick at or after `days` simulated days.
    #[inline]
    pub fn tick_at_days(&self, days: f64) -> Tick {
        Tick(self.ticks_for_days(days))
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (day {:.2})", self.current_tick, self.now_days())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Simulated days per tick.  Must be positive.
    pub step_days: f64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    #[serde(default)]
    pub num_threads: Option<usize>,

    /// Emit per-agent snapshots every N ticks; 0 disables them.
    #[serde(default = "default_output_interval")]
    pub output_interval_ticks: u64,
}

fn default_output_interval() -> u64 {
    1
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.step_days)
    }
}
