//! The swept epsilon parameter.

use errors::*;
use std::fmt;

// Absorbs representation error in (max - min) / step, e.g. (1.0 - 0.01) / 0.01.
const STEP_TOLERANCE: f64 = 1e-9;

/// Upper bound on the number of epsilon values in one sweep.
pub const MAX_STEPS: usize = 1_000_000;

/// An inclusive epsilon range walked with a fixed step.
///
/// Values are always computed from their integer index as `min + i * step`,
/// never by accumulating the step, so the same index yields the same bits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonRange {
    min: f64,
    max: f64,
    step: f64,
}

impl EpsilonRange {
    /// Creates a new `EpsilonRange`. Requires `0 < min <= max <= 1` and a
    /// positive step.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        if !(min > 0.0 && min <= max && max <= 1.0) {
            bail!(ErrorKind::Setting(format!(
                "epsilon range must satisfy 0 < min <= max <= 1, got {}..{}",
                min,
                max
            )));
        }
        if !(step > 0.0) || !step.is_finite() {
            bail!(ErrorKind::Setting(format!("epsilon step must be positive, got {}", step)));
        }
        let steps = (max - min) / step + STEP_TOLERANCE;
        if !(steps < MAX_STEPS as f64) {
            bail!(ErrorKind::Setting(format!(
                "epsilon step {} gives more than {} values",
                step,
                MAX_STEPS
            )));
        }
        Ok(EpsilonRange {
            min: min,
            max: max,
            step: step,
        })
    }

    /// Lower bound (passed as `-e`).
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound (passed as `-f`).
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Step (passed as `-j`).
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of epsilon values in the sweep.
    pub fn len(&self) -> usize {
        ((self.max - self.min) / self.step + STEP_TOLERANCE).floor() as usize + 1
    }

    /// The `i`-th epsilon value.
    pub fn value(&self, i: usize) -> f64 {
        self.min + (i as f64) * self.step
    }

    /// All epsilon values in increasing order.
    pub fn values(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.value(i)).collect()
    }
}

impl fmt::Display for EpsilonRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..={} by {}", self.min, self.max, self.step)
    }
}
