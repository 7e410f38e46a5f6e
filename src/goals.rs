//! Goal (target) distributions and the rolling goal horizon.
//!
//! A goal is a Gaussian target over the system output at one future step.
//! Planning either applies a single target uniformly across the horizon or
//! consumes an explicit per-step sequence; the two configurations are a
//! tagged choice and are never inferred from argument shape.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Gaussian target distribution over a future output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    mean: f64,
    variance: f64,
}

impl Gaussian {
    /// Construct from mean and variance. The variance must be strictly
    /// positive and finite.
    pub fn new(mean: f64, variance: f64) -> Result<Self> {
        if !mean.is_finite() || !variance.is_finite() || variance <= 0.0 {
            return Err(Error::InvalidConfiguration {
                message: format!("goal must have finite mean and positive variance (mean={mean}, variance={variance})"),
            });
        }
        Ok(Self { mean, variance })
    }

    /// Standard normal target, the default goal prior.
    pub fn standard() -> Self {
        Self {
            mean: 0.0,
            variance: 1.0,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }
}

/// Goal configuration for a planning horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GoalModel {
    /// One target applied identically at every step of the horizon.
    Constant(Gaussian),
    /// Explicit per-step targets; must cover at least the horizon length.
    Sequence(Vec<Gaussian>),
}

impl GoalModel {
    /// Resolve the per-step targets for a horizon of the given length.
    pub fn resolve(&self, horizon: usize) -> Result<Vec<Gaussian>> {
        match self {
            GoalModel::Constant(goal) => Ok(vec![*goal; horizon]),
            GoalModel::Sequence(sequence) => {
                if sequence.len() < horizon {
                    return Err(Error::GoalHorizonMismatch {
                        horizon,
                        goals: sequence.len(),
                    });
                }
                Ok(sequence[..horizon].to_vec())
            }
        }
    }
}

/// Advance a rolling goal horizon: rotate the sequence left by one step and
/// overwrite the final slot with the new goal. Length is preserved.
pub fn update_goals(goals: &mut [Gaussian], new_goal: Gaussian) {
    let len = goals.len();
    if len == 0 {
        return;
    }
    goals.rotate_left(1);
    goals[len - 1] = new_goal;
}
