//! Optimizer port: box-constrained gradient-based minimization.

use std::time::Duration;

/// Differentiable objective over a control vector.
pub trait ControlProblem {
    fn value(&self, controls: &[f64]) -> f64;
    fn gradient(&self, controls: &[f64]) -> Vec<f64>;
}

/// Identical box bounds applied to every control in the sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ControlBounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        assert!(lower <= upper, "lower bound must not exceed upper bound");
        Self { lower, upper }
    }

    /// Project a value onto the box.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

impl Default for ControlBounds {
    fn default() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }
}

/// Configuration bundle recognized by optimizer adapters.
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    /// Wall-clock budget; exhausting it returns the best iterate so far.
    pub time_limit: Option<Duration>,
    /// Emit a per-iteration trace on stderr.
    pub verbose: bool,
    /// Relative objective-decrease tolerance.
    pub f_tol: f64,
    /// Projected-gradient-norm tolerance.
    pub g_tol: f64,
    /// Iteration cap.
    pub iterations: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            time_limit: None,
            verbose: false,
            f_tol: 1e-8,
            g_tol: 1e-8,
            iterations: 100,
        }
    }
}

/// Box-constrained gradient-based minimizer.
///
/// Implementations must be interruptible by the configured budgets and
/// must return the best iterate found rather than failing on
/// non-convergence.
pub trait ControlOptimizer {
    fn minimize(
        &self,
        problem: &dyn ControlProblem,
        bounds: ControlBounds,
        init: &[f64],
        options: &OptimizerOptions,
    ) -> Vec<f64>;
}
