//! Ports (trait boundaries) for external dependencies.
//!
//! The optimizer behind receding-horizon planning is an injected
//! capability: the domain owns the trait, adapters implement it. Keeping
//! the boundary explicit makes alternative minimizers swappable without
//! touching the planner.

pub mod optimizer;

pub use optimizer::{ControlBounds, ControlOptimizer, ControlProblem, OptimizerOptions};
