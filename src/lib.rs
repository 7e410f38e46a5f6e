//! Active-inference control for NARX dynamical systems.
//!
//! This crate provides:
//! - Conjugate Normal-Gamma beliefs over NARX coefficients with exact
//!   streaming updates and a running log-evidence signal
//! - Student-t posterior predictive distributions
//! - Certainty-equivalence multi-step forecasting
//! - Expected-free-energy objectives balancing pragmatic, epistemic and
//!   control-effort terms
//! - Receding-horizon planning through a pluggable box-constrained
//!   gradient optimizer with forward-mode AD gradients

pub mod adapters;
pub mod agent;
pub mod beliefs;
pub mod buffer;
pub mod efe;
pub mod error;
pub mod features;
pub mod forecast;
pub mod goals;
pub mod ports;

pub use adapters::SpectralProjectedGradient;
pub use agent::{AgentConfig, MinimizeRequest, NarxAgent};
pub use beliefs::{NormalGamma, StudentT};
pub use buffer::backshift;
pub use efe::{
    EfeObjective, control_cost, gaussian_cross_entropy, mutual_info_from_feature, single_step_efe,
};
pub use error::{Error, Result};
pub use features::{basis_order, polynomial_basis};
pub use forecast::{ForecastPath, Forecaster};
pub use goals::{Gaussian, GoalModel, update_goals};
pub use ports::{ControlBounds, ControlOptimizer, ControlProblem, OptimizerOptions};
