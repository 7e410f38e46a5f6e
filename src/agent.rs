//! The NARX active-inference agent.
//!
//! Owns the lag buffers, the Normal-Gamma belief, the goal configuration
//! and the running free-energy signal. The intended loop is strictly
//! sequential per agent instance: observe with [`NarxAgent::update`],
//! optionally advance the rolling goals, plan with
//! [`NarxAgent::minimize_efe`], apply the first control, repeat. The agent
//! performs no internal locking; callers must serialize concurrent use.

use std::time::Duration;

use nalgebra::{DMatrix, DVector};
use num_dual::Dual64;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::SpectralProjectedGradient,
    beliefs::NormalGamma,
    buffer::backshift,
    efe::{EfeObjective, gaussian_cross_entropy},
    error::{Error, Result},
    features::{basis_order, polynomial_basis},
    forecast::Forecaster,
    goals::{Gaussian, GoalModel, update_goals},
    ports::{ControlBounds, ControlOptimizer, ControlProblem, OptimizerOptions},
};

/// Immutable agent configuration, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Number of lagged inputs beyond the current one.
    pub delay_inp: usize,
    /// Number of lagged outputs.
    pub delay_out: usize,
    /// Degree of the elementwise polynomial basis.
    pub pol_degree: usize,
    /// Prepend a constant feature.
    pub zero_order: bool,
    /// Receding-horizon length.
    pub time_horizon: usize,
    /// Default optimizer iteration budget.
    pub num_iters: usize,
    /// Control-effort prior precision (eta).
    pub control_prior_precision: f64,
    /// Goal prior applied until the caller installs explicit goals.
    pub goal_prior: Gaussian,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            delay_inp: 1,
            delay_out: 1,
            pol_degree: 1,
            zero_order: false,
            time_horizon: 1,
            num_iters: 100,
            control_prior_precision: 0.0,
            goal_prior: Gaussian::standard(),
        }
    }
}

/// Per-call knobs for [`NarxAgent::minimize_efe`].
#[derive(Debug, Clone, Default)]
pub struct MinimizeRequest {
    /// Initial control sequence; defaults to all zeros over the horizon.
    pub initial_controls: Option<Vec<f64>>,
    /// Box bounds applied to every control.
    pub control_lims: ControlBounds,
    /// Wall-clock budget for the optimizer.
    pub time_limit: Option<Duration>,
    /// Per-iteration optimizer trace.
    pub verbose: bool,
    /// Iteration cap; defaults to the agent's `num_iters`.
    pub iterations: Option<usize>,
    /// Objective-decrease tolerance override.
    pub f_tol: Option<f64>,
    /// Gradient-norm tolerance override.
    pub g_tol: Option<f64>,
}

/// Active-inference controller for a NARX system.
#[derive(Debug, Clone)]
pub struct NarxAgent {
    config: AgentConfig,
    order: usize,
    ybuffer: Vec<f64>,
    ubuffer: Vec<f64>,
    belief: NormalGamma,
    goals: GoalModel,
    free_energy: f64,
}

impl NarxAgent {
    /// Construct from prior hyperparameters and configuration.
    ///
    /// Fails fast when the coefficient prior length does not match the
    /// feature order implied by the delays, degree and zero-order flag.
    pub fn new(
        coefficients_mean: DVector<f64>,
        coefficients_precision: DMatrix<f64>,
        noise_shape: f64,
        noise_rate: f64,
        config: AgentConfig,
    ) -> Result<Self> {
        if config.pol_degree == 0 {
            return Err(Error::InvalidConfiguration {
                message: "polynomial degree must be at least 1".to_string(),
            });
        }
        if config.time_horizon == 0 {
            return Err(Error::InvalidConfiguration {
                message: "time horizon must be at least 1".to_string(),
            });
        }
        if !(config.control_prior_precision >= 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "control prior precision must be non-negative, got {}",
                    config.control_prior_precision
                ),
            });
        }

        let window = 1 + config.delay_inp + config.delay_out;
        let order = basis_order(window, config.pol_degree, config.zero_order);
        if coefficients_mean.len() != order {
            return Err(Error::DimensionMismatch {
                expected: order,
                got: coefficients_mean.len(),
            });
        }

        let belief = NormalGamma::new(
            coefficients_mean,
            coefficients_precision,
            noise_shape,
            noise_rate,
        )?;
        let goals = GoalModel::Constant(config.goal_prior);

        Ok(Self {
            ybuffer: vec![0.0; config.delay_out],
            ubuffer: vec![0.0; config.delay_inp + 1],
            order,
            belief,
            goals,
            free_energy: f64::INFINITY,
            config,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Feature-vector dimension, fixed for the agent's lifetime.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn belief(&self) -> &NormalGamma {
        &self.belief
    }

    /// Negative incremental log evidence of the most recent update;
    /// infinite until the first update.
    pub fn free_energy(&self) -> f64 {
        self.free_energy
    }

    pub fn ybuffer(&self) -> &[f64] {
        &self.ybuffer
    }

    pub fn ubuffer(&self) -> &[f64] {
        &self.ubuffer
    }

    pub fn goals(&self) -> &GoalModel {
        &self.goals
    }

    /// Replace the goal configuration.
    pub fn set_goals(&mut self, goals: GoalModel) {
        self.goals = goals;
    }

    /// Advance the rolling goal horizon by one step. A constant goal is
    /// unaffected.
    pub fn advance_goals(&mut self, new_goal: Gaussian) {
        if let GoalModel::Sequence(sequence) = &mut self.goals {
            update_goals(sequence, new_goal);
        }
    }

    /// Observe one (output, input) pair: refresh the posterior, the lag
    /// buffers and the free-energy signal.
    pub fn update(&mut self, y: f64, u: f64) -> Result<()> {
        self.ubuffer = backshift(&self.ubuffer, u);
        let mut window = self.ybuffer.clone();
        window.extend_from_slice(&self.ubuffer);
        let phi = DVector::from_vec(polynomial_basis(
            &window,
            self.config.pol_degree,
            self.config.zero_order,
        ));
        let log_evidence = self.belief.update(y, &phi)?;
        self.ybuffer = backshift(&self.ybuffer, y);
        self.free_energy = -log_evidence;
        Ok(())
    }

    fn forecaster(&self) -> Result<Forecaster> {
        Forecaster::new(
            &self.belief,
            &self.ybuffer,
            &self.ubuffer,
            self.config.pol_degree,
            self.config.zero_order,
        )
    }

    /// Certainty-equivalence forecast of the next `horizon` outputs under a
    /// candidate control sequence. Returns per-step predictive means and
    /// variances.
    pub fn predictions(&self, controls: &[f64], horizon: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        if controls.len() < horizon {
            return Err(Error::DimensionMismatch {
                expected: horizon,
                got: controls.len(),
            });
        }
        let path = self.forecaster()?.forecast(&controls[..horizon]);
        Ok((path.means, path.variances))
    }

    fn objective(&self, goals: &GoalModel, horizon: usize) -> Result<EfeObjective> {
        let resolved = goals.resolve(horizon)?;
        Ok(EfeObjective::new(
            self.forecaster()?,
            self.config.control_prior_precision,
            resolved,
        ))
    }

    /// Horizon EFE of a candidate control sequence under the supplied goals.
    pub fn expected_free_energy(&self, goals: &GoalModel, controls: &[f64]) -> Result<f64> {
        let objective = self.objective(goals, controls.len())?;
        Ok(objective.value(controls))
    }

    /// Minimize the horizon EFE with the default optimizer adapter.
    pub fn minimize_efe(&self, goals: &GoalModel, request: &MinimizeRequest) -> Result<Vec<f64>> {
        self.minimize_efe_with(&SpectralProjectedGradient, goals, request)
    }

    /// Minimize the horizon EFE with an injected optimizer. Returns the
    /// full optimized control sequence; the caller applies only the first
    /// control and re-plans at the next timestep.
    pub fn minimize_efe_with(
        &self,
        optimizer: &dyn ControlOptimizer,
        goals: &GoalModel,
        request: &MinimizeRequest,
    ) -> Result<Vec<f64>> {
        let horizon = self.config.time_horizon;
        let objective = self.objective(goals, horizon)?;

        let init = match &request.initial_controls {
            Some(controls) if controls.len() == horizon => controls.clone(),
            Some(controls) => {
                return Err(Error::DimensionMismatch {
                    expected: horizon,
                    got: controls.len(),
                });
            }
            None => vec![0.0; horizon],
        };

        let defaults = OptimizerOptions::default();
        let options = OptimizerOptions {
            time_limit: request.time_limit,
            verbose: request.verbose,
            f_tol: request.f_tol.unwrap_or(defaults.f_tol),
            g_tol: request.g_tol.unwrap_or(defaults.g_tol),
            iterations: request.iterations.unwrap_or(self.config.num_iters),
        };

        Ok(optimizer.minimize(&objective, request.control_lims, &init, &options))
    }

    /// Per-term EFE derivatives with respect to a single scalar control:
    /// `(d_epistemic, d_pragmatic, d_control_cost)`. Purely diagnostic.
    pub fn efe_balance(&self, goal: &Gaussian, control: f64) -> Result<(f64, f64, f64)> {
        let forecaster = self.forecaster()?;
        let seeded = [Dual64::new(control, 1.0)];
        let path = forecaster.forecast(&seeded);
        let d_epistemic = path.info_gains[0].eps;
        let d_pragmatic = gaussian_cross_entropy(goal, path.means[0], path.variances[0]).eps;
        let d_control_cost = 2.0 * self.config.control_prior_precision * control;
        Ok((d_epistemic, d_pragmatic, d_control_cost))
    }
}
