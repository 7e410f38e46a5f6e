//! Expected-free-energy terms and the horizon objective.
//!
//! The planner scores a control sequence as accumulated pragmatic value
//! (moment-matched cross-entropy to a Gaussian goal) minus epistemic value
//! (mutual information of the predicted regressor) plus a quadratic control
//! cost. Constant and normalizing terms are dropped throughout since only
//! relative ordering matters for minimization.

use nalgebra::DMatrix;
use num_dual::{Dual64, DualNum};

use crate::{
    forecast::{Forecaster, quadratic_form},
    goals::Gaussian,
    ports::ControlProblem,
};

/// Epistemic value of observing a feature vector under coefficient
/// covariance scale `Lambda^-1`: `0.5 ln(1 + phi' Lambda^-1 phi)`.
pub fn mutual_info_from_feature<D: DualNum<f64> + Copy>(
    covariance_scale: &DMatrix<f64>,
    phi: &[D],
) -> D {
    (quadratic_form(covariance_scale, phi) + D::from(1.0)).ln() * D::from(0.5)
}

/// Pragmatic value: cross-entropy of a moment-matched predictive `(mean,
/// variance)` against a Gaussian goal, up to goal-constant terms.
pub fn gaussian_cross_entropy<D: DualNum<f64> + Copy>(goal: &Gaussian, mean: D, variance: D) -> D {
    let residual = mean - D::from(goal.mean());
    (variance + residual * residual) / D::from(2.0 * goal.variance())
}

/// Quadratic control-effort penalty `(eta / 2) u^2`.
pub fn control_cost<D: DualNum<f64> + Copy>(eta: f64, control: D) -> D {
    control * control * D::from(0.5 * eta)
}

/// Single-step EFE: pragmatic minus epistemic plus control cost.
pub fn single_step_efe<D: DualNum<f64> + Copy>(
    goal: &Gaussian,
    covariance_scale: &DMatrix<f64>,
    phi: &[D],
    mean: D,
    variance: D,
    eta: f64,
    control: D,
) -> D {
    gaussian_cross_entropy(goal, mean, variance) - mutual_info_from_feature(covariance_scale, phi)
        + control_cost(eta, control)
}

/// Horizon EFE objective over a control sequence, differentiable in the
/// controls through the whole certainty-equivalence rollout.
#[derive(Debug, Clone)]
pub struct EfeObjective {
    forecaster: Forecaster,
    eta: f64,
    goals: Vec<Gaussian>,
}

impl EfeObjective {
    /// Build from a frozen rollout state, the control-effort precision and
    /// per-step goals already resolved to the horizon length.
    pub fn new(forecaster: Forecaster, eta: f64, goals: Vec<Gaussian>) -> Self {
        Self {
            forecaster,
            eta,
            goals,
        }
    }

    /// Accumulated EFE of a control sequence, generic over the scalar so
    /// the same code path serves evaluation and forward-mode AD.
    ///
    /// # Panics
    ///
    /// Panics if `controls` is longer than the resolved goal horizon.
    pub fn value_generic<D: DualNum<f64> + Copy>(&self, controls: &[D]) -> D {
        assert!(
            controls.len() <= self.goals.len(),
            "control sequence exceeds the resolved goal horizon"
        );
        let path = self.forecaster.forecast(controls);
        let mut total = D::from(0.0);
        for (step, &control) in controls.iter().enumerate() {
            total = total
                + gaussian_cross_entropy(&self.goals[step], path.means[step], path.variances[step])
                - path.info_gains[step]
                + control_cost(self.eta, control);
        }
        total
    }
}

impl ControlProblem for EfeObjective {
    fn value(&self, controls: &[f64]) -> f64 {
        self.value_generic(controls)
    }

    fn gradient(&self, controls: &[f64]) -> Vec<f64> {
        let mut duals: Vec<Dual64> = controls.iter().map(|&u| Dual64::from_re(u)).collect();
        let mut gradient = vec![0.0; controls.len()];
        for i in 0..controls.len() {
            duals[i] = Dual64::new(controls[i], 1.0);
            gradient[i] = self.value_generic(&duals).eps;
            duals[i] = Dual64::from_re(controls[i]);
        }
        gradient
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{DMatrix, DVector};

    use super::*;
    use crate::{beliefs::NormalGamma, buffer::backshift, features::polynomial_basis};

    fn belief() -> NormalGamma {
        NormalGamma::new(
            DVector::from_vec(vec![0.1, 0.5, 1.0]),
            DMatrix::identity(3, 3) * 4.0,
            3.0,
            2.0,
        )
        .expect("valid belief")
    }

    fn forecaster(belief: &NormalGamma) -> Forecaster {
        Forecaster::new(belief, &[0.8], &[0.1], 1, true).expect("forecaster builds")
    }

    #[test]
    fn single_step_objective_matches_term_decomposition() {
        let belief = belief();
        let eta = 0.7;
        let control = 0.4;
        let goal = Gaussian::new(1.0, 0.5).expect("valid goal");
        let objective = EfeObjective::new(forecaster(&belief), eta, vec![goal]);

        // Recompute the three terms independently from the same state.
        let covariance_scale = belief.covariance_scale().expect("invertible");
        let ubuffer = backshift(&[0.1], control);
        let mut window = vec![0.8];
        window.extend_from_slice(&ubuffer);
        let phi = polynomial_basis(&window, 1, true);
        let path = forecaster(&belief).forecast(&[control]);
        let expected = single_step_efe(
            &goal,
            &covariance_scale,
            &phi,
            path.means[0],
            path.variances[0],
            eta,
            control,
        );

        assert!((objective.value(&[control]) - expected).abs() < 1e-12);
    }

    #[test]
    fn epistemic_value_grows_with_feature_norm() {
        let covariance_scale = DMatrix::identity(3, 3) * 0.25;
        let mut previous = f64::NEG_INFINITY;
        for scale in [0.5, 1.0, 2.0, 4.0] {
            let phi = [scale, -scale, 0.5 * scale];
            let info = mutual_info_from_feature(&covariance_scale, &phi);
            assert!(info >= previous);
            previous = info;
        }
    }

    #[test]
    fn gradient_matches_central_differences() {
        let goal = Gaussian::new(0.5, 0.2).expect("valid goal");
        let objective = EfeObjective::new(forecaster(&belief()), 0.3, vec![goal; 3]);
        let controls = [0.2, -0.4, 0.1];
        let gradient = objective.gradient(&controls);

        let step = 1e-6;
        for i in 0..controls.len() {
            let mut forward = controls;
            let mut backward = controls;
            forward[i] += step;
            backward[i] -= step;
            let numeric = (objective.value(&forward) - objective.value(&backward)) / (2.0 * step);
            assert!(
                (gradient[i] - numeric).abs() < 1e-5,
                "coordinate {i}: AD {} vs numeric {numeric}",
                gradient[i]
            );
        }
    }

    #[test]
    fn control_cost_is_quadratic_in_the_control() {
        assert_eq!(control_cost(2.0, 3.0), 9.0);
        assert_eq!(control_cost(0.0, 5.0), 0.0);
    }
}
