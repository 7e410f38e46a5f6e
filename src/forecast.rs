//! Certainty-equivalence multi-step forecasting.
//!
//! The forecaster freezes a snapshot of the belief and lag buffers, then
//! rolls the buffers forward under a candidate control sequence. Each step
//! feeds the predictive *mean* back into the output buffer; per-step
//! variance is computed from the current posterior only and does not
//! compound uncertainty from earlier forecast steps. This
//! certainty-equivalence approximation is deliberate and load-bearing for
//! the planner's numerical behavior.

use nalgebra::DMatrix;
use num_dual::DualNum;

use crate::{
    beliefs::NormalGamma,
    buffer::backshift,
    error::{Error, Result},
    features::polynomial_basis,
};

/// Quadratic form `phi' M phi` with a constant matrix and a (possibly
/// dual-valued) feature vector.
pub(crate) fn quadratic_form<D: DualNum<f64> + Copy>(matrix: &DMatrix<f64>, phi: &[D]) -> D {
    let mut total = D::from(0.0);
    for (i, &phi_i) in phi.iter().enumerate() {
        for (j, &phi_j) in phi.iter().enumerate() {
            total = total + phi_i * phi_j * D::from(matrix[(i, j)]);
        }
    }
    total
}

/// Frozen-belief rollout state for multi-step prediction and planning.
#[derive(Debug, Clone)]
pub struct Forecaster {
    mean: Vec<f64>,
    covariance_scale: DMatrix<f64>,
    predictive_scale: f64,
    ybuffer: Vec<f64>,
    ubuffer: Vec<f64>,
    degree: usize,
    zero_order: bool,
}

/// Per-step predictive moments and information gains along a rollout.
#[derive(Debug, Clone)]
pub struct ForecastPath<D> {
    pub means: Vec<D>,
    pub variances: Vec<D>,
    pub info_gains: Vec<D>,
}

impl Forecaster {
    /// Snapshot a belief and buffer state for rollout.
    ///
    /// Fails when the predictive variance is undefined (noise shape <= 1)
    /// or the coefficient precision cannot be inverted.
    pub fn new(
        belief: &NormalGamma,
        ybuffer: &[f64],
        ubuffer: &[f64],
        degree: usize,
        zero_order: bool,
    ) -> Result<Self> {
        if belief.shape() <= 1.0 {
            return Err(Error::UndefinedVariance {
                shape: belief.shape(),
            });
        }
        let covariance_scale = belief.covariance_scale()?;
        let dof = 2.0 * belief.shape();
        let predictive_scale = (belief.rate() / belief.shape()) * dof / (dof - 2.0);
        Ok(Self {
            mean: belief.mean().iter().copied().collect(),
            covariance_scale,
            predictive_scale,
            ybuffer: ybuffer.to_vec(),
            ubuffer: ubuffer.to_vec(),
            degree,
            zero_order,
        })
    }

    /// Roll the buffers forward under `controls`, one step per control.
    ///
    /// Generic over the scalar so the same rollout produces plain forecasts
    /// and forward-mode derivatives for the planner.
    pub fn forecast<D: DualNum<f64> + Copy>(&self, controls: &[D]) -> ForecastPath<D> {
        let mut ybuffer: Vec<D> = self.ybuffer.iter().map(|&v| D::from(v)).collect();
        let mut ubuffer: Vec<D> = self.ubuffer.iter().map(|&v| D::from(v)).collect();
        let mut means = Vec::with_capacity(controls.len());
        let mut variances = Vec::with_capacity(controls.len());
        let mut info_gains = Vec::with_capacity(controls.len());

        for &control in controls {
            ubuffer = backshift(&ubuffer, control);
            let mut window = ybuffer.clone();
            window.extend_from_slice(&ubuffer);
            let phi = polynomial_basis(&window, self.degree, self.zero_order);

            let mean = phi
                .iter()
                .zip(self.mean.iter())
                .fold(D::from(0.0), |acc, (&p, &m)| acc + p * D::from(m));
            let one_plus_spread = quadratic_form(&self.covariance_scale, &phi) + D::from(1.0);

            means.push(mean);
            variances.push(one_plus_spread * D::from(self.predictive_scale));
            info_gains.push(one_plus_spread.ln() * D::from(0.5));

            // Mean feedback: the forecast mean becomes the next lagged output.
            ybuffer = backshift(&ybuffer, mean);
        }

        ForecastPath {
            means,
            variances,
            info_gains,
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{DMatrix, DVector};

    use super::*;

    fn belief() -> NormalGamma {
        NormalGamma::new(
            DVector::from_vec(vec![0.0, 0.5, 1.0]),
            DMatrix::identity(3, 3) * 10.0,
            3.0,
            1.0,
        )
        .expect("valid belief")
    }

    #[test]
    fn rollout_feeds_means_back_into_the_lag_window() {
        // delay_out = 1, delay_inp = 0, degree = 1, zero order:
        // phi = [1, y_prev, u] and the belief encodes y' = 0.5 y + u.
        let forecaster =
            Forecaster::new(&belief(), &[1.0], &[0.0], 1, true).expect("forecaster builds");
        let path = forecaster.forecast(&[0.0, 0.0]);
        assert!((path.means[0] - 0.5).abs() < 1e-12);
        assert!((path.means[1] - 0.25).abs() < 1e-12);
        assert_eq!(path.means.len(), 2);
        assert_eq!(path.variances.len(), 2);
    }

    #[test]
    fn low_shape_belief_is_rejected() {
        let belief = NormalGamma::new(
            DVector::zeros(2),
            DMatrix::identity(2, 2),
            1.0,
            1.0,
        )
        .expect("valid prior");
        let error = Forecaster::new(&belief, &[0.0], &[0.0], 1, false)
            .expect_err("shape 1 has no predictive variance");
        assert!(matches!(error, Error::UndefinedVariance { .. }));
    }

    #[test]
    fn variances_and_info_gains_are_positive() {
        let forecaster =
            Forecaster::new(&belief(), &[0.3], &[-0.2], 1, true).expect("forecaster builds");
        let path = forecaster.forecast(&[0.4, -0.1, 0.2]);
        assert!(path.variances.iter().all(|&v| v > 0.0));
        assert!(path.info_gains.iter().all(|&g| g > 0.0));
    }
}
