//! Conjugate Normal-Gamma belief over NARX coefficients and noise precision.
//!
//! Stores the joint posterior over regression coefficients and the
//! observation-noise precision, updated in closed form once per observed
//! timestep. Each update also yields the incremental log evidence (the log
//! Bayes factor between the new and old hyperparameters), which the agent
//! tracks as a running surprise signal.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;

use crate::error::{Error, Result};

const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Normal-Gamma posterior: coefficients ~ N(mean, (precision * noise)^-1),
/// noise precision ~ Gamma(shape, rate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalGamma {
    mean: DVector<f64>,
    precision: DMatrix<f64>,
    shape: f64,
    rate: f64,
}

impl NormalGamma {
    /// Construct from prior hyperparameters. The precision matrix must be
    /// square with the mean's dimension; shape and rate must be positive.
    pub fn new(
        mean: DVector<f64>,
        precision: DMatrix<f64>,
        shape: f64,
        rate: f64,
    ) -> Result<Self> {
        if precision.nrows() != mean.len() || precision.ncols() != mean.len() {
            return Err(Error::DimensionMismatch {
                expected: mean.len(),
                got: precision.nrows(),
            });
        }
        if !(shape > 0.0) || !(rate > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "noise shape and rate must be positive (shape={shape}, rate={rate})"
                ),
            });
        }
        Ok(Self {
            mean,
            precision,
            shape,
            rate,
        })
    }

    pub fn order(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn precision(&self) -> &DMatrix<f64> {
        &self.precision
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Inverse of the coefficient precision, shared by the posterior
    /// predictive and the epistemic EFE term.
    pub fn covariance_scale(&self) -> Result<DMatrix<f64>> {
        self.precision
            .clone()
            .try_inverse()
            .ok_or(Error::SingularPrecision {
                operation: "invert the coefficient precision",
            })
    }

    /// One conjugate Bayesian update with regressor `phi` and observation
    /// `y`. Returns the incremental log evidence ln p(y | phi, prior).
    ///
    /// A singular updated precision is fatal for this call and leaves the
    /// belief untouched; there is no regularization beyond the additive
    /// prior already present in the recursion.
    pub fn update(&mut self, y: f64, phi: &DVector<f64>) -> Result<f64> {
        if phi.len() != self.order() {
            return Err(Error::DimensionMismatch {
                expected: self.order(),
                got: phi.len(),
            });
        }

        let precision_new = phi * phi.transpose() + &self.precision;
        let inverse_new = precision_new
            .clone()
            .try_inverse()
            .ok_or(Error::SingularPrecision {
                operation: "apply the belief update",
            })?;
        let rhs = phi * y + &self.precision * &self.mean;
        let mean_new = &inverse_new * &rhs;

        let shape_new = self.shape + 0.5;
        let prior_quadratic = self.mean.dot(&(&self.precision * &self.mean));
        let posterior_quadratic = mean_new.dot(&rhs);
        let rate_new = self.rate + 0.5 * (y * y + prior_quadratic - posterior_quadratic);

        let log_evidence = -0.5 * LN_2PI
            + 0.5 * (self.precision.determinant().ln() - precision_new.determinant().ln())
            + self.shape * self.rate.ln()
            - shape_new * rate_new.ln()
            + ln_gamma(shape_new)
            - ln_gamma(self.shape);

        self.precision = precision_new;
        self.mean = mean_new;
        self.shape = shape_new;
        self.rate = rate_new;

        Ok(log_evidence)
    }

    /// Student-t posterior predictive for a feature vector.
    pub fn posterior_predictive(&self, phi: &DVector<f64>) -> Result<StudentT> {
        if phi.len() != self.order() {
            return Err(Error::DimensionMismatch {
                expected: self.order(),
                got: phi.len(),
            });
        }
        let covariance_scale = self.covariance_scale()?;
        let spread = phi.dot(&(&covariance_scale * phi));
        Ok(StudentT {
            dof: 2.0 * self.shape,
            location: self.mean.dot(phi),
            scale2: (self.rate / self.shape) * (1.0 + spread),
        })
    }
}

/// Student-t predictive distribution in location/scale form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentT {
    dof: f64,
    location: f64,
    scale2: f64,
}

impl StudentT {
    pub fn dof(&self) -> f64 {
        self.dof
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn scale2(&self) -> f64 {
        self.scale2
    }

    pub fn mean(&self) -> f64 {
        self.location
    }

    /// Predictive variance `scale2 * dof / (dof - 2)`, defined only for more
    /// than two degrees of freedom.
    pub fn variance(&self) -> Result<f64> {
        if self.dof <= 2.0 {
            return Err(Error::UndefinedVariance {
                shape: self.dof / 2.0,
            });
        }
        Ok(self.scale2 * self.dof / (self.dof - 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diffuse_belief(order: usize) -> NormalGamma {
        NormalGamma::new(
            DVector::zeros(order),
            DMatrix::identity(order, order),
            1.0,
            1.0,
        )
        .expect("valid prior")
    }

    #[test]
    fn shape_grows_by_half_per_update() {
        let mut belief = diffuse_belief(2);
        let phi = DVector::from_vec(vec![1.0, -0.5]);
        for step in 1..=4 {
            belief.update(0.3, &phi).expect("update succeeds");
            assert_eq!(belief.shape(), 1.0 + 0.5 * step as f64);
        }
    }

    #[test]
    fn precision_stays_symmetric() {
        let mut belief = diffuse_belief(3);
        let phi = DVector::from_vec(vec![0.7, -1.2, 2.0]);
        belief.update(1.5, &phi).expect("update succeeds");
        let precision = belief.precision();
        for i in 0..3 {
            for j in 0..3 {
                assert!((precision[(i, j)] - precision[(j, i)]).abs() <= 1e-12);
            }
        }
    }

    #[test]
    fn predictive_location_is_mean_projection() {
        let belief = NormalGamma::new(
            DVector::from_vec(vec![0.5, -1.0]),
            DMatrix::identity(2, 2),
            2.0,
            1.0,
        )
        .expect("valid prior");
        let phi = DVector::from_vec(vec![2.0, 1.0]);
        let predictive = belief.posterior_predictive(&phi).expect("predictive");
        assert!((predictive.mean() - 0.0).abs() < 1e-12);
        assert!(predictive.variance().expect("dof > 2") > 0.0);
    }

    #[test]
    fn variance_undefined_at_low_shape() {
        let belief = diffuse_belief(2);
        let phi = DVector::from_vec(vec![1.0, 0.0]);
        let predictive = belief.posterior_predictive(&phi).expect("predictive");
        let error = predictive.variance().expect_err("dof = 2 has no variance");
        assert!(matches!(error, Error::UndefinedVariance { .. }));
    }

    #[test]
    fn mismatched_prior_dimensions_are_rejected() {
        let error = NormalGamma::new(DVector::zeros(3), DMatrix::identity(2, 2), 1.0, 1.0)
            .expect_err("3-vector with 2x2 precision");
        assert!(matches!(
            error,
            Error::DimensionMismatch { expected: 3, got: 2 }
        ));
    }
}
