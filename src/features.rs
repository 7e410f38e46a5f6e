//! Polynomial feature basis for NARX regressors.
//!
//! The basis is an elementwise-power expansion: for degree `p` it stacks
//! `x.^1` through `x.^p` in increasing order of the power, optionally with a
//! leading constant. It deliberately contains no cross terms, so the feature
//! dimension grows linearly in the window length rather than combinatorially.

use num_dual::DualNum;

/// Expand a lag window into its polynomial feature vector.
///
/// Output length is `x.len() * degree + 1` when `zero_order` is set and
/// `x.len() * degree` otherwise. Generic over the scalar so the same
/// expansion runs under forward-mode dual numbers during planning.
pub fn polynomial_basis<D: DualNum<f64> + Copy>(x: &[D], degree: usize, zero_order: bool) -> Vec<D> {
    let mut features = Vec::with_capacity(basis_order(x.len(), degree, zero_order));
    if zero_order {
        features.push(D::from(1.0));
    }
    for power in 1..=degree {
        for &value in x {
            features.push(value.powi(power as i32));
        }
    }
    features
}

/// Feature dimension produced by [`polynomial_basis`] for a window of
/// `input_len` entries.
pub fn basis_order(input_len: usize, degree: usize, zero_order: bool) -> usize {
    input_len * degree + usize::from(zero_order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_length_matches_order_formula() {
        for len in 1..5 {
            for degree in 1..4 {
                for zero_order in [false, true] {
                    let x = vec![0.5; len];
                    let features = polynomial_basis(&x, degree, zero_order);
                    assert_eq!(features.len(), basis_order(len, degree, zero_order));
                    assert_eq!(features.len(), len * degree + usize::from(zero_order));
                }
            }
        }
    }

    #[test]
    fn powers_are_stacked_in_increasing_order() {
        let features = polynomial_basis(&[2.0, 3.0], 2, true);
        assert_eq!(features, vec![1.0, 2.0, 3.0, 4.0, 9.0]);
    }

    #[test]
    fn no_cross_terms_for_degree_two() {
        // A full multivariate degree-2 basis over [a, b] would contain a*b;
        // the elementwise expansion must not.
        let features = polynomial_basis(&[2.0, 5.0], 2, false);
        assert_eq!(features, vec![2.0, 5.0, 4.0, 25.0]);
        assert!(!features.contains(&10.0));
    }
}
