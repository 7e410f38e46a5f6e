//! Spectral projected-gradient adapter for the optimizer port.
//!
//! Projected gradient descent with a Barzilai-Borwein spectral step and
//! Armijo backtracking. The spectral step reuses curvature from the last
//! two gradients, which places the method in the quasi-Newton family while
//! keeping box projection trivial.

use std::time::Instant;

use crate::ports::{ControlBounds, ControlOptimizer, ControlProblem, OptimizerOptions};

const ARMIJO_SLOPE: f64 = 1e-4;
const MIN_STEP: f64 = 1e-12;

/// Default in-tree minimizer for receding-horizon planning.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectralProjectedGradient;

impl ControlOptimizer for SpectralProjectedGradient {
    fn minimize(
        &self,
        problem: &dyn ControlProblem,
        bounds: ControlBounds,
        init: &[f64],
        options: &OptimizerOptions,
    ) -> Vec<f64> {
        let started = Instant::now();
        let mut current: Vec<f64> = init.iter().map(|&u| bounds.clamp(u)).collect();
        let mut value = problem.value(&current);
        let mut gradient = problem.gradient(&current);
        let mut best = current.clone();
        let mut best_value = value;
        let mut spectral_step = 1.0;

        for iteration in 0..options.iterations {
            if let Some(limit) = options.time_limit
                && started.elapsed() >= limit
            {
                break;
            }

            // Stationarity on the box: norm of the projected gradient step.
            let g_norm = current
                .iter()
                .zip(&gradient)
                .map(|(&u, &g)| bounds.clamp(u - g) - u)
                .map(|p| p * p)
                .sum::<f64>()
                .sqrt();
            if g_norm <= options.g_tol {
                break;
            }

            // Armijo backtracking along the projected direction.
            let mut step = spectral_step;
            let (candidate, candidate_value) = loop {
                let candidate: Vec<f64> = current
                    .iter()
                    .zip(&gradient)
                    .map(|(&u, &g)| bounds.clamp(u - step * g))
                    .collect();
                let candidate_value = problem.value(&candidate);
                let directional: f64 = candidate
                    .iter()
                    .zip(&current)
                    .zip(&gradient)
                    .map(|((&c, &u), &g)| g * (c - u))
                    .sum();
                if candidate_value <= value + ARMIJO_SLOPE * directional || step < MIN_STEP {
                    break (candidate, candidate_value);
                }
                step *= 0.5;
            };

            let candidate_gradient = problem.gradient(&candidate);

            // Barzilai-Borwein step for the next iteration.
            let mut s_dot_y = 0.0;
            let mut y_dot_y = 0.0;
            for i in 0..current.len() {
                let s = candidate[i] - current[i];
                let y = candidate_gradient[i] - gradient[i];
                s_dot_y += s * y;
                y_dot_y += y * y;
            }
            spectral_step = if s_dot_y > 0.0 && y_dot_y > 0.0 {
                (s_dot_y / y_dot_y).clamp(1e-8, 1e8)
            } else {
                1.0
            };

            let improvement = value - candidate_value;
            current = candidate;
            value = candidate_value;
            gradient = candidate_gradient;

            if value < best_value {
                best_value = value;
                best = current.clone();
            }

            if options.verbose {
                eprintln!("iteration {iteration}: f = {value:.6e}, |g| = {g_norm:.3e}");
            }

            if improvement.abs() <= options.f_tol * (1.0 + value.abs()) {
                break;
            }
        }

        best
    }
}
