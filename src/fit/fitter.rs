//! Quadratic least-squares fitting.
//!
//! Given:
//! - sample positions `x_i`
//! - observed values `y_i`
//! - an `EngineConfig`
//!
//! we estimate `(a, b, c)` minimizing `Σ (y_i - (a·x_i² + b·x_i + c))²`.
//!
//! The solve happens in the centred/scaled coordinate `t ∈ [-1, 1]` (see
//! `models::Scaling`) and the coefficients are mapped back afterwards. A rank
//! check on the scaled design matrix runs first, so both solvers see only
//! full-rank problems.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Axis, EngineConfig, PARAM_COUNT, QuadraticFit, Samples, SolverKind};
use crate::error::{ConvergenceFailure, FitError};
use crate::math::{LeastSquaresProblem, LmConfig, levenberg_marquardt, numerical_rank, solve_least_squares};
use crate::models::{Scaling, fill_design_row, predict, residual_sum_of_squares};

/// Minimum number of points that identifies all three coefficients.
pub const MIN_POINTS: usize = PARAM_COUNT;

/// Fit `a·x² + b·x + c` to the samples.
pub fn fit(x: &[f64], y: &[f64], config: &EngineConfig) -> Result<QuadraticFit, FitError> {
    validate_samples(x, y)?;
    config.validate()?;

    let n = x.len();

    // Zero spread: every row of the design matrix is identical.
    let Some(scaling) = Scaling::from_samples(x) else {
        return Err(ConvergenceFailure::Singular { rank: 1 }.into());
    };

    let t: Vec<f64> = x.iter().map(|&v| scaling.to_t(v)).collect();
    let design = design_matrix(&t);
    let rank = numerical_rank(&design);
    if rank < PARAM_COUNT {
        return Err(ConvergenceFailure::Singular { rank }.into());
    }

    log::debug!("fitting quadratic: n={n} solver={}", config.solver.display_name());

    let (coeffs_t, iterations) = match config.solver {
        SolverKind::ClosedForm => {
            let yv = DVector::from_column_slice(y);
            let beta =
                solve_least_squares(&design, &yv).ok_or(ConvergenceFailure::Singular { rank })?;
            ([beta[0], beta[1], beta[2]], 0)
        }
        SolverKind::LevenbergMarquardt => {
            let problem = QuadraticProblem { t: &t, y };
            let initial = scaling.coeffs_to_t(&config.initial_guess);
            let lm = LmConfig::new(config.max_iterations, config.tolerance);
            let out = levenberg_marquardt(&problem, &initial, &lm)?;
            log::debug!("lm converged in {} iterations (cost {:.6e})", out.iterations, out.cost);
            ([out.params[0], out.params[1], out.params[2]], out.iterations)
        }
    };

    let coeffs = scaling.coeffs_from_t(&coeffs_t);
    if coeffs.iter().any(|v| !v.is_finite()) {
        return Err(ConvergenceFailure::NonFinite.into());
    }

    let [a, b, c] = coeffs;
    Ok(QuadraticFit {
        a,
        b,
        c,
        rss: residual_sum_of_squares(&coeffs, x, y),
        iterations,
        solver: config.solver,
    })
}

/// Convenience wrapper over `fit` for parsed samples.
pub fn fit_samples(samples: &Samples, config: &EngineConfig) -> Result<QuadraticFit, FitError> {
    fit(&samples.x, &samples.y, config)
}

fn validate_samples(x: &[f64], y: &[f64]) -> Result<(), FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if x.len() < MIN_POINTS {
        return Err(FitError::InsufficientData {
            n: x.len(),
            required: MIN_POINTS,
        });
    }
    for (axis, values) in [(Axis::X, x), (Axis::Y, y)] {
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(FitError::InvalidInput { axis, index, value });
        }
    }
    Ok(())
}

fn design_matrix(t: &[f64]) -> DMatrix<f64> {
    let mut design = DMatrix::<f64>::zeros(t.len(), PARAM_COUNT);
    let mut row = [0.0; PARAM_COUNT];
    for (i, &ti) in t.iter().enumerate() {
        fill_design_row(ti, &mut row);
        for (j, &v) in row.iter().enumerate() {
            design[(i, j)] = v;
        }
    }
    design
}

/// Residuals `f(t_i) - y_i` of the quadratic in scaled coordinates.
struct QuadraticProblem<'a> {
    t: &'a [f64],
    y: &'a [f64],
}

impl LeastSquaresProblem for QuadraticProblem<'_> {
    fn param_dim(&self) -> usize {
        PARAM_COUNT
    }

    fn residual_dim(&self) -> usize {
        self.t.len()
    }

    fn residual(&self, p: &[f64], out: &mut [f64]) {
        let coeffs = [p[0], p[1], p[2]];
        for ((o, &ti), &yi) in out.iter_mut().zip(self.t).zip(self.y) {
            *o = predict(&coeffs, ti) - yi;
        }
    }

    fn jacobian(&self, _p: &[f64], out: &mut [f64]) {
        for (row, &ti) in out.chunks_exact_mut(PARAM_COUNT).zip(self.t) {
            fill_design_row(ti, row);
        }
    }
}
