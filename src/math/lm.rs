//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `‖r(p)‖²` for a residual function `r` with Jacobian `J` by taking
//! damped Gauss–Newton steps:
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! λ shrinks after every accepted step and grows after every rejected one.
//! Each attempted step counts against the iteration budget.

use nalgebra::{DMatrix, DVector};

use crate::error::ConvergenceFailure;

/// Floor for diagonal scaling entries so a zero column never removes damping.
const MIN_DIAG: f64 = f64::EPSILON;

/// Lower bound for λ after repeated successful steps.
const MIN_DAMPING: f64 = 1e-12;

/// Problem definition for nonlinear least squares.
pub trait LeastSquaresProblem {
    /// Number of parameters.
    fn param_dim(&self) -> usize;

    /// Number of residuals.
    fn residual_dim(&self) -> usize;

    /// Fill residual vector r(p), len = `residual_dim`.
    fn residual(&self, p: &[f64], out: &mut [f64]);

    /// Fill Jacobian J(p), row-major, len = `residual_dim * param_dim`.
    ///
    /// The i-th row and k-th column must be written to `out[i * n + k]`.
    fn jacobian(&self, p: &[f64], out: &mut [f64]);
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LmConfig {
    pub max_iterations: usize,
    /// Relative tolerance for cost reduction and step size.
    pub tolerance: f64,
    pub initial_damping: f64,
    pub damping_factor: f64,
    /// Give up once λ exceeds this.
    pub max_damping: f64,
}

impl LmConfig {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..Self::default()
        }
    }
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1.49012e-8,
            initial_damping: 1e-3,
            damping_factor: 10.0,
            max_damping: 1e16,
        }
    }
}

/// Converged solution.
#[derive(Debug, Clone, PartialEq)]
pub struct LmReport {
    pub params: Vec<f64>,
    /// `‖r‖²` at `params`.
    pub cost: f64,
    pub iterations: usize,
}

/// Run Levenberg–Marquardt from `initial`.
pub fn levenberg_marquardt<P: LeastSquaresProblem + ?Sized>(
    problem: &P,
    initial: &[f64],
    config: &LmConfig,
) -> Result<LmReport, ConvergenceFailure> {
    let n = problem.param_dim();
    let m = problem.residual_dim();
    let tol = config.tolerance;

    let mut p = DVector::from_column_slice(initial);
    let mut r = eval_residual(problem, &p, m);
    let mut cost = r.norm_squared();
    if !cost.is_finite() {
        return Err(ConvergenceFailure::NonFinite);
    }

    let mut lambda = config.initial_damping;
    let mut jac_buf = vec![0.0; m * n];

    for iter in 1..=config.max_iterations {
        if cost == 0.0 {
            return Ok(report(&p, cost, iter - 1));
        }

        problem.jacobian(p.as_slice(), &mut jac_buf);
        let j = DMatrix::from_row_slice(m, n, &jac_buf);
        let jt = j.transpose();
        let jtj = &jt * &j;
        let g = &jt * &r;

        if g.amax() == 0.0 {
            return Ok(report(&p, cost, iter - 1));
        }

        let mut damped = jtj.clone();
        for k in 0..n {
            damped[(k, k)] += lambda * jtj[(k, k)].max(MIN_DIAG);
        }

        let Some(chol) = damped.cholesky() else {
            lambda *= config.damping_factor;
            if lambda > config.max_damping {
                return Err(ConvergenceFailure::Stagnated {
                    iterations: iter,
                    damping: lambda,
                });
            }
            continue;
        };

        let delta = chol.solve(&(-&g));
        if delta.iter().any(|v| !v.is_finite()) {
            return Err(ConvergenceFailure::NonFinite);
        }
        let step_small = delta.norm() <= tol * (tol + p.norm());

        let p_new = &p + &delta;
        let r_new = eval_residual(problem, &p_new, m);
        let cost_new = r_new.norm_squared();

        log::trace!("lm iter={iter} cost={cost:.6e} trial={cost_new:.6e} lambda={lambda:.3e}");

        if cost_new.is_finite() && cost_new < cost {
            let reduction = cost - cost_new;
            let previous = cost;
            p = p_new;
            r = r_new;
            cost = cost_new;
            lambda = (lambda / config.damping_factor).max(MIN_DAMPING);

            if reduction <= tol * previous || step_small {
                return Ok(report(&p, cost, iter));
            }
        } else {
            // No improvement from a negligible step: already at the minimum
            // to working precision.
            if step_small {
                return Ok(report(&p, cost, iter));
            }
            lambda *= config.damping_factor;
            if lambda > config.max_damping {
                return Err(ConvergenceFailure::Stagnated {
                    iterations: iter,
                    damping: lambda,
                });
            }
        }
    }

    Err(ConvergenceFailure::IterationBudget {
        iterations: config.max_iterations,
        cost,
    })
}

fn eval_residual<P: LeastSquaresProblem + ?Sized>(problem: &P, p: &DVector<f64>, m: usize) -> DVector<f64> {
    let mut out = vec![0.0; m];
    problem.residual(p.as_slice(), &mut out);
    DVector::from_vec(out)
}

fn report(p: &DVector<f64>, cost: f64, iterations: usize) -> LmReport {
    LmReport {
        params: p.iter().copied().collect(),
        cost,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// r(p) = p - target
    struct Shift {
        target: Vec<f64>,
    }

    impl LeastSquaresProblem for Shift {
        fn param_dim(&self) -> usize {
            self.target.len()
        }

        fn residual_dim(&self) -> usize {
            self.target.len()
        }

        fn residual(&self, p: &[f64], out: &mut [f64]) {
            for (i, o) in out.iter_mut().enumerate() {
                *o = p[i] - self.target[i];
            }
        }

        fn jacobian(&self, _p: &[f64], out: &mut [f64]) {
            let n = self.target.len();
            out.iter_mut().for_each(|v| *v = 0.0);
            for i in 0..n {
                out[i * n + i] = 1.0;
            }
        }
    }

    /// Exponential decay y = A·exp(-k·t): genuinely nonlinear in k.
    struct Decay {
        t: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Decay {
        fn param_dim(&self) -> usize {
            2
        }

        fn residual_dim(&self) -> usize {
            self.t.len()
        }

        fn residual(&self, p: &[f64], out: &mut [f64]) {
            for (i, o) in out.iter_mut().enumerate() {
                *o = p[0] * (-p[1] * self.t[i]).exp() - self.y[i];
            }
        }

        fn jacobian(&self, p: &[f64], out: &mut [f64]) {
            for i in 0..self.t.len() {
                let e = (-p[1] * self.t[i]).exp();
                out[i * 2] = e;
                out[i * 2 + 1] = -p[0] * self.t[i] * e;
            }
        }
    }

    #[test]
    fn solves_linear_shift() {
        let problem = Shift {
            target: vec![2.0, 3.0],
        };
        let out = levenberg_marquardt(&problem, &[0.0, 0.0], &LmConfig::default()).unwrap();
        assert!((out.params[0] - 2.0).abs() < 1e-6);
        assert!((out.params[1] - 3.0).abs() < 1e-6);
        assert!(out.iterations <= 20, "took {} iterations", out.iterations);
    }

    #[test]
    fn solves_exponential_decay() {
        let t: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 3.0 * (-0.7 * ti).exp()).collect();
        let problem = Decay { t, y };
        let out = levenberg_marquardt(&problem, &[1.0, 1.0], &LmConfig::default()).unwrap();
        assert!((out.params[0] - 3.0).abs() < 1e-6, "A = {}", out.params[0]);
        assert!((out.params[1] - 0.7).abs() < 1e-6, "k = {}", out.params[1]);
    }

    #[test]
    fn exact_initial_guess_returns_immediately() {
        let problem = Shift {
            target: vec![1.0, -1.0],
        };
        let out = levenberg_marquardt(&problem, &[1.0, -1.0], &LmConfig::default()).unwrap();
        assert_eq!(out.iterations, 0);
        assert_eq!(out.cost, 0.0);
    }

    #[test]
    fn tiny_budget_reports_iteration_exhaustion() {
        let t: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 3.0 * (-0.7 * ti).exp()).collect();
        let problem = Decay { t, y };
        let err = levenberg_marquardt(&problem, &[1.0, 1.0], &LmConfig::new(1, 1e-12)).unwrap_err();
        assert!(matches!(err, ConvergenceFailure::IterationBudget { iterations: 1, .. }));
    }
}
