//! Linear least squares solver.
//!
//! The quadratic model is linear in its coefficients, so the optimal `(a, b, c)`
//! is the solution of:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD so the tall (n × 3) design matrix is handled directly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Rank is checked separately so singular designs are reported as such
//!   instead of silently returning a minimum-norm solution.

use nalgebra::{DMatrix, DVector};

/// Singular values below `RANK_RTOL * σ_max` count as zero.
pub const RANK_RTOL: f64 = 1e-10;

/// Numerical rank of `x` using a relative singular value cutoff.
pub fn numerical_rank(x: &DMatrix<f64>) -> usize {
    let sv = x.singular_values();
    let max = sv.iter().copied().fold(0.0_f64, f64::max);
    if !(max.is_finite() && max > 0.0) {
        return 0;
    }
    sv.iter().filter(|&&s| s > max * RANK_RTOL).count()
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
