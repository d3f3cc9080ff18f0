//! Quadratic model evaluation and coordinate scaling.
//!
//! The engine relies on three primitive operations:
//! - build a design row for a given x (for least squares)
//! - predict y(x) given coefficients (for residuals/plots)
//! - map coefficients between raw x and the centred/scaled `t` coordinate

use crate::domain::PARAM_COUNT;

/// Fill a design row `[x², x, 1]`.
///
/// # Panics
/// Panics if `out` is shorter than `PARAM_COUNT`.
pub fn fill_design_row(x: f64, out: &mut [f64]) {
    out[0] = x * x;
    out[1] = x;
    out[2] = 1.0;
}

/// Evaluate `a·x² + b·x + c` in Horner form.
pub fn predict(coeffs: &[f64; PARAM_COUNT], x: f64) -> f64 {
    let [a, b, c] = *coeffs;
    (a * x + b) * x + c
}

/// Residual sum of squares of `coeffs` over the samples.
pub fn residual_sum_of_squares(coeffs: &[f64; PARAM_COUNT], x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - predict(coeffs, xi);
            r * r
        })
        .sum()
}

/// Affine map `t = (x - center) / scale` that puts the samples in `[-1, 1]`.
///
/// Solving in `t` keeps the `[t², t, 1]` columns well conditioned even when the
/// raw x values are large or far from zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub center: f64,
    pub scale: f64,
}

impl Scaling {
    /// Derive the scaling from the samples.
    ///
    /// The centre is the midpoint of the range, halved before adding so any
    /// finite samples give a finite centre and scale.
    ///
    /// Returns `None` when every x is identical (zero spread).
    pub fn from_samples(x: &[f64]) -> Option<Self> {
        let (&first, rest) = x.split_first()?;
        let (min, max) = rest.iter().fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let center = min / 2.0 + max / 2.0;
        let scale = max / 2.0 - min / 2.0;
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        Some(Self { center, scale })
    }

    pub fn to_t(&self, x: f64) -> f64 {
        (x - self.center) / self.scale
    }

    /// Map raw `(a, b, c)` to coefficients in `t`.
    pub fn coeffs_to_t(&self, coeffs: &[f64; PARAM_COUNT]) -> [f64; PARAM_COUNT] {
        let [a, b, c] = *coeffs;
        let (m, s) = (self.center, self.scale);
        [a * s * s, (2.0 * a * m + b) * s, (a * m + b) * m + c]
    }

    /// Map coefficients in `t` back to raw `(a, b, c)`.
    pub fn coeffs_from_t(&self, coeffs_t: &[f64; PARAM_COUNT]) -> [f64; PARAM_COUNT] {
        let [at, bt, ct] = *coeffs_t;
        let (m, s) = (self.center, self.scale);
        let a = at / (s * s);
        let b = bt / s - 2.0 * a * m;
        let c = ct - (a * m + b) * m;
        [a, b, c]
    }
}
