//! Synthetic quadratic sample generation.
//!
//! Produces `y_i = a·x_i² + b·x_i + c + noise_i` on an evenly spaced x grid.
//! Generation is seeded so the same spec always yields the same samples.

use clap::ValueEnum;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::{PARAM_COUNT, Samples};
use crate::error::AppError;
use crate::models::predict;

/// Noise distribution added to each observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// Uniform on `[-noise, noise]`.
    Uniform,
    /// Normal with standard deviation `noise`.
    Gaussian,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleSpec {
    pub coeffs: [f64; PARAM_COUNT],
    pub n: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub noise: f64,
    pub noise_kind: NoiseKind,
    pub seed: u64,
}

pub fn generate_samples(spec: &SampleSpec) -> Result<Samples, AppError> {
    if spec.n == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    if !(spec.x_min.is_finite() && spec.x_max.is_finite() && spec.x_max > spec.x_min) {
        return Err(AppError::new(2, "Invalid x range for sample generation."));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(AppError::new(2, "Noise level must be a non-negative finite number."));
    }
    if spec.coeffs.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(2, "Coefficients must be finite."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let step = if spec.n > 1 {
        (spec.x_max - spec.x_min) / (spec.n as f64 - 1.0)
    } else {
        0.0
    };

    let mut x = Vec::with_capacity(spec.n);
    let mut y = Vec::with_capacity(spec.n);
    for i in 0..spec.n {
        let xi = spec.x_min + step * i as f64;
        let noise = if spec.noise == 0.0 {
            0.0
        } else {
            match spec.noise_kind {
                NoiseKind::Uniform => rng.gen_range(-spec.noise..=spec.noise),
                NoiseKind::Gaussian => normal.sample(&mut rng),
            }
        };
        x.push(xi);
        y.push(predict(&spec.coeffs, xi) + noise);
    }

    Ok(Samples { x, y })
}
