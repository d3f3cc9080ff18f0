//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the engine, the orchestrator and the store
//! - persisted as JSON records
//! - reloaded later for the dashboard and plotting

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, StoreError};

/// Number of free coefficients in `f(x) = a·x² + b·x + c`.
pub const PARAM_COUNT: usize = 3;

/// Default iteration budget for the iterative solver.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Default convergence tolerance (square root of machine epsilon).
pub const DEFAULT_TOLERANCE: f64 = 1.49012e-8;

/// Current version of the persisted parameter format.
pub const FIT_PARAMS_VERSION: u32 = 1;

/// Which solver the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SolverKind {
    /// Damped Gauss–Newton (Levenberg–Marquardt) from an initial guess.
    #[value(name = "lm")]
    #[serde(rename = "lm")]
    LevenbergMarquardt,
    /// Direct SVD least-squares solve.
    ClosedForm,
}

impl SolverKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SolverKind::LevenbergMarquardt => "Levenberg-Marquardt",
            SolverKind::ClosedForm => "closed-form (SVD)",
        }
    }
}

/// Which of the two input sequences a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Fit engine configuration.
///
/// The initial guess and tolerance are explicit so the engine stays pure; they
/// only affect `SolverKind::LevenbergMarquardt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub solver: SolverKind,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Starting `(a, b, c)` for the iterative solver.
    pub initial_guess: [f64; PARAM_COUNT],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: SolverKind::LevenbergMarquardt,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            initial_guess: [1.0; PARAM_COUNT],
        }
    }
}

impl EngineConfig {
    /// Reject settings no solver can run with.
    pub fn validate(&self) -> Result<(), FitError> {
        if self.max_iterations == 0 {
            return Err(FitError::InvalidConfig("max_iterations must be at least 1".into()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(FitError::InvalidConfig(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        if self.initial_guess.iter().any(|v| !v.is_finite()) {
            return Err(FitError::InvalidConfig("initial guess must be finite".into()));
        }
        Ok(())
    }
}

/// Parsed, equal-length observation sequences for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Samples {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Least-squares optimal coefficients of `a·x² + b·x + c`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Residual sum of squares at the solution.
    pub rss: f64,
    /// Solver iterations used (0 for the closed-form solve).
    pub iterations: usize,
    pub solver: SolverKind,
}

impl QuadraticFit {
    pub fn coefficients(&self) -> [f64; PARAM_COUNT] {
        [self.a, self.b, self.c]
    }

    pub fn predict(&self, x: f64) -> f64 {
        crate::models::predict(&self.coefficients(), x)
    }

    pub fn params(&self) -> FitParams {
        FitParams::new(self.a, self.b, self.c)
    }
}

/// Persisted representation of fitted coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    pub version: u32,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl FitParams {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self {
            version: FIT_PARAMS_VERSION,
            a,
            b,
            c,
        }
    }

    pub fn coefficients(&self) -> [f64; PARAM_COUNT] {
        [self.a, self.b, self.c]
    }

    /// Serialize to the compact versioned JSON form stored in records.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored parameter string.
    ///
    /// Accepts the versioned JSON form and the legacy `"a, b, c"` display string.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            let params: FitParams = serde_json::from_str(trimmed)?;
            if params.version != FIT_PARAMS_VERSION {
                return Err(StoreError::Corrupt(format!(
                    "unsupported fit parameter version {}",
                    params.version
                )));
            }
            return Ok(params);
        }

        let values: Vec<f64> = trimmed
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| StoreError::Corrupt(format!("invalid legacy fit parameters '{trimmed}': {e}")))?;
        match values.as_slice() {
            [a, b, c] => Ok(FitParams::new(*a, *b, *c)),
            _ => Err(StoreError::Corrupt(format!(
                "expected 3 legacy fit parameters, found {}",
                values.len()
            ))),
        }
    }
}

/// Opaque authenticated identity supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned by the store to a new fit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted fit. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    pub id: RecordId,
    pub owner: UserId,
    pub dataset_name: String,
    /// Serialized `FitParams`.
    pub params: String,
    pub created_at: DateTime<Utc>,
}

impl FitRecord {
    pub fn fit_params(&self) -> Result<FitParams, StoreError> {
        FitParams::parse(&self.params)
    }
}
