//! Error types.
//!
//! - `FitError`: failures of the pure fit engine
//! - `OrchestratorError`: the uniform `{kind, message, context}` shape returned
//!   to presentation code
//! - `StoreError`: storage collaborator failures
//! - `AppError`: binary-level error carrying a process exit code

use std::fmt;

use serde::Serialize;

use crate::domain::Axis;

/// Why the engine could not extract a solution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvergenceFailure {
    #[error("design matrix is singular (numerical rank {rank} < 3); x values cannot separate a, b, c")]
    Singular { rank: usize },

    #[error("iteration budget exhausted after {iterations} iterations (cost {cost:.6e})")]
    IterationBudget { iterations: usize, cost: f64 },

    #[error("solver stagnated after {iterations} iterations (damping {damping:.3e})")]
    Stagnated { iterations: usize, damping: f64 },

    #[error("solver produced non-finite coefficients")]
    NonFinite,
}

/// Fit engine failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("{axis}[{index}] is not finite ({value})")]
    InvalidInput { axis: Axis, index: usize, value: f64 },

    #[error("need at least {required} points to fit a quadratic, got {n}")]
    InsufficientData { n: usize, required: usize },

    #[error("x has {x_len} values but y has {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("fit did not converge: {0}")]
    DidNotConverge(#[from] ConvergenceFailure),
}

/// Storage collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt store data: {0}")]
    Corrupt(String),
}

/// Error taxonomy at the orchestrator boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidInput,
    InsufficientData,
    LengthMismatch,
    ParseError,
    FitDidNotConverge,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::InsufficientData => "InsufficientData",
            ErrorKind::LengthMismatch => "LengthMismatch",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::FitDidNotConverge => "FitDidNotConverge",
            ErrorKind::Storage => "Storage",
        }
    }

    /// Process exit code used by the binary for this kind.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidInput | ErrorKind::ParseError | ErrorKind::LengthMismatch => 2,
            ErrorKind::InsufficientData => 3,
            ErrorKind::FitDidNotConverge => 4,
            ErrorKind::Storage => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured detail attached to an `OrchestratorError`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    None,
    /// A single offending input element.
    Element { axis: Axis, index: usize, raw: String },
    Lengths { x_len: usize, y_len: usize },
    Sample { n: usize, required: usize },
    Solver {
        iterations: Option<usize>,
        cost: Option<f64>,
        rank: Option<usize>,
    },
}

/// Uniform error returned by `submit_fit`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct OrchestratorError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: ErrorContext,
}

impl OrchestratorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, context: ErrorContext) -> Self {
        Self {
            kind,
            message: message.into(),
            context,
        }
    }
}

impl From<FitError> for OrchestratorError {
    fn from(err: FitError) -> Self {
        let message = err.to_string();
        match err {
            FitError::InvalidInput { axis, index, value } => OrchestratorError::new(
                ErrorKind::InvalidInput,
                message,
                ErrorContext::Element {
                    axis,
                    index,
                    raw: value.to_string(),
                },
            ),
            FitError::InsufficientData { n, required } => OrchestratorError::new(
                ErrorKind::InsufficientData,
                message,
                ErrorContext::Sample { n, required },
            ),
            FitError::LengthMismatch { x_len, y_len } => OrchestratorError::new(
                ErrorKind::LengthMismatch,
                message,
                ErrorContext::Lengths { x_len, y_len },
            ),
            FitError::InvalidConfig(_) => {
                OrchestratorError::new(ErrorKind::InvalidInput, message, ErrorContext::None)
            }
            FitError::DidNotConverge(failure) => {
                let context = match failure {
                    ConvergenceFailure::Singular { rank } => ErrorContext::Solver {
                        iterations: None,
                        cost: None,
                        rank: Some(rank),
                    },
                    ConvergenceFailure::IterationBudget { iterations, cost } => ErrorContext::Solver {
                        iterations: Some(iterations),
                        cost: Some(cost),
                        rank: None,
                    },
                    ConvergenceFailure::Stagnated { iterations, .. } => ErrorContext::Solver {
                        iterations: Some(iterations),
                        cost: None,
                        rank: None,
                    },
                    ConvergenceFailure::NonFinite => ErrorContext::None,
                };
                OrchestratorError::new(ErrorKind::FitDidNotConverge, message, context)
            }
        }
    }
}

impl From<StoreError> for OrchestratorError {
    fn from(err: StoreError) -> Self {
        OrchestratorError::new(ErrorKind::Storage, err.to_string(), ErrorContext::None)
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        AppError::new(err.kind.exit_code(), crate::report::format_error(&err))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::new(ErrorKind::Storage.exit_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_fit_maps_to_did_not_converge_with_rank() {
        let err: OrchestratorError = FitError::from(ConvergenceFailure::Singular { rank: 1 }).into();
        assert_eq!(err.kind, ErrorKind::FitDidNotConverge);
        assert!(err.message.contains("singular"), "got {}", err.message);
        assert_eq!(
            err.context,
            ErrorContext::Solver {
                iterations: None,
                cost: None,
                rank: Some(1)
            }
        );
    }

    #[test]
    fn invalid_config_is_reported_as_invalid_input() {
        let err: OrchestratorError = FitError::InvalidConfig("tolerance must be > 0".into()).into();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "InvalidInput: invalid engine configuration: tolerance must be > 0");
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(ErrorKind::ParseError.exit_code(), 2);
        assert_eq!(ErrorKind::InsufficientData.exit_code(), 3);
        assert_eq!(ErrorKind::FitDidNotConverge.exit_code(), 4);
        assert_eq!(ErrorKind::Storage.exit_code(), 5);
    }
}
