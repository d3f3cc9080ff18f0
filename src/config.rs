//! Environment-driven settings.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Command-line flags override them (see `app`).
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `QUADFIT_STORE` | JSON record store path | `quadfit.json` |
//! | `QUADFIT_USER` | identity used when `--user` is absent | none |
//! | `QUADFIT_SOLVER` | `lm` or `closed-form` | `lm` |
//! | `QUADFIT_MAX_ITERATIONS` | solver iteration budget | 200 |
//! | `QUADFIT_TOLERANCE` | convergence tolerance | 1.49012e-8 |

use std::path::PathBuf;

use clap::ValueEnum;

use crate::domain::{EngineConfig, SolverKind, UserId};
use crate::error::AppError;

pub const DEFAULT_STORE_PATH: &str = "quadfit.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store_path: PathBuf,
    pub user: Option<UserId>,
    pub engine: EngineConfig,
}

impl Settings {
    /// Load `.env` (if present) and read settings from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store_path = get("QUADFIT_STORE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        let user = get("QUADFIT_USER").map(UserId::new);

        let mut engine = EngineConfig::default();
        if let Some(raw) = get("QUADFIT_SOLVER") {
            engine.solver = SolverKind::from_str(&raw, true)
                .map_err(|_| AppError::new(2, format!("Invalid QUADFIT_SOLVER '{raw}' (expected lm or closed-form).")))?;
        }
        if let Some(raw) = get("QUADFIT_MAX_ITERATIONS") {
            engine.max_iterations = match raw.parse::<usize>() {
                Ok(v) if v > 0 => v,
                _ => {
                    return Err(AppError::new(
                        2,
                        format!("Invalid QUADFIT_MAX_ITERATIONS '{raw}' (expected a positive integer)."),
                    ));
                }
            };
        }
        if let Some(raw) = get("QUADFIT_TOLERANCE") {
            engine.tolerance = match raw.parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => v,
                _ => {
                    return Err(AppError::new(
                        2,
                        format!("Invalid QUADFIT_TOLERANCE '{raw}' (expected a positive number)."),
                    ));
                }
            };
        }

        Ok(Self {
            store_path,
            user,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, AppError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(s.user, None);
        assert_eq!(s.engine, EngineConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let s = settings(&[
            ("QUADFIT_STORE", "/tmp/fits.json"),
            ("QUADFIT_USER", " 17 "),
            ("QUADFIT_SOLVER", "closed-form"),
            ("QUADFIT_MAX_ITERATIONS", "50"),
            ("QUADFIT_TOLERANCE", "1e-12"),
        ])
        .unwrap();
        assert_eq!(s.store_path, PathBuf::from("/tmp/fits.json"));
        assert_eq!(s.user, Some(UserId::new("17")));
        assert_eq!(s.engine.solver, SolverKind::ClosedForm);
        assert_eq!(s.engine.max_iterations, 50);
        assert_eq!(s.engine.tolerance, 1e-12);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for pair in [
            ("QUADFIT_SOLVER", "newton"),
            ("QUADFIT_MAX_ITERATIONS", "0"),
            ("QUADFIT_MAX_ITERATIONS", "many"),
            ("QUADFIT_TOLERANCE", "-1"),
            ("QUADFIT_TOLERANCE", "inf"),
        ] {
            let err = settings(&[pair]).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{pair:?}");
        }
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let s = settings(&[("QUADFIT_USER", "  "), ("QUADFIT_SOLVER", "")]).unwrap();
        assert_eq!(s.user, None);
        assert_eq!(s.engine.solver, SolverKind::LevenbergMarquardt);
    }
}
