//! Fit submission workflow shared by every front-end.
//!
//! raw strings -> length check -> parse -> fit engine -> serialize -> store
//!
//! Front-ends (the CLI here, a web handler elsewhere) only supply the identity,
//! the raw form values and a store, then render the structured result.

use crate::domain::{Axis, EngineConfig, FitRecord, QuadraticFit, RecordId, Samples, UserId};
use crate::error::{ErrorContext, ErrorKind, OrchestratorError};
use crate::fit::fit_samples;
use crate::store::FitStore;

/// Maximum dataset name length accepted for a record.
pub const MAX_DATASET_NAME_LEN: usize = 150;

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub record_id: RecordId,
    pub dataset_name: String,
    pub fit: QuadraticFit,
}

/// Validate, fit and persist one dataset; returns the new record id.
pub fn submit_fit<S, X, Y>(
    store: &mut S,
    config: &EngineConfig,
    dataset_name: &str,
    raw_x: &[X],
    raw_y: &[Y],
    owner: &UserId,
) -> Result<RecordId, OrchestratorError>
where
    S: FitStore + ?Sized,
    X: AsRef<str>,
    Y: AsRef<str>,
{
    submit_fit_detailed(store, config, dataset_name, raw_x, raw_y, owner).map(|s| s.record_id)
}

/// Like `submit_fit`, but also returns the fitted coefficients for display.
pub fn submit_fit_detailed<S, X, Y>(
    store: &mut S,
    config: &EngineConfig,
    dataset_name: &str,
    raw_x: &[X],
    raw_y: &[Y],
    owner: &UserId,
) -> Result<Submission, OrchestratorError>
where
    S: FitStore + ?Sized,
    X: AsRef<str>,
    Y: AsRef<str>,
{
    let outcome = prepare_and_fit(config, dataset_name, raw_x, raw_y).and_then(|(name, fit)| {
        let serialized = fit.params().to_json()?;
        let record_id = store.create_fit_record(owner, &name, &serialized)?;
        Ok(Submission {
            record_id,
            dataset_name: name,
            fit,
        })
    });

    match &outcome {
        Ok(s) => log::info!(
            "stored fit record {} for '{}' (n={}, rss={:.6e})",
            s.record_id,
            s.dataset_name,
            raw_x.len(),
            s.fit.rss
        ),
        Err(e) => log::warn!("rejected fit submission '{}': {e}", dataset_name.trim()),
    }

    outcome
}

/// Run validation and the engine without persisting anything.
pub fn preview_fit<X, Y>(
    config: &EngineConfig,
    dataset_name: &str,
    raw_x: &[X],
    raw_y: &[Y],
) -> Result<QuadraticFit, OrchestratorError>
where
    X: AsRef<str>,
    Y: AsRef<str>,
{
    prepare_and_fit(config, dataset_name, raw_x, raw_y).map(|(_, fit)| fit)
}

/// The owner's records, oldest first.
pub fn dashboard<S: FitStore + ?Sized>(store: &S, owner: &UserId) -> Result<Vec<FitRecord>, OrchestratorError> {
    let mut records = store.list_fit_records(owner)?;
    records.sort_by_key(|r| (r.created_at, r.id));
    Ok(records)
}

/// Check lengths and parse both sequences.
///
/// The length check runs first so a mismatch never reaches element parsing or
/// the engine.
pub fn parse_samples<X, Y>(raw_x: &[X], raw_y: &[Y]) -> Result<Samples, OrchestratorError>
where
    X: AsRef<str>,
    Y: AsRef<str>,
{
    if raw_x.len() != raw_y.len() {
        return Err(OrchestratorError::new(
            ErrorKind::LengthMismatch,
            format!("x has {} values but y has {}", raw_x.len(), raw_y.len()),
            ErrorContext::Lengths {
                x_len: raw_x.len(),
                y_len: raw_y.len(),
            },
        ));
    }

    Ok(Samples {
        x: parse_column(Axis::X, raw_x)?,
        y: parse_column(Axis::Y, raw_y)?,
    })
}

fn prepare_and_fit<X, Y>(
    config: &EngineConfig,
    dataset_name: &str,
    raw_x: &[X],
    raw_y: &[Y],
) -> Result<(String, QuadraticFit), OrchestratorError>
where
    X: AsRef<str>,
    Y: AsRef<str>,
{
    let name = validate_dataset_name(dataset_name)?;
    let samples = parse_samples(raw_x, raw_y)?;
    let fit = fit_samples(&samples, config)?;
    Ok((name, fit))
}

fn validate_dataset_name(name: &str) -> Result<String, OrchestratorError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(OrchestratorError::new(
            ErrorKind::InvalidInput,
            "dataset name must not be empty",
            ErrorContext::None,
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_DATASET_NAME_LEN {
        return Err(OrchestratorError::new(
            ErrorKind::InvalidInput,
            format!("dataset name is {len} characters; the limit is {MAX_DATASET_NAME_LEN}"),
            ErrorContext::None,
        ));
    }
    Ok(trimmed.to_string())
}

fn parse_column<T: AsRef<str>>(axis: Axis, raw: &[T]) -> Result<Vec<f64>, OrchestratorError> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            let value = value.as_ref();
            value.trim().parse::<f64>().map_err(|_| {
                OrchestratorError::new(
                    ErrorKind::ParseError,
                    format!("{axis}[{index}] = '{value}' is not a number"),
                    ErrorContext::Element {
                        axis,
                        index,
                        raw: value.to_string(),
                    },
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitParams, SolverKind};
    use crate::error::StoreError;
    use crate::store::MemoryStore;

    /// Counts writes and can be told to fail them.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: usize,
        fail: bool,
    }

    impl FitStore for CountingStore {
        fn create_fit_record(
            &mut self,
            owner: &UserId,
            dataset_name: &str,
            serialized_params: &str,
        ) -> Result<RecordId, StoreError> {
            self.writes += 1;
            if self.fail {
                return Err(StoreError::Corrupt("disk full".into()));
            }
            self.inner.create_fit_record(owner, dataset_name, serialized_params)
        }

        fn list_fit_records(&self, owner: &UserId) -> Result<Vec<FitRecord>, StoreError> {
            self.inner.list_fit_records(owner)
        }
    }

    fn owner() -> UserId {
        UserId::new("42")
    }

    #[test]
    fn successful_submission_writes_one_record() {
        let mut store = CountingStore::default();
        let id = submit_fit(
            &mut store,
            &EngineConfig::default(),
            "  parabola  ",
            &["0", "1", "2", "3", "4"],
            &["5", "4", "7", "14", "25"],
            &owner(),
        )
        .unwrap();
        assert_eq!(store.writes, 1);

        let records = dashboard(&store, &owner()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].dataset_name, "parabola");

        let params: FitParams = records[0].fit_params().unwrap();
        assert!((params.a - 2.0).abs() < 1e-6);
        assert!((params.b + 3.0).abs() < 1e-6);
        assert!((params.c - 5.0).abs() < 1e-6);
    }

    #[test]
    fn parse_error_names_the_offending_element() {
        let mut store = CountingStore::default();
        let err = submit_fit(
            &mut store,
            &EngineConfig::default(),
            "bad",
            &["1", "2", "x"],
            &["1", "4", "9"],
            &owner(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert_eq!(
            err.context,
            ErrorContext::Element {
                axis: Axis::X,
                index: 2,
                raw: "x".into()
            }
        );
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn length_mismatch_is_caught_before_parsing() {
        let mut store = CountingStore::default();
        let err = submit_fit(
            &mut store,
            &EngineConfig::default(),
            "uneven",
            &["1", "2", "oops"],
            &["1", "4"],
            &owner(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::LengthMismatch);
        assert_eq!(err.context, ErrorContext::Lengths { x_len: 3, y_len: 2 });
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn engine_failures_are_wrapped_and_not_persisted() {
        let mut store = CountingStore::default();
        let config = EngineConfig::default();

        let err = submit_fit(&mut store, &config, "flat", &["1", "1", "1"], &["1", "2", "3"], &owner()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::FitDidNotConverge);
        assert!(err.message.contains("singular"), "got {}", err.message);

        let err = submit_fit(&mut store, &config, "short", &["1", "2"], &["1", "2"], &owner()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientData);
        assert_eq!(err.context, ErrorContext::Sample { n: 2, required: 3 });

        let err = submit_fit(&mut store, &config, "nan", &["1", "2", "3"], &["1", "nan", "3"], &owner()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        assert_eq!(store.writes, 0);
        assert!(dashboard(&store, &owner()).unwrap().is_empty());
    }

    #[test]
    fn empty_or_long_dataset_names_are_rejected() {
        let mut store = CountingStore::default();
        let config = EngineConfig::default();
        let x = ["0", "1", "2"];
        let y = ["0", "1", "4"];

        let err = submit_fit(&mut store, &config, "   ", &x, &y, &owner()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let long = "n".repeat(MAX_DATASET_NAME_LEN + 1);
        let err = submit_fit(&mut store, &config, &long, &x, &y, &owner()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn storage_failure_is_reported() {
        let mut store = CountingStore {
            fail: true,
            ..CountingStore::default()
        };
        let err = submit_fit(
            &mut store,
            &EngineConfig::default(),
            "ok",
            &["0", "1", "2"],
            &["0", "1", "4"],
            &owner(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(dashboard(&store, &owner()).unwrap().is_empty());
    }

    #[test]
    fn whitespace_and_scientific_literals_parse() {
        let samples = parse_samples(&[" 1e0 ", "2.5", "-3"], &["+4", "5.", ".5"]).unwrap();
        assert_eq!(samples.x, vec![1.0, 2.5, -3.0]);
        assert_eq!(samples.y, vec![4.0, 5.0, 0.5]);

        let err = parse_samples(&["1", "", "3"], &["1", "2", "3"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[test]
    fn preview_and_detailed_submission_agree() {
        let config = EngineConfig {
            solver: SolverKind::ClosedForm,
            ..EngineConfig::default()
        };
        let x = ["-2", "-1", "0", "1", "2"];
        let y = ["4.1", "0.9", "0.0", "1.1", "3.9"];
        let preview = preview_fit(&config, "p", &x, &y).unwrap();

        let mut store = MemoryStore::new();
        let submission = submit_fit_detailed(&mut store, &config, "p", &x, &y, &owner()).unwrap();
        assert_eq!(submission.fit, preview);
        assert_eq!(store.len(), 1);
    }
}
