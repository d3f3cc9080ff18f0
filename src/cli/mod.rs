//! Command-line parsing for the quadratic fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting and storage code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::NoiseKind;
use crate::domain::SolverKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "quadfit", version, about = "Quadratic least-squares fitting with saved results")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit `a·x² + b·x + c` to a dataset and save the parameters.
    Fit(FitArgs),
    /// List saved fits (the dashboard).
    List(IdentityArgs),
    /// Show a single saved fit.
    Show(ShowArgs),
    /// Print synthetic quadratic samples as two comma-separated lines.
    Sample(SampleArgs),
}

/// Who is acting and where records live.
#[derive(Debug, Args, Clone)]
pub struct IdentityArgs {
    /// User identity (falls back to QUADFIT_USER).
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// JSON record store (falls back to QUADFIT_STORE).
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

/// Options for `fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Dataset name stored with the fit.
    #[arg(short = 'n', long)]
    pub name: String,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// x values, comma separated.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, requires = "y", conflicts_with = "csv")]
    pub x: Vec<String>,

    /// y values, comma separated.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, requires = "x", conflicts_with = "csv")]
    pub y: Vec<String>,

    /// Read x/y from a CSV file with a header row.
    #[arg(long, value_name = "FILE", required_unless_present = "x")]
    pub csv: Option<PathBuf>,

    /// CSV column holding x.
    #[arg(long, default_value = "x")]
    pub x_col: String,

    /// CSV column holding y.
    #[arg(long, default_value = "y")]
    pub y_col: String,

    /// Solver (falls back to QUADFIT_SOLVER, then lm).
    #[arg(long, value_enum)]
    pub solver: Option<SolverKind>,

    /// Iteration budget for the lm solver.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Convergence tolerance for the lm solver.
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Starting point `a,b,c` for the lm solver.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_name = "A,B,C")]
    pub initial_guess: Option<Vec<f64>>,

    /// Fit and print the result without saving it.
    #[arg(long)]
    pub dry_run: bool,

    /// Render an ASCII plot of the data and fitted curve.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for `show`.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Record id.
    #[arg(long)]
    pub id: u64,

    #[command(flatten)]
    pub identity: IdentityArgs,
}

/// Options for `sample`.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    #[arg(short = 'a', long, default_value_t = 2.0, allow_negative_numbers = true)]
    pub a: f64,

    #[arg(short = 'b', long, default_value_t = -3.0, allow_negative_numbers = true)]
    pub b: f64,

    #[arg(short = 'c', long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub c: f64,

    /// Number of points.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub count: usize,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Noise amplitude (half-width for uniform, std dev for gaussian).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    #[arg(long, value_enum, default_value_t = NoiseKind::Uniform)]
    pub noise_kind: NoiseKind,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_values_with_negatives() {
        let cli = Cli::try_parse_from([
            "quadfit", "fit", "--name", "demo", "--x", "-1,0,1", "--y", "1,0,1", "--solver", "closed-form",
            "--initial-guess", "-1,2,3",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.x, vec!["-1", "0", "1"]);
        assert_eq!(args.y, vec!["1", "0", "1"]);
        assert_eq!(args.solver, Some(SolverKind::ClosedForm));
        assert_eq!(args.initial_guess, Some(vec![-1.0, 2.0, 3.0]));
        assert!(!args.dry_run);
    }

    #[test]
    fn fit_requires_data_source() {
        assert!(Cli::try_parse_from(["quadfit", "fit", "--name", "demo"]).is_err());
        assert!(Cli::try_parse_from(["quadfit", "fit", "--name", "demo", "--x", "1,2,3"]).is_err());
        assert!(Cli::try_parse_from(["quadfit", "fit", "--name", "demo", "--csv", "data.csv"]).is_ok());
    }

    #[test]
    fn sample_accepts_negative_coefficients() {
        let cli = Cli::try_parse_from(["quadfit", "sample", "-a", "-2", "--x-min", "-5", "--noise-kind", "gaussian"])
            .unwrap();
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.a, -2.0);
        assert_eq!(args.x_min, -5.0);
        assert_eq!(args.noise_kind, NoiseKind::Gaussian);
    }
}
