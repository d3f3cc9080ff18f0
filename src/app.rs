//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and environment settings
//! - resolves the caller identity and the record store
//! - runs the fit pipeline and prints reports/plots

use clap::Parser;

use crate::cli::{Command, FitArgs, IdentityArgs, SampleArgs, ShowArgs};
use crate::config::Settings;
use crate::data::{SampleSpec, generate_samples};
use crate::domain::{EngineConfig, PARAM_COUNT, RecordId, UserId};
use crate::error::AppError;
use crate::store::JsonFileStore;

pub mod pipeline;

/// Entry point for the `quadfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args, &Settings::from_env()?),
        Command::List(args) => handle_list(args, &Settings::from_env()?),
        Command::Show(args) => handle_show(args, &Settings::from_env()?),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_fit(args: FitArgs, settings: &Settings) -> Result<(), AppError> {
    let config = engine_config_from_args(&args, &settings.engine)?;

    let (raw_x, raw_y) = match &args.csv {
        Some(path) => {
            let cols = crate::io::read_xy_columns(path, &args.x_col, &args.y_col)?;
            (cols.x, cols.y)
        }
        None => (args.x.clone(), args.y.clone()),
    };

    let fit = if args.dry_run {
        let fit = pipeline::preview_fit(&config, &args.name, &raw_x, &raw_y)?;
        print!("{}", crate::report::format_preview(&fit));
        fit
    } else {
        let owner = resolve_user(&args.identity, settings)?;
        let mut store = resolve_store(&args.identity, settings);
        let submission =
            pipeline::submit_fit_detailed(&mut store, &config, &args.name, &raw_x, &raw_y, &owner)?;
        print!("{}", crate::report::format_submission(&submission));
        submission.fit
    };

    if args.plot {
        let samples = pipeline::parse_samples(&raw_x, &raw_y)?;
        println!();
        print!("{}", crate::plot::render_fit_plot(&samples, &fit, args.width, args.height));
    }

    Ok(())
}

fn handle_list(args: IdentityArgs, settings: &Settings) -> Result<(), AppError> {
    let owner = resolve_user(&args, settings)?;
    let store = resolve_store(&args, settings);
    let records = pipeline::dashboard(&store, &owner)?;
    print!("{}", crate::report::format_dashboard(&owner, &records));
    Ok(())
}

fn handle_show(args: ShowArgs, settings: &Settings) -> Result<(), AppError> {
    let owner = resolve_user(&args.identity, settings)?;
    let store = resolve_store(&args.identity, settings);
    let id = RecordId(args.id);
    let record = pipeline::dashboard(&store, &owner)?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::new(2, format!("No fit record #{id} for user {owner}.")))?;
    print!("{}", crate::report::format_record(&record));
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = SampleSpec {
        coeffs: [args.a, args.b, args.c],
        n: args.count,
        x_min: args.x_min,
        x_max: args.x_max,
        noise: args.noise,
        noise_kind: args.noise_kind,
        seed: args.seed,
    };
    let samples = generate_samples(&spec)?;
    print!("{}", crate::report::format_samples(&samples));
    Ok(())
}

/// Merge CLI overrides into the environment-derived engine config.
pub fn engine_config_from_args(args: &FitArgs, base: &EngineConfig) -> Result<EngineConfig, AppError> {
    let mut config = base.clone();
    if let Some(solver) = args.solver {
        config.solver = solver;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(guess) = &args.initial_guess {
        config.initial_guess = <[f64; PARAM_COUNT]>::try_from(guess.as_slice()).map_err(|_| {
            AppError::new(
                2,
                format!("--initial-guess needs exactly {PARAM_COUNT} values (a,b,c), got {}.", guess.len()),
            )
        })?;
    }
    Ok(config)
}

fn resolve_user(args: &IdentityArgs, settings: &Settings) -> Result<UserId, AppError> {
    args.user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(UserId::new)
        .or_else(|| settings.user.clone())
        .ok_or_else(|| AppError::new(2, "No user identity: pass --user or set QUADFIT_USER."))
}

fn resolve_store(args: &IdentityArgs, settings: &Settings) -> JsonFileStore {
    JsonFileStore::new(args.store.clone().unwrap_or_else(|| settings.store_path.clone()))
}
