//! `quadfit` library crate.
//!
//! The binary (`quadfit`) is a thin wrapper around this library so that:
//!
//! - the fit engine and orchestrator are testable without spawning processes
//! - storage and presentation stay swappable (a web front-end can reuse `app::pipeline`)

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod store;
