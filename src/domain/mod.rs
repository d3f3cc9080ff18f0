//! Domain types used throughout the fit pipeline.
//!
//! This module defines:
//!
//! - engine configuration (`EngineConfig`, `SolverKind`)
//! - transient request data (`Samples`)
//! - fit outputs (`QuadraticFit`) and their persisted form (`FitParams`, `FitRecord`)

pub mod types;

pub use types::*;
