//! The fit engine.
//!
//! Responsibilities:
//!
//! - validate sample sequences and engine configuration
//! - detect singular designs before solving
//! - solve for `(a, b, c)` with the configured solver

pub mod fitter;

pub use fitter::*;
