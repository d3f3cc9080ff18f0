//! The quadratic model `f(x) = a·x² + b·x + c`.
//!
//! Kept as small, pure functions so the solvers can stay generic over the
//! design matrix.

pub mod model;

pub use model::*;
