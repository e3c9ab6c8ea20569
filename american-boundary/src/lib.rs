//! # american-boundary
//!
//! Early-exercise boundaries of American options.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on it rather than on the individual
//! `ab-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use american_boundary::boundary::{
//!     compute_exercise_boundary, BoundaryEvaluator, ConvergenceConfig, MarketParameters,
//! };
//!
//! let call = MarketParameters::call(100.0, 0.03, 0.07, 0.25, 0.5)?;
//! let config = ConvergenceConfig::default().with_max_iterations(100);
//! let boundary = compute_exercise_boundary(&call, 9, &config)?;
//!
//! // a call is exercised above the boundary, which ends at K max(1, r/q)
//! assert!(boundary.value_at(0.0)? > 100.0);
//! # Ok::<(), american_boundary::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ab_core as core;

/// Quadrature, splines, distributions, and root finding.
pub use ab_math as math;

/// The exercise-boundary solver.
pub use ab_boundary as boundary;

pub use ab_boundary::{
    compute_exercise_boundaries, compute_exercise_boundary, BoundaryEvaluator, ConvergedBoundary,
    ConvergenceConfig, MarketParameters,
};
pub use ab_core::{Error, OptionType, Result};
