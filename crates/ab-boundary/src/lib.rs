//! # ab-boundary
//!
//! Early-exercise boundary of American options under Black-Scholes
//! dynamics with a continuous dividend yield, computed by fixed-point
//! iteration on the Andersen-Lake-Offengenden integral equations.
//!
//! The boundary is solved on a [`TimeGrid`] over `[0, T]`, interpolated by
//! a cubic spline in `√(T − t)` and returned as an immutable
//! [`ConvergedBoundary`]. Calls are reduced to puts by put-call symmetry.
//!
//! ```
//! use ab_boundary::{
//!     compute_exercise_boundary, BoundaryEvaluator, ConvergenceConfig, MarketParameters,
//! };
//!
//! let market = MarketParameters::put(100.0, 0.06, 0.0, 0.2, 1.0)?;
//! let config = ConvergenceConfig::default().with_max_iterations(100);
//! let boundary = compute_exercise_boundary(&market, 17, &config)?;
//!
//! assert!(boundary.is_converged());
//! assert_eq!(boundary.value_at(1.0)?, 100.0);
//! let today = boundary.value_at(0.0)?;
//! assert!(today > 75.0 && today < 100.0);
//! # Ok::<(), ab_core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Batched solves.
pub mod batch;

/// Solver configuration.
pub mod config;

/// The boundary integral equations.
pub mod equation;

/// Solved boundary and its evaluation.
pub mod evaluator;

/// Time discretisation.
pub mod grid;

/// Spline of the boundary between nodes.
pub mod interpolant;

/// Market inputs.
pub mod market;

/// Barone-Adesi-Whaley critical price.
pub mod quadratic_approximation;

/// Fixed-point iteration state machine.
pub mod solver;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use batch::compute_exercise_boundaries;
pub use config::{ConvergenceConfig, EquationForm, InitialGuess, QuadratureScheme, ToleranceKind};
pub use equation::{BoundaryCurve, BoundaryEquationSystem};
pub use evaluator::{BoundaryEvaluator, ConvergedBoundary};
pub use grid::{GridSpacing, TimeGrid};
pub use interpolant::BoundaryInterpolant;
pub use market::MarketParameters;
pub use solver::{ConvergenceStatus, FixedPointSolver, SolveOutcome, SolverState};

use ab_core::{
    errors::{Error, Result},
    require, Size,
};
use tracing::info_span;

/// Solve the exercise boundary of one option on a grid of `grid_size`
/// nodes with the default clustering.
///
/// Market parameters are validated first, then the grid, then the
/// configuration; no quadrature runs before all three pass. Running out of
/// iterations or time is reported through
/// [`ConvergedBoundary::status`], not as an error.
///
/// # Errors
/// [`Error::InvalidMarketParameters`], [`Error::InvalidGridSpec`] or
/// [`Error::InvalidArgument`] for rejected inputs.
pub fn compute_exercise_boundary(
    market: &MarketParameters,
    grid_size: Size,
    config: &ConvergenceConfig,
) -> Result<ConvergedBoundary> {
    market.validate()?;
    let grid = TimeGrid::new(market.expiry(), grid_size)?;
    compute_exercise_boundary_on_grid(market, grid, config)
}

/// Solve on a caller-supplied grid, which must end at the option's expiry.
pub fn compute_exercise_boundary_on_grid(
    market: &MarketParameters,
    grid: TimeGrid,
    config: &ConvergenceConfig,
) -> Result<ConvergedBoundary> {
    market.validate()?;
    require!(
        Error::InvalidGridSpec,
        grid.expiry() == market.expiry(),
        "grid ends at {} but the option expires at {}",
        grid.expiry(),
        market.expiry()
    );
    config.validate()?;

    let _span = info_span!(
        "exercise_boundary",
        option = %market.option_type(),
        strike = market.strike(),
        expiry = market.expiry(),
        nodes = grid.len()
    )
    .entered();

    let system = BoundaryEquationSystem::new(
        market,
        config.equation_form(),
        config.quadrature().build()?,
    )?;
    let outcome = FixedPointSolver::new(&system, &grid, config)?.run()?;
    ConvergedBoundary::new(*market, grid, outcome)
}
