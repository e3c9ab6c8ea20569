//! Independent solves over a batch of options.
//!
//! With the `parallel` feature (on by default) the batch is mapped with
//! rayon; otherwise it is solved in a plain loop. Each element runs exactly
//! the single-option solve, so results do not depend on the feature or on
//! thread scheduling, and output order equals input order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::info_span;

use ab_core::{
    errors::{Error, Result},
    require, Size,
};

use crate::{
    compute_exercise_boundary_on_grid, config::ConvergenceConfig, evaluator::ConvergedBoundary,
    grid::TimeGrid, market::MarketParameters,
};

/// Solve the exercise boundary of every option in `markets`.
///
/// Every market and every per-option grid is validated before any solve
/// starts; an invalid element fails the whole batch with its index in the
/// message.
pub fn compute_exercise_boundaries(
    markets: &[MarketParameters],
    grid_size: Size,
    config: &ConvergenceConfig,
) -> Result<Vec<ConvergedBoundary>> {
    for (index, market) in markets.iter().enumerate() {
        market.validate().map_err(|err| with_index(index, err))?;
    }
    require!(
        Error::InvalidGridSpec,
        grid_size >= 2,
        "a grid needs at least 2 nodes, got {grid_size}"
    );
    let grids = markets
        .iter()
        .enumerate()
        .map(|(index, market)| {
            TimeGrid::new(market.expiry(), grid_size).map_err(|err| with_index(index, err))
        })
        .collect::<Result<Vec<_>>>()?;
    config.validate()?;

    let _span = info_span!("exercise_boundary_batch", options = markets.len(), grid_size).entered();

    solve_all(markets, grids, config)
}

fn with_index(index: usize, err: Error) -> Error {
    match err {
        Error::InvalidMarketParameters(msg) => {
            Error::InvalidMarketParameters(format!("batch element {index}: {msg}"))
        }
        Error::InvalidGridSpec(msg) => Error::InvalidGridSpec(format!("batch element {index}: {msg}")),
        other => other,
    }
}

#[cfg(feature = "parallel")]
fn solve_all(
    markets: &[MarketParameters],
    grids: Vec<TimeGrid>,
    config: &ConvergenceConfig,
) -> Result<Vec<ConvergedBoundary>> {
    markets
        .par_iter()
        .zip(grids)
        .map(|(market, grid)| compute_exercise_boundary_on_grid(market, grid, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn solve_all(
    markets: &[MarketParameters],
    grids: Vec<TimeGrid>,
    config: &ConvergenceConfig,
) -> Result<Vec<ConvergedBoundary>> {
    markets
        .iter()
        .zip(grids)
        .map(|(market, grid)| compute_exercise_boundary_on_grid(market, grid, config))
        .collect()
}
