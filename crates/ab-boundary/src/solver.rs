//! Fixed-point iteration driver.
//!
//! The solver is a small state machine:
//!
//! ```text
//! Seeded ──step──▶ Iterating ──step──▶ … ──▶ Converged
//!                                         └─▶ MaxIterationsExceeded
//!                                         └─▶ BudgetExhausted
//! ```
//!
//! Each step performs one full Jacobi sweep and then measures the largest
//! change over all nodes. Nothing in a sweep depends on node order, so two
//! solves with the same inputs produce bit-identical curves.

use std::time::Instant;

use ab_core::{errors::Result, Price, Real, Size};
use tracing::{debug, info, warn};

use crate::{
    config::ConvergenceConfig,
    equation::{BoundaryCurve, BoundaryEquationSystem},
    grid::TimeGrid,
};

/// Where the iteration stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Initial guess in place, no sweep performed yet.
    Seeded,
    /// At least one sweep done, tolerance not yet met.
    Iterating,
    /// The last change met the tolerance.
    Converged,
    /// The iteration cap was reached first.
    MaxIterationsExceeded,
    /// The wall-clock budget ran out first.
    BudgetExhausted,
}

impl SolverState {
    /// `true` once no further step will be taken.
    pub fn is_terminal(self) -> bool {
        self.status().is_some()
    }

    /// Final status, for terminal states.
    pub fn status(self) -> Option<ConvergenceStatus> {
        match self {
            SolverState::Seeded | SolverState::Iterating => None,
            SolverState::Converged => Some(ConvergenceStatus::Converged),
            SolverState::MaxIterationsExceeded => Some(ConvergenceStatus::MaxIterationsExceeded),
            SolverState::BudgetExhausted => Some(ConvergenceStatus::BudgetExhausted),
        }
    }
}

/// How a finished solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConvergenceStatus {
    /// Tolerance met.
    Converged,
    /// Iteration cap reached.
    MaxIterationsExceeded,
    /// Wall-clock budget elapsed.
    BudgetExhausted,
}

/// Result of running a [`FixedPointSolver`] to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Final put-problem curve in node order.
    pub curve: BoundaryCurve,
    /// How the iteration ended.
    pub status: ConvergenceStatus,
    /// Maximum change of every sweep, in order.
    pub residual_history: Vec<Real>,
}

/// Drives [`BoundaryEquationSystem::refine`] until the curve settles.
#[derive(Debug)]
pub struct FixedPointSolver<'a> {
    system: &'a BoundaryEquationSystem,
    grid: &'a TimeGrid,
    config: &'a ConvergenceConfig,
    state: SolverState,
    curve: BoundaryCurve,
    residual_history: Vec<Real>,
    started: Instant,
}

impl<'a> FixedPointSolver<'a> {
    /// Seed the solver with the configured initial guess.
    pub fn new(
        system: &'a BoundaryEquationSystem,
        grid: &'a TimeGrid,
        config: &'a ConvergenceConfig,
    ) -> Result<Self> {
        config.validate()?;
        let curve = system.initial_guess(grid, config.initial_guess());
        Ok(Self {
            system,
            grid,
            config,
            state: SolverState::Seeded,
            curve,
            residual_history: Vec::with_capacity(config.max_iterations()),
            started: Instant::now(),
        })
    }

    /// Current state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Current curve in node order.
    pub fn curve(&self) -> &[Price] {
        &self.curve
    }

    /// Maximum change of each sweep so far.
    pub fn residual_history(&self) -> &[Real] {
        &self.residual_history
    }

    /// Number of sweeps performed.
    pub fn iterations(&self) -> Size {
        self.residual_history.len()
    }

    /// Perform one sweep unless the solver is already terminal.
    pub fn step(&mut self) -> Result<SolverState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if let Some(budget) = self.config.time_budget() {
            if self.started.elapsed() >= budget {
                warn!(
                    iterations = self.iterations(),
                    ?budget,
                    "time budget exhausted before convergence"
                );
                self.state = SolverState::BudgetExhausted;
                return Ok(self.state);
            }
        }

        let next = self.system.refine(self.grid, &self.curve)?;
        let change = self.config.tolerance_kind().max_change(&self.curve, &next);
        self.curve = next;
        self.residual_history.push(change);
        let iteration = self.iterations();
        debug!(iteration, change, "boundary sweep");

        self.state = if change <= self.config.tolerance() {
            info!(iterations = iteration, change, "exercise boundary converged");
            SolverState::Converged
        } else if iteration >= self.config.max_iterations() {
            warn!(
                iterations = iteration,
                change,
                tolerance = self.config.tolerance(),
                "iteration cap reached before convergence"
            );
            SolverState::MaxIterationsExceeded
        } else {
            SolverState::Iterating
        };
        Ok(self.state)
    }

    /// Step until a terminal state is reached.
    pub fn run(mut self) -> Result<SolveOutcome> {
        let status = loop {
            if let Some(status) = self.step()?.status() {
                break status;
            }
        };
        Ok(SolveOutcome {
            curve: self.curve,
            status,
            residual_history: self.residual_history,
        })
    }
}
