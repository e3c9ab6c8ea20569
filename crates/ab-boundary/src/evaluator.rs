//! The solved boundary as a function of calendar time.

use ab_core::{
    errors::{Error, Result},
    Price, Real, Size, Time,
};

use crate::{
    grid::TimeGrid,
    interpolant::BoundaryInterpolant,
    market::MarketParameters,
    solver::{ConvergenceStatus, SolveOutcome},
};

/// Continuous evaluation of an exercise boundary on `[0, T]`.
pub trait BoundaryEvaluator {
    /// Solved interval `(lower, upper)`.
    fn domain(&self) -> (Time, Time);

    /// Boundary at calendar time `t`.
    ///
    /// # Errors
    /// [`Error::OutOfDomain`] when `t` is outside [`domain`](Self::domain)
    /// or NaN.
    fn value_at(&self, t: Time) -> Result<Price>;

    /// Boundary at each of `times`, in input order.
    ///
    /// Stops at the first out-of-domain query.
    fn values_at(&self, times: &[Time]) -> Result<Vec<Price>> {
        times.iter().map(|&t| self.value_at(t)).collect()
    }
}

/// An immutable solved boundary.
///
/// Holds the grid, the node values of the requested option type, the spline
/// of the underlying put problem and the convergence record. A call
/// boundary is `K² / B` of the put problem with the rates swapped, applied
/// on every evaluation.
#[derive(Debug, Clone)]
pub struct ConvergedBoundary {
    market: MarketParameters,
    grid: TimeGrid,
    nodes: Vec<Price>,
    interpolant: BoundaryInterpolant,
    status: ConvergenceStatus,
    residual_history: Vec<Real>,
}

impl ConvergedBoundary {
    pub(crate) fn new(market: MarketParameters, grid: TimeGrid, outcome: SolveOutcome) -> Result<Self> {
        let interpolant = BoundaryInterpolant::fit(&grid, &outcome.curve)?;
        let nodes = outcome
            .curve
            .iter()
            .map(|&b| market.denormalize(b))
            .collect();
        Ok(Self {
            market,
            grid,
            nodes,
            interpolant,
            status: outcome.status,
            residual_history: outcome.residual_history,
        })
    }

    /// The option this boundary belongs to.
    pub fn market(&self) -> &MarketParameters {
        &self.market
    }

    /// The time grid.
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Boundary at each grid node, in node order.
    pub fn node_values(&self) -> &[Price] {
        &self.nodes
    }

    /// How the iteration ended.
    pub fn status(&self) -> ConvergenceStatus {
        self.status
    }

    /// `true` if the tolerance was met.
    pub fn is_converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }

    /// Number of sweeps performed.
    pub fn iterations(&self) -> Size {
        self.residual_history.len()
    }

    /// Change of the last sweep; `None` if no sweep ran.
    pub fn final_residual(&self) -> Option<Real> {
        self.residual_history.last().copied()
    }

    /// Change of every sweep, in order.
    pub fn residual_history(&self) -> &[Real] {
        &self.residual_history
    }

    /// Fail with [`Error::NonConvergent`] unless the tolerance was met.
    pub fn into_converged(self) -> Result<Self> {
        if self.is_converged() {
            Ok(self)
        } else {
            Err(Error::NonConvergent {
                iterations: self.iterations(),
                residual: self.final_residual().unwrap_or(Real::INFINITY),
            })
        }
    }

    /// Boundary at time to expiry `tau ∈ [0, T]`.
    pub fn value_at_time_to_expiry(&self, tau: Time) -> Result<Price> {
        self.value_at(self.grid.expiry() - tau)
    }
}

impl BoundaryEvaluator for ConvergedBoundary {
    fn domain(&self) -> (Time, Time) {
        (0.0, self.grid.expiry())
    }

    fn value_at(&self, t: Time) -> Result<Price> {
        if !self.grid.contains(t) {
            return Err(Error::OutOfDomain {
                t,
                lower: 0.0,
                upper: self.grid.expiry(),
            });
        }
        let tau = self.grid.expiry() - t;
        Ok(self.market.denormalize(self.interpolant.value(tau)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn boundary(market: MarketParameters, status: ConvergenceStatus) -> ConvergedBoundary {
        let grid = TimeGrid::new(market.expiry(), 3).unwrap();
        let outcome = SolveOutcome {
            curve: vec![80.0, 90.0, 100.0],
            status,
            residual_history: vec![1e-2, 1e-5],
        };
        ConvergedBoundary::new(market, grid, outcome).unwrap()
    }

    #[test]
    fn put_nodes_and_domain() {
        let put = MarketParameters::put(100.0, 0.05, 0.0, 0.2, 1.0).unwrap();
        let b = boundary(put, ConvergenceStatus::Converged);
        assert_eq!(b.node_values(), &[80.0, 90.0, 100.0]);
        assert_eq!(b.value_at(1.0).unwrap(), 100.0);
        assert_abs_diff_eq!(b.value_at(0.0).unwrap(), 80.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.value_at_time_to_expiry(1.0).unwrap(), 80.0, epsilon = 1e-12);
        assert_eq!(b.domain(), (0.0, 1.0));
        assert_eq!(b.iterations(), 2);
        assert_eq!(b.final_residual(), Some(1e-5));
        assert!(b.is_converged());
    }

    #[test]
    fn call_nodes_are_inverted() {
        let call = MarketParameters::call(100.0, 0.0, 0.05, 0.2, 1.0).unwrap();
        let b = boundary(call, ConvergenceStatus::Converged);
        assert_relative_eq!(b.node_values()[0], 125.0, max_relative = 1e-15);
        assert_relative_eq!(b.value_at(0.0).unwrap(), 125.0, max_relative = 1e-12);
        assert_eq!(b.value_at(1.0).unwrap(), 100.0);
    }

    #[test]
    fn out_of_domain_queries() {
        let put = MarketParameters::put(100.0, 0.05, 0.0, 0.2, 1.0).unwrap();
        let b = boundary(put, ConvergenceStatus::Converged);
        for t in [-1e-9, 1.0 + 1e-9, f64::NAN] {
            assert!(matches!(b.value_at(t), Err(Error::OutOfDomain { .. })));
        }
        assert!(b.values_at(&[0.5, 2.0, 0.1]).is_err());
        let ordered = b.values_at(&[0.9, 0.1, 0.5]).unwrap();
        assert_eq!(ordered[0], b.value_at(0.9).unwrap());
        assert_eq!(ordered[1], b.value_at(0.1).unwrap());
    }

    #[test]
    fn strict_callers_see_non_convergence() {
        let put = MarketParameters::put(100.0, 0.05, 0.0, 0.2, 1.0).unwrap();
        let b = boundary(put, ConvergenceStatus::MaxIterationsExceeded);
        match b.into_converged() {
            Err(Error::NonConvergent {
                iterations,
                residual,
            }) => {
                assert_eq!(iterations, 2);
                assert_eq!(residual, 1e-5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
