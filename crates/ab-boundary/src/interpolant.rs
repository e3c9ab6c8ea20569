//! Continuous boundary between grid nodes.

use ab_core::{ensure, errors::Result, Price, Real, Time};
use ab_math::{CubicSpline, Interpolation1D, SplineBoundary};

use crate::grid::TimeGrid;

/// Natural cubic spline of the boundary in `x = √τ`, with `τ` the time to
/// expiry.
///
/// The boundary has a square-root profile near expiry, which is smooth in
/// `√τ`. Beyond the last knot the spline continues along its end tangent.
#[derive(Debug, Clone)]
pub struct BoundaryInterpolant {
    spline: CubicSpline,
}

impl BoundaryInterpolant {
    /// Fit through `values`, one per grid node in node order.
    pub fn fit(grid: &TimeGrid, values: &[Price]) -> Result<Self> {
        ensure!(
            values.len() == grid.len(),
            "expected {} boundary values, got {}",
            grid.len(),
            values.len()
        );
        // Knots ascend in √τ, i.e. run from expiry backwards.
        let xs: Vec<Real> = (0..grid.len())
            .rev()
            .map(|i| grid.time_to_expiry(i).max(0.0).sqrt())
            .collect();
        let ys: Vec<Real> = values.iter().rev().copied().collect();
        let spline = CubicSpline::new(&xs, &ys, SplineBoundary::Natural)?;
        Ok(Self { spline })
    }

    /// Boundary at time to expiry `tau`; negative `tau` is read as 0.
    pub fn value(&self, tau: Time) -> Price {
        self.spline.value(tau.max(0.0).sqrt())
    }

    /// The underlying spline in `√τ`.
    pub fn spline(&self) -> &CubicSpline {
        &self.spline
    }
}
