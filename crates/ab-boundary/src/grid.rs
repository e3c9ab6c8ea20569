//! Discretised time axis of the boundary solve.
//!
//! Nodes are calendar times `0 = t₀ < t₁ < … < tₙ₋₁ = T`. The boundary
//! behaves like `√(T − t)` near expiry, so the default spacing is uniform
//! in `θ = √(T − t)`: time to expiry at node `j` (counted from expiry) is
//! `τⱼ = T (j / (n − 1))²`.

use ab_core::{
    errors::{Error, Result},
    require, Size, Time,
};

/// How the nodes are distributed over `[0, T]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridSpacing {
    /// Uniform in `√(T − t)`; clusters nodes near expiry.
    #[default]
    SqrtClustered,
    /// Uniform in `t`.
    Uniform,
}

/// Strictly increasing calendar-time grid covering `[0, T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    expiry: Time,
    spacing: GridSpacing,
    times: Vec<Time>,
}

impl TimeGrid {
    /// Grid of `n` nodes with the default expiry clustering.
    ///
    /// # Errors
    /// [`Error::InvalidGridSpec`] unless `expiry` is positive and finite and
    /// `n >= 2`.
    pub fn new(expiry: Time, n: Size) -> Result<Self> {
        Self::with_spacing(expiry, n, GridSpacing::default())
    }

    /// Grid of `n` nodes with an explicit spacing.
    pub fn with_spacing(expiry: Time, n: Size, spacing: GridSpacing) -> Result<Self> {
        require!(
            Error::InvalidGridSpec,
            expiry.is_finite() && expiry > 0.0,
            "expiry must be positive and finite, got {expiry}"
        );
        require!(
            Error::InvalidGridSpec,
            n >= 2,
            "a grid needs at least 2 nodes, got {n}"
        );

        let last = (n - 1) as Time;
        let times: Vec<Time> = (0..n)
            .map(|i| match spacing {
                GridSpacing::SqrtClustered => {
                    let j = (n - 1 - i) as Time / last;
                    expiry - expiry * j * j
                }
                GridSpacing::Uniform => expiry * i as Time / last,
            })
            .collect();

        // Very fine grids on tiny expiries can collapse neighbouring nodes.
        require!(
            Error::InvalidGridSpec,
            times.windows(2).all(|w| w[0] < w[1]),
            "{n} nodes cannot be strictly increasing on [0, {expiry}]"
        );

        Ok(Self {
            expiry,
            spacing,
            times,
        })
    }

    /// Calendar times, ascending; first is 0, last is the expiry.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Time to expiry `T − tᵢ` of node `i`.
    pub fn time_to_expiry(&self, i: Size) -> Time {
        self.expiry - self.times[i]
    }

    /// Time to expiry of every node, in node order (descending).
    pub fn times_to_expiry(&self) -> Vec<Time> {
        self.times.iter().map(|&t| self.expiry - t).collect()
    }

    /// The expiry `T`.
    pub fn expiry(&self) -> Time {
        self.expiry
    }

    /// Node spacing rule.
    pub fn spacing(&self) -> GridSpacing {
        self.spacing
    }

    /// Number of nodes.
    pub fn len(&self) -> Size {
        self.times.len()
    }

    /// Always `false`; a grid holds at least two nodes.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate over the calendar times.
    pub fn iter(&self) -> std::slice::Iter<'_, Time> {
        self.times.iter()
    }

    /// `true` when `t` lies in `[0, T]`.
    pub fn contains(&self, t: Time) -> bool {
        (0.0..=self.expiry).contains(&t)
    }
}

impl<'a> IntoIterator for &'a TimeGrid {
    type Item = &'a Time;
    type IntoIter = std::slice::Iter<'a, Time>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn endpoints_are_exact() {
        for spacing in [GridSpacing::SqrtClustered, GridSpacing::Uniform] {
            let grid = TimeGrid::with_spacing(1.5, 7, spacing).unwrap();
            assert_eq!(grid.times()[0], 0.0);
            assert_eq!(grid.times()[6], 1.5);
            assert_eq!(grid.time_to_expiry(6), 0.0);
            assert_eq!(grid.len(), 7);
        }
    }

    #[test]
    fn clustered_nodes_follow_squares() {
        let grid = TimeGrid::new(2.0, 5).unwrap();
        let taus = grid.times_to_expiry();
        for (i, tau) in taus.iter().enumerate() {
            let j = (4 - i) as f64 / 4.0;
            assert_abs_diff_eq!(*tau, 2.0 * j * j, epsilon = 1e-15);
        }
        // spacing shrinks towards expiry
        let steps: Vec<f64> = grid.times().windows(2).map(|w| w[1] - w[0]).collect();
        assert!(steps.windows(2).all(|s| s[0] > s[1]));
    }

    #[test]
    fn refinement_keeps_interval() {
        for n in [2, 3, 10, 257] {
            let grid = TimeGrid::new(0.75, n).unwrap();
            assert_eq!(grid.times().first(), Some(&0.0));
            assert_eq!(grid.times().last(), Some(&0.75));
            assert!(grid.times().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn rejects_bad_specs() {
        for (expiry, n) in [(0.0, 5), (-1.0, 5), (f64::NAN, 5), (f64::INFINITY, 5), (1.0, 1), (1.0, 0)] {
            assert!(matches!(
                TimeGrid::new(expiry, n),
                Err(Error::InvalidGridSpec(_))
            ));
        }
    }

    #[test]
    fn contains_closed_interval() {
        let grid = TimeGrid::new(1.0, 3).unwrap();
        assert!(grid.contains(0.0));
        assert!(grid.contains(1.0));
        assert!(!grid.contains(1.0 + 1e-12));
        assert!(!grid.contains(-1e-12));
        assert!(!grid.contains(f64::NAN));
        assert_eq!(grid.iter().count(), 3);
    }
}
