//! Cubic spline interpolation with natural or clamped end conditions.
//!
//! The second derivatives `Mᵢ` at the knots solve a tridiagonal system
//! (Thomas algorithm, O(n)); on `[xᵢ, xᵢ₊₁]` with `h = xᵢ₊₁ − xᵢ` and
//! `t = x − xᵢ` the spline is
//!
//!   `S(x) = yᵢ + bᵢ t + Mᵢ t²/2 + (Mᵢ₊₁ − Mᵢ) t³ / (6h)`
//!
//! with `bᵢ = (yᵢ₊₁ − yᵢ)/h − h (2Mᵢ + Mᵢ₊₁)/6`. The curve is C² inside the
//! knot range. Outside it the spline continues as the tangent line at the
//! nearest end knot, which keeps value and slope continuous.

use ab_core::{ensure, errors::Result, Real};

use super::{locate, Interpolation1D};

/// End condition of a [`CubicSpline`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SplineBoundary {
    /// Zero second derivative at both ends.
    #[default]
    Natural,
    /// Prescribed first derivatives at the left and right ends.
    Clamped {
        /// Slope at the first knot.
        left: Real,
        /// Slope at the last knot.
        right: Real,
    },
}

/// C² cubic spline through strictly increasing knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<Real>,
    ys: Vec<Real>,
    m: Vec<Real>,
    b: Vec<Real>,
}

impl CubicSpline {
    /// Fit a spline through `(xs, ys)`.
    ///
    /// # Errors
    /// Returns an error if fewer than 2 points are given, the lengths
    /// differ, any value is non-finite, or `xs` is not strictly increasing.
    pub fn new(xs: &[Real], ys: &[Real], boundary: SplineBoundary) -> Result<Self> {
        let n = xs.len();
        ensure!(n >= 2, "need at least 2 points for a cubic spline, got {n}");
        ensure!(
            ys.len() == n,
            "xs and ys must have the same length: {} vs {}",
            n,
            ys.len()
        );
        ensure!(
            xs.iter().chain(ys.iter()).all(|v| v.is_finite()),
            "spline knots must be finite"
        );
        ensure!(
            xs.windows(2).all(|w| w[0] < w[1]),
            "spline abscissae must be strictly increasing"
        );
        if let SplineBoundary::Clamped { left, right } = boundary {
            ensure!(
                left.is_finite() && right.is_finite(),
                "clamped end slopes must be finite"
            );
        }

        let h: Vec<Real> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let s: Vec<Real> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        // Tridiagonal system: sub[i] M[i-1] + diag[i] M[i] + sup[i] M[i+1] = rhs[i]
        let mut sub = vec![0.0; n];
        let mut diag = vec![0.0; n];
        let mut sup = vec![0.0; n];
        let mut rhs = vec![0.0; n];

        for i in 1..n - 1 {
            sub[i] = h[i - 1];
            diag[i] = 2.0 * (h[i - 1] + h[i]);
            sup[i] = h[i];
            rhs[i] = 6.0 * (s[i] - s[i - 1]);
        }

        match boundary {
            SplineBoundary::Natural => {
                diag[0] = 1.0;
                diag[n - 1] = 1.0;
            }
            SplineBoundary::Clamped { left, right } => {
                diag[0] = 2.0 * h[0];
                sup[0] = h[0];
                rhs[0] = 6.0 * (s[0] - left);
                sub[n - 1] = h[n - 2];
                diag[n - 1] = 2.0 * h[n - 2];
                rhs[n - 1] = 6.0 * (right - s[n - 2]);
            }
        }

        let m = solve_tridiagonal(&sub, &diag, &sup, rhs);
        let b = (0..n - 1)
            .map(|i| s[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0)
            .collect();

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
            b,
        })
    }

    /// Knot abscissae.
    pub fn xs(&self) -> &[Real] {
        &self.xs
    }

    /// Knot values.
    pub fn ys(&self) -> &[Real] {
        &self.ys
    }

    /// Second derivatives at the knots.
    pub fn second_derivatives(&self) -> &[Real] {
        &self.m
    }

    fn segment_derivative(&self, i: usize, t: Real) -> Real {
        let h = self.xs[i + 1] - self.xs[i];
        self.b[i] + self.m[i] * t + (self.m[i + 1] - self.m[i]) * t * t / (2.0 * h)
    }

    fn end_slopes(&self) -> (Real, Real) {
        let last = self.xs.len() - 2;
        let h = self.xs[last + 1] - self.xs[last];
        (self.segment_derivative(0, 0.0), self.segment_derivative(last, h))
    }
}

/// Thomas algorithm; the systems built here are diagonally dominant so no
/// pivoting is needed.
fn solve_tridiagonal(sub: &[Real], diag: &[Real], sup: &[Real], mut rhs: Vec<Real>) -> Vec<Real> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    c[0] = sup[0] / diag[0];
    rhs[0] /= diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i] * c[i - 1];
        c[i] = sup[i] / denom;
        rhs[i] = (rhs[i] - sub[i] * rhs[i - 1]) / denom;
    }
    for i in (0..n - 1).rev() {
        rhs[i] -= c[i] * rhs[i + 1];
    }
    rhs
}

impl Interpolation1D for CubicSpline {
    fn value(&self, x: Real) -> Real {
        let n = self.xs.len();
        if x < self.xs[0] {
            let (left, _) = self.end_slopes();
            return self.ys[0] + left * (x - self.xs[0]);
        }
        if x > self.xs[n - 1] {
            let (_, right) = self.end_slopes();
            return self.ys[n - 1] + right * (x - self.xs[n - 1]);
        }
        let i = locate(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let t = x - self.xs[i];
        self.ys[i]
            + t * (self.b[i] + t * (0.5 * self.m[i] + t * (self.m[i + 1] - self.m[i]) / (6.0 * h)))
    }

    fn derivative(&self, x: Real) -> Real {
        let n = self.xs.len();
        if x < self.xs[0] {
            return self.end_slopes().0;
        }
        if x > self.xs[n - 1] {
            return self.end_slopes().1;
        }
        let i = locate(&self.xs, x);
        self.segment_derivative(i, x - self.xs[i])
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}
