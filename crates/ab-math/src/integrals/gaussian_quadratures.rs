//! Gauss-Legendre quadrature.
//!
//! Nodes and weights come from the Golub-Welsch algorithm: the nodes are
//! the eigenvalues of the symmetric tridiagonal Jacobi matrix of the
//! Legendre recurrence and the weights are `μ₀ v₀²` with `v₀` the first
//! component of each normalised eigenvector (`μ₀ = 2` on [−1, 1]).

use ab_core::{ensure, errors::Result, Real};
use nalgebra::{DMatrix, SymmetricEigen};

use super::{check_bounds, Integral, Integrator};

/// A Gauss quadrature rule defined by nodes and weights on [−1, 1].
#[derive(Debug, Clone)]
pub struct GaussianQuadrature {
    x: Vec<Real>,
    w: Vec<Real>,
}

impl GaussianQuadrature {
    /// Quadrature nodes, ascending.
    pub fn x(&self) -> &[Real] {
        &self.x
    }

    /// Quadrature weights.
    pub fn w(&self) -> &[Real] {
        &self.w
    }

    /// Number of quadrature points.
    pub fn order(&self) -> usize {
        self.x.len()
    }

    /// Evaluate ∫₋₁¹ f(x) dx ≈ Σ wᵢ f(xᵢ).
    pub fn integrate<F: Fn(Real) -> Real>(&self, f: F) -> Real {
        self.x.iter().zip(self.w.iter()).map(|(&xi, &wi)| wi * f(xi)).sum()
    }

    /// Accumulate `Σ wᵢ f(mid + half xᵢ) · half` component-wise into `acc`.
    fn accumulate<F>(&self, f: &F, mid: Real, half: Real, sample: &mut [Real], acc: &mut [Real])
    where
        F: Fn(Real, &mut [Real]),
    {
        acc.fill(0.0);
        for (&xi, &wi) in self.x.iter().zip(self.w.iter()) {
            f(mid + half * xi, sample);
            for (a, s) in acc.iter_mut().zip(sample.iter()) {
                *a += wi * s;
            }
        }
        for a in acc.iter_mut() {
            *a *= half;
        }
    }
}

/// Build the `order`-point Gauss-Legendre rule on [−1, 1].
///
/// Uses the Legendre recurrence `βₖ = k / √(4k² − 1)` for the off-diagonal
/// of the Jacobi matrix. The result is symmetrised so that `xᵢ = −xₙ₋₁₋ᵢ`
/// and `wᵢ = wₙ₋₁₋ᵢ` hold exactly.
pub fn gauss_legendre_rule(order: usize) -> GaussianQuadrature {
    let n = order;
    if n == 0 {
        return GaussianQuadrature {
            x: vec![],
            w: vec![],
        };
    }

    let mut jacobi = DMatrix::<Real>::zeros(n, n);
    for k in 1..n {
        let kk = k as Real;
        let beta = kk / (4.0 * kk * kk - 1.0).sqrt();
        jacobi[(k - 1, k)] = beta;
        jacobi[(k, k - 1)] = beta;
    }
    let eigen = SymmetricEigen::new(jacobi);

    let mut pairs: Vec<(Real, Real)> = (0..n)
        .map(|i| {
            let v0 = eigen.eigenvectors[(0, i)];
            (eigen.eigenvalues[i], 2.0 * v0 * v0)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut x: Vec<Real> = pairs.iter().map(|p| p.0).collect();
    let mut w: Vec<Real> = pairs.iter().map(|p| p.1).collect();
    for i in 0..n / 2 {
        let j = n - 1 - i;
        let node = 0.5 * (x[j] - x[i]);
        let weight = 0.5 * (w[i] + w[j]);
        x[i] = -node;
        x[j] = node;
        w[i] = weight;
        w[j] = weight;
    }
    if n % 2 == 1 {
        x[n / 2] = 0.0;
    }

    GaussianQuadrature { x, w }
}

/// Fixed-order Gauss-Legendre integration on an arbitrary interval.
///
/// The error estimate is the difference to an embedded rule of half the
/// order, so it is pessimistic for smooth integrands: the full-order value
/// is usually far more accurate than the estimate suggests.
#[derive(Debug, Clone)]
pub struct GaussLegendreIntegral {
    rule: GaussianQuadrature,
    embedded: Option<GaussianQuadrature>,
}

impl GaussLegendreIntegral {
    /// Build an integrator with `order` nodes (`order >= 1`).
    pub fn new(order: usize) -> Result<Self> {
        ensure!(order >= 1, "Gauss-Legendre order must be at least 1");
        let embedded = (order >= 2).then(|| gauss_legendre_rule(order / 2));
        Ok(Self {
            rule: gauss_legendre_rule(order),
            embedded,
        })
    }

    /// Number of nodes of the main rule.
    pub fn order(&self) -> usize {
        self.rule.order()
    }

    /// The main rule on [−1, 1].
    pub fn rule(&self) -> &GaussianQuadrature {
        &self.rule
    }
}

impl Integrator for GaussLegendreIntegral {
    fn integrate_vector<F>(&self, f: F, width: usize, a: Real, b: Real) -> Result<Vec<Integral>>
    where
        F: Fn(Real, &mut [Real]),
    {
        check_bounds(width, a, b)?;
        if a == b {
            return Ok(vec![Integral::ZERO; width]);
        }
        let mid = 0.5 * (a + b);
        let half = 0.5 * (b - a);
        let mut sample = vec![0.0; width];
        let mut values = vec![0.0; width];
        self.rule.accumulate(&f, mid, half, &mut sample, &mut values);

        let errors = match &self.embedded {
            Some(embedded) => {
                let mut coarse = vec![0.0; width];
                embedded.accumulate(&f, mid, half, &mut sample, &mut coarse);
                values.iter().zip(&coarse).map(|(v, c)| (v - c).abs()).collect()
            }
            None => vec![Real::INFINITY; width],
        };

        Ok(values
            .into_iter()
            .zip(errors)
            .map(|(value, error_estimate)| Integral {
                value,
                error_estimate,
            })
            .collect())
    }
}
