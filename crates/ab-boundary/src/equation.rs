//! Integral equations of the early-exercise boundary.
//!
//! Everything here works on the put problem; calls are mapped onto it by
//! put-call symmetry before the system is built. With time to expiry `τ`
//! the boundary `B` of a put satisfies the fixed-point relation
//!
//! `B(τ) = K e^{−(r−q)τ} N(τ, B) / D(τ, B)`
//!
//! where `N` and `D` combine a closed-form term at `B(τ)/K` with an
//! integral over the boundary history `B(u)`, `0 ≤ u ≤ τ`. Two equivalent
//! forms of `N` and `D` are provided (see [`EquationForm`]).
//!
//! The integrals run over calendar time `s ∈ [t, T]`, i.e. over
//! `u = T − s ∈ [0, τ]`. The FP-A kernel carries a `1/√(τ − u)` factor, so
//! both forms are integrated in `z` with `τ − u = z²`, which turns the
//! kernel into a smooth function on `[0, √τ]`.

use ab_core::{ensure, errors::Result, Price, Rate, Real, Time, Volatility};
use ab_math::{normal_cdf, normal_pdf, Integrator, Quadrature};
use tracing::warn;

use crate::{
    config::{EquationForm, InitialGuess},
    grid::TimeGrid,
    interpolant::BoundaryInterpolant,
    market::MarketParameters,
    quadratic_approximation::critical_put_price,
};

/// One boundary price per grid node, in node order.
pub type BoundaryCurve = Vec<Price>;

/// `d±(τ, z) = (ln z + (r − q ± σ²/2) τ) / (σ √τ)`, zero for `τ <= 0`.
fn d_pm(tau: Time, z: Real, r: Rate, q: Rate, sigma: Volatility, sign: Real) -> Real {
    if tau <= 0.0 {
        return 0.0;
    }
    (z.ln() + (r - q + sign * 0.5 * sigma * sigma) * tau) / (sigma * tau.sqrt())
}

/// The normalised (put) boundary equations for one option.
#[derive(Debug, Clone)]
pub struct BoundaryEquationSystem {
    strike: Price,
    r: Rate,
    q: Rate,
    sigma: Volatility,
    form: EquationForm,
    quadrature: Quadrature,
}

impl BoundaryEquationSystem {
    /// Build the put system equivalent to `market`.
    pub fn new(market: &MarketParameters, form: EquationForm, quadrature: Quadrature) -> Result<Self> {
        market.validate()?;
        let (r, q) = market.normalized_rates();
        Ok(Self {
            strike: market.strike(),
            r,
            q,
            sigma: market.volatility(),
            form,
            quadrature,
        })
    }

    /// Strike of the put problem.
    pub fn strike(&self) -> Price {
        self.strike
    }

    /// `(r, q)` of the put problem.
    pub fn rates(&self) -> (Rate, Rate) {
        (self.r, self.q)
    }

    /// Equation form in use.
    pub fn form(&self) -> EquationForm {
        self.form
    }

    /// Boundary at expiry: `K min(1, r/q)`, or `K` when `q <= 0`.
    pub fn short_maturity_limit(&self) -> Price {
        if self.q <= 0.0 {
            self.strike
        } else {
            self.strike * (self.r / self.q).min(1.0)
        }
    }

    /// Boundary of the perpetual put, `K λ / (λ − 1)` with `λ` the negative
    /// root of `σ²λ²/2 + (r − q − σ²/2) λ − r = 0`.
    pub fn perpetual_limit(&self) -> Price {
        let half_var = 0.5 * self.sigma * self.sigma;
        let b = self.r - self.q - half_var;
        let lambda = (-b - (b * b + 4.0 * half_var * self.r).sqrt()) / (2.0 * half_var);
        self.strike * lambda / (lambda - 1.0)
    }

    /// Starting curve; finite and strictly positive at every node.
    pub fn initial_guess(&self, grid: &TimeGrid, scheme: InitialGuess) -> BoundaryCurve {
        let limit = self.short_maturity_limit();
        match scheme {
            InitialGuess::ShortMaturityLimit => vec![limit; grid.len()],
            InitialGuess::PerpetualLimit => {
                let floor = self.perpetual_limit().min(limit);
                (0..grid.len())
                    .map(|i| if grid.time_to_expiry(i) <= 0.0 { limit } else { floor })
                    .collect()
            }
            InitialGuess::QuadraticApproximation => (0..grid.len())
                .map(|i| {
                    let tau = grid.time_to_expiry(i);
                    if tau <= 0.0 {
                        return limit;
                    }
                    match critical_put_price(self.strike, self.r, self.q, self.sigma, tau) {
                        Ok(s) if s.is_finite() && s > 0.0 => s.min(limit),
                        Ok(s) => {
                            warn!(tau, critical = s, "unusable quadratic approximation, using expiry limit");
                            limit
                        }
                        Err(err) => {
                            warn!(tau, %err, "quadratic approximation failed, using expiry limit");
                            limit
                        }
                    }
                })
                .collect(),
        }
    }

    /// One Jacobi sweep: every node is updated from `curve` alone.
    ///
    /// The node at expiry keeps the closed-form limit. An update that is
    /// non-finite or not strictly positive keeps the previous value.
    pub fn refine(&self, grid: &TimeGrid, curve: &[Price]) -> Result<BoundaryCurve> {
        ensure!(
            curve.len() == grid.len(),
            "curve has {} values for a grid of {} nodes",
            curve.len(),
            grid.len()
        );
        let interpolant = BoundaryInterpolant::fit(grid, curve)?;
        let limit = self.short_maturity_limit();

        let mut rejected = 0usize;
        let mut next = Vec::with_capacity(curve.len());
        for (i, &current) in curve.iter().enumerate() {
            let tau = grid.time_to_expiry(i);
            if tau <= 0.0 {
                next.push(limit);
                continue;
            }
            let updated = self.update(&interpolant, tau, current)?;
            if updated.is_finite() && updated > 0.0 {
                next.push(updated);
            } else {
                rejected += 1;
                next.push(current);
            }
        }
        if rejected > 0 {
            warn!(rejected, "kept previous boundary value at nodes with invalid updates");
        }
        Ok(next)
    }

    /// `f(B) = K e^{−(r−q)τ} N / D` at one node, with `B(u)` read from
    /// `interpolant` and `B(τ) = b`.
    pub fn update(&self, interpolant: &BoundaryInterpolant, tau: Time, b: Price) -> Result<Price> {
        let (n, d) = self.numerator_denominator(interpolant, tau, b)?;
        Ok(self.strike * (-(self.r - self.q) * tau).exp() * n / d)
    }

    /// `(N, D)` at time to expiry `tau` for node value `b`.
    pub fn numerator_denominator(
        &self,
        interpolant: &BoundaryInterpolant,
        tau: Time,
        b: Price,
    ) -> Result<(Real, Real)> {
        let (r, q, sigma) = (self.r, self.q, self.sigma);
        let form = self.form;

        let kernel = |z: Real, out: &mut [Real]| {
            let lag = z * z;
            let u = tau - lag;
            // Guard against spline undershoot on coarse grids.
            let ratio = b / interpolant.value(u).max(Real::MIN_POSITIVE);
            let dm = d_pm(lag, ratio, r, q, sigma, -1.0);
            let dp = d_pm(lag, ratio, r, q, sigma, 1.0);
            let (er, eq) = ((r * u).exp(), (q * u).exp());
            match form {
                EquationForm::FpB => {
                    out[0] = 2.0 * z * er * normal_cdf(dm);
                    out[1] = 2.0 * z * eq * normal_cdf(dp);
                }
                EquationForm::FpA => {
                    out[0] = 2.0 / sigma * er * normal_pdf(dm);
                    out[1] = eq * (2.0 / sigma * normal_pdf(dp) + 2.0 * z * normal_cdf(dp));
                }
            }
        };
        let integrals = self.quadrature.integrate_vector(kernel, 2, 0.0, tau.sqrt())?;
        let (int_n, int_d) = (integrals[0].value, integrals[1].value);

        let dm = d_pm(tau, b / self.strike, r, q, sigma, -1.0);
        let dp = d_pm(tau, b / self.strike, r, q, sigma, 1.0);
        Ok(match form {
            EquationForm::FpB => (normal_cdf(dm) + r * int_n, normal_cdf(dp) + q * int_d),
            EquationForm::FpA => {
                let std_dev = sigma * tau.sqrt();
                (
                    normal_pdf(dm) / std_dev + r * int_n,
                    normal_pdf(dp) / std_dev + normal_cdf(dp) + q * int_d,
                )
            }
        })
    }
}
