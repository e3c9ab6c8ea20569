//! Barone-Adesi-Whaley quadratic approximation of the put boundary.
//!
//! Supplies a starting curve that is already close to the converged
//! boundary. For a put the critical price `S*` solves the smooth-pasting
//! condition
//!
//! `g(S) = (K − S) − P_BS(S) + (S / q₁)(1 − e^{−qτ} Φ(−d₁(S))) = 0`
//!
//! with `q₁ = (−(n − 1) − √((n − 1)² + 4m / k)) / 2`, `m = 2r/σ²`,
//! `n = 2(r − q)/σ²` and `k = 1 − e^{−rτ}`.

use ab_core::{ensure, errors::Result, Price, Rate, Real, Time, Volatility};
use ab_math::{normal_cdf, normal_pdf, solvers1d::newton_safe};

/// Black-Scholes put price and `d₁` at spot `s`.
pub fn black_scholes_put(
    spot: Price,
    strike: Price,
    r: Rate,
    q: Rate,
    sigma: Volatility,
    tau: Time,
) -> (Price, Real) {
    if tau <= 0.0 {
        return ((strike - spot).max(0.0), 0.0);
    }
    let std_dev = sigma * tau.sqrt();
    let d1 = ((spot / strike).ln() + (r - q + 0.5 * sigma * sigma) * tau) / std_dev;
    let d2 = d1 - std_dev;
    let price =
        strike * (-r * tau).exp() * normal_cdf(-d2) - spot * (-q * tau).exp() * normal_cdf(-d1);
    (price, d1)
}

/// Critical price of the BAW put approximation at time to expiry `tau`.
///
/// Requires `r > 0`. Returns `strike` at `tau = 0`.
pub fn critical_put_price(
    strike: Price,
    r: Rate,
    q: Rate,
    sigma: Volatility,
    tau: Time,
) -> Result<Price> {
    ensure!(r > 0.0, "quadratic approximation needs r > 0, got {r}");
    if tau <= 0.0 {
        return Ok(strike);
    }

    let sigma2 = sigma * sigma;
    let m = 2.0 * r / sigma2;
    let n = 2.0 * (r - q) / sigma2;
    let big_k = 1.0 - (-r * tau).exp();
    let q1 = (-(n - 1.0) - ((n - 1.0) * (n - 1.0) + 4.0 * m / big_k).sqrt()) / 2.0;
    let eq = (-q * tau).exp();
    let sst = sigma * tau.sqrt();

    let g = |s: Real| {
        let (put, d1) = black_scholes_put(s, strike, r, q, sigma, tau);
        let nmd1 = normal_cdf(-d1);
        let value = (strike - s) - put + (s / q1) * (1.0 - eq * nmd1);
        let slope =
            -1.0 + eq * nmd1 + (1.0 - eq * nmd1) / q1 + eq * normal_pdf(d1) / (q1 * sst);
        (value, slope)
    };

    // g > 0 deep in the money, g < 0 at the strike
    newton_safe(g, strike * 1e-8, strike, 1e-10 * strike)
}
