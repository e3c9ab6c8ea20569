//! # ab-math
//!
//! Numerical building blocks for the boundary solver: Gaussian and adaptive
//! quadrature, C¹ cubic splines, the normal distribution (via statrs), and
//! a safeguarded Newton root finder.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Probability distributions.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// 1D interpolation schemes.
pub mod interpolations;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use distributions::{normal_cdf, normal_pdf};
pub use integrals::{
    gauss_legendre_rule, GaussKronrodAdaptive, GaussLegendreIntegral, GaussianQuadrature, Integral,
    Integrator, Quadrature,
};
pub use interpolations::{CubicSpline, Interpolation1D, SplineBoundary};
