//! Error types for the exercise-boundary workspace.
//!
//! Every fallible operation returns [`Result`], built on a single
//! `thiserror`-derived enum. Input validation maps to the `ensure!`,
//! `require!` and `fail!` convenience macros defined here; the domain conditions of the
//! boundary solver (bad grid, bad market data, out-of-domain queries,
//! non-convergence) have dedicated variants so callers can match on them.

use thiserror::Error;

/// The top-level error type used throughout the workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The time grid request is malformed (non-positive expiry, fewer than
    /// two nodes, non-finite input).
    #[error("invalid grid specification: {0}")]
    InvalidGridSpec(String),

    /// Market parameters are rejected before any computation starts.
    #[error("invalid market parameters: {0}")]
    InvalidMarketParameters(String),

    /// A boundary query falls outside the solved time interval.
    #[error("time {t} is outside the solved domain [{lower}, {upper}]")]
    OutOfDomain {
        /// The queried time.
        t: f64,
        /// Lower end of the domain.
        lower: f64,
        /// Upper end of the domain.
        upper: f64,
    },

    /// The fixed-point iteration stopped before meeting its tolerance.
    #[error("exercise boundary did not converge after {iterations} iterations (last change {residual:e})")]
    NonConvergent {
        /// Number of refinement steps performed.
        iterations: usize,
        /// Maximum pointwise change of the last step.
        residual: f64,
    },

    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ab_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ab_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err($variant(...))` if `$cond` is false.
///
/// Like [`ensure!`] but for the message-carrying domain variants.
///
/// # Example
/// ```
/// use ab_core::{require, errors::Error};
/// fn strike(k: f64) -> ab_core::errors::Result<f64> {
///     require!(Error::InvalidMarketParameters, k > 0.0, "strike must be positive, got {k}");
///     Ok(k)
/// }
/// assert!(strike(100.0).is_ok());
/// assert!(matches!(strike(0.0), Err(Error::InvalidMarketParameters(_))));
/// ```
#[macro_export]
macro_rules! require {
    ($variant:path, $cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($variant(format!($($msg)*)));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ab_core::{fail, errors::Error};
/// fn always_err() -> ab_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
