//! Solver configuration.

use std::time::Duration;

use ab_core::{
    errors::{Error, Result},
    require, Real, Size,
};
use ab_math::{GaussKronrodAdaptive, GaussLegendreIntegral, Quadrature};

/// How the per-iteration change between two curves is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToleranceKind {
    /// `max |new − old|`.
    Absolute,
    /// `max |new − old| / (|new| + 1e-10)`.
    #[default]
    Relative,
}

impl ToleranceKind {
    const RELATIVE_FLOOR: Real = 1e-10;

    /// Maximum change between `old` and `new` under this metric.
    pub fn max_change(self, old: &[Real], new: &[Real]) -> Real {
        old.iter()
            .zip(new)
            .map(|(&o, &n)| match self {
                ToleranceKind::Absolute => (n - o).abs(),
                ToleranceKind::Relative => (n - o).abs() / (n.abs() + Self::RELATIVE_FLOOR),
            })
            .fold(0.0, Real::max)
    }
}

/// Which pair of integral equations drives the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquationForm {
    /// Kernels built from the density `φ(d±)`.
    FpA,
    /// Kernels built from `Φ(d±)` only.
    #[default]
    FpB,
}

/// Starting curve of the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialGuess {
    /// The expiry limit `K min(1, r/q)` at every node.
    #[default]
    ShortMaturityLimit,
    /// Barone-Adesi-Whaley critical price at each node's time to expiry.
    QuadraticApproximation,
    /// The perpetual boundary away from expiry, the expiry limit at `τ = 0`.
    PerpetualLimit,
}

/// Quadrature used for every boundary integral.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuadratureScheme {
    /// Fixed-order Gauss-Legendre.
    GaussLegendre {
        /// Number of nodes.
        order: Size,
    },
    /// Adaptive Gauss-Kronrod (G7/K15).
    GaussKronrod {
        /// Absolute accuracy target.
        absolute_accuracy: Real,
        /// Cap on integrand evaluations per integral.
        max_evaluations: Size,
    },
}

impl Default for QuadratureScheme {
    fn default() -> Self {
        QuadratureScheme::GaussLegendre { order: 32 }
    }
}

impl QuadratureScheme {
    /// Instantiate the integrator.
    pub fn build(&self) -> Result<Quadrature> {
        Ok(match *self {
            QuadratureScheme::GaussLegendre { order } => GaussLegendreIntegral::new(order)?.into(),
            QuadratureScheme::GaussKronrod {
                absolute_accuracy,
                max_evaluations,
            } => GaussKronrodAdaptive::new(absolute_accuracy, max_evaluations)?.into(),
        })
    }
}

/// Everything that controls a boundary solve besides the market and the
/// grid size.
///
/// The defaults are 20 iterations, relative tolerance `1e-8`, 32-point
/// Gauss-Legendre, the FP-B equations, the short-maturity-limit start and no
/// wall-clock budget.
///
/// Twenty FP-B sweeps are often not enough to reach `1e-8`: the solve then
/// ends with [`MaxIterationsExceeded`](crate::ConvergenceStatus::MaxIterationsExceeded)
/// and a usable but unconverged curve. FP-A contracts faster; otherwise
/// raise the cap.
///
/// ```
/// use ab_boundary::{ConvergenceConfig, EquationForm};
///
/// let config = ConvergenceConfig::default()
///     .with_max_iterations(100)
///     .with_equation_form(EquationForm::FpA);
/// assert_eq!(config.max_iterations(), 100);
/// assert_eq!(config.tolerance(), 1e-8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceConfig {
    max_iterations: Size,
    tolerance: Real,
    tolerance_kind: ToleranceKind,
    quadrature: QuadratureScheme,
    equation_form: EquationForm,
    initial_guess: InitialGuess,
    time_budget: Option<Duration>,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tolerance: 1e-8,
            tolerance_kind: ToleranceKind::Relative,
            quadrature: QuadratureScheme::default(),
            equation_form: EquationForm::FpB,
            initial_guess: InitialGuess::ShortMaturityLimit,
            time_budget: None,
        }
    }
}

impl ConvergenceConfig {
    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: Size) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the stopping tolerance.
    pub fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the change metric.
    pub fn with_tolerance_kind(mut self, kind: ToleranceKind) -> Self {
        self.tolerance_kind = kind;
        self
    }

    /// Set the quadrature scheme.
    pub fn with_quadrature(mut self, quadrature: QuadratureScheme) -> Self {
        self.quadrature = quadrature;
        self
    }

    /// Set the equation form.
    pub fn with_equation_form(mut self, form: EquationForm) -> Self {
        self.equation_form = form;
        self
    }

    /// Set the initial-guess scheme.
    pub fn with_initial_guess(mut self, guess: InitialGuess) -> Self {
        self.initial_guess = guess;
        self
    }

    /// Stop with [`BudgetExhausted`](crate::ConvergenceStatus::BudgetExhausted)
    /// once `budget` has elapsed.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Iteration cap.
    pub fn max_iterations(&self) -> Size {
        self.max_iterations
    }

    /// Stopping tolerance.
    pub fn tolerance(&self) -> Real {
        self.tolerance
    }

    /// Change metric.
    pub fn tolerance_kind(&self) -> ToleranceKind {
        self.tolerance_kind
    }

    /// Quadrature scheme.
    pub fn quadrature(&self) -> QuadratureScheme {
        self.quadrature
    }

    /// Equation form.
    pub fn equation_form(&self) -> EquationForm {
        self.equation_form
    }

    /// Initial-guess scheme.
    pub fn initial_guess(&self) -> InitialGuess {
        self.initial_guess
    }

    /// Optional wall-clock budget.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    /// Reject settings no solve can honour.
    pub fn validate(&self) -> Result<()> {
        require!(
            Error::InvalidArgument,
            self.max_iterations >= 1,
            "max_iterations must be at least 1"
        );
        require!(
            Error::InvalidArgument,
            self.tolerance.is_finite() && self.tolerance > 0.0,
            "tolerance must be positive and finite, got {}",
            self.tolerance
        );
        match self.quadrature {
            QuadratureScheme::GaussLegendre { order } => require!(
                Error::InvalidArgument,
                order >= 1,
                "Gauss-Legendre order must be at least 1"
            ),
            QuadratureScheme::GaussKronrod {
                absolute_accuracy,
                max_evaluations,
            } => require!(
                Error::InvalidArgument,
                absolute_accuracy > 0.0 && max_evaluations >= 15,
                "Gauss-Kronrod needs a positive accuracy and at least 15 evaluations"
            ),
        }
        Ok(())
    }
}
