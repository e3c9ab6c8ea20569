//! Numerical integration.
//!
//! Two rules share the [`Integrator`] contract:
//!
//! - [`GaussLegendreIntegral`]: fixed-order Gauss-Legendre with an embedded
//!   half-order rule for the error estimate.
//! - [`GaussKronrodAdaptive`]: G7/K15 Gauss-Kronrod with recursive
//!   bisection until an absolute accuracy is met.
//!
//! Both integrate vector-valued integrands: every component is sampled at
//! the same abscissae, so integrands that share an expensive sub-expression
//! pay for it once per abscissa.

pub mod gaussian_quadratures;

pub use gaussian_quadratures::{gauss_legendre_rule, GaussLegendreIntegral, GaussianQuadrature};

use ab_core::{ensure, errors::Result, Real};

/// Value of a definite integral together with an estimate of its
/// absolute error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    /// Approximation of the integral.
    pub value: Real,
    /// Estimated absolute error of `value`.
    pub error_estimate: Real,
}

impl Integral {
    /// The zero integral over an empty interval.
    pub const ZERO: Integral = Integral {
        value: 0.0,
        error_estimate: 0.0,
    };
}

/// A numerical integrator.
///
/// Implementations are deterministic: the same integrand and bounds give
/// bit-identical results.
pub trait Integrator {
    /// Integrate the `width`-component integrand `f` on `[a, b]`.
    ///
    /// `f(x, out)` must write all `width` components of the integrand at `x`
    /// into `out`. Returns one [`Integral`] per component.
    fn integrate_vector<F>(&self, f: F, width: usize, a: Real, b: Real) -> Result<Vec<Integral>>
    where
        F: Fn(Real, &mut [Real]);

    /// Integrate the scalar function `f` on `[a, b]`.
    fn integrate<F>(&self, f: F, a: Real, b: Real) -> Result<Integral>
    where
        F: Fn(Real) -> Real,
    {
        let mut integrals = self.integrate_vector(|x, out: &mut [Real]| out[0] = f(x), 1, a, b)?;
        Ok(integrals.swap_remove(0))
    }
}

fn check_bounds(width: usize, a: Real, b: Real) -> Result<()> {
    ensure!(width > 0, "integrand must have at least one component");
    ensure!(
        a.is_finite() && b.is_finite(),
        "integration bounds must be finite, got [{a}, {b}]"
    );
    Ok(())
}

// ── Gauss-Kronrod ─────────────────────────────────────────────────────────────

// G7/K15 abscissae on [0, 1] (mirrored), Kronrod weights, and Gauss weights
// for the odd Kronrod abscissae plus the centre.
const XGK: [Real; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];
const WGK: [Real; 8] = [
    0.022_935_322_010_529_225,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_18,
    0.140_653_259_715_525_92,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_83,
];
const WG: [Real; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// Gauss-Kronrod adaptive integration using the 7/15-point pair.
///
/// Each segment is accepted when the largest component-wise difference
/// between the Kronrod and Gauss estimates is below its share of the
/// absolute accuracy; otherwise it is bisected and each half gets half the
/// budget. Once `max_evaluations` would be exceeded the remaining segments
/// are accepted as they are, so the returned error estimate can exceed the
/// requested accuracy.
#[derive(Debug, Clone)]
pub struct GaussKronrodAdaptive {
    absolute_accuracy: Real,
    max_evaluations: usize,
}

impl GaussKronrodAdaptive {
    /// Create a new integrator.
    pub fn new(absolute_accuracy: Real, max_evaluations: usize) -> Result<Self> {
        ensure!(
            absolute_accuracy > 0.0 && absolute_accuracy.is_finite(),
            "absolute accuracy must be positive, got {absolute_accuracy}"
        );
        ensure!(
            max_evaluations >= 15,
            "need at least 15 evaluations for one Kronrod segment, got {max_evaluations}"
        );
        Ok(Self {
            absolute_accuracy,
            max_evaluations,
        })
    }

    /// The target absolute accuracy.
    pub fn absolute_accuracy(&self) -> Real {
        self.absolute_accuracy
    }

    /// Evaluate the G7 and K15 estimates on one segment.
    fn segment<F>(f: &F, a: Real, b: Real, sample: &mut [Real], gauss: &mut [Real], kronrod: &mut [Real])
    where
        F: Fn(Real, &mut [Real]),
    {
        let mid = 0.5 * (a + b);
        let half = 0.5 * (b - a);

        f(mid, sample);
        for k in 0..sample.len() {
            kronrod[k] = WGK[7] * sample[k];
            gauss[k] = WG[3] * sample[k];
        }
        for j in 0..7 {
            let dx = half * XGK[j];
            for x in [mid - dx, mid + dx] {
                f(x, sample);
                for k in 0..sample.len() {
                    kronrod[k] += WGK[j] * sample[k];
                    if j % 2 == 1 {
                        gauss[k] += WG[j / 2] * sample[k];
                    }
                }
            }
        }
        for k in 0..sample.len() {
            kronrod[k] *= half;
            gauss[k] *= half;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn integrate_recursive<F>(
        &self,
        f: &F,
        a: Real,
        b: Real,
        tolerance: Real,
        evals: &mut usize,
        values: &mut [Real],
        errors: &mut [Real],
    ) where
        F: Fn(Real, &mut [Real]),
    {
        let width = values.len();
        let mut sample = vec![0.0; width];
        let mut gauss = vec![0.0; width];
        let mut kronrod = vec![0.0; width];
        Self::segment(f, a, b, &mut sample, &mut gauss, &mut kronrod);
        *evals += 15;

        let error = kronrod
            .iter()
            .zip(&gauss)
            .map(|(k, g)| (k - g).abs())
            .fold(0.0, Real::max);
        let mid = 0.5 * (a + b);
        let exhausted = *evals + 30 > self.max_evaluations;
        let unsplittable = mid <= a.min(b) || mid >= a.max(b);

        if error <= tolerance || exhausted || unsplittable || !error.is_finite() {
            for k in 0..width {
                values[k] += kronrod[k];
                errors[k] += (kronrod[k] - gauss[k]).abs();
            }
            return;
        }

        self.integrate_recursive(f, a, mid, 0.5 * tolerance, evals, values, errors);
        self.integrate_recursive(f, mid, b, 0.5 * tolerance, evals, values, errors);
    }
}

impl Integrator for GaussKronrodAdaptive {
    fn integrate_vector<F>(&self, f: F, width: usize, a: Real, b: Real) -> Result<Vec<Integral>>
    where
        F: Fn(Real, &mut [Real]),
    {
        check_bounds(width, a, b)?;
        if a == b {
            return Ok(vec![Integral::ZERO; width]);
        }
        let mut values = vec![0.0; width];
        let mut errors = vec![0.0; width];
        let mut evals = 0;
        self.integrate_recursive(&f, a, b, self.absolute_accuracy, &mut evals, &mut values, &mut errors);
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

// ── Rule selection ────────────────────────────────────────────────────────────

/// A concrete integrator chosen at run time.
#[derive(Debug, Clone)]
pub enum Quadrature {
    /// Fixed-order Gauss-Legendre.
    GaussLegendre(GaussLegendreIntegral),
    /// Adaptive Gauss-Kronrod.
    GaussKronrod(GaussKronrodAdaptive),
}

impl Integrator for Quadrature {
    fn integrate_vector<F>(&self, f: F, width: usize, a: Real, b: Real) -> Result<Vec<Integral>>
    where
        F: Fn(Real, &mut [Real]),
    {
        match self {
            Quadrature::GaussLegendre(rule) => rule.integrate_vector(f, width, a, b),
            Quadrature::GaussKronrod(rule) => rule.integrate_vector(f, width, a, b),
        }
    }
}

impl From<GaussLegendreIntegral> for Quadrature {
    fn from(rule: GaussLegendreIntegral) -> Self {
        Quadrature::GaussLegendre(rule)
    }
}

impl From<GaussKronrodAdaptive> for Quadrature {
    fn from(rule: GaussKronrodAdaptive) -> Self {
        Quadrature::GaussKronrod(rule)
    }
}
