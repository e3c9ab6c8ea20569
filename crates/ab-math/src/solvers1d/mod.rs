//! 1D root finding.

use ab_core::{
    errors::{Error, Result},
    fail, Real,
};

const MAX_ITERATIONS: u32 = 100;
const DEFAULT_ACCURACY: Real = 1.0e-11;

// ── Newton-Safe ──────────────────────────────────────────────────────────────

/// Safeguarded Newton-Raphson on a bracket `[x_min, x_max]`.
///
/// `f_df` returns `(f(x), f'(x))`. A Newton step is taken when it stays
/// inside the current bracket and shrinks the step fast enough; otherwise
/// the bracket is bisected. `f(x_min)` and `f(x_max)` must have opposite
/// signs.
pub fn newton_safe<F>(f_df: F, x_min: Real, x_max: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> (Real, Real),
{
    let acc = if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    };
    let (flo, _) = f_df(x_min);
    let (fhi, _) = f_df(x_max);

    if flo == 0.0 {
        return Ok(x_min);
    }
    if fhi == 0.0 {
        return Ok(x_max);
    }
    if flo * fhi > 0.0 {
        return Err(Error::Precondition(format!(
            "newton_safe: f({x_min}) = {flo} and f({x_max}) = {fhi} must have opposite signs"
        )));
    }

    // Orient so that f(xl) < 0
    let (mut xl, mut xh) = if flo < 0.0 {
        (x_min, x_max)
    } else {
        (x_max, x_min)
    };

    let mut x = 0.5 * (xl + xh);
    let mut dx_old = (xh - xl).abs();
    let mut dx = dx_old;
    let (mut fx, mut dfx) = f_df(x);

    for _ in 0..MAX_ITERATIONS {
        let newton_out_of_range = ((x - xh) * dfx - fx) * ((x - xl) * dfx - fx) > 0.0;
        let bisection_faster = (2.0 * fx).abs() > (dx_old * dfx).abs();

        if newton_out_of_range || bisection_faster {
            dx_old = dx;
            dx = 0.5 * (xh - xl);
            x = xl + dx;
        } else {
            dx_old = dx;
            dx = fx / dfx;
            x -= dx;
        }

        if dx.abs() < acc {
            return Ok(x);
        }

        (fx, dfx) = f_df(x);
        if fx.abs() < acc {
            return Ok(x);
        }

        if fx < 0.0 {
            xl = x;
        } else {
            xh = x;
        }
    }

    fail!("newton_safe: no root within {acc} after {MAX_ITERATIONS} iterations");
}
