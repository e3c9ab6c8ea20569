//! End-to-end tests of the boundary solve.
//!
//! The reference option throughout is the put with `K = 100`, `r = 6%`,
//! `q = 0`, `σ = 20%` and `T = 1`. Its perpetual boundary is 75 and its
//! boundary one year before expiry is close to 82.29.

use ab_boundary::{
    compute_exercise_boundary, compute_exercise_boundary_on_grid, BoundaryEvaluator,
    ConvergenceConfig, ConvergenceStatus, EquationForm, GridSpacing, InitialGuess,
    MarketParameters, QuadratureScheme, TimeGrid, ToleranceKind,
};
use ab_core::Error;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use proptest::prelude::*;

fn reference_put() -> MarketParameters {
    MarketParameters::put(100.0, 0.06, 0.0, 0.2, 1.0).unwrap()
}

/// Route solver logs to the test harness; set `RUST_LOG=ab_boundary=debug`
/// to see every sweep.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> ConvergenceConfig {
    ConvergenceConfig::default().with_max_iterations(200)
}

// ───────────────────────── convergence ─────────────────────────

#[test]
fn reference_put_converges() {
    init_tracing();
    let boundary = compute_exercise_boundary(&reference_put(), 17, &config()).unwrap();

    assert_eq!(boundary.status(), ConvergenceStatus::Converged);
    let history = boundary.residual_history();
    assert_eq!(history.len(), boundary.iterations());
    assert!(*history.last().unwrap() <= 1e-8);
    assert!(history[..history.len() - 1].iter().all(|&c| c > 1e-8));

    assert_eq!(boundary.value_at(1.0).unwrap(), 100.0);
    let today = boundary.value_at(0.0).unwrap();
    assert!(today > 82.0 && today < 82.6, "B(0) = {today}");
}

#[test]
fn expiry_node_is_the_closed_form_limit() {
    let put = compute_exercise_boundary(&reference_put(), 9, &config()).unwrap();
    assert_eq!(*put.node_values().last().unwrap(), 100.0);

    let high_div = MarketParameters::put(100.0, 0.02, 0.04, 0.25, 0.5).unwrap();
    let b = compute_exercise_boundary(&high_div, 9, &config()).unwrap();
    assert_abs_diff_eq!(*b.node_values().last().unwrap(), 50.0, epsilon = 1e-12);
    assert!(b.node_values()[..8].iter().all(|&v| v < 50.0));
}

#[test]
fn put_boundary_is_bracketed_and_monotone() {
    let boundary = compute_exercise_boundary(&reference_put(), 17, &config()).unwrap();
    let nodes = boundary.node_values();
    assert!(nodes.iter().all(|&b| b > 75.0 && b <= 100.0));
    // non-decreasing in calendar time, i.e. non-increasing in time to expiry
    assert!(nodes.windows(2).all(|w| w[0] <= w[1] + 1e-9), "{nodes:?}");
}

#[test]
fn node_values_match_evaluation() {
    let boundary = compute_exercise_boundary(&reference_put(), 9, &config()).unwrap();
    for (t, node) in boundary.grid().times().iter().zip(boundary.node_values()) {
        assert_abs_diff_eq!(boundary.value_at(*t).unwrap(), *node, epsilon = 1e-10);
    }
}

#[test]
fn one_iteration_reports_cap_not_error() {
    init_tracing();
    let cfg = ConvergenceConfig::default().with_max_iterations(1);
    let boundary = compute_exercise_boundary(&reference_put(), 9, &cfg).unwrap();
    assert_eq!(boundary.status(), ConvergenceStatus::MaxIterationsExceeded);
    assert!(!boundary.is_converged());
    assert_eq!(boundary.iterations(), 1);
    assert!(boundary.node_values().iter().all(|&b| b > 0.0));
    assert!(matches!(
        boundary.into_converged(),
        Err(Error::NonConvergent { iterations: 1, .. })
    ));
}

#[test]
fn solves_are_bit_identical() {
    let a = compute_exercise_boundary(&reference_put(), 13, &config()).unwrap();
    let b = compute_exercise_boundary(&reference_put(), 13, &config()).unwrap();
    assert_eq!(a.node_values(), b.node_values());
    assert_eq!(a.residual_history(), b.residual_history());
    let ts = [0.0, 0.123, 0.5, 0.999];
    assert_eq!(a.values_at(&ts).unwrap(), b.values_at(&ts).unwrap());
}

#[test]
fn grid_refinement_shrinks_changes() {
    // τ = 0.25 (t = 0.75) is a node of every grid with n − 1 even.
    let cfg = config().with_tolerance(1e-10).with_max_iterations(400);
    let at_node = |n: usize| {
        let b = compute_exercise_boundary(&reference_put(), n, &cfg).unwrap();
        assert!(b.is_converged(), "n = {n}");
        assert_eq!(b.grid().times()[(n - 1) / 2], 0.75);
        b.node_values()[(n - 1) / 2]
    };
    let (coarse, medium, fine) = (at_node(9), at_node(17), at_node(33));
    let first = (medium - coarse).abs();
    let second = (fine - medium).abs();
    assert!(second < first, "|Δ| = {first} then {second}");
}

// ───────────────────────── schemes ─────────────────────────

#[test]
fn equation_forms_agree() {
    let b = compute_exercise_boundary(&reference_put(), 17, &config()).unwrap();
    let a = compute_exercise_boundary(
        &reference_put(),
        17,
        &config().with_equation_form(EquationForm::FpA),
    )
    .unwrap();
    assert!(a.is_converged());
    for (x, y) in a.node_values().iter().zip(b.node_values()) {
        assert_abs_diff_eq!(*x, *y, epsilon = 0.05);
    }
}

#[test]
fn adaptive_quadrature_agrees_with_legendre() {
    let legendre = compute_exercise_boundary(&reference_put(), 9, &config()).unwrap();
    let kronrod = compute_exercise_boundary(
        &reference_put(),
        9,
        &config()
            .with_tolerance(1e-7)
            .with_quadrature(QuadratureScheme::GaussKronrod {
                absolute_accuracy: 1e-10,
                max_evaluations: 10_000,
            }),
    )
    .unwrap();
    assert!(kronrod.is_converged());
    for (x, y) in kronrod.node_values().iter().zip(legendre.node_values()) {
        assert_abs_diff_eq!(*x, *y, epsilon = 1e-2);
    }
}

#[test]
fn default_config_reports_unconverged_reference_put() {
    let boundary =
        compute_exercise_boundary(&reference_put(), 17, &ConvergenceConfig::default()).unwrap();
    assert_eq!(boundary.status(), ConvergenceStatus::MaxIterationsExceeded);
    assert_eq!(boundary.iterations(), 20);
    assert!(boundary.final_residual().unwrap() > 1e-8);

    let fp_a = ConvergenceConfig::default().with_equation_form(EquationForm::FpA);
    let boundary = compute_exercise_boundary(&reference_put(), 17, &fp_a).unwrap();
    assert!(boundary.is_converged());
}

#[test]
fn perpetual_guess_converges_to_the_same_curve() {
    let flat = compute_exercise_boundary(&reference_put(), 17, &config()).unwrap();
    let perpetual = compute_exercise_boundary(
        &reference_put(),
        17,
        &config().with_initial_guess(InitialGuess::PerpetualLimit),
    )
    .unwrap();
    assert!(perpetual.is_converged());
    assert_abs_diff_eq!(
        perpetual.value_at(0.0).unwrap(),
        flat.value_at(0.0).unwrap(),
        epsilon = 1e-4
    );
}

#[test]
fn quadratic_guess_needs_fewer_sweeps() {
    let flat = compute_exercise_boundary(&reference_put(), 17, &config()).unwrap();
    let baw = compute_exercise_boundary(
        &reference_put(),
        17,
        &config().with_initial_guess(InitialGuess::QuadraticApproximation),
    )
    .unwrap();
    assert!(baw.is_converged());
    assert!(baw.iterations() < flat.iterations());
    assert_abs_diff_eq!(
        baw.value_at(0.0).unwrap(),
        flat.value_at(0.0).unwrap(),
        epsilon = 1e-4
    );
}

#[test]
fn absolute_tolerance_is_honoured() {
    let cfg = config()
        .with_tolerance_kind(ToleranceKind::Absolute)
        .with_tolerance(1e-6);
    let b = compute_exercise_boundary(&reference_put(), 9, &cfg).unwrap();
    assert!(b.is_converged());
    assert!(b.final_residual().unwrap() <= 1e-6);
}

#[test]
fn uniform_grid_is_supported() {
    let grid = TimeGrid::with_spacing(1.0, 17, GridSpacing::Uniform).unwrap();
    let b = compute_exercise_boundary_on_grid(&reference_put(), grid, &config()).unwrap();
    assert!(b.is_converged());
    let today = b.value_at(0.0).unwrap();
    assert!(today > 81.5 && today < 83.0, "B(0) = {today}");
}

#[test]
fn two_node_grid_is_linear_in_sqrt_tau() {
    let b = compute_exercise_boundary(&reference_put(), 2, &config()).unwrap();
    let start = b.node_values()[0];
    assert!(start > 75.0 && start < 100.0);
    // halfway in √τ
    assert_abs_diff_eq!(
        b.value_at(0.75).unwrap(),
        0.5 * (start + 100.0),
        epsilon = 1e-10
    );
}

// ───────────────────────── put-call symmetry ─────────────────────────

#[test]
fn call_boundary_is_inverted_put() {
    let call = MarketParameters::call(100.0, 0.03, 0.06, 0.3, 1.0).unwrap();
    let put = MarketParameters::put(100.0, 0.06, 0.03, 0.3, 1.0).unwrap();
    let cb = compute_exercise_boundary(&call, 17, &config()).unwrap();
    let pb = compute_exercise_boundary(&put, 17, &config()).unwrap();

    assert_eq!(cb.residual_history(), pb.residual_history());
    for (c, p) in cb.node_values().iter().zip(pb.node_values()) {
        assert_relative_eq!(*c, 100.0 * 100.0 / p, max_relative = 1e-14);
    }
    for t in [0.0, 0.3, 0.77, 1.0] {
        assert_relative_eq!(
            cb.value_at(t).unwrap(),
            1e4 / pb.value_at(t).unwrap(),
            max_relative = 1e-14
        );
    }
    // reaches K max(1, r/q) = 100 at expiry and lies above the strike
    assert_relative_eq!(cb.value_at(1.0).unwrap(), 100.0, max_relative = 1e-14);
    assert!(cb.node_values().iter().all(|&b| b >= 100.0));
    assert!(cb.node_values().windows(2).all(|w| w[0] + 1e-9 >= w[1]));
}

// ───────────────────────── errors ─────────────────────────

#[test]
fn out_of_domain_queries_fail() {
    let b = compute_exercise_boundary(&reference_put(), 9, &config()).unwrap();
    let eps = 1e-9;
    for t in [1.0 + eps, -eps] {
        match b.value_at(t) {
            Err(Error::OutOfDomain { lower, upper, .. }) => {
                assert_eq!((lower, upper), (0.0, 1.0));
            }
            other => panic!("t = {t}: unexpected {other:?}"),
        }
    }
    assert!(b.value_at_time_to_expiry(1.0 + eps).is_err());
}

#[test]
fn rejected_inputs_map_to_their_errors() {
    let cfg = config();
    assert!(matches!(
        MarketParameters::put(-100.0, 0.06, 0.0, 0.2, 1.0),
        Err(Error::InvalidMarketParameters(_))
    ));

    assert!(matches!(
        compute_exercise_boundary(&reference_put(), 1, &cfg),
        Err(Error::InvalidGridSpec(_))
    ));

    let grid = TimeGrid::new(2.0, 5).unwrap();
    assert!(matches!(
        compute_exercise_boundary_on_grid(&reference_put(), grid, &cfg),
        Err(Error::InvalidGridSpec(_))
    ));

    assert!(matches!(
        compute_exercise_boundary(&reference_put(), 9, &cfg.with_tolerance(-1.0)),
        Err(Error::InvalidArgument(_))
    ));
}

#[cfg(feature = "serde")]
#[test]
fn deserialised_markets_are_validated_before_the_grid() {
    let json = r#"{"option_type":"Put","strike":-1.0,"risk_free_rate":0.05,
        "dividend_yield":0.0,"volatility":0.2,"expiry":1.0}"#;
    let market: MarketParameters = serde_json::from_str(json).unwrap();
    assert!(matches!(
        compute_exercise_boundary(&market, 1, &config()),
        Err(Error::InvalidMarketParameters(_))
    ));
    let json = r#"{"option_type":"Put","strike":100.0,"risk_free_rate":0.05,
        "dividend_yield":0.0,"volatility":0.2,"expiry":-1.0}"#;
    let market: MarketParameters = serde_json::from_str(json).unwrap();
    assert!(matches!(
        compute_exercise_boundary(&market, 9, &config()),
        Err(Error::InvalidMarketParameters(_))
    ));
}

#[cfg(feature = "serde")]
#[test]
fn config_round_trips_through_json() {
    let cfg = config().with_equation_form(EquationForm::FpA);
    let json = serde_json::to_string(&cfg).unwrap();
    let back: ConvergenceConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}

// ───────────────────────── properties ─────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn boundary_is_positive(
        r in 0.005f64..0.12,
        q in 0.0f64..0.12,
        sigma in 0.05f64..0.6,
        expiry in 0.05f64..3.0,
        call in any::<bool>(),
    ) {
        let market = if call {
            MarketParameters::call(100.0, q, r, sigma, expiry)
        } else {
            MarketParameters::put(100.0, r, q, sigma, expiry)
        }
        .unwrap();
        let cfg = ConvergenceConfig::default()
            .with_max_iterations(8)
            .with_quadrature(QuadratureScheme::GaussLegendre { order: 16 });
        let b = compute_exercise_boundary(&market, 9, &cfg).unwrap();
        prop_assert!(b.node_values().iter().all(|&v| v.is_finite() && v > 0.0));
        prop_assert!(b.values_at(&[0.0, 0.5 * expiry, expiry]).unwrap().iter().all(|&v| v > 0.0));
    }
}
