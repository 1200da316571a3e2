//! Integration tests for synthetic data simulation.

use approx::assert_relative_eq;
use symfit_rs::{DataSimulator, FitOptions, FunctionalModel, GridSpec, NoiseKind, NoiseSpec, SymFitError};

use crate::test_helpers::{array_approx_eq, line};

fn bound_line(m: f64, b: f64) -> DataSimulator {
    let mut simulator = DataSimulator::new(line()).unwrap();
    simulator.set_parameters([("m", m), ("b", b)]).unwrap();
    simulator
}

#[test]
fn test_noise_free_data_matches_model() {
    let model = FunctionalModel::new("A k", "x", "A*besselj(1, k*x)").unwrap();
    let mut simulator = DataSimulator::new(model).unwrap();
    simulator.set_parameters([("A", 2.0), ("k", 1.5)]).unwrap();
    simulator.set_x(GridSpec::linear(0.0, 8.0, 81)).unwrap();

    let expected = simulator.model().eval(simulator.x()).unwrap();
    assert_eq!(simulator.data().len(), 81);
    assert!(array_approx_eq(simulator.data(), &expected, 1e-12));
    assert!(simulator.noise().is_empty());
}

#[test]
fn test_grid_runs_from_max_to_min() {
    let mut simulator = bound_line(1.0, 0.0);
    simulator.set_x(GridSpec::stepped(0.0, 1.0, 0.25)).unwrap();
    assert_eq!(simulator.x().to_vec(), vec![1.0, 0.75, 0.5, 0.25, 0.0]);

    simulator
        .set_x(GridSpec::Linear {
            min: -1.0,
            max: 1.0,
            n_points: None,
            step: None,
        })
        .unwrap();
    assert_eq!(simulator.x().len(), symfit_rs::simulator::DEFAULT_GRID_POINTS);
    assert_relative_eq!(simulator.x()[0], 1.0);
}

#[test]
fn test_seeded_noise_is_reproducible() {
    let build = || {
        let mut simulator = bound_line(2.0, 1.0);
        simulator.set_x(GridSpec::linear(0.0, 10.0, 50)).unwrap();
        simulator.set_seed(Some(7)).unwrap();
        simulator
            .set_output_noise(Some("gaussian"), 0.0, 0.1, 1.0)
            .unwrap();
        simulator
    };

    let first = build();
    let second = build();
    assert_eq!(first.data(), second.data());
    assert_eq!(first.noise_spec().kind, Some(NoiseKind::Normal));
    assert_eq!(first.noise_spec().seed, Some(7));

    let clean = first.model().eval(first.x()).unwrap();
    assert!(first.data().iter().zip(clean.iter()).any(|(d, c)| d != c));
}

#[test]
fn test_uniform_noise_stays_in_range() {
    let mut simulator = bound_line(0.0, 5.0);
    simulator.set_x(GridSpec::linear(0.0, 1.0, 200)).unwrap();
    simulator
        .set_noise(NoiseSpec::new(NoiseKind::Uniform, 0.0, 0.5, 2.0).with_seed(3))
        .unwrap();

    for value in simulator.data() {
        assert!((4.0..=6.0).contains(value), "{} out of range", value);
    }
}

#[test]
fn test_unknown_noise_disables_noise() {
    let mut simulator = bound_line(1.0, 1.0);
    simulator.set_x(GridSpec::linear(0.0, 1.0, 5)).unwrap();
    simulator
        .set_output_noise(Some("poisson"), 0.0, 1.0, 1.0)
        .unwrap();

    assert_eq!(simulator.noise_spec().kind, None);
    assert_eq!(simulator.data().to_vec(), vec![2.0, 1.75, 1.5, 1.25, 1.0]);
}

#[test]
fn test_unbound_parameters_give_empty_data() {
    let mut simulator = bound_line(1.0, 1.0);
    simulator.set_x(GridSpec::linear(0.0, 1.0, 5)).unwrap();
    assert_eq!(simulator.data().len(), 5);

    simulator.clear_parameters().unwrap();
    assert!(simulator.data().is_empty());
    assert!(matches!(
        simulator.sample_at(0.5),
        Err(SymFitError::UnboundSymbol(_))
    ));
}

#[test]
fn test_sampling_leaves_state_alone() {
    let mut simulator = bound_line(3.0, -1.0);
    simulator.set_x(GridSpec::Points(vec![0.0, 1.0])).unwrap();
    let data_before = simulator.data().clone();

    assert_relative_eq!(simulator.sample_at(2.0).unwrap(), 5.0);
    assert_eq!(simulator.sample(&[1.0, 2.0]).unwrap().to_vec(), vec![2.0, 5.0]);
    assert_eq!(simulator.x().to_vec(), vec![0.0, 1.0]);
    assert_eq!(simulator.data(), &data_before);
}

#[test]
fn test_multi_variable_model_rejected() {
    let model = FunctionalModel::new("a", "x y", "a*x*y").unwrap();
    assert!(matches!(
        DataSimulator::new(model),
        Err(SymFitError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_fit_recovers_simulated_parameters() {
    let mut simulator = bound_line(1.5, -0.5);
    simulator.set_x(GridSpec::linear(0.0, 10.0, 400)).unwrap();
    simulator
        .set_noise(NoiseSpec::new(NoiseKind::Normal, 0.0, 0.01, 1.0).with_seed(11))
        .unwrap();

    let result = symfit_rs::fit_model(
        &line(),
        simulator.x(),
        simulator.data(),
        &FitOptions::new(),
    )
    .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.value("m").unwrap(), 1.5, epsilon = 1e-2);
    assert_relative_eq!(result.value("b").unwrap(), -0.5, epsilon = 1e-2);
    assert!(result.standard_error("m").unwrap() < 1e-2);
}
