//! Integration tests for fitting functional models to data.

use approx::assert_relative_eq;
use ndarray::Array1;
use symfit_rs::lm::LmConfig;
use symfit_rs::{fit_batch, fit_model, FitOptions, FunctionalModel, Multicosine};

use crate::test_helpers::{line, line_data};

#[test]
fn test_fit_recovers_known_parameters() {
    let (x, y) = line_data(2.0, 3.0, 200);
    let mut model = line();

    let result = model.fit_data(&x, &y, &FitOptions::default()).unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.value("m").unwrap(), 2.0, epsilon = 1e-3);
    assert_relative_eq!(result.value("b").unwrap(), 3.0, epsilon = 1e-3);

    // The fit binds the result
    assert_eq!(model.signature(), &["x"]);
    assert_relative_eq!(model.parameter_value("m").unwrap(), result.values[0]);
    assert_relative_eq!(model.call(&[10.0]).unwrap(), 23.0, epsilon = 1e-3);
}

#[test]
fn test_fit_ignores_previous_binding() {
    let (x, y) = line_data(-1.0, 0.5, 50);
    let mut model = line();
    model.set_parameters([("m", 100.0), ("b", 100.0)]).unwrap();

    let result = model.fit_data(&x, &y, &FitOptions::new()).unwrap();
    assert_relative_eq!(result.value("m").unwrap(), -1.0, epsilon = 1e-6);
    assert_relative_eq!(model.parameter_value("b").unwrap(), 0.5, epsilon = 1e-6);
}

#[test]
fn test_fit_gaussian_with_guesses() {
    let model = FunctionalModel::new("A mu sigma", "x", "A*exp(-(x-mu)^2/(2*sigma^2))").unwrap();
    let x = Array1::linspace(-5.0, 5.0, 101);
    let y = x.mapv(|v: f64| 4.0 * (-(v - 0.7).powi(2) / (2.0 * 1.2f64.powi(2))).exp());

    let options = FitOptions::new().with_initial_guesses([("A", 3.0), ("mu", 0.0), ("sigma", 1.0)]);
    let result = fit_model(&model, &x, &y, &options).unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.value("A").unwrap(), 4.0, epsilon = 1e-6);
    assert_relative_eq!(result.value("mu").unwrap(), 0.7, epsilon = 1e-6);
    assert_relative_eq!(result.value("sigma").unwrap().abs(), 1.2, epsilon = 1e-6);
}

#[test]
fn test_fit_special_function_model() {
    let model = FunctionalModel::new("a k", "x", "a*besselj(0, k*x)").unwrap();
    let x = Array1::linspace(0.1, 6.0, 60);
    let y = x.mapv(|v| 1.5 * symfit_rs::special::bessel_j(0, 0.8 * v));

    let options = FitOptions::new()
        .with_initial_guess("a", 1.0)
        .with_initial_guess("k", 0.75);
    let result = fit_model(&model, &x, &y, &options).unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.value("a").unwrap(), 1.5, epsilon = 1e-5);
    assert_relative_eq!(result.value("k").unwrap(), 0.8, epsilon = 1e-5);
}

#[test]
fn test_iteration_cap_reports_failure() {
    let model = FunctionalModel::new("A tau", "t", "A*exp(-t/tau)").unwrap();
    let t = Array1::linspace(0.0, 5.0, 30);
    let y = t.mapv(|v: f64| 3.0 * (-v / 2.0).exp());

    let options = FitOptions::new()
        .with_initial_guesses([("A", 1.0), ("tau", 0.5)])
        .with_config(LmConfig::default().with_max_iterations(1));
    let result = fit_model(&model, &t, &y, &options).unwrap();

    assert!(!result.success);
    assert_eq!(result.iterations, 1);
}

#[test]
fn test_multicosine_fit() {
    let signal = Multicosine::new(&[1.0, 2.0]).unwrap();
    let t = Array1::linspace(0.0, 2.0, 400);
    let y = t.mapv(|v| {
        1.2 * (2.0 * std::f64::consts::PI * v + 0.3).cos()
            + 0.6 * (4.0 * std::f64::consts::PI * v - 0.5).cos()
    });

    let options = FitOptions::new().with_initial_guesses([
        ("A_1", 1.0),
        ("A_2", 0.5),
        ("phi_1", 0.1),
        ("phi_2", -0.2),
    ]);
    let result = fit_model(&signal, &t, &y, &options).unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.value("A_1").unwrap(), 1.2, epsilon = 1e-6);
    assert_relative_eq!(result.value("A_2").unwrap(), 0.6, epsilon = 1e-6);
    assert_relative_eq!(result.value("phi_1").unwrap(), 0.3, epsilon = 1e-6);
    assert_relative_eq!(result.value("phi_2").unwrap(), -0.5, epsilon = 1e-6);
}

#[test]
fn test_batch_fitting() {
    let model = line();
    let x = Array1::linspace(0.0, 10.0, 25);
    let datasets: Vec<Array1<f64>> = (0..8)
        .map(|k| x.mapv(|v| 0.5 * k as f64 * v + k as f64))
        .collect();

    let results = fit_batch(&model, &x, &datasets, &FitOptions::new());

    assert_eq!(results.len(), datasets.len());
    for (k, result) in results.iter().enumerate() {
        let result = result.as_ref().unwrap();
        assert_relative_eq!(result.value("m").unwrap(), 0.5 * k as f64, epsilon = 1e-6);
        assert_relative_eq!(result.value("b").unwrap(), k as f64, epsilon = 1e-6);
    }
    // The shared model is untouched
    assert!(model.parameter_values().is_empty());
}
