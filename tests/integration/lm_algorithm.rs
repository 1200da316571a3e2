//! Integration tests for the Levenberg-Marquardt algorithm.

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use symfit_rs::lm::{ConvergenceStatus, DiffMethod, LevenbergMarquardt, LmConfig};
use symfit_rs::{Problem, Result};

use crate::test_helpers::LinearProblem;

/// Test Problem: Rosenbrock function as residuals [10 (y - x²), 1 - x]
struct RosenbrockProblem;

impl Problem for RosenbrockProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (x, y) = (params[0], params[1]);
        Ok(array![10.0 * (y - x * x), 1.0 - x])
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        2
    }
}

/// Test Problem: a * exp(-b * x), Jacobian by finite differences
struct ExponentialProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for ExponentialProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = (params[0], params[1]);
        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| a * (-b * x).exp() - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

#[test]
fn test_linear_fitting() {
    // y = 3x + 2 + noise
    let problem = LinearProblem {
        x: array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        y: array![2.1, 4.9, 8.05, 10.8, 14.1, 17.0],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 1.0])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 3.0, epsilon = 0.1);
    assert_relative_eq!(result.params[1], 2.0, epsilon = 0.1);
    assert!(result.cost < 0.1);
}

#[test]
fn test_rosenbrock_optimization() {
    let config = LmConfig::default()
        .with_max_iterations(200)
        .with_ftol(1e-12)
        .with_xtol(1e-12);
    let result = LevenbergMarquardt::with_config(config)
        .minimize(&RosenbrockProblem, array![-1.2, 1.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-4);
    assert!(result.cost < 1e-8);
}

#[test]
fn test_exponential_fitting() {
    // y = 2 * exp(-0.5 * x) + noise
    let problem = ExponentialProblem {
        x_data: array![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
        y_data: array![2.02, 1.67, 1.21, 0.98, 0.81, 0.62, 0.45, 0.39, 0.29],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 0.1])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.1);
    assert_relative_eq!(result.params[1], 0.5, epsilon = 0.1);
    assert!(result.cost < 0.01);
}

#[test]
fn test_bad_initial_guess() {
    let problem = LinearProblem {
        x: array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        y: array![2.0, 5.0, 8.0, 11.0, 14.0, 17.0],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![100.0, -50.0])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 3.0, epsilon = 1e-6);
    assert_relative_eq!(result.params[1], 2.0, epsilon = 1e-6);
}

#[test]
fn test_custom_config() {
    // y = 2x + 1
    let problem = LinearProblem {
        x: array![0.0, 1.0, 2.0, 3.0, 4.0],
        y: array![1.0, 3.0, 5.0, 7.0, 9.0],
    };

    let config = LmConfig::default()
        .with_max_iterations(10)
        .with_ftol(1e-2)
        .with_xtol(1e-2)
        .with_gtol(1e-2)
        .with_lambda(1.0);
    let result = LevenbergMarquardt::with_config(config)
        .minimize(&problem, array![1.0, 0.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert!(result.iterations <= 10);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.2);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 0.2);
}

#[test]
fn test_finite_difference_method_on_analytic_problem() {
    let problem = LinearProblem {
        x: array![0.0, 1.0, 2.0, 3.0],
        y: array![-1.0, 1.0, 3.0, 5.0],
    };

    let result = LevenbergMarquardt::new()
        .with_differentiation_method(DiffMethod::FiniteDifference)
        .minimize(&problem, array![0.0, 0.0])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.params[1], -1.0, epsilon = 1e-6);
}

#[test]
fn test_non_convergence_is_reported() {
    let result = LevenbergMarquardt::new()
        .with_max_iterations(1)
        .minimize(&RosenbrockProblem, array![-1.2, 1.0])
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
    assert!(!result.message.is_empty());
}
