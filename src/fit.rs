//! # Least-Squares Fitting of Functional Models
//!
//! Adapts a [`FunctionalModel`] to the [`Problem`] trait and minimizes
//! `Σ (f(p, x_i) - y_i)²` with the Levenberg-Marquardt solver.
//!
//! The Jacobian comes from symbolic partial derivatives of the equation when
//! every partial can be formed, and from finite differences otherwise.
//!
//! ## Example Usage
//!
//! ```rust
//! use ndarray::Array1;
//! use symfit_rs::{FitOptions, FunctionalModel};
//!
//! let x = Array1::linspace(0.0, 10.0, 50);
//! let y = x.mapv(|v| 2.0 * v + 3.0);
//!
//! let mut line = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
//! let result = line.fit_data(&x, &y, &FitOptions::default()).unwrap();
//!
//! assert!(result.success);
//! assert!((result.value("m").unwrap() - 2.0).abs() < 1e-6);
//! assert!((line.call(&[1.0]).unwrap() - 5.0).abs() < 1e-6);
//! ```

use std::collections::HashMap;
use std::fmt;

use ndarray::{Array1, Array2, ArrayView1};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::compile::{Backend, NumericFunction};
use crate::error::{Result, SymFitError};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::model::FunctionalModel;
use crate::problem::Problem;
use crate::uncertainty;

/// Options for [`fit_model`] and [`FunctionalModel::fit_data`].
#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    /// Starting values by parameter name. Missing parameters start at 0.0.
    pub initial_guess: HashMap<String, f64>,

    /// Parameters requested to stay fixed.
    ///
    /// Accepted for compatibility but not applied: every parameter varies.
    pub fixed_parameters: Vec<String>,

    /// Solver configuration
    pub config: LmConfig,
}

impl FitOptions {
    /// Default options: every parameter starts at 0.0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting value of one parameter.
    pub fn with_initial_guess(mut self, name: &str, value: f64) -> Self {
        self.initial_guess.insert(name.to_string(), value);
        self
    }

    /// Set the starting values of several parameters.
    pub fn with_initial_guesses<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.initial_guess.extend(
            values
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_string(), value)),
        );
        self
    }

    /// Record parameters that should stay fixed (not applied, see the field docs).
    pub fn with_fixed_parameters<I, K>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.fixed_parameters = names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        self
    }

    /// Set the solver configuration.
    pub fn with_config(mut self, config: LmConfig) -> Self {
        self.config = config;
        self
    }
}

/// Result of fitting a model to data.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Parameter names, in the model's declaration order
    pub parameter_names: Vec<String>,

    /// Fitted values, aligned with `parameter_names`
    pub values: Array1<f64>,

    /// Residuals `f(p, x) - y` at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Reduced chi-square, NaN without degrees of freedom
    pub redchi: f64,

    /// Number of data points
    pub ndata: usize,

    /// Number of accepted solver steps
    pub iterations: usize,

    /// Number of model evaluations
    pub func_evals: usize,

    /// Whether the solver converged
    pub success: bool,

    /// Solver message
    pub message: String,

    /// Covariance of the fitted values, when it could be estimated
    pub covariance: Option<Array2<f64>>,

    /// Standard errors of the fitted values
    pub standard_errors: Option<Array1<f64>>,

    /// Correlation matrix of the fitted values
    pub correlation: Option<Array2<f64>>,
}

impl FitResult {
    /// Fitted value of one parameter.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.index(name).map(|i| self.values[i])
    }

    /// Standard error of one parameter.
    pub fn standard_error(&self, name: &str) -> Option<f64> {
        let i = self.index(name)?;
        self.standard_errors.as_ref().map(|errors| errors[i])
    }

    /// Fitted values paired with their names.
    pub fn parameter_values(&self) -> Vec<(String, f64)> {
        self.parameter_names
            .iter()
            .cloned()
            .zip(self.values.iter().copied())
            .collect()
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.parameter_names.iter().position(|n| n == name)
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Data points: {}", self.ndata)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Reduced chi-square: {:.6e}", self.redchi)?;
        writeln!(f, "  Parameters:")?;
        for (i, name) in self.parameter_names.iter().enumerate() {
            match &self.standard_errors {
                Some(errors) => writeln!(
                    f,
                    "    {} = {:.8} +/- {:.3e}",
                    name, self.values[i], errors[i]
                )?,
                None => writeln!(f, "    {} = {:.8}", name, self.values[i])?,
            }
        }
        Ok(())
    }
}

/// A single-variable model and a dataset as a least-squares problem.
///
/// The problem parameters are all of the model's declared parameters, in
/// declaration order; bound values on the model are ignored.
pub struct CurveProblem<'a> {
    function: NumericFunction,
    partials: Option<Vec<NumericFunction>>,
    parameter_count: usize,
    x: ArrayView1<'a, f64>,
    y: ArrayView1<'a, f64>,
}

impl<'a> CurveProblem<'a> {
    /// Build the residual problem for `model` over `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`SymFitError::UnsupportedOperation`] when the model does not have
    /// exactly one variable.
    pub fn new(model: &FunctionalModel, x: &'a Array1<f64>, y: &'a Array1<f64>) -> Result<Self> {
        let [variable] = model.variables() else {
            return Err(SymFitError::UnsupportedOperation(format!(
                "fitting needs a single-variable model, this one has variables ({})",
                model.variables().join(", ")
            )));
        };

        let mut signature = model.parameters().to_vec();
        signature.push(variable.clone());
        let backend = if model.is_special_function() {
            Backend::Elementwise
        } else {
            Backend::Vectorized
        };

        let function = NumericFunction::compile(model.equation(), &signature, backend);
        let partials = model
            .parameters()
            .iter()
            .map(|name| {
                model
                    .equation()
                    .diff(name)
                    .map(|partial| NumericFunction::compile(&partial, &signature, backend))
            })
            .collect::<std::result::Result<Vec<_>, _>>();
        let partials = match partials {
            Ok(partials) => Some(partials),
            Err(err) => {
                log::debug!("no analytic Jacobian ({}), using finite differences", err);
                None
            }
        };

        Ok(Self {
            function,
            partials,
            parameter_count: model.parameters().len(),
            x: x.view(),
            y: y.view(),
        })
    }

    fn columns<'p>(&self, params: &'p Array1<f64>) -> Vec<ArrayView1<'p, f64>>
    where
        'a: 'p,
    {
        params
            .iter()
            .map(|p| ArrayView1::from(std::slice::from_ref(p)))
            .chain(std::iter::once(self.x.reborrow()))
            .collect()
    }

    fn check_params(&self, params: &Array1<f64>) -> Result<()> {
        if params.len() != self.parameter_count {
            return Err(SymFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.parameter_count,
                params.len()
            )));
        }
        Ok(())
    }
}

impl Problem for CurveProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_params(params)?;
        if self.x.len() != self.y.len() {
            return Err(SymFitError::DimensionMismatch(format!(
                "x has {} points but y has {}",
                self.x.len(),
                self.y.len()
            )));
        }

        let predicted = self.function.call_arrays(&self.columns(params))?;
        Ok(predicted - &self.y)
    }

    fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    fn residual_count(&self) -> usize {
        self.y.len()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        let Some(partials) = &self.partials else {
            return crate::utils::finite_difference::jacobian(self, params, None);
        };
        self.check_params(params)?;

        let columns = self.columns(params);
        let mut jacobian = Array2::zeros((self.x.len(), self.parameter_count));
        for (j, partial) in partials.iter().enumerate() {
            jacobian.column_mut(j).assign(&partial.call_arrays(&columns)?);
        }
        Ok(jacobian)
    }

    fn has_custom_jacobian(&self) -> bool {
        self.partials.is_some()
    }
}

/// Fit `model` to `(x, y)` without modifying it.
///
/// Every declared parameter is fitted, starting from
/// [`FitOptions::initial_guess`] or 0.0. Failing to converge is reported
/// through [`FitResult::success`], not as an error.
pub fn fit_model(
    model: &FunctionalModel,
    x: &Array1<f64>,
    y: &Array1<f64>,
    options: &FitOptions,
) -> Result<FitResult> {
    if let Some(name) = options
        .initial_guess
        .keys()
        .find(|name| !model.parameters().contains(*name))
    {
        return Err(SymFitError::ParameterNotFound(name.clone()));
    }
    if !options.fixed_parameters.is_empty() {
        log::warn!(
            "fixed_parameters {:?} are not applied; all parameters vary",
            options.fixed_parameters
        );
    }

    let problem = CurveProblem::new(model, x, y)?;
    let initial: Array1<f64> = model
        .parameters()
        .iter()
        .map(|name| options.initial_guess.get(name).copied().unwrap_or(0.0))
        .collect();
    log::debug!(
        "fitting '{}' to {} points from {:?}",
        model.equation(),
        x.len(),
        initial
    );

    let solver = LevenbergMarquardt::with_config(options.config.clone());
    let result = solver.minimize(&problem, initial)?;

    let ndata = result.residuals.len();
    let redchi = uncertainty::reduced_chi_square(result.cost, ndata, result.params.len());
    let covariance = match &result.jacobian {
        Some(jacobian) if redchi.is_finite() => {
            match uncertainty::calculate_covariance(jacobian, redchi) {
                Ok(covariance) => Some(covariance),
                Err(err) => {
                    log::debug!("no covariance estimate: {}", err);
                    None
                }
            }
        }
        _ => None,
    };
    let standard_errors = covariance
        .as_ref()
        .map(uncertainty::standard_errors_from_covariance);
    let correlation = covariance.as_ref().map(uncertainty::calculate_correlation);

    if result.success {
        log::info!(
            "fit converged after {} iterations, cost {:.6e}",
            result.iterations,
            result.cost
        );
    } else {
        log::warn!("fit did not converge: {}", result.message);
    }

    Ok(FitResult {
        parameter_names: model.parameters().to_vec(),
        values: result.params,
        residuals: result.residuals,
        cost: result.cost,
        redchi,
        ndata,
        iterations: result.iterations,
        func_evals: result.func_evals,
        success: result.success,
        message: result.message,
        covariance,
        standard_errors,
        correlation,
    })
}

/// Fit one model to many datasets sharing the same `x`.
///
/// Each dataset is fitted independently; with the `parallel` feature the
/// fits run on the rayon thread pool. Results are in dataset order.
pub fn fit_batch(
    model: &FunctionalModel,
    x: &Array1<f64>,
    datasets: &[Array1<f64>],
    options: &FitOptions,
) -> Vec<Result<FitResult>> {
    log::debug!("fitting {} datasets", datasets.len());

    #[cfg(feature = "parallel")]
    let results = datasets
        .par_iter()
        .map(|y| fit_model(model, x, y, options))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results = datasets
        .iter()
        .map(|y| fit_model(model, x, y, options))
        .collect();

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_curve_problem_residuals_and_jacobian() {
        let model = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
        let x = array![0.0, 1.0, 2.0];
        let y = array![1.0, 3.0, 5.0];
        let problem = CurveProblem::new(&model, &x, &y).unwrap();

        assert!(problem.has_custom_jacobian());
        assert_eq!(problem.eval(&array![2.0, 1.0]).unwrap(), array![0.0, 0.0, 0.0]);
        assert_eq!(problem.eval(&array![2.0, 0.0]).unwrap(), array![-1.0, -1.0, -1.0]);

        let jacobian = problem.jacobian(&array![2.0, 1.0]).unwrap();
        assert_eq!(jacobian, array![[0.0, 1.0], [1.0, 1.0], [2.0, 1.0]]);
    }

    #[test]
    fn test_length_mismatch_surfaces_from_residuals() {
        let model = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
        let err = fit_model(&model, &array![0.0, 1.0, 2.0], &array![1.0, 2.0], &FitOptions::new())
            .unwrap_err();
        assert!(matches!(err, SymFitError::DimensionMismatch(_)));
    }

    #[test]
    fn test_exponential_fit_with_initial_guess() {
        let model = FunctionalModel::new("A tau", "t", "A*exp(-t/tau)").unwrap();
        let t = Array1::linspace(0.0, 5.0, 40);
        let y = t.mapv(|v: f64| 3.0 * (-v / 1.5).exp());

        let options = FitOptions::new()
            .with_initial_guess("A", 1.0)
            .with_initial_guess("tau", 1.0);
        let result = fit_model(&model, &t, &y, &options).unwrap();

        assert!(result.success, "{}", result);
        assert_relative_eq!(result.value("A").unwrap(), 3.0, epsilon = 1e-6);
        assert_relative_eq!(result.value("tau").unwrap(), 1.5, epsilon = 1e-6);
    }

    #[test]
    fn test_standard_errors_of_noisy_line() {
        let model = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
        let x = Array1::linspace(0.0, 9.0, 10);
        let y = &x.mapv(|v| 2.0 * v + 1.0) + &array![0.1, -0.1, 0.1, -0.1, 0.1, -0.1, 0.1, -0.1, 0.1, -0.1];

        let result = fit_model(&model, &x, &y, &FitOptions::new()).unwrap();
        let errors = result.standard_errors.clone().unwrap();
        assert!(errors[0] > 0.0 && errors[0] < 0.1);
        assert!(errors[1] > 0.0 && errors[1] < 0.1);

        let correlation = result.correlation.unwrap();
        // Slope and intercept of data on positive x are anti-correlated
        assert!(correlation[[0, 1]] < 0.0);
    }

    #[test]
    fn test_unknown_guess_and_ignored_fixed_parameters() {
        let model = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
        let x = array![0.0, 1.0, 2.0];
        let y = array![1.0, 3.0, 5.0];

        let bad = FitOptions::new().with_initial_guess("q", 1.0);
        assert!(matches!(
            fit_model(&model, &x, &y, &bad),
            Err(SymFitError::ParameterNotFound(_))
        ));

        // `b` still varies
        let fixed = FitOptions::new()
            .with_initial_guess("b", 10.0)
            .with_fixed_parameters(["b"]);
        let result = fit_model(&model, &x, &y, &fixed).unwrap();
        assert_relative_eq!(result.value("b").unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_multi_variable_model_is_rejected() {
        let model = FunctionalModel::new("a", "x y", "a*x*y").unwrap();
        let x = array![1.0];
        assert!(matches!(
            fit_model(&model, &x, &x, &FitOptions::new()),
            Err(SymFitError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_complex_model_is_rejected() {
        let model = FunctionalModel::new("a", "x", "a*hankel1(0, x)").unwrap();
        let x = array![1.0, 2.0, 3.0];
        let err = fit_model(&model, &x, &x, &FitOptions::new().with_initial_guess("a", 1.0))
            .unwrap_err();
        assert!(matches!(err, SymFitError::ComplexResult(_)));
    }

    #[test]
    fn test_fit_batch_keeps_order() {
        let model = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
        let x = Array1::linspace(0.0, 1.0, 20);
        let datasets: Vec<Array1<f64>> = (1..=4)
            .map(|k| x.mapv(|v| k as f64 * v - 1.0))
            .collect();

        let results = fit_batch(&model, &x, &datasets, &FitOptions::new());
        assert_eq!(results.len(), 4);
        for (k, result) in results.into_iter().enumerate() {
            let result = result.unwrap();
            assert_relative_eq!(result.value("m").unwrap(), (k + 1) as f64, epsilon = 1e-6);
            assert_relative_eq!(result.value("b").unwrap(), -1.0, epsilon = 1e-6);
        }
    }
}
