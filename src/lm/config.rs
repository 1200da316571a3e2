//! Configuration options for the Levenberg-Marquardt algorithm.

use crate::error::{Result, SymFitError};

/// Method for calculating the Jacobian matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMethod {
    /// Use finite differences to approximate the Jacobian
    FiniteDifference,

    /// Use the analytical Jacobian provided by the problem, when it has one
    #[default]
    Analytical,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct LmConfig {
    /// Maximum number of iterations. Default: 200
    pub max_iterations: usize,

    /// Tolerance for relative change in cost. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for the infinity norm of the gradient. Default: 1e-10
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e12
    pub max_lambda: f64,

    /// Method to use for calculating the Jacobian. Default: Analytical
    pub diff_method: DiffMethod,

    /// Whether to return the Jacobian at the solution. Default: true
    pub calc_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            diff_method: DiffMethod::default(),
            calc_jacobian: true,
        }
    }
}

impl LmConfig {
    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for change in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    /// Set the tolerance for the gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    /// Set the factors by which lambda grows after a rejected step and
    /// shrinks after a good one.
    pub fn with_lambda_factors(mut self, up: f64, down: f64) -> Self {
        self.lambda_up_factor = up;
        self.lambda_down_factor = down;
        self
    }

    /// Set the bounds for lambda.
    pub fn with_lambda_bounds(mut self, min_lambda: f64, max_lambda: f64) -> Self {
        self.min_lambda = min_lambda;
        self.max_lambda = max_lambda;
        self
    }

    /// Set the method used for calculating the Jacobian.
    pub fn with_differentiation_method(mut self, method: DiffMethod) -> Self {
        self.diff_method = method;
        self
    }

    /// Set whether to return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.calc_jacobian = calc_jacobian;
        self
    }

    /// Check that the damping settings let a rejected step raise lambda
    /// until it reaches `max_lambda`.
    ///
    /// # Errors
    ///
    /// [`SymFitError::InvalidInput`] unless `lambda_up_factor > 1`,
    /// `0 < lambda_down_factor <= 1`, `0 < min_lambda < max_lambda` and
    /// `initial_lambda` is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(SymFitError::InvalidInput(message));

        if !(self.lambda_up_factor > 1.0) || !self.lambda_up_factor.is_finite() {
            return invalid(format!(
                "lambda_up_factor must be a finite value above 1, got {}",
                self.lambda_up_factor
            ));
        }
        if !(self.lambda_down_factor > 0.0 && self.lambda_down_factor <= 1.0) {
            return invalid(format!(
                "lambda_down_factor must be in (0, 1], got {}",
                self.lambda_down_factor
            ));
        }
        if !(self.min_lambda > 0.0 && self.min_lambda < self.max_lambda) || !self.max_lambda.is_finite() {
            return invalid(format!(
                "lambda bounds must satisfy 0 < min < max < inf, got [{}, {}]",
                self.min_lambda, self.max_lambda
            ));
        }
        if !(self.initial_lambda >= 0.0) || !self.initial_lambda.is_finite() {
            return invalid(format!(
                "initial_lambda must be finite and non-negative, got {}",
                self.initial_lambda
            ));
        }
        Ok(())
    }
}
