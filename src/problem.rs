//! Problem definition trait.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the Levenberg-Marquardt algorithm.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A trait representing a nonlinear least squares problem.
///
/// This trait defines the interface for problems that can be solved using
/// the Levenberg-Marquardt algorithm.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The Jacobian is the matrix of partial derivatives of the residuals with respect
    /// to the parameters. The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Check if this problem provides a custom Jacobian implementation.
    ///
    /// When false, the optimizer computes the Jacobian by finite differences
    /// regardless of the configured [`DiffMethod`](crate::lm::DiffMethod).
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}
