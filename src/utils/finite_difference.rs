//! Finite difference methods for numerical differentiation.
//!
//! Used for the Jacobian of residual functions whose partial derivatives are
//! not available symbolically.

use crate::error::{Result, SymFitError};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size for finite differences.
const DEFAULT_EPSILON: f64 = 1.4901161193847656e-8;

/// Step for parameter `value`, scaled to its magnitude.
fn step_for(value: f64, eps: f64) -> f64 {
    if value.abs() > 1.0 {
        value.abs() * eps
    } else {
        eps
    }
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The relative step size (optional)
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let residuals = problem.eval(params)?;
    let n_residuals = residuals.len();

    if n_residuals != problem.residual_count() {
        return Err(SymFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            problem.residual_count(),
            n_residuals
        )));
    }

    let mut jac = Array2::zeros((n_residuals, params.len()));
    let mut perturbed = params.clone();
    for j in 0..params.len() {
        let h = step_for(params[j], eps);
        perturbed[j] = params[j] + h;
        let shifted = problem.eval(&perturbed)?;
        perturbed[j] = params[j];

        let column = (&shifted - &residuals) / h;
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}
