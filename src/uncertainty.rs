//! # Covariance Matrix Calculations
//!
//! Parameter uncertainties of a least-squares fit, estimated from the
//! Jacobian of the residuals at the solution.

use ndarray::{Array1, Array2};

use crate::error::{Result, SymFitError};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Reduced chi-square: `cost / (n_data - n_params)`.
///
/// Returns NaN when there are no degrees of freedom left.
pub fn reduced_chi_square(cost: f64, n_data: usize, n_params: usize) -> f64 {
    if n_data > n_params {
        cost / (n_data - n_params) as f64
    } else {
        f64::NAN
    }
}

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = ndarray_to_nalgebra(&jacobian.t().dot(jacobian));

    let inverse = match jtj.clone().cholesky() {
        Some(cholesky) => cholesky.inverse(),
        None => jtj.try_inverse().ok_or_else(|| {
            SymFitError::LinearAlgebraError(
                "J^T J is singular, parameters are not identifiable".to_string(),
            )
        })?,
    };

    Ok(nalgebra_to_ndarray(&inverse).mapv(|v| v * redchi))
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
