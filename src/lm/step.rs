//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! The step solves the damped normal equations
//! `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr`, interpolating between Gauss-Newton
//! (small λ) and scaled gradient descent (large λ).

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::error::{Result, SymFitError};
use crate::lm::trust_region::TrustRegion;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

/// Floor for diagonal scaling entries, so zero columns still get damped.
const MIN_SCALE: f64 = 1e-12;

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The reduction in cost predicted by the linearized model
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step.
    ///
    /// # Arguments
    ///
    /// * `jacobian` - The Jacobian matrix at the current position
    /// * `residuals` - The residuals at the current position
    /// * `trust_region` - The damping controller
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        trust_region: &TrustRegion,
    ) -> Result<StepResult> {
        if jacobian.nrows() != residuals.len() {
            return Err(SymFitError::DimensionMismatch(format!(
                "Jacobian has {} rows but there are {} residuals",
                jacobian.nrows(),
                residuals.len()
            )));
        }

        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);
        let lambda = trust_region.lambda;

        let mut damped = j_t_j.clone();
        for i in 0..damped.nrows() {
            damped[[i, i]] += lambda * j_t_j[[i, i]].max(MIN_SCALE);
        }

        let rhs = j_t_r.mapv(|g| -g);
        let step = match LmStep::solve(&damped, &rhs) {
            Ok(step) => step,
            Err(err) => {
                log::debug!("damped system not solvable ({}), taking a gradient step", err);
                &rhs / (lambda + 1.0)
            }
        };

        let predicted_reduction = LmStep::predicted_reduction(&j_t_j, &j_t_r, &step);

        Ok(StepResult {
            step,
            predicted_reduction,
            lambda,
        })
    }

    /// Solves `a x = b`, by Cholesky when `a` is positive definite and by LU otherwise.
    pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let a: DMatrix<f64> = ndarray_to_nalgebra(a);
        let b = ndarray_vec_to_nalgebra(b);

        if let Some(cholesky) = a.clone().cholesky() {
            return Ok(nalgebra_vec_to_ndarray(&cholesky.solve(&b)));
        }

        let solution = a.lu().solve(&b).ok_or_else(|| {
            SymFitError::LinearAlgebraError("damped normal equations are singular".to_string())
        })?;
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(SymFitError::LinearAlgebraError(
                "non-finite solution of the damped normal equations".to_string(),
            ));
        }
        Ok(nalgebra_vec_to_ndarray(&solution))
    }

    /// Reduction in cost predicted by the linear model of the residuals.
    ///
    /// With cost `‖r‖²`, the model cost after step `δ` is
    /// `‖r + Jδ‖² = ‖r‖² + 2δᵀJᵀr + δᵀJᵀJδ`.
    pub fn predicted_reduction(j_t_j: &Array2<f64>, j_t_r: &Array1<f64>, step: &Array1<f64>) -> f64 {
        -(2.0 * step.dot(j_t_r) + step.dot(&j_t_j.dot(step)))
    }
}
