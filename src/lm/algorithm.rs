//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core loop: compute the Jacobian, solve the damped
//! normal equations for a step, accept or reject it by the gain ratio, and
//! stop on the convergence criteria.

use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{Result, SymFitError};
use crate::problem::Problem;
use crate::utils::finite_difference;

use super::config::{DiffMethod, LmConfig};
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of residual evaluations, finite-difference evaluations included
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// Why the optimization stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for change in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the method used for calculating the Jacobian.
    pub fn with_differentiation_method(mut self, method: DiffMethod) -> Self {
        self.config.diff_method = method;
        self
    }

    fn jacobian<P: Problem + ?Sized>(
        &self,
        problem: &P,
        params: &Array1<f64>,
        func_evals: &mut usize,
    ) -> Result<Array2<f64>> {
        if self.config.diff_method == DiffMethod::Analytical && problem.has_custom_jacobian() {
            problem.jacobian(params)
        } else {
            *func_evals += params.len() + 1;
            finite_difference::jacobian(problem, params, None)
        }
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Failing to converge is not an error: the returned [`LmResult`] has
    /// `success == false` and a status explaining why the loop stopped.
    /// Errors are reserved for problems that cannot be evaluated.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem + ?Sized>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        self.config.validate()?;

        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(SymFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        let mut cost = residuals.dot(&residuals);
        if !cost.is_finite() {
            return Err(SymFitError::FunctionEvaluation(format!(
                "residuals are not finite at the initial parameters {:?}",
                params
            )));
        }

        let criteria = ConvergenceCriteria::new(
            self.config.xtol,
            self.config.ftol,
            self.config.gtol,
            self.config.max_iterations,
        );
        let mut region = TrustRegion::from_config(&self.config);
        let mut iterations = 0;

        let status = loop {
            if iterations >= self.config.max_iterations {
                break ConvergenceStatus::MaxIterationsReached;
            }

            let jacobian = self.jacobian(problem, &params, &mut func_evals)?;
            let gradient = jacobian.t().dot(&residuals);
            let gradient_norm = ConvergenceCriteria::gradient_norm(&gradient);
            if gradient_norm < self.config.gtol || cost == 0.0 {
                break ConvergenceStatus::GradientConvergence;
            }

            // Raise the damping until a step reduces the cost
            let accepted = loop {
                let step = LmStep::calculate_step(&jacobian, &residuals, &region)?;
                let new_params = &params + &step.step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost = new_residuals.dot(&new_residuals);

                let rho = TrustRegion::gain_ratio(cost, new_cost, step.predicted_reduction);
                if region.update_lambda(rho) {
                    break Some((new_params, new_residuals, new_cost));
                }
                if region.is_exhausted() {
                    break None;
                }
            };

            let Some((new_params, new_residuals, new_cost)) = accepted else {
                break ConvergenceStatus::DampingOverflow;
            };

            iterations += 1;
            log::trace!(
                "iteration {}: cost {:.6e} -> {:.6e}, lambda {:.3e}",
                iterations,
                cost,
                new_cost,
                region.lambda
            );

            let status = criteria.check(
                &params,
                &new_params,
                cost,
                new_cost,
                gradient_norm,
                iterations,
            );
            params = new_params;
            residuals = new_residuals;
            cost = new_cost;

            if status.is_terminated() {
                break status;
            }
        };

        log::debug!(
            "optimization stopped after {} iterations: {}",
            iterations,
            status.description()
        );

        let jacobian = if self.config.calc_jacobian {
            Some(self.jacobian(problem, &params, &mut func_evals)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            message: status.description().to_string(),
            status,
            jacobian,
        })
    }
}
