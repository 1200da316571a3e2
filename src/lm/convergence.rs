//! Convergence criteria for the optimizer.
//!
//! This module defines the criteria used to determine when an optimization
//! has converged to a solution or must stop without one.

use ndarray::Array1;

/// Possible convergence states for an optimization algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The algorithm has converged due to a small parameter change.
    ParameterConvergence,

    /// The algorithm has converged due to a small function value change.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// The damping parameter grew past its bound without finding a better point.
    DampingOverflow,

    /// The algorithm has terminated due to a numerical error.
    NumericalError,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small cost change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::DampingOverflow => "Terminated: damping parameter overflow",
            ConvergenceStatus::NumericalError => "Terminated: numerical error",
        }
    }
}

/// Criteria for determining when an optimization algorithm has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for change in parameter values.
    pub xtol: f64,

    /// Tolerance for change in function value.
    pub ftol: f64,

    /// Tolerance for gradient norm.
    pub gtol: f64,

    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            xtol: 1e-10,
            ftol: 1e-10,
            gtol: 1e-10,
            max_iterations: 200,
        }
    }
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(xtol: f64, ftol: f64, gtol: f64, max_iterations: usize) -> Self {
        Self {
            xtol,
            ftol,
            gtol,
            max_iterations,
        }
    }

    /// Infinity norm of the gradient, scaled so it is comparable across
    /// problems of different size.
    pub fn gradient_norm(gradient: &Array1<f64>) -> f64 {
        gradient.iter().fold(0.0, |acc: f64, g| acc.max(g.abs()))
    }

    /// Checks whether an accepted step ends the optimization.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values before the step
    /// * `new_params` - The parameter values after the step
    /// * `cost` - The cost before the step
    /// * `new_cost` - The cost after the step
    /// * `gradient_norm` - The gradient norm at the new point
    /// * `iterations` - The number of completed iterations, this one included
    pub fn check(
        &self,
        params: &Array1<f64>,
        new_params: &Array1<f64>,
        cost: f64,
        new_cost: f64,
        gradient_norm: f64,
        iterations: usize,
    ) -> ConvergenceStatus {
        if !new_cost.is_finite() || new_params.iter().any(|p| !p.is_finite()) {
            return ConvergenceStatus::NumericalError;
        }

        if gradient_norm < self.gtol {
            return ConvergenceStatus::GradientConvergence;
        }

        let param_change = new_params
            .iter()
            .zip(params.iter())
            .map(|(a, b)| (a - b).abs() / b.abs().max(1.0))
            .fold(0.0, f64::max);
        if param_change < self.xtol {
            return ConvergenceStatus::ParameterConvergence;
        }

        let cost_change = (cost - new_cost).abs() / cost.max(f64::MIN_POSITIVE);
        if cost_change < self.ftol || new_cost == 0.0 {
            return ConvergenceStatus::FunctionValueConvergence;
        }

        if iterations >= self.max_iterations {
            return ConvergenceStatus::MaxIterationsReached;
        }

        ConvergenceStatus::Running
    }
}
