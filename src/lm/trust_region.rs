//! Damping control for the Levenberg-Marquardt algorithm.
//!
//! The damping parameter plays the role of an inverse trust-region radius:
//! it shrinks after steps whose actual cost reduction agrees with the
//! prediction of the linearized model and grows after rejected steps.

use super::config::LmConfig;

/// Trust region implementation for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone)]
pub struct TrustRegion {
    /// Current value of the damping parameter
    pub lambda: f64,

    /// Minimum allowed value for the damping parameter
    pub lambda_min: f64,

    /// Maximum allowed value for the damping parameter
    pub lambda_max: f64,

    /// Factor to increase lambda by when step is rejected
    pub lambda_increase_factor: f64,

    /// Factor to decrease lambda by when step is accepted
    pub lambda_decrease_factor: f64,

    /// Minimum gain ratio required to accept a step
    pub min_gain_ratio: f64,

    /// Gain ratio above which lambda is decreased
    pub good_gain_ratio: f64,
}

impl Default for TrustRegion {
    fn default() -> Self {
        Self::from_config(&LmConfig::default())
    }
}

impl TrustRegion {
    /// Build the damping controller from solver configuration.
    pub fn from_config(config: &LmConfig) -> Self {
        Self {
            lambda: config.initial_lambda,
            lambda_min: config.min_lambda,
            lambda_max: config.max_lambda,
            lambda_increase_factor: config.lambda_up_factor,
            lambda_decrease_factor: config.lambda_down_factor,
            min_gain_ratio: 1e-4,
            good_gain_ratio: 0.75,
        }
    }

    /// Updates the damping parameter based on the gain ratio.
    ///
    /// Returns whether the step is accepted.
    pub fn update_lambda(&mut self, gain_ratio: f64) -> bool {
        if gain_ratio > self.min_gain_ratio {
            if gain_ratio > self.good_gain_ratio {
                self.lambda = (self.lambda * self.lambda_decrease_factor).max(self.lambda_min);
            }
            true
        } else {
            self.lambda = (self.lambda * self.lambda_increase_factor).max(self.lambda_min);
            false
        }
    }

    /// Whether lambda has grown beyond its upper bound.
    pub fn is_exhausted(&self) -> bool {
        self.lambda > self.lambda_max
    }

    /// Calculates the gain ratio between actual and predicted reduction.
    pub fn gain_ratio(current_cost: f64, new_cost: f64, predicted_reduction: f64) -> f64 {
        let actual_reduction = current_cost - new_cost;
        if !new_cost.is_finite() {
            return f64::NEG_INFINITY;
        }

        if predicted_reduction <= 0.0 || predicted_reduction.abs() < f64::EPSILON * current_cost {
            if actual_reduction > 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            actual_reduction / predicted_reduction
        }
    }
}
