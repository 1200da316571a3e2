//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the nonlinear least-squares solver behind model
//! fitting. Any [`Problem`](crate::problem::Problem) can be minimized with it;
//! [`fit`](crate::fit) wraps it for symbolic models.

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DiffMethod, LmConfig};
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
pub use trust_region::TrustRegion;
