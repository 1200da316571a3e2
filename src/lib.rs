//! # symfit-rs
//!
//! `symfit-rs` builds curve-fitting models from symbolic equations.
//!
//! The library provides:
//! - A small symbolic engine: parsing, simplification, derivatives,
//!   antiderivatives, limits, plain-text and LaTeX output
//! - Compiled numeric evaluation, including Bessel and Hankel functions
//! - [`FunctionalModel`], a callable symbolic model with operator algebra
//! - Least-squares fitting with a Levenberg-Marquardt solver and parameter
//!   uncertainties
//! - [`DataSimulator`](simulator::DataSimulator) for synthetic noisy data
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use symfit_rs::{FitOptions, FunctionalModel};
//!
//! let mut model = FunctionalModel::new("A tau", "t", "A*exp(-t/tau)").unwrap();
//! let t = Array1::linspace(0.0, 4.0, 30);
//! let y = t.mapv(|v: f64| 2.0 * (-v / 0.8).exp());
//!
//! let options = FitOptions::new()
//!     .with_initial_guess("A", 1.0)
//!     .with_initial_guess("tau", 1.0);
//! let result = model.fit_data(&t, &y, &options).unwrap();
//!
//! assert!(result.success);
//! assert!((result.value("tau").unwrap() - 0.8).abs() < 1e-6);
//! println!("{}", model.to_latex());
//! ```

pub mod compile;
pub mod error;
pub mod fit;
pub mod lm;
pub mod model;
pub mod models;
pub mod problem;
pub mod simulator;
pub mod special;
pub mod symbolic;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use error::{Result, SymFitError};
pub use fit::{fit_batch, fit_model, FitOptions, FitResult};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use model::{FunctionalModel, ModelDefinition};
pub use models::Multicosine;
pub use problem::Problem;
pub use simulator::{DataSimulator, GridSpec, NoiseKind, NoiseSpec};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
