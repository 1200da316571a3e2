//! # Symbolic Engine
//!
//! A small computer-algebra layer for functional models: equations are parsed
//! into an [`Expr`] tree which can be simplified, differentiated, integrated,
//! taken to a limit and printed as plain text or LaTeX.
//!
//! ## Example Usage
//!
//! ```rust
//! use symfit_rs::symbolic::Expr;
//!
//! let expr = Expr::parse("a*x^2 + b").unwrap();
//! let slope = expr.diff("x").unwrap();
//! assert_eq!(slope.to_string(), "2*a*x");
//!
//! let area = expr.integrate("x").unwrap();
//! assert!(area.depends_on("x"));
//! ```

pub mod calculus;
pub mod expr;
pub mod format;
pub mod parser;
pub mod simplify;

use thiserror::Error;

// Re-export key types
pub use expr::{Constant, Expr, Function};

/// Error that can occur while parsing or transforming expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolicError {
    #[error("{message}")]
    ParseError { message: String },

    #[error("{name}() takes {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{name}() has no real value")]
    ComplexValued { name: String },

    #[error("{name}() requires an integer order, got {order}")]
    InvalidOrder { name: String, order: f64 },

    #[error("{message}")]
    Unsupported { message: String },
}

impl Expr {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> Result<Self, SymbolicError> {
        parser::parse(input)
    }
}
