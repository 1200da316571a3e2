use thiserror::Error;

use crate::symbolic::SymbolicError;

/// Error types for the symfit-rs library.
#[derive(Error, Debug)]
pub enum SymFitError {
    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The equation text could not be parsed.
    #[error("Failed to parse equation: {0}")]
    ParseError(String),

    /// The equation references a symbol that is neither a variable nor a parameter.
    #[error("Undeclared symbol '{0}' in equation")]
    UndeclaredSymbol(String),

    /// A name was declared both as a variable and as a parameter.
    #[error("Symbol '{0}' is declared as both a variable and a parameter")]
    SymbolConflict(String),

    /// A symbol had no value at evaluation time.
    #[error("Unbound symbol '{0}': bind it with set_parameters or pass it as an argument")]
    UnboundSymbol(String),

    /// A real-valued evaluation produced a complex number.
    #[error("Complex result: {0}")]
    ComplexResult(String),

    /// The requested operation is not supported for this model or expression.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

impl From<SymbolicError> for SymFitError {
    fn from(err: SymbolicError) -> Self {
        match err {
            SymbolicError::ParseError { message } => SymFitError::ParseError(message),
            SymbolicError::Unsupported { message } => SymFitError::UnsupportedOperation(message),
            SymbolicError::ComplexValued { .. } => SymFitError::ComplexResult(err.to_string()),
            SymbolicError::InvalidOrder { .. } => SymFitError::FunctionEvaluation(err.to_string()),
            SymbolicError::ArityMismatch { .. } => SymFitError::ParseError(err.to_string()),
        }
    }
}

/// Result type alias for symfit-rs operations.
pub type Result<T> = std::result::Result<T, SymFitError>;

/// Extensions for converting from other error types.
impl From<String> for SymFitError {
    fn from(s: String) -> Self {
        SymFitError::Other(s)
    }
}

impl From<&str> for SymFitError {
    fn from(s: &str) -> Self {
        SymFitError::Other(s.to_string())
    }
}
