use thiserror::Error;

use crate::parameters::expression::ExpressionError;
use crate::parameters::parameter::ParameterError;
use crate::parameters::vector::VectorError;

/// Error types for the symparam library.
#[derive(Error, Debug)]
pub enum SymParamError {
    /// Error constructing a parameter.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Error accessing a parameter vector.
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    /// Error parsing or evaluating an expression.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for symparam operations.
pub type Result<T> = std::result::Result<T, SymParamError>;

/// Extensions for converting from other error types.
impl From<String> for SymParamError {
    fn from(s: String) -> Self {
        SymParamError::Other(s)
    }
}

impl From<&str> for SymParamError {
    fn from(s: &str) -> Self {
        SymParamError::Other(s.to_string())
    }
}
