//! Error types for the rule engine core

use thiserror::Error;

/// Main error type for the rule engine core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Unbalanced parentheses")]
    UnbalancedParens,

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Empty expression")]
    EmptyExpression,

    #[error("Invalid condition format: {0}")]
    BadConditionFormat(String),

    #[error("Field \"{0}\" not found in record")]
    UnknownField(String),

    #[error("Invalid comparison operator: {0}")]
    BadComparator(String),

    #[error("No rules to combine")]
    EmptyRuleSet,

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::DeserializationError(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<RuleError> for pyo3::PyErr {
    fn from(err: RuleError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyValueError};

        match err {
            RuleError::UnknownField(_) => PyKeyError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for the rule engine core
pub type Result<T> = std::result::Result<T, RuleError>;
