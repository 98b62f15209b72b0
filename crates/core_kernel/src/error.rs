//! Kernel error types

use thiserror::Error;

/// Error raised when a wire value cannot be turned into a kernel or domain value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The value names no known variant, e.g. an unknown payment method
    #[error("Invalid {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },
}

impl CoreError {
    pub fn unknown_value(kind: &'static str, value: impl Into<String>) -> Self {
        CoreError::UnknownValue {
            kind,
            value: value.into(),
        }
    }
}
