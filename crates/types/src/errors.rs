//! Error types for payload validation and feature derivation

use thiserror::Error;

/// Errors raised while validating an untyped request payload.
///
/// Every variant that concerns a field carries the field name so the
/// caller can see exactly which input was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field absent from the payload
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but not a JSON number
    #[error("field {0} must be numeric")]
    NotNumeric(&'static str),

    /// Field present and numeric but not integer-valued
    #[error("field {0} must be an integer")]
    NotInteger(&'static str),

    /// Payload is not a JSON object at all
    #[error("request body must be a JSON object")]
    NotAnObject,
}

impl ValidationError {
    /// The offending field, if the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(f) | Self::NotNumeric(f) | Self::NotInteger(f) => Some(f),
            Self::NotAnObject => None,
        }
    }
}

/// Semantically invalid values that pass schema validation but cannot
/// be used for feature derivation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// BMI requires a strictly positive height in meters
    #[error("height must be positive to derive BMI, got {0}")]
    NonPositiveHeight(f64),
}
