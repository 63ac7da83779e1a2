use thiserror::Error;

use crate::attribution::AttributionMethod;

/// Failure reported by (or detected in the output of) an external collaborator:
/// the prediction service or an attribution provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("Prediction service failed: {0}")]
    Prediction(String),

    #[error("Attribution provider '{method}' failed: {message}")]
    Attribution {
        method: AttributionMethod,
        message: String,
    },

    #[error("{origin} returned a non-finite value for '{field}'")]
    NonFinite { origin: String, field: String },
}

impl CollaboratorError {
    /// Reject NaN/Infinity coming back from a collaborator.
    pub fn check_finite(
        value: f64,
        origin: &str,
        field: &str,
    ) -> std::result::Result<f64, CollaboratorError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CollaboratorError::NonFinite {
                origin: origin.to_string(),
                field: field.to_string(),
            })
        }
    }
}

#[derive(Error, Debug)]
pub enum ExplainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ExplainError>;
