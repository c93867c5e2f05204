use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapPlanError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CapPlanError {
    fn from(e: serde_json::Error) -> Self {
        CapPlanError::SerializationError(e.to_string())
    }
}
