use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditFundError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: f64,
    },

    #[error("Invalid loan transition: {0}")]
    InvalidTransition(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Simulation cancelled after {completed} of {total} trials")]
    Cancelled { completed: usize, total: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CreditFundError {
    fn from(e: serde_json::Error) -> Self {
        CreditFundError::SerializationError(e.to_string())
    }
}
