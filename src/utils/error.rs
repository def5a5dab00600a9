use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Render service error: {operation}: {message}")]
    Render { operation: String, message: String },

    #[error("Timeout waiting for page load after {timeout_ms}ms")]
    LoadTimeout { timeout_ms: u64 },

    #[error("No query text found")]
    NoQuery,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn render(operation: &str, err: impl std::fmt::Display) -> Self {
        AppError::Render {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
