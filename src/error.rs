use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Validation error on '{field}' (value: {value}): {message}")]
    Validation {
        field: &'static str,
        value: String,
        message: String,
    },
    #[error("Buffer overflow: current size {current_size} reached capacity {capacity}")]
    Overflow { current_size: usize, capacity: usize },
    #[error("Publish error on topic '{topic}': {message}")]
    Publish {
        topic: String,
        message: String,
        recoverable: bool,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl IngestError {
    pub fn validation(field: &'static str, value: impl ToString, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Whether the caller may retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Overflow { .. } => true,
            Self::Publish { recoverable, .. } => *recoverable,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
