use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to parse inbound payload: {0}")]
    ParseError(String),

    #[error("Failed to access storage provider: {0}")]
    StorageError(String),

    #[error("Failed to access messaging platform: {0}")]
    MessagingError(String),

    #[error("Failed to access OpenAI API: {0}")]
    OpenAIError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        RelayError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        RelayError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(error: anyhow::Error) -> Self {
        RelayError::StorageError(error.to_string())
    }
}
