use thiserror::Error;

pub type Result<T> = std::result::Result<T, VcommissionError>;

#[derive(Debug, Error)]
pub enum VcommissionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No API key configured")]
    MissingCredential,
}

impl From<reqwest::Error> for VcommissionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VcommissionError::Timeout(err.to_string())
        } else {
            VcommissionError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VcommissionError {
    fn from(err: serde_json::Error) -> Self {
        VcommissionError::Parse(err.to_string())
    }
}
