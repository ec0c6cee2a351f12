use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: please sign in again")]
    Unauthorized,

    #[error("Task title must not be empty")]
    BlankTitle,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Caller-side precondition failures. These never reach a store's `error`.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::BlankTitle | ClientError::Validation(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
