use crate::validation::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CabinetError {
    /// One or more form fields failed client-side checks. Nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The external store rejected a read or write.
    #[error("Persistence error: {message}")]
    Persistence { message: String, retryable: bool },

    #[error("Not found: {0}")]
    NotFound(String),

    /// An edit path did not resolve against the buffer it was derived from.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// The content editor was asked to do something its current state forbids.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl CabinetError {
    pub fn persistence(message: impl Into<String>) -> Self {
        CabinetError::Persistence {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        CabinetError::Persistence {
            message: message.into(),
            retryable: true,
        }
    }

    /// True for failures of the external store (as opposed to local defects
    /// or rejected input).
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            CabinetError::Persistence { .. } | CabinetError::Io(_) | CabinetError::Http(_)
        )
    }

    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CabinetError::Persistence { retryable, .. } => *retryable,
            CabinetError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<ValidationErrors> for CabinetError {
    fn from(errors: ValidationErrors) -> Self {
        CabinetError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, CabinetError>;
