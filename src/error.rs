use thiserror::Error;

use crate::remote::DataError;

pub type Result<T> = std::result::Result<T, Error>;
pub type ConfigError = Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Failure reported by the remote source, relayed without reclassification.
    #[error(transparent)]
    Remote(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid article: {0}")]
    InvalidArticle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// The remote classification, if this error came from the remote source.
    pub fn as_remote(&self) -> Option<&DataError> {
        match self {
            Error::Remote(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_temporary(&self) -> bool {
        match self {
            Error::Remote(e) => e.is_temporary(),
            Error::Io(_) => true,
            _ => false,
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::Config(_) | Error::Invalid(_)
        )
    }

    pub fn error_code(&self) -> &str {
        match self {
            Error::Remote(e) => e.error_code(),
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Storage(_) => "STORAGE",
            Error::InvalidArticle(_) => "INVALID_ARTICLE",
            Error::Config(_) => "CONFIG",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Invalid(_) => "INVALID",
        }
    }
}
