use thiserror::Error;

/// Classified failure of a remote fetch.
///
/// The repository never invents new kinds: whatever the remote source
/// reports here is either swallowed behind a cache fallback or handed to
/// the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("Network connection failed. Please check your internet connection.")]
    Network { detail: String },

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Server error ({code}). Please try again later.")]
    Server { code: u16 },

    #[error("{title}: {message}")]
    Backend {
        code: String,
        title: String,
        message: String,
    },

    #[error("Failed to parse response. Please try again.")]
    Parse { detail: String },

    #[error("{}", unknown_message(.detail))]
    Unknown { detail: Option<String> },
}

fn unknown_message(detail: &Option<String>) -> &str {
    detail.as_deref().unwrap_or("An unknown error occurred.")
}

impl DataError {
    pub fn network(detail: impl Into<String>) -> Self {
        DataError::Network { detail: detail.into() }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        DataError::Parse { detail: detail.into() }
    }

    pub fn backend(
        code: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DataError::Backend {
            code: code.into(),
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: &str) -> Self {
        Self::backend("NOT_FOUND", "Not Found", format!("Article with ID {} not found", id))
    }

    /// Short heading for an error banner.
    pub fn title(&self) -> &str {
        match self {
            DataError::Network { .. } => "No connection",
            DataError::Timeout => "Timed out",
            DataError::Server { .. } => "Server error",
            DataError::Backend { title, .. } => title,
            DataError::Parse { .. } => "Unexpected response",
            DataError::Unknown { .. } => "Something went wrong",
        }
    }

    /// Body text for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            DataError::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            DataError::Network { .. } => "NETWORK",
            DataError::Timeout => "TIMEOUT",
            DataError::Server { .. } => "SERVER",
            DataError::Backend { code, .. } => code,
            DataError::Parse { .. } => "PARSE",
            DataError::Unknown { .. } => "UNKNOWN",
        }
    }

    /// Whether retrying the same request later could plausibly succeed.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self,
            DataError::Network { .. } | DataError::Timeout | DataError::Server { .. }
        )
    }
}
