use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned while requesting a caption from a text-generation service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptionError {
    #[error("Error: model not found or not accessible. Check the API key and model name. Details: {message}")]
    NotFound { message: String },

    #[error("Error: permission denied. The API key might be invalid or lack permissions. Details: {message}")]
    PermissionDenied { message: String },

    #[error("Error: rate limit exceeded or quota exhausted. Try again later. Details: {message}")]
    QuotaExhausted { message: String },

    #[error("Error: the service returned no caption text.")]
    EmptyResponse,

    #[error("Error: could not reach the caption service: {message}")]
    Transport { message: String },

    #[error("Error: caption model not initialized. {reason}")]
    NotInitialized { reason: String },

    /// Catch-all for unexpected statuses and malformed answers
    #[error("Error: an unexpected error occurred during caption generation: {message}")]
    Unexpected { message: String },
}

impl CaptionError {
    /// Classifies an error answer by its HTTP status and, if present, the
    /// `status` string of the API's error object (e.g. `RESOURCE_EXHAUSTED`).
    pub fn from_status(status: StatusCode, api_status: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();

        match (api_status, status.as_u16()) {
            (Some("NOT_FOUND"), _) | (_, 404) => Self::NotFound { message },
            (Some("PERMISSION_DENIED" | "UNAUTHENTICATED"), _) | (_, 401 | 403) => {
                Self::PermissionDenied { message }
            }
            (Some("RESOURCE_EXHAUSTED"), _) | (_, 429) => Self::QuotaExhausted { message },
            _ => Self::Unexpected {
                message: format!("{status}: {message}"),
            },
        }
    }
}

impl From<reqwest::Error> for CaptionError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            message: e.to_string(),
        }
    }
}
