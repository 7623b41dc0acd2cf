//! Forge API error types.

use thiserror::Error;

use crate::http::HttpError;

/// Errors from talking to the forge API.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Missing or unusable credential. Raised before any request is sent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API answered with a status the endpoint does not accept.
    #[error("Unexpected HTTP status {status} for {route}")]
    Status { status: u16, route: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] HttpError),

    /// The response body could not be turned into the expected value.
    #[error("Could not decode response from {route}: {message}")]
    Decode { route: String, message: String },
}

impl ForgeError {
    pub(crate) fn decode(route: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            route: route.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status carried by the error, if the API answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error looks like primary or secondary rate limiting.
    ///
    /// GitHub signals both with 403 or 429.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.status(), Some(403 | 429))
    }
}

/// First line of an error message, for progress events and log fields.
#[must_use]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}
