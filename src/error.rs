//! Error types for a chat submission.

use thiserror::Error;

/// Message used when a non-2xx response carries no usable `detail` field.
pub const GENERIC_BACKEND_ERROR: &str = "Backend returned an error";

/// Message used when an unexpected failure carries no text of its own.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// Terminal failure of one submission.
///
/// Every variant ends the submission; nothing is retried. The `Display`
/// output is what the presentation layer shows in its error slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The API key field was empty. No request was sent.
    #[error("Please enter your OpenAI API key.")]
    MissingCredential,

    /// The backend answered with a non-2xx status.
    #[error("{0}")]
    BackendError(String),

    /// The response had no body to read from.
    #[error("Could not get response reader from the server.")]
    StreamUnavailable,

    /// Transport, decoding, or any other unexpected failure.
    #[error("{0}")]
    Unknown(String),

    /// Another submission on the same flow is still pending.
    #[error("A submission is already in progress.")]
    Busy,

    /// The caller cancelled the submission.
    #[error("Submission cancelled.")]
    Cancelled,
}

impl SubmitError {
    /// Build a [`SubmitError::Unknown`] from any error, falling back to a
    /// generic message when the error renders as an empty string.
    pub fn unknown(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            Self::Unknown(UNKNOWN_ERROR.to_string())
        } else {
            Self::Unknown(message)
        }
    }

    /// Short machine-readable kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::BackendError(_) => "backend_error",
            Self::StreamUnavailable => "stream_unavailable",
            Self::Unknown(_) => "unknown",
            Self::Busy => "busy",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        Self::unknown(err)
    }
}

/// Result type alias for submission operations.
pub type Result<T> = std::result::Result<T, SubmitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_displays_its_message_verbatim() {
        let err = SubmitError::BackendError("rate limited".into());
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.kind(), "backend_error");
    }

    #[test]
    fn unknown_falls_back_to_generic_text() {
        assert_eq!(
            SubmitError::unknown("  "),
            SubmitError::Unknown(UNKNOWN_ERROR.to_string())
        );
        assert_eq!(
            SubmitError::unknown("connection reset"),
            SubmitError::Unknown("connection reset".to_string())
        );
    }
}
