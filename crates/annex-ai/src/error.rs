//! Error types for annex-ai

use thiserror::Error;

/// Result type alias using annex-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a completion endpoint
#[derive(Error, Debug)]
pub enum Error {
    /// API key not found in the environment
    #[error("missing API key: set the XAI_API_KEY environment variable")]
    MissingApiKey,

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint returned a non-2xx status; body carried verbatim
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Server-sent events stream failed
    #[error("SSE error: {0}")]
    Sse(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error should be shown before any request is made
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Error::MissingApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_carries_status_and_body_verbatim() {
        let e = Error::Api {
            status: 429,
            body: "{\"error\":\"rate limited\"}".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("429"), "got: {}", msg);
        assert!(msg.contains("rate limited"), "got: {}", msg);
    }

    #[test]
    fn test_missing_key_names_the_env_var() {
        let e = Error::MissingApiKey;
        assert!(e.is_missing_credential());
        assert!(e.to_string().contains("XAI_API_KEY"));
    }

    #[test]
    fn test_other_errors_are_not_credential_errors() {
        assert!(!Error::Sse("connection reset".into()).is_missing_credential());
        assert!(
            !Error::Api {
                status: 500,
                body: String::new()
            }
            .is_missing_credential()
        );
    }
}
