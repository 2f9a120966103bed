use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the indexer service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A transport-level error from the HTTP client.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service responded with a non-success status.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// The HTTP status code returned by the service.
        status: StatusCode,
        /// The response body, for diagnostics.
        message: String,
    },

    /// Signing the request token failed.
    #[error("failed to sign request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
