//! SDK error types.
//!
//! [`SdkError`] covers the request/response plumbing of the transports.
//! Failures that belong to the ingestion state are reported as
//! [`IngestError`](crate::IngestError), relay failures as
//! [`RelayError`](crate::RelayError).

/// Error type for SDK transport operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// HTTP request failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
