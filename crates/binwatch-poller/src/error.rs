//! Error types for the poller.
//!
//! Uses `thiserror` for typed errors that surface through the poll loop:
//! configuration, transport, and unexpected API responses.

/// Errors that can occur while polling the dashboard API.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// Path that was requested.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}
