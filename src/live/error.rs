//! Live stream error types

use thiserror::Error;

/// Transport-level failures. Every variant is treated as transient by the
/// live client and counts against the retry budget.
#[derive(Error, Debug)]
pub enum LiveError {
    /// Could not reach the server
    #[error("Event stream unavailable: {0}")]
    Unavailable(String),

    /// Connect or read timed out
    #[error("Event stream timeout")]
    Timeout,

    /// Server answered with a non-success status
    #[error("Event stream rejected with status {0}")]
    Status(u16),

    /// Server answered with something other than an event stream
    #[error("Unexpected content type: {0}")]
    ContentType(String),

    /// Reading the body failed mid-stream
    #[error("Event stream read failed: {0}")]
    Read(String),

    /// Server closed the stream
    #[error("Event stream closed by server")]
    Closed,

    /// Request could not be built
    #[error("Invalid event stream request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for LiveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LiveError::Timeout
        } else if err.is_connect() {
            LiveError::Unavailable(err.to_string())
        } else if err.is_body() || err.is_decode() {
            LiveError::Read(err.to_string())
        } else if err.is_builder() {
            LiveError::InvalidRequest(err.to_string())
        } else {
            LiveError::Unavailable(err.to_string())
        }
    }
}

/// Result type alias for live stream operations
pub type LiveResult<T> = Result<T, LiveError>;
