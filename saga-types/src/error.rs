//! Error types shared across the saga crates.

/// Errors from the generation backend client.
///
/// Malformed individual stream lines are not represented here: the stream
/// decoder logs and drops them without surfacing anything to the caller.
#[derive(Debug, thiserror::Error)]
pub enum EternalError {
    /// No API key was supplied. Failed fast; no request was sent.
    #[error("no API key configured")]
    MissingCredential,
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Network-level error (connection reset, DNS failure, etc.).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A 2xx response whose body could not be parsed.
    #[error("malformed response body: {0}")]
    InvalidResponse(String),
    /// The submit call succeeded but returned no job identifier.
    #[error("submit returned no request_id")]
    NoRequestId,
    /// The backend reported the job as failed.
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    /// The backend reported success without any usable result URL.
    #[error("success reported but no result URL present")]
    MissingResultUrl,
    /// The poll attempt budget was exhausted without a terminal status.
    #[error("timed out after {attempts} poll attempts")]
    Timeout {
        /// Number of attempts consumed.
        attempts: u32,
    },
    /// The operation was cancelled via its cancellation token.
    #[error("cancelled")]
    Cancelled,
}

impl EternalError {
    /// Whether this error is transient from the poller's point of view.
    ///
    /// Transient errors consume a poll attempt and are retried within the
    /// attempt budget; everything else terminates the workflow.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Http { .. } | Self::InvalidResponse(_)
        )
    }
}
