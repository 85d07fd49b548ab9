//! Internal helpers for mapping HTTP/reqwest errors to [`EternalError`].

use saga_types::EternalError;

/// Map a non-2xx HTTP status to an [`EternalError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> EternalError {
    EternalError::Http {
        status: status.as_u16(),
        body: body.to_string(),
    }
}

/// Map a [`reqwest::Error`] to an [`EternalError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> EternalError {
    EternalError::Network(Box::new(err))
}
