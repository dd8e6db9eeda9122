//! Transport-level error types.
//!
//! These are the *infrastructure* errors of the sync engine: non-2xx
//! responses, exhausted transport retries, malformed requests and network
//! failures. The engine never retries them on its own beyond the
//! per-request `tries` budget; they propagate to the caller unchanged.

use thiserror::Error;

/// A non-successful HTTP response.
///
/// `message` holds a JSON rendering of the `errors`/`error` fields of the
/// body, plus an `error_reference` naming the `X-Request-Id`.
///
/// # Example
///
/// ```rust
/// use shopify_sync::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     code: 404,
///     message: r#"{"errors":"Not Found"}"#.to_string(),
///     error_reference: Some("abc-123".to_string()),
/// };
/// assert_eq!(error.to_string(), r#"{"errors":"Not Found"}"#);
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Serialized error message in JSON format.
    pub message: String,
    /// Reference ID for error reporting (from `X-Request-Id`).
    pub error_reference: Option<String>,
}

/// Returned when a request kept failing with 429 or 500 for all of its tries.
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries}. Last message: {message}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// Serialized error message from the last response.
    pub message: String,
    /// Reference ID for error reporting (from `X-Request-Id`).
    pub error_reference: Option<String>,
}

/// Returned before sending when a request is malformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A request body was provided without specifying the body type.
    #[error("Cannot set a body without also setting body_type.")]
    MissingBodyType,

    /// A POST or PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// An absolute URL does not point at the configured origin.
    #[error("Refusing to follow '{url}': it does not belong to {origin}.")]
    ForeignUrl {
        /// The rejected URL.
        url: String,
        /// The origin requests are allowed to go to.
        origin: String,
    },
}

/// Unified transport error.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Transport tries exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl HttpError {
    /// Returns the HTTP status code carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::MaxRetries(e) => Some(e.code),
            Self::InvalidRequest(_) | Self::Network(_) => None,
        }
    }
}
