//! REST-specific error types.
//!
//! - [`RestError::InvalidPath`]: a path was empty after normalization, or a
//!   next-page link was not an absolute URL
//! - [`RestError::Http`]: wraps underlying HTTP errors

use crate::clients::HttpError;
use thiserror::Error;

/// Error type for REST API operations.
///
/// # Example
///
/// ```rust
/// use shopify_sync::clients::rest::RestError;
///
/// let error = RestError::InvalidPath { path: "".to_string() };
/// assert!(error.to_string().contains("Invalid"));
/// ```
#[derive(Debug, Error)]
pub enum RestError {
    /// The REST API path is invalid.
    #[error("Invalid REST API path: {path}")]
    InvalidPath {
        /// The invalid path that was provided.
        path: String,
    },

    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{HttpResponseError, MaxHttpRetriesExceededError};

    #[test]
    fn test_invalid_path_error_includes_path_in_message() {
        let error = RestError::InvalidPath {
            path: "/invalid/path".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid REST API path: /invalid/path");
    }

    #[test]
    fn test_http_error_wraps_http_response_error() {
        let rest_error: RestError = HttpError::Response(HttpResponseError {
            code: 404,
            message: r#"{"errors":"Not Found"}"#.to_string(),
            error_reference: Some("abc-123".to_string()),
        })
        .into();

        assert!(matches!(rest_error, RestError::Http(_)));
        assert!(rest_error.to_string().contains("Not Found"));
    }

    #[test]
    fn test_http_error_wraps_max_retries_exceeded() {
        let rest_error = RestError::Http(HttpError::MaxRetries(MaxHttpRetriesExceededError {
            code: 429,
            tries: 3,
            message: r#"{"errors":"Exceeded 2 calls per second for api client"}"#.to_string(),
            error_reference: None,
        }));
        let message = rest_error.to_string();

        assert!(message.contains("Exceeded maximum retry count of 3"));
    }
}
