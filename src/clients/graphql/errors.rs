//! GraphQL-specific error types.
//!
//! GraphQL reports most failures with HTTP 200 and an `errors` array, so the
//! client classifies the body itself:
//!
//! - [`GraphqlError::UserErrors`]: validation or input problems. Terminal.
//! - [`GraphqlError::Throttled`] and [`GraphqlError::CostExceeded`]: the bucket
//!   or per-query ceiling was hit. Retried by
//!   [`GraphqlClient::execute_with_retry`](crate::clients::graphql::GraphqlClient::execute_with_retry)
//!   and never returned from it.
//! - [`GraphqlError::MaxRetries`]: the retry ceiling was reached.
//! - [`GraphqlError::Http`]: transport failures, passed through unchanged.

use thiserror::Error;

use crate::clients::graphql::RequestCost;
use crate::clients::HttpError;

/// Error type for GraphQL API operations.
///
/// # Example
///
/// ```rust
/// use shopify_sync::clients::graphql::GraphqlError;
///
/// let error = GraphqlError::UserErrors {
///     messages: vec!["Title can't be blank".to_string()],
/// };
/// assert_eq!(error.to_string(), "Title can't be blank");
/// assert!(!error.is_retryable());
/// ```
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The request was rejected for user-actionable reasons.
    #[error("{}", format_messages(.messages))]
    UserErrors {
        /// Deduplicated messages, in response order.
        messages: Vec<String>,
    },

    /// The shop's bucket did not have enough points.
    #[error("Throttled")]
    Throttled {
        /// Cost envelope of the rejected request, if the server sent one.
        cost: Option<RequestCost>,
    },

    /// The request costs more than the single-query ceiling.
    #[error("Query cost is {cost}, which exceeds the single query max cost limit ({max_cost}).")]
    CostExceeded {
        /// Computed cost of the request.
        cost: f64,
        /// Single-query ceiling.
        max_cost: f64,
    },

    /// Retries were exhausted.
    #[error("Exceeded maximum retry count of {max_retries}. Last error: {last_error}")]
    MaxRetries {
        /// The ceiling that was reached.
        max_retries: u32,
        /// The retryable error seen last.
        last_error: Box<GraphqlError>,
    },

    /// The response body did not have the expected shape.
    #[error("Invalid GraphQL response: {message}")]
    InvalidResponse {
        /// What was missing or malformed.
        message: String,
    },
}

impl GraphqlError {
    /// Returns `true` for throttling and cost-exceeded errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled { .. } | Self::CostExceeded { .. })
    }

    /// Builds [`GraphqlError::UserErrors`] with deduplicated messages.
    #[must_use]
    pub fn user_errors<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for message in messages {
            let message = message.into();
            if !unique.contains(&message) {
                unique.push(message);
            }
        }
        Self::UserErrors { messages: unique }
    }
}

/// Renders error messages for display: one message as-is, several as a
/// bulleted list.
#[must_use]
pub fn format_messages(messages: &[String]) -> String {
    match messages {
        [] => "Unknown GraphQL error".to_string(),
        [single] => single.clone(),
        many => many
            .iter()
            .map(|message| format!("• {message}"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
