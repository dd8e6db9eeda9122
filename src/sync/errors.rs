//! Errors surfaced by the sync controllers.
//!
//! Throttling and cost-exceeded rejections are resolved by the retry
//! coordinator before a controller sees them, so a [`SyncError`] only ever
//! carries terminal GraphQL errors.

use thiserror::Error;

use crate::clients::graphql::GraphqlError;
use crate::clients::rest::RestError;

/// Error type for sync runs and sync updates.
///
/// # Example
///
/// ```rust
/// use shopify_sync::sync::SyncError;
///
/// let error = SyncError::InvalidContinuation {
///     message: "unknown kind 'ftp'".to_string(),
/// };
/// assert!(error.to_string().contains("ftp"));
/// ```
#[derive(Debug, Error)]
pub enum SyncError {
    /// A terminal GraphQL error.
    #[error(transparent)]
    Graphql(#[from] GraphqlError),

    /// A REST error.
    #[error(transparent)]
    Rest(#[from] RestError),

    /// The host handed back a continuation that cannot be decoded, or one of
    /// the wrong kind for the job.
    #[error("Invalid continuation: {message}")]
    InvalidContinuation {
        /// What was wrong with it.
        message: String,
    },

    /// A page body did not have the shape the resource expects.
    #[error("Invalid page: {message}")]
    InvalidPage {
        /// What was missing or malformed.
        message: String,
    },

    /// A row could not be written back.
    #[error("Failed to update row {id}: {message}")]
    RowUpdate {
        /// Identifier of the row, or `<unknown>`.
        id: String,
        /// Why the update failed.
        message: String,
    },
}

impl SyncError {
    /// Shorthand for [`SyncError::InvalidPage`].
    #[must_use]
    pub fn invalid_page(message: impl Into<String>) -> Self {
        Self::InvalidPage {
            message: message.into(),
        }
    }
}
