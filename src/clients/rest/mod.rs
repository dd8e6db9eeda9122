//! REST API client for the Shopify Admin API.
//!
//! The sync engine uses REST for primary page fetches and row updates:
//!
//! - [`RestClient::get`]: first pages, with a `limit` and façade filters
//! - [`RestClient::get_url`]: follows a `Link` next-page URL verbatim
//! - [`RestClient::put`]: row updates
//!
//! 429 and 500 responses are retried by the transport up to the configured
//! `rest_tries`.

mod client;
mod errors;

pub use client::{normalize_path, RestClient};
pub use errors::RestError;
