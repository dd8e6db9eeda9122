//! GraphQL request executor and retry coordinator for the Admin API.
//!
//! # Overview
//!
//! - [`GraphqlClient`]: performs one call per [`execute`](GraphqlClient::execute),
//!   classifies the body and repays the reported cost.
//! - [`GraphqlClient::execute_with_retry`]: waits out throttling and shrinks
//!   over-budget requests, up to a retry ceiling.
//! - [`RequestCost`] / [`ThrottleStatus`] and the cost functions: the
//!   leaky-bucket arithmetic.
//! - [`GraphqlError`]: terminal and retryable failures.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_sync::clients::graphql::{GraphqlClient, GraphqlRequest};
//!
//! let client = GraphqlClient::new(&config);
//! let request = GraphqlRequest::new(
//!     "query Products($first: Int!) { products(first: $first) { nodes { id } } }",
//! )
//! .limit_variable("first", 50);
//!
//! let outcome = client.execute_with_retry(request).await?;
//! println!("{} retries, final limit {:?}", outcome.retries, outcome.request.limit());
//! ```

mod cache;
mod client;
mod cost;
mod errors;
mod request;
mod retry;

pub use cache::ResponseCache;
pub use client::{classify_response, GraphqlClient, GraphqlResponse};
pub use cost::{
    defer_delay, min_points_needed, next_max_entries, reduced_limit, repay_delay, repay_delay_ms,
    status_after_repay, RequestCost, ThrottleStatus,
};
pub use errors::{format_messages, GraphqlError};
pub use request::{CacheOptions, GraphqlRequest};
pub use retry::RetryOutcome;
