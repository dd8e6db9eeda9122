//! HTTP client types for Shopify Admin API communication.
//!
//! # Overview
//!
//! - [`Transport`]: the seam every higher-level client sends through
//! - [`HttpClient`]: the reqwest-backed transport
//! - [`HttpRequest`] / [`HttpResponse`]: one call and its parsed result
//! - [`graphql::GraphqlClient`]: GraphQL executor and retry coordinator
//! - [`rest::RestClient`]: REST page fetches and updates
//!
//! # Retry Behavior
//!
//! The transport retries only HTTP-level failures:
//!
//! - **429 (Rate Limited)**: Retries using `Retry-After` header value, or 1 second if not present
//! - **500 (Server Error)**: Retries with fixed 1-second delay
//! - **Other errors (4xx)**: Returns immediately without retry
//!
//! The default `tries` is 1. GraphQL throttling arrives with HTTP 200 and is
//! handled by [`graphql::GraphqlClient::execute_with_retry`] instead.

mod errors;
pub mod graphql;
mod http_client;
mod http_request;
mod http_response;
pub mod rest;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, Transport, RETRY_WAIT_TIME, SDK_VERSION};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{ApiCallLimit, HttpResponse, PaginationInfo};

pub use graphql::{GraphqlClient, GraphqlError};
pub use rest::{RestClient, RestError};
