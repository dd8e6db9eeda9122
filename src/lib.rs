//! # Shopify Sync
//!
//! A cost-aware, resumable sync engine for the Shopify Admin GraphQL and REST
//! APIs.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`SyncConfig`] and [`SyncConfigBuilder`]
//! - Validated newtypes for credentials and domain values
//! - An async HTTP transport with retry logic for 429/500 responses
//! - A GraphQL executor that understands the leaky-bucket cost envelope,
//!   waits out throttling and shrinks over-budget requests
//! - Sync controllers that do one bounded unit of work per invocation and
//!   hand back a continuation for the next
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_sync::{AccessToken, ApiVersion, ShopDomain, SyncConfig};
//!
//! let config = SyncConfig::builder()
//!     .shop(ShopDomain::new("my-store").unwrap())
//!     .access_token(AccessToken::new("shpat_123").unwrap())
//!     .api_version(ApiVersion::latest())
//!     .graphql_page_size(100)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.graphql_page_size(), 100);
//! ```
//!
//! ## Running a Sync
//!
//! ```rust,ignore
//! use shopify_sync::sync::{SyncEngine, SyncJob};
//!
//! let engine = SyncEngine::new(&config);
//!
//! // The host calls this once per invocation, persisting the continuation.
//! let result = engine
//!     .execute_sync(SyncJob::Mixed(&products), stored_continuation.as_deref())
//!     .await?;
//!
//! save_rows(result.rows);
//! match result.continuation {
//!     Some(next) => schedule_next_invocation(next),
//!     None => println!("sync complete"),
//! }
//! ```
//!
//! ## Cost Model
//!
//! Every GraphQL response reports `requestedQueryCost`, `actualQueryCost`
//! and the bucket's `throttleStatus`. After each uncached call the executor
//! sleeps long enough to repay what was spent, and locked runs size their
//! next page to the points they can afford. See [`clients::graphql`].
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all public types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime
//! - **Stateless runs**: everything a job needs between runs is in its continuation

pub mod clients;
pub mod config;
pub mod error;
pub mod sync;

pub use config::{
    AccessToken, ApiVersion, HostUrl, ShopDomain, SyncConfig, SyncConfigBuilder,
};
pub use error::ConfigError;

pub use clients::{
    DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, Transport,
};
pub use clients::{GraphqlClient, GraphqlError, RestClient, RestError};

pub use sync::{Continuation, Row, SyncEngine, SyncError, SyncJob, SyncResult};
