//! Bounded, resumable sync runs.
//!
//! Each call of a controller does one bounded unit of work and returns the
//! rows it produced plus a continuation. The host stores the continuation
//! and calls back with it until none is returned.
//!
//! # Overview
//!
//! - [`SyncEngine::sync_graphql`]: one GraphQL page per run, sized to the
//!   cost budget
//! - [`SyncEngine::sync_rest`]: one REST page per run
//! - [`SyncEngine::sync_mixed`]: REST pages augmented with metafields fetched
//!   in GraphQL batches
//! - [`SyncEngine::sync_update`]: row-by-row write-back
//! - [`SyncEngine::execute_sync`]: the same runs with host-encoded
//!   continuations
//!
//! Resource façades plug in through [`GraphqlSyncResource`],
//! [`RestSyncResource`] and [`UpdatableResource`].

mod batch;
mod continuation;
mod engine;
mod errors;
mod gid;
mod graphql_sync;
mod metafields;
mod mixed_sync;
mod resource;
mod rest_sync;
mod update;

pub use batch::CurrentBatch;
pub use continuation::{
    Continuation, ExtraData, GraphqlContinuation, MixedContinuation, RestContinuation,
};
pub use engine::{HostSyncResult, SyncEngine, SyncJob, SyncResult};
pub use errors::SyncError;
pub use gid::{graphql_gid, id_from_gid, normalize_gid};
pub use metafields::{
    id_search_query, metafield_batch_request, metafields_delete_request, metafields_set_request,
    parse_metafield_page, MetafieldPage, METAFIELD_LIMIT_VARIABLE,
};
pub use resource::{
    rows_at, GraphqlPage, GraphqlSyncResource, RestPageRequest, RestSyncResource,
    RestUpdateRequest, Row, UpdatableResource,
};
pub use update::{changed_fields, RowUpdate};
