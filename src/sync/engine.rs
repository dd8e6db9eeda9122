//! The sync engine and its host-facing entry point.

use std::sync::Arc;
use std::time::Duration;

use crate::clients::graphql::{defer_delay, GraphqlClient, GraphqlError};
use crate::clients::rest::RestClient;
use crate::clients::{HttpClient, Transport};
use crate::config::SyncConfig;
use crate::sync::{
    Continuation, ExtraData, GraphqlSyncResource, RestSyncResource, Row, SyncError,
};

/// Rows of one run plus the continuation for the next, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncResult<C = Continuation> {
    /// Rows produced by this run.
    pub rows: Vec<Row>,
    /// Present iff more work remains.
    pub continuation: Option<C>,
}

impl<C> SyncResult<C> {
    /// A run that produced `rows` and is the last one.
    #[must_use]
    pub const fn done(rows: Vec<Row>) -> Self {
        Self {
            rows,
            continuation: None,
        }
    }

    /// Converts the continuation into another type.
    #[must_use]
    pub fn map_continuation<D>(self, f: impl FnOnce(C) -> D) -> SyncResult<D> {
        SyncResult {
            rows: self.rows,
            continuation: self.continuation.map(f),
        }
    }
}

/// What the host asks [`SyncEngine::execute_sync`] to run.
#[derive(Clone, Copy)]
pub enum SyncJob<'a> {
    /// A GraphQL connection.
    Graphql(&'a dyn GraphqlSyncResource),
    /// REST pages only.
    Rest(&'a dyn RestSyncResource),
    /// REST pages augmented with the façade's metafields.
    Mixed(&'a dyn RestSyncResource),
}

impl SyncJob<'_> {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Graphql(_) => "graphql",
            Self::Rest(_) => "rest",
            Self::Mixed(_) => "mixed",
        }
    }
}

/// Host-encoded result of [`SyncEngine::execute_sync`].
#[derive(Clone, Debug, PartialEq)]
pub struct HostSyncResult {
    /// Rows produced by this run.
    pub rows: Vec<Row>,
    /// Host-encoded continuation, present iff more work remains.
    pub continuation: Option<String>,
}

/// Settings the controllers read from [`SyncConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SyncSettings {
    pub(crate) budget_cap: f64,
    pub(crate) page_size: u32,
    pub(crate) hard_cap: u32,
    pub(crate) rest_page_size: u32,
    pub(crate) defer_delay: Duration,
}

/// Runs bounded sync work against one shop.
///
/// One engine serves any number of jobs; all job state lives in the
/// continuations.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_sync::sync::{SyncEngine, SyncJob};
///
/// let engine = SyncEngine::new(&config);
/// let mut continuation = None;
/// loop {
///     let result = engine
///         .execute_sync(SyncJob::Mixed(&products), continuation.as_deref())
///         .await?;
///     store(result.rows);
///     continuation = result.continuation;
///     if continuation.is_none() {
///         break;
///     }
/// }
/// ```
#[derive(Debug)]
pub struct SyncEngine<T = HttpClient> {
    graphql: GraphqlClient<Arc<T>>,
    rest: RestClient<Arc<T>>,
    pub(crate) settings: SyncSettings,
}

// Verify SyncEngine is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SyncEngine>();
};

impl SyncEngine<HttpClient> {
    /// Creates an engine that talks to the configured shop over HTTP.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        let base_path = format!("/admin/api/{}", config.api_version());
        Self::with_transport(Arc::new(HttpClient::new(base_path, config)), config)
    }
}

impl<T: Transport> SyncEngine<T> {
    /// Creates an engine on top of a shared transport.
    #[must_use]
    pub fn with_transport(transport: Arc<T>, config: &SyncConfig) -> Self {
        Self {
            graphql: GraphqlClient::with_transport(Arc::clone(&transport), config),
            rest: RestClient::with_transport(transport, config),
            settings: SyncSettings {
                budget_cap: config.graphql_budget_cap(),
                page_size: config.graphql_page_size(),
                hard_cap: config.graphql_hard_cap(),
                rest_page_size: config.rest_page_size(),
                defer_delay: config.defer_delay(),
            },
        }
    }

    /// The GraphQL client.
    #[must_use]
    pub const fn graphql(&self) -> &GraphqlClient<Arc<T>> {
        &self.graphql
    }

    /// The REST client.
    #[must_use]
    pub const fn rest(&self) -> &RestClient<Arc<T>> {
        &self.rest
    }

    /// Runs one invocation of a job with a host-encoded continuation.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidContinuation`] if `previous` cannot be
    /// decoded or belongs to another kind of job, and any error of the
    /// controller. No continuation is produced on error.
    pub async fn execute_sync(
        &self,
        job: SyncJob<'_>,
        previous: Option<&str>,
    ) -> Result<HostSyncResult, SyncError> {
        let previous = previous
            .filter(|encoded| !encoded.trim().is_empty())
            .map(Continuation::from_host)
            .transpose()?;

        let result: SyncResult = match (job, previous) {
            (SyncJob::Graphql(resource), None) => self
                .sync_graphql(resource, None)
                .await?
                .map_continuation(Continuation::from),
            (SyncJob::Graphql(resource), Some(Continuation::Graphql(c))) => self
                .sync_graphql(resource, Some(c))
                .await?
                .map_continuation(Continuation::from),
            (SyncJob::Rest(resource), None) => self
                .sync_rest(resource, None)
                .await?
                .map_continuation(Continuation::from),
            (SyncJob::Rest(resource), Some(Continuation::Rest(c))) => self
                .sync_rest(resource, Some(c))
                .await?
                .map_continuation(Continuation::from),
            (SyncJob::Mixed(resource), None) => self
                .sync_mixed(resource, None)
                .await?
                .map_continuation(Continuation::from),
            (SyncJob::Mixed(resource), Some(Continuation::Mixed(c))) => self
                .sync_mixed(resource, Some(c))
                .await?
                .map_continuation(Continuation::from),
            (job, Some(other)) => {
                return Err(SyncError::InvalidContinuation {
                    message: format!(
                        "a {} job cannot resume from a {} continuation",
                        job.kind(),
                        kind_of(&other)
                    ),
                });
            }
        };

        Ok(HostSyncResult {
            rows: result.rows,
            continuation: result
                .continuation
                .as_ref()
                .map(Continuation::to_host)
                .transpose()?,
        })
    }

    /// Admission control for unlocked runs: sleeps the defer and returns
    /// `true` when the bucket is not (almost) full.
    ///
    /// A throttled status query means the bucket is drained, so the run is
    /// deferred rather than failed.
    pub(crate) async fn deferred(&self) -> Result<bool, SyncError> {
        let fixed = self.settings.defer_delay;
        let (status, defer) = match self.graphql.throttle_status().await {
            Ok(status) => (Some(status), defer_delay(&status, fixed)),
            Err(GraphqlError::Throttled { cost }) => (cost.map(|cost| cost.throttle_status), fixed),
            Err(error) => return Err(error.into()),
        };
        if defer.is_zero() {
            return Ok(false);
        }

        tracing::info!(
            currently_available = status.map(|s| s.currently_available),
            maximum_available = status.map(|s| s.maximum_available),
            defer_ms = u64::try_from(defer.as_millis()).unwrap_or(u64::MAX),
            "Deferring sync run until the GraphQL bucket refills"
        );
        tokio::time::sleep(defer).await;
        Ok(true)
    }
}

const fn kind_of(continuation: &Continuation) -> &'static str {
    match continuation {
        Continuation::Rest(_) => "rest",
        Continuation::Graphql(_) => "graphql",
        Continuation::Mixed(_) => "mixed",
    }
}

/// Façade state without the batch.
pub(crate) fn without_batch(extra: &ExtraData) -> ExtraData {
    ExtraData {
        current_batch: None,
        values: extra.values.clone(),
    }
}
