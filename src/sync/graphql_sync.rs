//! Single-resource GraphQL run controller.
//!
//! One page per invocation. A fresh run is admitted only when the bucket is
//! (almost) full and uses the default page size; a locked run sizes its page
//! from the previous run's cost via [`next_max_entries`].

use crate::clients::graphql::{next_max_entries, status_after_repay, RequestCost};
use crate::clients::Transport;
use crate::sync::{GraphqlContinuation, GraphqlSyncResource, SyncEngine, SyncError, SyncResult};

impl<T: Transport> SyncEngine<T> {
    /// Runs one page of a GraphQL sync.
    ///
    /// # Errors
    ///
    /// Returns terminal GraphQL errors (including the retry ceiling) and
    /// [`SyncError::InvalidPage`] for pages that claim a next page without a
    /// cursor.
    pub async fn sync_graphql<R>(
        &self,
        resource: &R,
        previous: Option<GraphqlContinuation>,
    ) -> Result<SyncResult<GraphqlContinuation>, SyncError>
    where
        R: GraphqlSyncResource + ?Sized,
    {
        let previous = previous.unwrap_or_default();

        let limit = if previous.lock {
            self.locked_limit(&previous)
        } else {
            if self.deferred().await? {
                return Ok(SyncResult {
                    rows: Vec::new(),
                    continuation: Some(GraphqlContinuation {
                        lock: false,
                        ..previous
                    }),
                });
            }
            self.settings.page_size
        };

        let request = resource.page_request(previous.cursor.as_deref(), limit, &previous.extra_data);
        let outcome = self.graphql().execute_with_retry(request).await?;
        let page = resource.parse_page(&outcome.response)?;

        if !page.has_next_page {
            tracing::debug!(rows = page.rows.len(), "GraphQL sync finished");
            return Ok(SyncResult::done(page.rows));
        }

        let cursor = page
            .end_cursor
            .ok_or_else(|| SyncError::invalid_page("hasNextPage without endCursor"))?;
        let used_limit = outcome.request.limit().unwrap_or(limit);
        tracing::debug!(
            rows = page.rows.len(),
            limit = used_limit,
            retries = outcome.retries,
            "GraphQL sync continues"
        );

        Ok(SyncResult {
            rows: page.rows,
            continuation: Some(GraphqlContinuation {
                cursor: Some(cursor),
                retries: outcome.retries,
                lock: true,
                last_cost: outcome.response.cost.or(previous.last_cost),
                last_max_entries_per_run: Some(used_limit),
                extra_data: previous.extra_data,
            }),
        })
    }

    /// Page size of a locked run, from the recorded cost after repayment.
    pub(crate) fn locked_limit_from(
        &self,
        last_cost: Option<&RequestCost>,
        last_limit: Option<u32>,
    ) -> u32 {
        match (last_cost, last_limit) {
            (Some(cost), Some(last_limit)) => next_max_entries(
                cost,
                last_limit,
                &status_after_repay(cost),
                self.settings.budget_cap,
                self.settings.hard_cap,
            ),
            _ => self.settings.page_size,
        }
    }

    fn locked_limit(&self, previous: &GraphqlContinuation) -> u32 {
        self.locked_limit_from(previous.last_cost.as_ref(), previous.last_max_entries_per_run)
    }
}
