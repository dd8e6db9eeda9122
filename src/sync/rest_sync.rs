//! Single-resource REST run controller.
//!
//! One page per invocation, following `Link` next-page URLs verbatim.

use std::collections::BTreeMap;

use crate::clients::Transport;
use crate::sync::{
    ExtraData, RestContinuation, RestSyncResource, Row, SyncEngine, SyncError, SyncResult,
};

/// Where the next REST page comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RestPointer<'a> {
    /// The façade's first page.
    First,
    /// A `Link` next-page URL.
    Url(&'a str),
    /// The façade's first-page path with this query.
    Query(&'a BTreeMap<String, String>),
}

/// One fetched REST page.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RestPage {
    pub(crate) rows: Vec<Row>,
    pub(crate) next_url: Option<String>,
}

impl<T: Transport> SyncEngine<T> {
    /// Runs one page of a REST sync.
    ///
    /// # Errors
    ///
    /// Returns REST errors and [`SyncError::InvalidPage`] for bodies the
    /// façade cannot parse.
    pub async fn sync_rest<R>(
        &self,
        resource: &R,
        previous: Option<RestContinuation>,
    ) -> Result<SyncResult<RestContinuation>, SyncError>
    where
        R: RestSyncResource + ?Sized,
    {
        let previous = previous.unwrap_or_default();
        let url = previous
            .next_url
            .as_deref()
            .or(previous.scheduled_next_rest_url.as_deref());
        let pointer = match (url, &previous.next_query) {
            (Some(url), _) => RestPointer::Url(url),
            (None, Some(query)) => RestPointer::Query(query),
            (None, None) => RestPointer::First,
        };

        let page = self
            .fetch_rest_page(resource, pointer, &previous.extra_data)
            .await?;

        Ok(SyncResult {
            rows: page.rows,
            continuation: page.next_url.map(|next_url| RestContinuation {
                next_url: Some(next_url),
                extra_data: previous.extra_data,
                ..RestContinuation::default()
            }),
        })
    }

    pub(crate) async fn fetch_rest_page<R>(
        &self,
        resource: &R,
        pointer: RestPointer<'_>,
        extra: &ExtraData,
    ) -> Result<RestPage, SyncError>
    where
        R: RestSyncResource + ?Sized,
    {
        let response = match pointer {
            RestPointer::Url(url) => self.rest().get_url(url).await?,
            RestPointer::Query(query) => {
                let first = resource.first_page_request(extra);
                self.rest().get(&first.path, Some(query.clone())).await?
            }
            RestPointer::First => {
                let mut first = resource.first_page_request(extra);
                first
                    .query
                    .entry("limit".to_string())
                    .or_insert_with(|| self.settings.rest_page_size.to_string());
                self.rest().get(&first.path, Some(first.query)).await?
            }
        };

        let rows = resource.parse_rows(&response.body)?;
        tracing::debug!(
            rows = rows.len(),
            has_next_page = response.pagination.has_next_page(),
            "REST page fetched"
        );

        Ok(RestPage {
            rows,
            next_url: response.pagination.next_url,
        })
    }
}
