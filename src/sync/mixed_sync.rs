//! Mixed run controller: REST pages augmented with GraphQL metafields.
//!
//! REST and GraphQL paginate independently. A REST page is split into a
//! batch; each invocation either fetches a REST page and starts its batch, or
//! resumes the outstanding batch without touching REST. While a batch is
//! outstanding the REST next-page URL stays parked in
//! `scheduledNextRestUrl` and `nextUrl` keeps pointing at the page being
//! drained, so the REST cursor never moves past rows that still need
//! metafields. `skipNextRestSync` is set exactly when a batch is carried;
//! a continuation where the two disagree is rejected.

use serde_json::Value;

use crate::clients::Transport;
use crate::sync::engine::without_batch;
use crate::sync::metafields::{metafield_batch_request, parse_metafield_page, MetafieldPage};
use crate::sync::rest_sync::RestPointer;
use crate::sync::{
    CurrentBatch, ExtraData, MixedContinuation, RestSyncResource, Row, SyncEngine, SyncError,
    SyncResult,
};

impl<T: Transport> SyncEngine<T> {
    /// Runs one invocation of a mixed sync.
    ///
    /// Without metafield keys this is a plain REST sync. With keys, every REST
    /// row is emitted exactly once: augmented when GraphQL returned its node,
    /// unaugmented when the batch's GraphQL pages finished without it.
    ///
    /// # Errors
    ///
    /// REST and terminal GraphQL errors abort the invocation; no continuation
    /// is produced. A continuation whose `skip_next_rest_sync` disagrees with
    /// its batch is [`SyncError::InvalidContinuation`].
    pub async fn sync_mixed<R>(
        &self,
        resource: &R,
        previous: Option<MixedContinuation>,
    ) -> Result<SyncResult<MixedContinuation>, SyncError>
    where
        R: RestSyncResource + ?Sized,
    {
        let previous = previous.unwrap_or_default();
        if previous.skip_next_rest_sync != previous.extra_data.current_batch.is_some() {
            return Err(SyncError::InvalidContinuation {
                message: format!(
                    "skipNextRestSync is {} but extraData {} a currentBatch",
                    previous.skip_next_rest_sync,
                    if previous.skip_next_rest_sync { "has no" } else { "carries" }
                ),
            });
        }
        let keys = resource.metafield_keys();
        let with_metafields = !keys.is_empty();

        if with_metafields && !previous.lock && self.deferred().await? {
            return Ok(SyncResult {
                rows: Vec::new(),
                continuation: Some(MixedContinuation {
                    lock: false,
                    ..previous
                }),
            });
        }

        let limit = if previous.lock {
            self.locked_limit_from(previous.last_cost.as_ref(), previous.last_max_entries_per_run)
        } else {
            self.settings.page_size
        };

        let (batch, parked, cursor, drained_url, drained_query) =
            if let Some(batch) = previous.extra_data.current_batch.clone() {
                tracing::debug!(
                    processing = batch.processing.len(),
                    remaining = batch.remaining.len(),
                    "Resuming metafield batch"
                );
                (
                    batch,
                    previous.scheduled_next_rest_url.clone(),
                    previous.cursor.clone(),
                    previous.next_url.clone(),
                    previous.next_query.clone(),
                )
            } else {
                let url = previous
                    .next_url
                    .clone()
                    .or_else(|| previous.scheduled_next_rest_url.clone());
                let pointer = match (&url, &previous.next_query) {
                    (Some(url), _) => RestPointer::Url(url),
                    (None, Some(query)) => RestPointer::Query(query),
                    (None, None) => RestPointer::First,
                };
                let page = self
                    .fetch_rest_page(resource, pointer, &previous.extra_data)
                    .await?;

                if !with_metafields || page.rows.is_empty() {
                    return Ok(SyncResult {
                        rows: page.rows,
                        continuation: page.next_url.map(|next_url| MixedContinuation {
                            next_url: Some(next_url),
                            lock: with_metafields,
                            last_cost: previous.last_cost,
                            last_max_entries_per_run: previous.last_max_entries_per_run,
                            extra_data: without_batch(&previous.extra_data),
                            ..MixedContinuation::default()
                        }),
                    });
                }

                let query = if url.is_some() {
                    None
                } else {
                    previous.next_query.clone()
                };
                (
                    CurrentBatch::split(page.rows, usize_from(limit)),
                    page.next_url,
                    None,
                    url,
                    query,
                )
            };

        let mut batch = batch;
        let connection = resource.metafield_connection();
        let mut ids: Vec<String> = Vec::with_capacity(batch.processing.len());
        for id in batch.processing.iter().filter_map(|row| resource.row_id(row)) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let (page, outcome) = if ids.is_empty() {
            (MetafieldPage::default(), None)
        } else {
            let request = metafield_batch_request(connection, &ids, &keys, limit, cursor.as_deref());
            let outcome = self.graphql().execute_with_retry(request).await?;
            let page = parse_metafield_page(outcome.response.data(), connection)?;
            (page, Some(outcome))
        };

        let finished = !page.has_next_page;
        let mut rows = Vec::new();
        let mut newly_matched = Vec::new();
        for row in &batch.processing {
            let id = resource.row_id(row);
            let already_emitted = id.as_deref().is_some_and(|id| batch.is_matched(id));
            let fields = id.as_ref().and_then(|id| page.nodes.get(id));

            match (id, fields) {
                _ if already_emitted => {}
                (Some(id), Some(fields)) => {
                    rows.push(augment(row, fields, &keys));
                    newly_matched.push(id);
                }
                _ if finished => rows.push(row.clone()),
                _ => {}
            }
        }
        for id in page.nodes.keys().filter(|id| !ids.contains(*id)) {
            tracing::debug!(id = %id, "Ignoring metafields of a node outside the batch");
        }
        batch.matched_ids.extend(newly_matched);

        let (last_cost, retries, used_limit) = outcome.as_ref().map_or(
            (previous.last_cost, 0, limit),
            |outcome| {
                (
                    outcome.response.cost.or(previous.last_cost),
                    outcome.retries,
                    outcome.request.limit().unwrap_or(limit),
                )
            },
        );

        let next_batch = if finished {
            let next_limit = self.locked_limit_from(last_cost.as_ref(), Some(used_limit));
            batch.advance(usize_from(next_limit)).map(|batch| (batch, None))
        } else {
            let cursor = page
                .end_cursor
                .ok_or_else(|| SyncError::invalid_page("hasNextPage without endCursor"))?;
            Some((batch, Some(cursor)))
        };

        let values = previous.extra_data.values;
        let continuation = match next_batch {
            Some((batch, cursor)) => {
                tracing::debug!(
                    emitted = rows.len(),
                    processing = batch.processing.len(),
                    remaining = batch.remaining.len(),
                    parked = parked.is_some(),
                    "Metafield batch outstanding, REST pagination parked"
                );
                Some(MixedContinuation {
                    next_url: drained_url,
                    next_query: drained_query,
                    scheduled_next_rest_url: parked,
                    skip_next_rest_sync: true,
                    cursor,
                    retries,
                    lock: true,
                    last_cost,
                    last_max_entries_per_run: Some(used_limit),
                    extra_data: ExtraData {
                        current_batch: Some(batch),
                        values,
                    },
                })
            }
            None => {
                tracing::debug!(
                    emitted = rows.len(),
                    has_next_rest_page = parked.is_some(),
                    "Metafield batch drained"
                );
                parked.map(|next_url| MixedContinuation {
                    next_url: Some(next_url),
                    retries,
                    lock: true,
                    last_cost,
                    last_max_entries_per_run: Some(used_limit),
                    extra_data: ExtraData {
                        current_batch: None,
                        values,
                    },
                    ..MixedContinuation::default()
                })
            }
        };

        Ok(SyncResult { rows, continuation })
    }
}

/// Row with its metafields merged in; requested keys without a value are
/// `null`.
fn augment(row: &Row, fields: &Row, keys: &[String]) -> Row {
    let mut merged = row.clone();
    merged.extend(fields.iter().map(|(key, value)| (key.clone(), value.clone())));
    for key in keys {
        merged.entry(key.clone()).or_insert(Value::Null);
    }
    merged
}

fn usize_from(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}
