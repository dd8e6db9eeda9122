//! Capabilities a resource façade provides to the sync controllers.
//!
//! Façades (products, collections, customers, ...) build requests and map
//! bodies to rows; the engine executes the requests, paginates and keeps the
//! cost budget. A façade is usually constructed per job so it can carry the
//! job's parameters (filters, requested metafields).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::clients::graphql::{GraphqlRequest, GraphqlResponse};
use crate::sync::{normalize_gid, ExtraData, SyncError};

/// One synced record, keyed by field name. Metafields use `namespace.key`.
pub type Row = serde_json::Map<String, Value>;

/// One parsed GraphQL page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphqlPage {
    /// Rows of the page.
    pub rows: Vec<Row>,
    /// `pageInfo.hasNextPage`.
    pub has_next_page: bool,
    /// `pageInfo.endCursor`.
    pub end_cursor: Option<String>,
}

impl GraphqlPage {
    /// Parses a connection at `data.<connection>` with `nodes` (or `edges`)
    /// and `pageInfo`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPage`] if the connection is missing.
    pub fn from_connection(data: &Value, connection: &str) -> Result<Self, SyncError> {
        let connection_value = data
            .get(connection)
            .filter(|value| value.is_object())
            .ok_or_else(|| SyncError::invalid_page(format!("missing connection '{connection}'")))?;

        let nodes: Vec<&Value> = if let Some(nodes) =
            connection_value.get("nodes").and_then(Value::as_array)
        {
            nodes.iter().collect()
        } else if let Some(edges) = connection_value.get("edges").and_then(Value::as_array) {
            edges.iter().filter_map(|edge| edge.get("node")).collect()
        } else {
            return Err(SyncError::invalid_page(format!(
                "connection '{connection}' has neither nodes nor edges"
            )));
        };

        let rows = nodes
            .into_iter()
            .filter_map(|node| node.as_object().cloned())
            .collect();
        let page_info = connection_value.get("pageInfo");
        let has_next_page = page_info
            .and_then(|info| info.get("hasNextPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let end_cursor = page_info
            .and_then(|info| info.get("endCursor"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        Ok(Self {
            rows,
            has_next_page,
            end_cursor,
        })
    }
}

/// First-page REST request of a façade. The engine adds `limit` unless the
/// façade set one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestPageRequest {
    /// Path relative to `/admin/api/{version}`, e.g. `products.json`.
    pub path: String,
    /// Filters.
    pub query: BTreeMap<String, String>,
}

impl RestPageRequest {
    /// Creates a request without filters.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// REST write of one row.
#[derive(Clone, Debug, PartialEq)]
pub struct RestUpdateRequest {
    /// Path relative to `/admin/api/{version}`, e.g. `products/1.json`.
    pub path: String,
    /// JSON body of the PUT.
    pub body: Value,
}

/// A resource synced through a GraphQL connection.
pub trait GraphqlSyncResource: Send + Sync {
    /// Request for one page after `cursor`, with `limit` in its limit
    /// variable.
    fn page_request(&self, cursor: Option<&str>, limit: u32, extra: &ExtraData) -> GraphqlRequest;

    /// Maps a response to rows and page info.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPage`] for unexpected bodies.
    fn parse_page(&self, response: &GraphqlResponse) -> Result<GraphqlPage, SyncError>;
}

/// A resource synced through REST pages, optionally augmented with
/// metafields fetched over GraphQL.
pub trait RestSyncResource: Send + Sync {
    /// GraphQL type name used for GIDs, e.g. `Product`.
    fn gid_type(&self) -> &str;

    /// First-page request.
    fn first_page_request(&self, extra: &ExtraData) -> RestPageRequest;

    /// Maps a REST body to rows.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPage`] for unexpected bodies.
    fn parse_rows(&self, body: &Value) -> Result<Vec<Row>, SyncError>;

    /// Normalized GID of a row, used to match GraphQL nodes.
    fn row_id(&self, row: &Row) -> Option<String> {
        row.get("id").and_then(|id| normalize_gid(self.gid_type(), id))
    }

    /// Metafields (`namespace.key`) to fetch for every row. Empty disables the
    /// GraphQL phase.
    fn metafield_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// GraphQL connection that can be filtered by `id:` search, e.g.
    /// `products`.
    fn metafield_connection(&self) -> &str;
}

/// A REST resource whose rows can be written back.
pub trait UpdatableResource: RestSyncResource {
    /// PUT request for the changed non-metafield fields of `previous`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RowUpdate`] when the row cannot be addressed.
    fn update_request(&self, previous: &Row, changes: &Row) -> Result<RestUpdateRequest, SyncError>;

    /// Maps the PUT response to the updated row.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPage`] for unexpected bodies.
    fn parse_updated_row(&self, body: &Value) -> Result<Row, SyncError>;

    /// GID owning the row's metafields.
    fn owner_gid(&self, row: &Row) -> Option<String> {
        self.row_id(row)
    }

    /// Metafield type for `namespace.key`, when no definition exists.
    fn metafield_type(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Reads an array of row objects at `body.<key>`.
///
/// # Errors
///
/// Returns [`SyncError::InvalidPage`] if the key is missing or not an array.
pub fn rows_at(body: &Value, key: &str) -> Result<Vec<Row>, SyncError> {
    body.get(key)
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.as_object().cloned())
                .collect()
        })
        .ok_or_else(|| SyncError::invalid_page(format!("response has no '{key}' array")))
}
