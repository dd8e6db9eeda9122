//! Shared fixtures for the integration tests: an in-memory shop and a few
//! resource façades.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use shopify_sync::clients::graphql::{GraphqlRequest, GraphqlResponse};
use shopify_sync::clients::{HttpError, HttpRequest, HttpResponse, HttpResponseError, Transport};
use shopify_sync::sync::{
    rows_at, ExtraData, GraphqlPage, GraphqlSyncResource, RestPageRequest, RestSyncResource,
    RestUpdateRequest, SyncEngine, SyncError, UpdatableResource,
};
use shopify_sync::{AccessToken, Row, ShopDomain, SyncConfig, SyncConfigBuilder};

pub const SHOP_URL: &str = "https://test-shop.myshopify.com/admin/api/2025-10";

/// Answers a GraphQL request body (`{"query": ..., "variables": ...}`).
pub type GraphqlHandler = Box<dyn Fn(&Value) -> Value + Send + Sync>;

/// A REST page served by [`FakeShop`].
#[derive(Clone, Debug)]
pub struct FakePage {
    pub body: Value,
    pub next_url: Option<String>,
}

/// In-memory transport. GraphQL goes to the handler; REST requests are
/// served from pages keyed by relative path or absolute URL, and unknown
/// keys answer 404.
pub struct FakeShop {
    graphql: GraphqlHandler,
    rest: Mutex<HashMap<String, FakePage>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl FakeShop {
    pub fn new(graphql: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self {
            graphql: Box::new(graphql),
            rest: Mutex::default(),
            sent: Mutex::default(),
        }
    }

    /// GraphQL answers only the throttle status query, with a full bucket.
    pub fn rest_only() -> Self {
        Self::new(|_| bucket(1000.0))
    }

    pub fn with_page(self, key: impl Into<String>, body: Value, next_url: Option<&str>) -> Self {
        self.rest.lock().insert(
            key.into(),
            FakePage {
                body,
                next_url: next_url.map(str::to_owned),
            },
        );
        self
    }

    /// Every request sent so far.
    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().clone()
    }

    /// Bodies of the GraphQL requests sent so far.
    pub fn graphql_bodies(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .filter(|request| request.path == "graphql.json")
            .filter_map(|request| request.body.clone())
            .collect()
    }

    /// Number of requests sent to `key`.
    pub fn hits(&self, key: &str) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|request| request.path == key)
            .count()
    }
}

impl Transport for FakeShop {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.sent.lock().push(request.clone());

        if request.path == "graphql.json" {
            let body = request.body.unwrap_or(Value::Null);
            return Ok(HttpResponse::ok((self.graphql)(&body)));
        }

        let page = self.rest.lock().get(&request.path).cloned();
        match page {
            Some(page) => {
                let mut response = HttpResponse::ok(page.body);
                response.pagination.next_url = page.next_url;
                Ok(response)
            }
            None => Err(HttpError::Response(HttpResponseError {
                code: 404,
                message: r#"{"errors":"Not Found"}"#.to_string(),
                error_reference: None,
            })),
        }
    }
}

pub fn config() -> SyncConfigBuilder {
    SyncConfig::builder()
        .shop(ShopDomain::new("test-shop").unwrap())
        .access_token(AccessToken::new("shpat_test").unwrap())
}

pub fn engine(shop: FakeShop, config: &SyncConfig) -> (SyncEngine<FakeShop>, Arc<FakeShop>) {
    let shop = Arc::new(shop);
    (SyncEngine::with_transport(Arc::clone(&shop), config), shop)
}

/// Response of the throttle status query with `available` points left.
pub fn bucket(available: f64) -> Value {
    json!({
        "data": {"shop": {"id": "gid://shopify/Shop/1"}},
        "extensions": {"cost": {
            "requestedQueryCost": 1,
            "actualQueryCost": 1,
            "throttleStatus": {
                "maximumAvailable": 1000.0,
                "currentlyAvailable": available,
                "restoreRate": 50.0
            }
        }}
    })
}

pub fn is_throttle_status_query(body: &Value) -> bool {
    body["query"]
        .as_str()
        .is_some_and(|query| query.contains("ThrottleStatus"))
}

/// Answers metafield searches by `id:`. Product 3 has no
/// metafields and product 4 no longer exists in GraphQL.
pub fn metafield_answer(body: &Value) -> Value {
    if is_throttle_status_query(body) {
        return bucket(1000.0);
    }

    let variables = &body["variables"];
    let matches: Vec<u64> = variables["query"]
        .as_str()
        .unwrap_or_default()
        .split(" OR ")
        .filter_map(|term| term.strip_prefix("id:"))
        .filter_map(|id| id.parse().ok())
        .filter(|id| *id != 4)
        .collect();
    let first = usize::try_from(variables["first"].as_u64().unwrap()).unwrap();
    let offset: usize = variables["after"]
        .as_str()
        .map_or(0, |cursor| cursor.parse().unwrap());
    let end = (offset + first).min(matches.len());

    let nodes: Vec<Value> = matches[offset..end]
        .iter()
        .map(|id| {
            let metafields = if *id == 3 {
                json!([])
            } else {
                json!([{
                    "namespace": "custom",
                    "key": "color",
                    "type": "single_line_text_field",
                    "value": format!("color-{id}")
                }])
            };
            json!({"id": format!("gid://shopify/Product/{id}"), "metafields": {"nodes": metafields}})
        })
        .collect();

    json!({
        "data": {"products": {
            "nodes": nodes,
            "pageInfo": {"hasNextPage": end < matches.len(), "endCursor": end.to_string()}
        }},
        "extensions": {"cost": {
            "requestedQueryCost": 10,
            "actualQueryCost": 10,
            "throttleStatus": {"maximumAvailable": 1000.0, "currentlyAvailable": 990.0, "restoreRate": 50.0}
        }}
    })
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

pub fn products(ids: impl IntoIterator<Item = u64>) -> Value {
    let products: Vec<Value> = ids
        .into_iter()
        .map(|id| json!({"id": id, "title": format!("Product {id}")}))
        .collect();
    json!({ "products": products })
}

/// Products over the GraphQL `products` connection.
pub struct ProductsConnection;

impl GraphqlSyncResource for ProductsConnection {
    fn page_request(&self, cursor: Option<&str>, limit: u32, _extra: &ExtraData) -> GraphqlRequest {
        GraphqlRequest::new(
            "query Products($first: Int!, $after: String) {
  products(first: $first, after: $after) {
    nodes { id title }
    pageInfo { hasNextPage endCursor }
  }
}",
        )
        .limit_variable("first", limit)
        .variable("after", cursor.map_or(Value::Null, Value::from))
    }

    fn parse_page(&self, response: &GraphqlResponse) -> Result<GraphqlPage, SyncError> {
        GraphqlPage::from_connection(response.data(), "products")
    }
}

/// Products over REST, optionally with metafields.
#[derive(Default)]
pub struct RestProducts {
    pub metafield_keys: Vec<String>,
}

impl RestProducts {
    pub fn with_metafields(keys: &[&str]) -> Self {
        Self {
            metafield_keys: keys.iter().map(|key| (*key).to_string()).collect(),
        }
    }
}

impl RestSyncResource for RestProducts {
    fn gid_type(&self) -> &str {
        "Product"
    }

    fn first_page_request(&self, _extra: &ExtraData) -> RestPageRequest {
        RestPageRequest::new("products.json").param("status", "active")
    }

    fn parse_rows(&self, body: &Value) -> Result<Vec<Row>, SyncError> {
        rows_at(body, "products")
    }

    fn metafield_keys(&self) -> Vec<String> {
        self.metafield_keys.clone()
    }

    fn metafield_connection(&self) -> &str {
        "products"
    }
}

impl UpdatableResource for RestProducts {
    fn update_request(&self, previous: &Row, changes: &Row) -> Result<RestUpdateRequest, SyncError> {
        let id = previous
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| SyncError::RowUpdate {
                id: "<unknown>".to_string(),
                message: "row has no numeric id".to_string(),
            })?;
        let mut product = changes.clone();
        product.insert("id".to_string(), json!(id));
        Ok(RestUpdateRequest {
            path: format!("products/{id}.json"),
            body: json!({ "product": product }),
        })
    }

    fn parse_updated_row(&self, body: &Value) -> Result<Row, SyncError> {
        body.get("product")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| SyncError::InvalidPage {
                message: "response has no 'product' object".to_string(),
            })
    }
}
