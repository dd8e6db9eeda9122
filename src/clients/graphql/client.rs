//! GraphQL request executor for the Shopify Admin API.
//!
//! [`GraphqlClient::execute`] performs exactly one call, classifies the body
//! and, on success, waits out the repay delay of the reported cost before
//! returning.

use crate::clients::graphql::{
    repay_delay, GraphqlError, GraphqlRequest, RequestCost, ResponseCache,
    ThrottleStatus,
};
use crate::clients::{DataType, HttpClient, HttpMethod, HttpRequest, Transport};
use crate::config::{ApiVersion, SyncConfig, DEFAULT_GRAPHQL_HARD_CAP, DEFAULT_MAX_RETRIES};

const THROTTLE_STATUS_QUERY: &str = "query ThrottleStatus { shop { id } }";

/// A classified, successful GraphQL response.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphqlResponse {
    /// Full response body.
    pub body: serde_json::Value,
    /// Cost envelope, when the server reported one.
    pub cost: Option<RequestCost>,
    /// `true` when served from the response cache.
    pub from_cache: bool,
}

impl GraphqlResponse {
    /// The `data` object (JSON `null` if absent).
    #[must_use]
    pub fn data(&self) -> &serde_json::Value {
        self.body.get("data").unwrap_or(&serde_json::Value::Null)
    }
}

/// GraphQL API client for the Shopify Admin API.
///
/// Generic over the [`Transport`] so tests can script responses.
///
/// # Example
///
/// ```rust
/// use shopify_sync::{AccessToken, ShopDomain, SyncConfig};
/// use shopify_sync::clients::graphql::GraphqlClient;
///
/// let config = SyncConfig::builder()
///     .shop(ShopDomain::new("my-store").unwrap())
///     .access_token(AccessToken::new("shpat_123").unwrap())
///     .build()
///     .unwrap();
///
/// let client = GraphqlClient::new(&config);
/// assert_eq!(client.max_retries(), 5);
/// ```
#[derive(Debug)]
pub struct GraphqlClient<T = HttpClient> {
    transport: T,
    api_version: ApiVersion,
    cache: ResponseCache,
    max_retries: u32,
    hard_cap: u32,
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient<HttpClient> {
    /// Creates a client that talks to the configured shop over HTTP.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        let base_path = format!("/admin/api/{}", config.api_version());
        Self::with_transport(HttpClient::new(base_path, config), config)
    }
}

impl<T: Transport> GraphqlClient<T> {
    /// Creates a client on top of an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: T, config: &SyncConfig) -> Self {
        Self {
            transport,
            api_version: config.api_version().clone(),
            cache: ResponseCache::new(),
            max_retries: config.max_retries(),
            hard_cap: config.graphql_hard_cap(),
        }
    }

    /// Creates a client with default retry settings, mainly for tests.
    #[must_use]
    pub fn from_parts(transport: T, api_version: ApiVersion) -> Self {
        Self {
            transport,
            api_version,
            cache: ResponseCache::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            hard_cap: DEFAULT_GRAPHQL_HARD_CAP,
        }
    }

    /// Returns the API version being used by this client.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Retry ceiling of [`execute_with_retry`](Self::execute_with_retry).
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Upper bound for shrunk page sizes.
    #[must_use]
    pub const fn hard_cap(&self) -> u32 {
        self.hard_cap
    }

    /// The response cache.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Executes one GraphQL request.
    ///
    /// A cache hit returns immediately. Otherwise the body is classified and,
    /// if it reports a cost, the call sleeps for the repay delay before
    /// returning so the next request does not hit an empty bucket.
    ///
    /// # Errors
    ///
    /// - [`GraphqlError::UserErrors`] for `userErrors` or uncoded `errors`.
    /// - [`GraphqlError::Throttled`] / [`GraphqlError::CostExceeded`] for the
    ///   corresponding error codes.
    /// - [`GraphqlError::Http`] for transport failures.
    pub async fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse, GraphqlError> {
        tracing::debug!(
            operation = request.operation_name().unwrap_or("anonymous"),
            variables = %serde_json::Value::Object(request.variables.clone()),
            cache = ?request.cache,
            "GraphQL request"
        );

        if let Some(body) = self.cached(request) {
            let cost = RequestCost::from_body(&body);
            return Ok(GraphqlResponse {
                body,
                cost,
                from_cache: true,
            });
        }

        let http_request = HttpRequest::builder(HttpMethod::Post, "graphql.json")
            .body(request.body())
            .body_type(DataType::Json)
            .build()
            .map_err(|e| GraphqlError::Http(e.into()))?;
        let response = self.transport.send(http_request).await?;

        classify_response(&response.body)?;
        let cost = RequestCost::from_body(&response.body);

        if let Some(ttl) = request.cache.ttl {
            self.cache
                .insert(&request.query, &request.variables, response.body.clone(), ttl);
        }

        if let Some(cost) = &cost {
            let delay = repay_delay(cost, false);
            if !delay.is_zero() {
                tracing::debug!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Repaying GraphQL cost"
                );
                tokio::time::sleep(delay).await;
            }
        }

        Ok(GraphqlResponse {
            body: response.body,
            cost,
            from_cache: false,
        })
    }

    /// Reads the current bucket state with a minimal, uncached query.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::InvalidResponse`] if the response carries no
    /// cost envelope, or any error of [`execute`](Self::execute).
    pub async fn throttle_status(&self) -> Result<ThrottleStatus, GraphqlError> {
        let response = self
            .execute(&GraphqlRequest::new(THROTTLE_STATUS_QUERY))
            .await?;
        response
            .cost
            .map(|cost| cost.throttle_status)
            .ok_or_else(|| GraphqlError::InvalidResponse {
                message: "response has no extensions.cost".to_string(),
            })
    }

    fn cached(&self, request: &GraphqlRequest) -> Option<serde_json::Value> {
        request.cache.ttl?;
        self.cache.get(&request.query, &request.variables)
    }
}

/// Classifies a GraphQL body.
///
/// Order: mutation `userErrors`, then `THROTTLED`, then `MAX_COST_EXCEEDED`,
/// then any other top-level error.
///
/// # Errors
///
/// Returns the matching [`GraphqlError`] variant.
pub fn classify_response(body: &serde_json::Value) -> Result<(), GraphqlError> {
    let user_errors = user_error_messages(body);
    if !user_errors.is_empty() {
        return Err(GraphqlError::user_errors(user_errors));
    }

    let errors = match body.get("errors") {
        Some(serde_json::Value::Array(errors)) if !errors.is_empty() => errors,
        Some(serde_json::Value::String(message)) => {
            return Err(GraphqlError::user_errors([message.clone()]));
        }
        _ => return Ok(()),
    };

    let code_of = |error: &serde_json::Value| {
        error
            .pointer("/extensions/code")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
    };

    if errors
        .iter()
        .any(|error| code_of(error).as_deref() == Some("THROTTLED"))
    {
        return Err(GraphqlError::Throttled {
            cost: RequestCost::from_body(body),
        });
    }

    if let Some(error) = errors
        .iter()
        .find(|error| code_of(error).as_deref() == Some("MAX_COST_EXCEEDED"))
    {
        let number = |key: &str| {
            error
                .pointer(&format!("/extensions/{key}"))
                .and_then(serde_json::Value::as_f64)
        };
        let cost = number("cost").or_else(|| RequestCost::from_body(body).map(|c| c.requested_query_cost));
        if let (Some(cost), Some(max_cost)) = (cost, number("maxCost")) {
            return Err(GraphqlError::CostExceeded { cost, max_cost });
        }
    }

    Err(GraphqlError::user_errors(errors.iter().map(|error| {
        error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| error.to_string(), str::to_owned)
    })))
}

/// Collects `data.<field>.userErrors[].message` from mutation payloads.
fn user_error_messages(body: &serde_json::Value) -> Vec<String> {
    let Some(data) = body.get("data").and_then(serde_json::Value::as_object) else {
        return Vec::new();
    };

    data.values()
        .filter_map(|payload| payload.get("userErrors").and_then(serde_json::Value::as_array))
        .flatten()
        .map(|error| {
            let message = error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Unknown user error");
            match error.get("field").and_then(serde_json::Value::as_array) {
                Some(field) if !field.is_empty() => {
                    let path: Vec<&str> = field.iter().filter_map(serde_json::Value::as_str).collect();
                    format!("{}: {message}", path.join("."))
                }
                _ => message.to_string(),
            }
        })
        .collect()
}
