//! REST client implementation for the Shopify Admin API.

use std::collections::BTreeMap;

use crate::clients::rest::RestError;
use crate::clients::{
    DataType, HttpClient, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse, Transport,
};
use crate::config::{ApiVersion, SyncConfig};

/// REST API client for the Shopify Admin API.
///
/// # Example
///
/// ```rust
/// use shopify_sync::{AccessToken, ShopDomain, SyncConfig};
/// use shopify_sync::clients::rest::RestClient;
///
/// let config = SyncConfig::builder()
///     .shop(ShopDomain::new("my-store").unwrap())
///     .access_token(AccessToken::new("shpat_123").unwrap())
///     .build()
///     .unwrap();
///
/// let client = RestClient::new(&config);
/// assert_eq!(client.tries(), 3);
/// ```
#[derive(Debug)]
pub struct RestClient<T = HttpClient> {
    transport: T,
    api_version: ApiVersion,
    tries: u32,
}

// Verify RestClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestClient>();
};

impl RestClient<HttpClient> {
    /// Creates a client that talks to the configured shop over HTTP.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        let base_path = format!("/admin/api/{}", config.api_version());
        Self::with_transport(HttpClient::new(base_path, config), config)
    }
}

impl<T: Transport> RestClient<T> {
    /// Creates a client on top of an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: T, config: &SyncConfig) -> Self {
        Self {
            transport,
            api_version: config.api_version().clone(),
            tries: config.rest_tries(),
        }
    }

    /// Returns the API version being used by this client.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Transport tries per request.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    /// Sends a GET request to a path relative to `/admin/api/{version}`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] for an empty path, or
    /// [`RestError::Http`] for transport failures.
    pub async fn get(
        &self,
        path: &str,
        query: Option<BTreeMap<String, String>>,
    ) -> Result<HttpResponse, RestError> {
        let path = normalize_path(path)?;
        tracing::debug!(path = %path, query = ?query, "REST page request");

        let mut builder = HttpRequest::builder(HttpMethod::Get, path).tries(self.tries);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        self.send(builder).await
    }

    /// Follows a next-page URL from a `Link` header without touching it.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] if `url` is not absolute, or
    /// [`RestError::Http`] for transport failures (including foreign origins).
    pub async fn get_url(&self, url: &str) -> Result<HttpResponse, RestError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(RestError::InvalidPath {
                path: url.to_string(),
            });
        }
        tracing::debug!(url = %url, "REST page request");

        self.send(HttpRequest::builder(HttpMethod::Get, url).tries(self.tries))
            .await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] for an empty path, or
    /// [`RestError::Http`] for transport failures.
    pub async fn put(&self, path: &str, body: serde_json::Value) -> Result<HttpResponse, RestError> {
        let path = normalize_path(path)?;
        tracing::debug!(path = %path, "REST update request");

        self.send(
            HttpRequest::builder(HttpMethod::Put, path)
                .body(body)
                .body_type(DataType::Json)
                .tries(self.tries),
        )
        .await
    }

    async fn send(&self, builder: HttpRequestBuilder) -> Result<HttpResponse, RestError> {
        let request = builder.build().map_err(|e| RestError::Http(e.into()))?;
        self.transport.send(request).await.map_err(Into::into)
    }
}

/// Normalizes a REST API path.
///
/// Strips leading `/` and a trailing `.json`, then appends `.json`.
///
/// # Errors
///
/// Returns [`RestError::InvalidPath`] if nothing is left.
///
/// # Examples
///
/// ```rust
/// use shopify_sync::clients::rest::normalize_path;
///
/// assert_eq!(normalize_path("products").unwrap(), "products.json");
/// assert_eq!(normalize_path("/products/1.json").unwrap(), "products/1.json");
/// ```
pub fn normalize_path(path: &str) -> Result<String, RestError> {
    let trimmed = path.trim_start_matches('/');
    let trimmed = trimmed.strip_suffix(".json").unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(RestError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(format!("{trimmed}.json"))
}
