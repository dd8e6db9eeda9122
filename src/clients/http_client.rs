//! HTTP client for Admin API communication.
//!
//! [`HttpClient`] is the production [`Transport`]: it resolves relative paths
//! against `{origin}/admin/api/{version}`, injects the access token, and
//! retries 429/500 responses up to the request's `tries`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::SyncConfig;

/// Fixed retry wait time in seconds when no `Retry-After` is given.
pub const RETRY_WAIT_TIME: u64 = 1;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Something that can perform exactly one logical HTTP exchange.
///
/// The GraphQL and REST clients are generic over this seam so the sync
/// controllers can be driven by [`HttpClient`] in production and by
/// scripted transports in tests.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the (successful) response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for invalid requests, network failures and
    /// non-2xx responses.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).send(request).await
    }
}

/// HTTP client bound to one shop.
///
/// # Example
///
/// ```rust
/// use shopify_sync::{AccessToken, ShopDomain, SyncConfig};
/// use shopify_sync::clients::HttpClient;
///
/// let config = SyncConfig::builder()
///     .shop(ShopDomain::new("my-store").unwrap())
///     .access_token(AccessToken::new("shpat_123").unwrap())
///     .build()
///     .unwrap();
///
/// let client = HttpClient::new("/admin/api/2025-10", &config);
/// assert_eq!(client.base_uri(), "https://my-store.myshopify.com");
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    /// Origin, e.g. `https://my-store.myshopify.com`.
    base_uri: String,
    /// Base path, e.g. `/admin/api/2025-10`.
    base_path: String,
    default_headers: HashMap<String, String>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client for the configured shop.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created (TLS
    /// initialization failure).
    #[must_use]
    pub fn new(base_path: impl Into<String>, config: &SyncConfig) -> Self {
        let shop = config.shop().as_ref();
        let base_uri = config
            .host()
            .map_or_else(|| format!("https://{shop}"), |host| host.origin().to_string());

        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}Shopify Sync Library v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        default_headers.insert(
            "X-Shopify-Access-Token".to_string(),
            config.access_token().as_ref().to_string(),
        );
        if config.host().is_some() {
            default_headers.insert("X-Shopify-Shop-Domain".to_string(), shop.to_string());
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_uri,
            base_path: base_path.into(),
            default_headers,
        }
    }

    /// Returns the origin requests are sent to.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the default headers.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Resolves the request path to a full URL.
    ///
    /// Absolute URLs must stay on this client's origin so a forged `Link`
    /// header cannot leak the access token.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::ForeignUrl`] for absolute URLs on
    /// another origin.
    pub fn resolve_url(&self, request: &HttpRequest) -> Result<String, InvalidHttpRequestError> {
        if !request.is_absolute() {
            return Ok(format!("{}{}/{}", self.base_uri, self.base_path, request.path));
        }

        let on_origin = request
            .path
            .strip_prefix(&self.base_uri)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        let on_shop = self
            .default_headers
            .get("X-Shopify-Shop-Domain")
            .is_some_and(|shop| request.path.starts_with(&format!("https://{shop}/")));

        if on_origin || on_shop {
            Ok(request.path.clone())
        } else {
            Err(InvalidHttpRequestError::ForeignUrl {
                url: request.path.clone(),
                origin: self.base_uri.clone(),
            })
        }
    }

    /// Sends a request, retrying 429 and 500 responses up to `request.tries`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if validation fails, the network fails, a
    /// non-retryable non-2xx response is received, or tries are exhausted.
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;
        let url = self.resolve_url(&request)?;

        let mut headers = self.default_headers.clone();
        if let Some(body_type) = &request.body_type {
            headers.insert(
                "Content-Type".to_string(),
                body_type.as_content_type().to_string(),
            );
        }
        if let Some(extra) = &request.extra_headers {
            headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let mut tries: u32 = 0;
        loop {
            tries += 1;

            let mut req_builder = match request.http_method {
                HttpMethod::Get => self.client.get(&url),
                HttpMethod::Post => self.client.post(&url),
                HttpMethod::Put => self.client.put(&url),
            };
            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }
            if let Some(query) = &request.query {
                req_builder = req_builder.query(query);
            }
            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.to_string());
            }

            let res = req_builder.send().await?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let body_text = res.text().await.unwrap_or_default();
            let body = if body_text.is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&body_text).unwrap_or_else(|_| {
                    if code >= 500 {
                        serde_json::json!({ "raw_body": body_text })
                    } else {
                        serde_json::json!({})
                    }
                })
            };

            let response = HttpResponse::new(code, res_headers, body);

            if let Some(reason) = response.deprecation_reason() {
                tracing::warn!(
                    "Deprecated request to Shopify API at {}, received reason: {}",
                    request.path,
                    reason
                );
            }

            if response.is_ok() {
                return Ok(response);
            }

            let error_message = Self::serialize_error(&response);
            let error_reference = response.request_id().map(String::from);

            if !(code == 429 || code == 500) || request.tries == 1 {
                return Err(HttpError::Response(HttpResponseError {
                    code,
                    message: error_message,
                    error_reference,
                }));
            }

            if tries >= request.tries {
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code,
                    tries: request.tries,
                    message: error_message,
                    error_reference,
                }));
            }

            let delay = Self::calculate_retry_delay(&response, code);
            tracing::warn!(
                status = code,
                attempt = tries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying {} after transport error",
                request.path
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// 429 honours `Retry-After`; 500 always waits the fixed delay.
    fn calculate_retry_delay(response: &HttpResponse, status: u16) -> Duration {
        if status == 429 {
            if let Some(retry_after) = response.retry_request_after.filter(|s| *s >= 0.0) {
                return Duration::from_secs_f64(retry_after);
            }
        }
        Duration::from_secs(RETRY_WAIT_TIME)
    }

    fn serialize_error(response: &HttpResponse) -> String {
        let mut error_body = serde_json::Map::new();

        for key in ["errors", "error"] {
            if let Some(value) = response.body.get(key) {
                error_body.insert(key.to_string(), value.clone());
            }
        }
        if response.body.get("error").is_some() {
            if let Some(desc) = response.body.get("error_description") {
                error_body.insert("error_description".to_string(), desc.clone());
            }
        }
        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::to_string(&error_body).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Transport for HttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.request(request).await
    }
}
