//! HTTP response types.
//!
//! [`HttpResponse`] parses the headers the sync engine relies on at
//! construction time: REST `Link` pagination, the REST call-limit bucket and
//! `Retry-After`.

use std::collections::HashMap;

/// REST bucket state parsed from `X-Shopify-Shop-Api-Call-Limit` ("X/Y").
///
/// # Example
///
/// ```rust
/// use shopify_sync::clients::ApiCallLimit;
///
/// let limit = ApiCallLimit::parse("39/40").unwrap();
/// assert_eq!(limit.request_count, 39);
/// assert!(limit.is_nearly_full());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiCallLimit {
    /// Requests currently in the bucket.
    pub request_count: u32,
    /// Bucket size.
    pub bucket_size: u32,
}

impl ApiCallLimit {
    /// Parses the header value.
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let (count, size) = header_value.trim().split_once('/')?;
        Some(Self {
            request_count: count.parse().ok()?,
            bucket_size: size.parse().ok()?,
        })
    }

    /// Returns `true` when at most one request of headroom is left.
    #[must_use]
    pub const fn is_nearly_full(&self) -> bool {
        self.request_count + 1 >= self.bucket_size
    }
}

/// Pagination links parsed from a REST `Link` header.
///
/// The next/previous URLs are kept verbatim so they can be followed without
/// being reconstructed; the `page_info` tokens are extracted for callers that
/// build their own query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    /// Full URL of the next page.
    pub next_url: Option<String>,
    /// Full URL of the previous page.
    pub prev_url: Option<String>,
    /// `page_info` of the next page.
    pub next_page_info: Option<String>,
    /// `page_info` of the previous page.
    pub prev_page_info: Option<String>,
}

impl PaginationInfo {
    /// Parses a `Link` header value of the form
    /// `<url>; rel="next", <url>; rel="previous"`.
    #[must_use]
    pub fn parse_link_header(header_value: &str) -> Self {
        let mut result = Self::default();

        for link in header_value.split(',') {
            let mut parts = link.trim().split(';');
            let Some(url) = parts
                .next()
                .map(|s| s.trim().trim_start_matches('<').trim_end_matches('>'))
            else {
                continue;
            };
            let rel = parts.find_map(|part| {
                part.trim()
                    .strip_prefix("rel=")
                    .map(|rel| rel.trim_matches('"'))
            });

            match rel {
                Some("next") => {
                    result.next_page_info = Self::extract_page_info(url);
                    result.next_url = Some(url.to_string());
                }
                Some("previous") => {
                    result.prev_page_info = Self::extract_page_info(url);
                    result.prev_url = Some(url.to_string());
                }
                _ => {}
            }
        }

        result
    }

    /// Returns `true` if a next page exists.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.next_url.is_some()
    }

    fn extract_page_info(url: &str) -> Option<String> {
        let (_, query) = url.split_once('?')?;
        query.split('&').find_map(|param| {
            param
                .split_once('=')
                .filter(|(key, _)| *key == "page_info")
                .map(|(_, value)| value.to_string())
        })
    }
}

/// A response from the Admin API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, lower-cased names, possibly multi-valued.
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body.
    pub body: serde_json::Value,
    /// REST pagination (from `Link`).
    pub pagination: PaginationInfo,
    /// REST bucket state (from `X-Shopify-Shop-Api-Call-Limit`).
    pub api_call_limit: Option<ApiCallLimit>,
    /// Seconds to wait before retrying (from `Retry-After`).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new response, parsing the pagination and rate-limit headers.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let first = |name: &str| headers.get(name).and_then(|values| values.first());

        let pagination = first("link")
            .map(|link| PaginationInfo::parse_link_header(link))
            .unwrap_or_default();
        let api_call_limit = first("x-shopify-shop-api-call-limit").and_then(|v| ApiCallLimit::parse(v));
        let retry_request_after = first("retry-after").and_then(|v| v.parse::<f64>().ok());

        Self {
            code,
            headers,
            body,
            pagination,
            api_call_limit,
            retry_request_after,
        }
    }

    /// Creates a 200 response with the given body and no headers.
    #[must_use]
    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(200, HashMap::new(), body)
    }

    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `X-Shopify-API-Deprecated-Reason` header value, if present.
    #[must_use]
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.header("x-shopify-api-deprecated-reason")
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}
