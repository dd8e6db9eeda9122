//! GraphQL request descriptors.

use std::time::Duration;

use serde_json::{Map, Value};

/// Cache directives for one request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// How long a successful response may be reused. `None` disables caching.
    pub ttl: Option<Duration>,
}

/// A GraphQL document plus its variables.
///
/// `limit_variable` names the variable holding the page size (e.g. `first`).
/// Only requests that have one can be shrunk after `MAX_COST_EXCEEDED`.
///
/// # Example
///
/// ```rust
/// use shopify_sync::clients::graphql::GraphqlRequest;
///
/// let request = GraphqlRequest::new("query Products($first: Int!) { products(first: $first) { nodes { id } } }")
///     .limit_variable("first", 50)
///     .variable("query", "status:active");
///
/// assert_eq!(request.limit(), Some(50));
/// assert_eq!(request.operation_name(), Some("Products"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GraphqlRequest {
    /// The GraphQL document.
    pub query: String,
    /// Variables object.
    pub variables: Map<String, Value>,
    /// Name of the shrinkable page-size variable.
    pub limit_variable: Option<String>,
    /// Cache directives.
    pub cache: CacheOptions,
}

impl GraphqlRequest {
    /// Creates an uncached request without variables.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
            limit_variable: None,
            cache: CacheOptions::default(),
        }
    }

    /// Sets one variable.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Sets the page-size variable and marks it as shrinkable.
    #[must_use]
    pub fn limit_variable(mut self, name: impl Into<String>, limit: u32) -> Self {
        let name = name.into();
        self.variables.insert(name.clone(), Value::from(limit));
        self.limit_variable = Some(name);
        self
    }

    /// Enables response caching for `ttl`.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = Some(ttl);
        self
    }

    /// Current value of the page-size variable.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        let name = self.limit_variable.as_ref()?;
        self.variables
            .get(name)
            .and_then(Value::as_u64)
            .and_then(|limit| u32::try_from(limit).ok())
    }

    /// Replaces the page-size variable. No-op without a limit variable.
    pub fn set_limit(&mut self, limit: u32) {
        if let Some(name) = &self.limit_variable {
            self.variables.insert(name.clone(), Value::from(limit));
        }
    }

    /// The operation name, if the document declares one.
    #[must_use]
    pub fn operation_name(&self) -> Option<&str> {
        let rest = self.query.trim_start();
        let rest = rest
            .strip_prefix("query")
            .or_else(|| rest.strip_prefix("mutation"))?;
        let name_start = rest.trim_start();
        let end = name_start
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(name_start.len());
        let name = &name_start[..end];
        (!name.is_empty()).then_some(name)
    }

    /// JSON body sent to `graphql.json`.
    #[must_use]
    pub fn body(&self) -> Value {
        serde_json::json!({
            "query": self.query,
            "variables": self.variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_round_trip() {
        let mut request = GraphqlRequest::new("query P($first: Int!) { x }").limit_variable("first", 40);
        assert_eq!(request.limit(), Some(40));
        request.set_limit(12);
        assert_eq!(request.limit(), Some(12));
        assert_eq!(request.variables["first"], json!(12));
    }

    #[test]
    fn test_set_limit_without_limit_variable_is_noop() {
        let mut request = GraphqlRequest::new("{ shop { id } }").variable("first", 3);
        request.set_limit(1);
        assert_eq!(request.limit(), None);
        assert_eq!(request.variables["first"], json!(3));
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(
            GraphqlRequest::new("query Products { x }").operation_name(),
            Some("Products")
        );
        assert_eq!(
            GraphqlRequest::new("  mutation metafieldsSet($m: [X!]!) { y }").operation_name(),
            Some("metafieldsSet")
        );
        assert_eq!(GraphqlRequest::new("{ shop { id } }").operation_name(), None);
        assert_eq!(GraphqlRequest::new("query { shop { id } }").operation_name(), None);
    }

    #[test]
    fn test_body_contains_query_and_variables() {
        let request = GraphqlRequest::new("query A { a }").variable("id", "gid://shopify/Product/1");
        assert_eq!(
            request.body(),
            json!({"query": "query A { a }", "variables": {"id": "gid://shopify/Product/1"}})
        );
    }

    #[test]
    fn test_cache_disabled_by_default() {
        let request = GraphqlRequest::new("{ a }");
        assert!(request.cache.ttl.is_none());
        let request = request.cache_ttl(Duration::from_secs(60));
        assert_eq!(request.cache.ttl, Some(Duration::from_secs(60)));
    }
}
