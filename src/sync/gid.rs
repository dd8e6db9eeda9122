//! Global identifiers (`gid://shopify/{Type}/{id}`).
//!
//! REST rows carry numeric ids while GraphQL nodes carry GIDs; rows are
//! matched across the two by normalized GID.

use std::fmt::Display;

const GID_PREFIX: &str = "gid://shopify/";

/// Builds a GID.
///
/// # Example
///
/// ```rust
/// use shopify_sync::sync::graphql_gid;
///
/// assert_eq!(graphql_gid("Product", 123), "gid://shopify/Product/123");
/// ```
#[must_use]
pub fn graphql_gid(resource_type: &str, id: impl Display) -> String {
    format!("{GID_PREFIX}{resource_type}/{id}")
}

/// Returns the trailing id segment of a GID, without any query suffix.
///
/// # Example
///
/// ```rust
/// use shopify_sync::sync::id_from_gid;
///
/// assert_eq!(id_from_gid("gid://shopify/Product/123"), Some("123"));
/// assert_eq!(id_from_gid("gid://shopify/ProductImage/9?v=1"), Some("9"));
/// assert_eq!(id_from_gid("123"), None);
/// ```
#[must_use]
pub fn id_from_gid(gid: &str) -> Option<&str> {
    let rest = gid.strip_prefix(GID_PREFIX)?;
    let rest = rest.split_once('?').map_or(rest, |(path, _)| path);
    let (_, id) = rest.rsplit_once('/')?;
    (!id.is_empty()).then_some(id)
}

/// Normalizes a REST `id` value (number or string, GID or bare) into a GID.
#[must_use]
pub fn normalize_gid(resource_type: &str, id: &serde_json::Value) -> Option<String> {
    match id {
        serde_json::Value::Number(number) => Some(graphql_gid(resource_type, number)),
        serde_json::Value::String(s) if s.starts_with(GID_PREFIX) => Some(s.clone()),
        serde_json::Value::String(s) if !s.is_empty() => Some(graphql_gid(resource_type, s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_gid_accepts_numbers_strings_and_gids() {
        assert_eq!(
            normalize_gid("Product", &json!(42)).as_deref(),
            Some("gid://shopify/Product/42")
        );
        assert_eq!(
            normalize_gid("Product", &json!("42")).as_deref(),
            Some("gid://shopify/Product/42")
        );
        assert_eq!(
            normalize_gid("Product", &json!("gid://shopify/Product/42")).as_deref(),
            Some("gid://shopify/Product/42")
        );
        assert!(normalize_gid("Product", &json!(null)).is_none());
        assert!(normalize_gid("Product", &json!("")).is_none());
    }

    #[test]
    fn test_id_from_gid_round_trip() {
        let gid = graphql_gid("Collection", 77);
        assert_eq!(id_from_gid(&gid), Some("77"));
        assert_eq!(id_from_gid("gid://shopify/Collection/"), None);
    }
}
