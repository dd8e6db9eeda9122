//! Metafield documents: batch reads for mixed sync and writes for sync update.
//!
//! Metafields are addressed as `namespace.key`, which is also the row field
//! they are merged into.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::clients::graphql::GraphqlRequest;
use crate::sync::{id_from_gid, Row, SyncError};

/// Page size of the nested `metafields` connection.
const METAFIELDS_PER_NODE: u32 = 250;

/// Name of the limit variable of [`metafield_batch_request`].
pub const METAFIELD_LIMIT_VARIABLE: &str = "first";

/// Metafields of the nodes on one GraphQL page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetafieldPage {
    /// Fields per owner GID.
    pub nodes: HashMap<String, Row>,
    /// More nodes match the search.
    pub has_next_page: bool,
    /// Cursor after the last node.
    pub end_cursor: Option<String>,
}

/// `id:` search matching exactly the given GIDs.
///
/// # Example
///
/// ```rust
/// use shopify_sync::sync::id_search_query;
///
/// let ids = vec![
///     "gid://shopify/Product/1".to_string(),
///     "gid://shopify/Product/2".to_string(),
/// ];
/// assert_eq!(id_search_query(&ids), "id:1 OR id:2");
/// ```
#[must_use]
pub fn id_search_query(gids: &[String]) -> String {
    gids.iter()
        .filter_map(|gid| id_from_gid(gid))
        .map(|id| format!("id:{id}"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Uncached request for the metafields of `gids` on `connection`.
#[must_use]
pub fn metafield_batch_request(
    connection: &str,
    gids: &[String],
    keys: &[String],
    limit: u32,
    cursor: Option<&str>,
) -> GraphqlRequest {
    let query = format!(
        "query SyncMetafields($first: Int!, $after: String, $query: String, $keys: [String!]) {{
  {connection}(first: $first, after: $after, query: $query) {{
    nodes {{
      id
      metafields(first: {METAFIELDS_PER_NODE}, keys: $keys) {{
        nodes {{ namespace key type value }}
      }}
    }}
    pageInfo {{ hasNextPage endCursor }}
  }}
}}"
    );

    GraphqlRequest::new(query)
        .limit_variable(METAFIELD_LIMIT_VARIABLE, limit)
        .variable("after", cursor.map_or(Value::Null, Value::from))
        .variable("query", id_search_query(gids))
        .variable("keys", keys.to_vec())
}

/// Parses a [`metafield_batch_request`] response.
///
/// # Errors
///
/// Returns [`SyncError::InvalidPage`] if the connection is missing.
pub fn parse_metafield_page(data: &Value, connection: &str) -> Result<MetafieldPage, SyncError> {
    let connection_value = data
        .get(connection)
        .filter(|value| value.is_object())
        .ok_or_else(|| SyncError::invalid_page(format!("missing connection '{connection}'")))?;

    let mut nodes = HashMap::new();
    for node in connection_value
        .get("nodes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(id) = node.get("id").and_then(Value::as_str) else {
            continue;
        };
        let mut fields = Row::new();
        for metafield in node
            .pointer("/metafields/nodes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let (Some(namespace), Some(key)) = (
                metafield.get("namespace").and_then(Value::as_str),
                metafield.get("key").and_then(Value::as_str),
            ) else {
                continue;
            };
            let kind = metafield.get("type").and_then(Value::as_str).unwrap_or("");
            let value = metafield.get("value").and_then(Value::as_str);
            fields.insert(format!("{namespace}.{key}"), decode_value(kind, value));
        }
        nodes.insert(id.to_string(), fields);
    }

    let page_info = connection_value.get("pageInfo");
    Ok(MetafieldPage {
        nodes,
        has_next_page: page_info
            .and_then(|info| info.get("hasNextPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        end_cursor: page_info
            .and_then(|info| info.get("endCursor"))
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

/// Converts a metafield's string value to JSON according to its type.
fn decode_value(kind: &str, value: Option<&str>) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };
    let parsed = match kind {
        "boolean" | "number_integer" | "number_decimal" | "json" | "rating" | "money"
        | "dimension" | "volume" | "weight" => serde_json::from_str(value).ok(),
        kind if kind.starts_with("list.") => serde_json::from_str(value).ok(),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(value.to_string()))
}

/// Converts a row value to the string form metafields store.
fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Splits `namespace.key`.
///
/// # Errors
///
/// Returns [`SyncError::RowUpdate`] for keys without a namespace.
fn split_key<'a>(owner: &str, full_key: &'a str) -> Result<(&'a str, &'a str), SyncError> {
    full_key
        .split_once('.')
        .filter(|(namespace, key)| !namespace.is_empty() && !key.is_empty())
        .ok_or_else(|| SyncError::RowUpdate {
            id: owner.to_string(),
            message: format!("metafield key '{full_key}' is not of the form namespace.key"),
        })
}

/// `metafieldsSet` mutation writing `changes` (non-null values) to `owner`.
///
/// # Errors
///
/// Returns [`SyncError::RowUpdate`] for malformed keys.
pub fn metafields_set_request(
    owner: &str,
    changes: &Row,
    type_of: impl Fn(&str) -> Option<String>,
) -> Result<GraphqlRequest, SyncError> {
    let mut inputs = Vec::with_capacity(changes.len());
    for (full_key, value) in changes {
        let (namespace, key) = split_key(owner, full_key)?;
        let mut input = Map::new();
        input.insert("ownerId".to_string(), json!(owner));
        input.insert("namespace".to_string(), json!(namespace));
        input.insert("key".to_string(), json!(key));
        input.insert("value".to_string(), json!(encode_value(value)));
        if let Some(kind) = type_of(full_key) {
            input.insert("type".to_string(), json!(kind));
        }
        inputs.push(Value::Object(input));
    }

    Ok(GraphqlRequest::new(
        "mutation metafieldsSet($metafields: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafields) {
    metafields { namespace key type value }
    userErrors { field message code }
  }
}",
    )
    .variable("metafields", inputs))
}

/// `metafieldsDelete` mutation clearing `keys` on `owner`.
///
/// # Errors
///
/// Returns [`SyncError::RowUpdate`] for malformed keys.
pub fn metafields_delete_request(owner: &str, keys: &[&str]) -> Result<GraphqlRequest, SyncError> {
    let identifiers = keys
        .iter()
        .map(|full_key| {
            let (namespace, key) = split_key(owner, full_key)?;
            Ok(json!({"ownerId": owner, "namespace": namespace, "key": key}))
        })
        .collect::<Result<Vec<_>, SyncError>>()?;

    Ok(GraphqlRequest::new(
        "mutation metafieldsDelete($metafields: [MetafieldIdentifierInput!]!) {
  metafieldsDelete(metafields: $metafields) {
    deletedMetafields { namespace key ownerId }
    userErrors { field message }
  }
}",
    )
    .variable("metafields", identifiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_variables() {
        let gids = vec![
            "gid://shopify/Product/10".to_string(),
            "gid://shopify/Product/11".to_string(),
        ];
        let keys = vec!["custom.color".to_string()];
        let request = metafield_batch_request("products", &gids, &keys, 2, Some("cur"));

        assert!(request.query.contains("products(first: $first"));
        assert_eq!(request.limit(), Some(2));
        assert_eq!(request.variables["query"], json!("id:10 OR id:11"));
        assert_eq!(request.variables["after"], json!("cur"));
        assert_eq!(request.variables["keys"], json!(["custom.color"]));
        assert!(request.cache.ttl.is_none());
    }

    #[test]
    fn test_parse_page_decodes_typed_values() {
        let data = json!({"products": {
            "nodes": [{
                "id": "gid://shopify/Product/10",
                "metafields": {"nodes": [
                    {"namespace": "custom", "key": "color", "type": "single_line_text_field", "value": "red"},
                    {"namespace": "custom", "key": "stock", "type": "number_integer", "value": "12"},
                    {"namespace": "custom", "key": "sizes", "type": "list.single_line_text_field", "value": "[\"S\",\"M\"]"}
                ]}
            }],
            "pageInfo": {"hasNextPage": true, "endCursor": "c1"}
        }});
        let page = parse_metafield_page(&data, "products").unwrap();
        let fields = &page.nodes["gid://shopify/Product/10"];

        assert_eq!(fields["custom.color"], json!("red"));
        assert_eq!(fields["custom.stock"], json!(12));
        assert_eq!(fields["custom.sizes"], json!(["S", "M"]));
        assert!(page.has_next_page);
        assert_eq!(page.end_cursor.as_deref(), Some("c1"));
    }

    #[test]
    fn test_unparseable_typed_value_stays_a_string() {
        assert_eq!(decode_value("number_integer", Some("twelve")), json!("twelve"));
        assert_eq!(decode_value("boolean", None), Value::Null);
    }

    #[test]
    fn test_metafields_set_request() {
        let mut changes = Row::new();
        changes.insert("custom.stock".to_string(), json!(3));
        changes.insert("custom.color".to_string(), json!("blue"));

        let request = metafields_set_request("gid://shopify/Product/1", &changes, |key| {
            (key == "custom.stock").then(|| "number_integer".to_string())
        })
        .unwrap();

        assert_eq!(request.operation_name(), Some("metafieldsSet"));
        assert_eq!(
            request.variables["metafields"],
            json!([
                {"ownerId": "gid://shopify/Product/1", "namespace": "custom", "key": "color", "value": "blue"},
                {"ownerId": "gid://shopify/Product/1", "namespace": "custom", "key": "stock", "value": "3", "type": "number_integer"}
            ])
        );
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        let mut changes = Row::new();
        changes.insert("color".to_string(), json!("blue"));
        assert!(matches!(
            metafields_set_request("gid://shopify/Product/1", &changes, |_| None),
            Err(SyncError::RowUpdate { .. })
        ));
        assert!(metafields_delete_request("gid://shopify/Product/1", &[".x"]).is_err());
    }
}
