//! Continuations: the state a sync job hands to the host between runs.
//!
//! A continuation is present iff more work remains. Internally it is a typed
//! enum; at the host boundary ([`Continuation::to_host`] /
//! [`Continuation::from_host`]) it is JSON with a `kind` tag, camelCase keys
//! and booleans spelled `"true"`/`"false"`, because the host persists string
//! values only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clients::graphql::RequestCost;
use crate::sync::{CurrentBatch, SyncError};

/// Top-level keys encoded as strings at the host boundary.
const HOST_BOOLEAN_KEYS: [&str; 2] = ["lock", "skipNextRestSync"];

/// Opaque façade state carried across runs, plus the mixed sync batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraData {
    /// Outstanding batch of a mixed sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_batch: Option<CurrentBatch>,
    /// Anything else the façade stashed; preserved verbatim.
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl ExtraData {
    /// Returns `true` if there is neither a batch nor façade state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_batch.is_none() && self.values.is_empty()
    }
}

/// Where a REST sync continues.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestContinuation {
    /// Absolute URL of the next page, verbatim from `Link`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    /// Query for the next page against the first-page path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_query: Option<BTreeMap<String, String>>,
    /// Next-page URL parked while GraphQL work is outstanding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_next_rest_url: Option<String>,
    /// The next run only drains GraphQL work.
    #[serde(default)]
    pub skip_next_rest_sync: bool,
    /// Façade state.
    #[serde(default, skip_serializing_if = "ExtraData::is_empty")]
    pub extra_data: ExtraData,
}

/// Where a GraphQL sync continues.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlContinuation {
    /// `endCursor` of the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Retries the last run needed.
    #[serde(default)]
    pub retries: u32,
    /// `true` once a run has been admitted; locked runs skip admission.
    #[serde(default)]
    pub lock: bool,
    /// Cost of the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cost: Option<RequestCost>,
    /// Page size of the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_max_entries_per_run: Option<u32>,
    /// Façade state.
    #[serde(default, skip_serializing_if = "ExtraData::is_empty")]
    pub extra_data: ExtraData,
}

/// Where a mixed (REST + metafields) sync continues.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedContinuation {
    /// Pointer of the REST page being paginated or drained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    /// Query form of `next_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_query: Option<BTreeMap<String, String>>,
    /// REST pointer parked until the current batch is drained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_next_rest_url: Option<String>,
    /// The next run resumes `extra_data.current_batch` without REST.
    #[serde(default)]
    pub skip_next_rest_sync: bool,
    /// Metafield cursor within the current batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Retries the last GraphQL phase needed.
    #[serde(default)]
    pub retries: u32,
    /// `true` once a run has been admitted.
    #[serde(default)]
    pub lock: bool,
    /// Cost of the last metafield page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cost: Option<RequestCost>,
    /// Metafield page size of the last run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_max_entries_per_run: Option<u32>,
    /// Façade state and the outstanding batch.
    #[serde(default, skip_serializing_if = "ExtraData::is_empty")]
    pub extra_data: ExtraData,
}

/// Any continuation, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Continuation {
    /// REST-only sync.
    Rest(RestContinuation),
    /// GraphQL-only sync.
    Graphql(GraphqlContinuation),
    /// REST sync with GraphQL metafields.
    Mixed(MixedContinuation),
}

impl Continuation {
    /// Encodes for the host: JSON with string booleans.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidContinuation`] if serialization fails.
    pub fn to_host(&self) -> Result<String, SyncError> {
        let mut value = serde_json::to_value(self).map_err(invalid)?;
        if let Value::Object(object) = &mut value {
            for key in HOST_BOOLEAN_KEYS {
                if let Some(Value::Bool(flag)) = object.get(key) {
                    let encoded = Value::String(flag.to_string());
                    object.insert(key.to_string(), encoded);
                }
            }
        }
        serde_json::to_string(&value).map_err(invalid)
    }

    /// Decodes a host continuation. Real booleans are accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidContinuation`] for malformed JSON, an
    /// unknown `kind`, or a boolean key that is neither `"true"` nor
    /// `"false"`.
    pub fn from_host(encoded: &str) -> Result<Self, SyncError> {
        let mut value: Value = serde_json::from_str(encoded).map_err(invalid)?;
        if let Value::Object(object) = &mut value {
            for key in HOST_BOOLEAN_KEYS {
                let decoded = match object.get(key) {
                    Some(Value::String(s)) if s == "true" => true,
                    Some(Value::String(s)) if s == "false" => false,
                    Some(Value::String(s)) => {
                        return Err(SyncError::InvalidContinuation {
                            message: format!("'{key}' must be \"true\" or \"false\", got {s:?}"),
                        });
                    }
                    _ => continue,
                };
                object.insert(key.to_string(), Value::Bool(decoded));
            }
        }
        serde_json::from_value(value).map_err(invalid)
    }

    /// The façade state of any kind.
    #[must_use]
    pub const fn extra_data(&self) -> &ExtraData {
        match self {
            Self::Rest(c) => &c.extra_data,
            Self::Graphql(c) => &c.extra_data,
            Self::Mixed(c) => &c.extra_data,
        }
    }
}

impl From<RestContinuation> for Continuation {
    fn from(continuation: RestContinuation) -> Self {
        Self::Rest(continuation)
    }
}

impl From<GraphqlContinuation> for Continuation {
    fn from(continuation: GraphqlContinuation) -> Self {
        Self::Graphql(continuation)
    }
}

impl From<MixedContinuation> for Continuation {
    fn from(continuation: MixedContinuation) -> Self {
        Self::Mixed(continuation)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn invalid(error: serde_json::Error) -> SyncError {
    SyncError::InvalidContinuation {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::graphql::ThrottleStatus;
    use serde_json::json;

    #[test]
    fn test_host_encoding_uses_string_booleans() {
        let continuation = Continuation::Graphql(GraphqlContinuation {
            cursor: Some("abc".to_string()),
            lock: true,
            ..GraphqlContinuation::default()
        });
        let encoded: Value = serde_json::from_str(&continuation.to_host().unwrap()).unwrap();

        assert_eq!(encoded["kind"], json!("graphql"));
        assert_eq!(encoded["lock"], json!("true"));
        assert_eq!(encoded["cursor"], json!("abc"));
        assert!(encoded.get("lastCost").is_none());
    }

    #[test]
    fn test_mixed_continuation_survives_the_host() {
        let mut extra = ExtraData::default();
        extra
            .values
            .insert("restEndpoint".to_string(), json!("smart_collections"));
        extra.current_batch = Some(CurrentBatch::split(
            vec![json!({"id": 1}).as_object().cloned().unwrap()],
            1,
        ));

        let continuation = Continuation::Mixed(MixedContinuation {
            next_url: Some("https://shop.myshopify.com/admin/api/2025-10/products.json?page_info=a".to_string()),
            scheduled_next_rest_url: Some("https://shop.myshopify.com/admin/api/2025-10/products.json?page_info=b".to_string()),
            skip_next_rest_sync: true,
            lock: true,
            retries: 2,
            last_cost: Some(RequestCost {
                requested_query_cost: 500.0,
                actual_query_cost: Some(480.0),
                throttle_status: ThrottleStatus {
                    maximum_available: 2000.0,
                    currently_available: 1520.0,
                    restore_rate: 100.0,
                },
            }),
            last_max_entries_per_run: Some(50),
            extra_data: extra,
            ..MixedContinuation::default()
        });

        let encoded = continuation.to_host().unwrap();
        assert!(encoded.contains(r#""skipNextRestSync":"true""#));
        assert!(encoded.contains(r#""restEndpoint":"smart_collections""#));
        assert_eq!(Continuation::from_host(&encoded).unwrap(), continuation);
    }

    #[test]
    fn test_from_host_accepts_real_booleans_and_missing_fields() {
        let decoded = Continuation::from_host(r#"{"kind":"rest","skipNextRestSync":false}"#).unwrap();
        assert_eq!(decoded, Continuation::Rest(RestContinuation::default()));
    }

    #[test]
    fn test_from_host_rejects_bad_input() {
        assert!(matches!(
            Continuation::from_host(r#"{"kind":"graphql","lock":"yes"}"#),
            Err(SyncError::InvalidContinuation { .. })
        ));
        assert!(Continuation::from_host(r#"{"kind":"ftp"}"#).is_err());
        assert!(Continuation::from_host("not json").is_err());
    }

    #[test]
    fn test_extra_data_does_not_touch_nested_booleans() {
        let mut extra = ExtraData::default();
        extra.values.insert("lock".to_string(), json!(true));
        let continuation = Continuation::Rest(RestContinuation {
            extra_data: extra,
            ..RestContinuation::default()
        });

        let encoded: Value = serde_json::from_str(&continuation.to_host().unwrap()).unwrap();
        assert_eq!(encoded["extraData"]["lock"], json!(true));
        assert_eq!(Continuation::from_host(&encoded.to_string()).unwrap(), continuation);
    }
}
