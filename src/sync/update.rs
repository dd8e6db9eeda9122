//! Writing edited rows back to the shop.
//!
//! Each row is independent: one failing row never affects the others.

use serde_json::Value;

use crate::clients::Transport;
use crate::sync::metafields::{metafields_delete_request, metafields_set_request};
use crate::sync::{Row, SyncEngine, SyncError, UpdatableResource};

/// A row before and after the host edited it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowUpdate {
    /// Row as last synced.
    pub previous: Row,
    /// Row as edited.
    pub new: Row,
}

/// Fields of `new` whose value differs from `previous`.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use shopify_sync::sync::changed_fields;
///
/// let previous = json!({"id": 1, "title": "Hat", "vendor": "Acme"});
/// let new = json!({"id": 1, "title": "Cap", "vendor": "Acme"});
/// let changes = changed_fields(previous.as_object().unwrap(), new.as_object().unwrap());
///
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes["title"], "Cap");
/// ```
#[must_use]
pub fn changed_fields(previous: &Row, new: &Row) -> Row {
    new.iter()
        .filter(|(key, value)| previous.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl<T: Transport> SyncEngine<T> {
    /// Writes each edited row back and returns one result per row, in order.
    ///
    /// Non-metafield changes go through the façade's REST update; metafield
    /// changes through `metafieldsSet` (and `metafieldsDelete` for `null`
    /// values). Rows without changes are returned without any request.
    pub async fn sync_update<R>(
        &self,
        resource: &R,
        updates: Vec<RowUpdate>,
    ) -> Vec<Result<Row, SyncError>>
    where
        R: UpdatableResource + ?Sized,
    {
        let metafield_keys = resource.metafield_keys();
        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            let result = self.update_row(resource, &metafield_keys, update).await;
            if let Err(error) = &result {
                tracing::warn!(error = %error, "Row update failed");
            }
            results.push(result);
        }
        results
    }

    async fn update_row<R>(
        &self,
        resource: &R,
        metafield_keys: &[String],
        update: RowUpdate,
    ) -> Result<Row, SyncError>
    where
        R: UpdatableResource + ?Sized,
    {
        let changes = changed_fields(&update.previous, &update.new);
        if changes.is_empty() {
            return Ok(update.new);
        }

        let (metafield_changes, field_changes): (Row, Row) = changes
            .into_iter()
            .partition(|(key, _)| metafield_keys.contains(key));

        let mut row = update.new;

        if !field_changes.is_empty() {
            let request = resource.update_request(&update.previous, &field_changes)?;
            let response = self.rest().put(&request.path, request.body).await?;
            row.extend(resource.parse_updated_row(&response.body)?);
        }

        if !metafield_changes.is_empty() {
            let owner = resource
                .owner_gid(&update.previous)
                .ok_or_else(|| SyncError::RowUpdate {
                    id: "<unknown>".to_string(),
                    message: "row has no owner id for its metafields".to_string(),
                })?;

            let (cleared, set): (Row, Row) = metafield_changes
                .into_iter()
                .partition(|(_, value)| value.is_null());

            if !set.is_empty() {
                let request = metafields_set_request(&owner, &set, |key| resource.metafield_type(key))?;
                self.graphql().execute_with_retry(request).await?;
            }
            if !cleared.is_empty() {
                let keys: Vec<&str> = cleared.keys().map(String::as_str).collect();
                let request = metafields_delete_request(&owner, &keys)?;
                self.graphql().execute_with_retry(request).await?;
            }

            for (key, value) in set.into_iter().chain(cleared) {
                row.insert(key, value);
            }
            tracing::debug!(owner = %owner, "Metafields updated");
        }

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_changed_fields_includes_new_keys() {
        let changes = changed_fields(
            &row(json!({"id": 1, "title": "Hat"})),
            &row(json!({"id": 1, "title": "Hat", "custom.color": "red"})),
        );
        assert_eq!(changes, row(json!({"custom.color": "red"})));
    }

    #[test]
    fn test_unchanged_rows_have_no_changes() {
        let same = row(json!({"id": 1, "title": "Hat"}));
        assert!(changed_fields(&same, &same).is_empty());
    }
}
