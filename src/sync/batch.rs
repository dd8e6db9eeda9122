//! Splitting one REST page into GraphQL-sized batches.

use serde::{Deserialize, Serialize};

use crate::sync::Row;

/// Rows of one REST page that still need metafields.
///
/// `processing` is being augmented now; `remaining` waits for later runs.
/// Across a batch's lifetime every row of the page is in `processing`
/// exactly once.
///
/// # Example
///
/// ```rust
/// use shopify_sync::sync::{CurrentBatch, Row};
///
/// let rows: Vec<Row> = (1..=5)
///     .map(|id| serde_json::json!({"id": id}).as_object().unwrap().clone())
///     .collect();
///
/// let batch = CurrentBatch::split(rows, 2);
/// assert_eq!(batch.processing.len(), 2);
/// assert_eq!(batch.remaining.len(), 3);
///
/// let batch = batch.advance(2).unwrap();
/// assert_eq!(batch.processing[0]["id"], 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentBatch {
    /// Rows whose metafields are being fetched.
    pub processing: Vec<Row>,
    /// Rows deferred to later runs, in page order.
    #[serde(default)]
    pub remaining: Vec<Row>,
    /// GIDs of `processing` rows already emitted by an earlier GraphQL page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_ids: Vec<String>,
}

impl CurrentBatch {
    /// Splits rows FIFO: the first `limit` (at least one) go to `processing`.
    #[must_use]
    pub fn split(mut rows: Vec<Row>, limit: usize) -> Self {
        let at = limit.max(1).min(rows.len());
        let remaining = rows.split_off(at);
        Self {
            processing: rows,
            remaining,
            matched_ids: Vec::new(),
        }
    }

    /// Moves on to the next slice of `remaining`, or `None` when the page is
    /// drained.
    #[must_use]
    pub fn advance(self, limit: usize) -> Option<Self> {
        if self.remaining.is_empty() {
            None
        } else {
            Some(Self::split(self.remaining, limit))
        }
    }

    /// Returns `true` if `id` was already emitted for this batch.
    #[must_use]
    pub fn is_matched(&self, id: &str) -> bool {
        self.matched_ids.iter().any(|matched| matched == id)
    }

    /// Total rows still held by the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processing.len() + self.remaining.len()
    }

    /// Returns `true` if the batch holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(ids: std::ops::RangeInclusive<u64>) -> Vec<Row> {
        ids.map(|id| json!({"id": id}).as_object().cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_split_and_advance_cover_every_row_once() {
        let mut batch = Some(CurrentBatch::split(rows(1..=7), 3));
        let mut seen = Vec::new();
        while let Some(current) = batch {
            assert!(current.processing.len() <= 3);
            seen.extend(current.processing.iter().map(|row| row["id"].as_u64().unwrap()));
            batch = current.advance(3);
        }
        assert_eq!(seen, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_smaller_than_limit() {
        let batch = CurrentBatch::split(rows(1..=2), 10);
        assert_eq!(batch.processing.len(), 2);
        assert!(batch.remaining.is_empty());
        assert!(batch.advance(10).is_none());
    }

    #[test]
    fn test_zero_limit_still_makes_progress() {
        let batch = CurrentBatch::split(rows(1..=3), 0);
        assert_eq!(batch.processing.len(), 1);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_matched_ids_are_omitted_when_empty() {
        let batch = CurrentBatch::split(rows(1..=1), 1);
        let value = serde_json::to_value(&batch).unwrap();
        assert!(value.get("matchedIds").is_none());
        assert_eq!(value["remaining"], json!([]));
    }
}
