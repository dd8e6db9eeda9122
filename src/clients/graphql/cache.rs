//! In-process response cache for GraphQL reads.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::time::Instant;

#[derive(Debug)]
struct CacheEntry {
    body: Value,
    expires_at: Instant,
}

/// Successful response bodies keyed by `(query, variables)`.
///
/// Entries expire after the TTL of the request that stored them. Expired
/// entries are dropped on lookup and whenever a new entry is stored.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<u64, CacheEntry>>,
}

impl ResponseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(query: &str, variables: &Map<String, Value>) -> u64 {
        let mut hasher = DefaultHasher::new();
        query.hash(&mut hasher);
        // serde_json maps are ordered, so the rendering is stable.
        Value::Object(variables.clone()).to_string().hash(&mut hasher);
        hasher.finish()
    }

    /// Returns a live entry.
    #[must_use]
    pub fn get(&self, query: &str, variables: &Map<String, Value>) -> Option<Value> {
        let key = Self::key(query, variables);
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores a body for `ttl`, dropping every entry that has already expired.
    pub fn insert(&self, query: &str, variables: &Map<String, Value>, body: Value, ttl: Duration) {
        let key = Self::key(query, variables);
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                body,
                expires_at: now + ttl,
            },
        );
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new();
        let variables = vars(json!({"first": 10}));
        cache.insert("{ a }", &variables, json!({"data": 1}), Duration::from_secs(5));

        assert_eq!(cache.get("{ a }", &variables), Some(json!({"data": 1})));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.get("{ a }", &variables).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_prunes_expired_entries() {
        let cache = ResponseCache::new();
        cache.insert("{ a }", &vars(json!({})), json!(1), Duration::from_secs(1));
        cache.insert("{ b }", &vars(json!({})), json!(2), Duration::from_secs(60));
        assert_eq!(cache.len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        cache.insert("{ c }", &vars(json!({})), json!(3), Duration::from_secs(60));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("{ a }", &vars(json!({}))).is_none());
        assert_eq!(cache.get("{ b }", &vars(json!({}))), Some(json!(2)));
    }

    #[test]
    fn test_variables_are_part_of_the_key() {
        let cache = ResponseCache::new();
        cache.insert(
            "{ a }",
            &vars(json!({"first": 10})),
            json!(1),
            Duration::from_secs(60),
        );
        assert!(cache.get("{ a }", &vars(json!({"first": 11}))).is_none());
        assert!(cache.get("{ b }", &vars(json!({"first": 10}))).is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
