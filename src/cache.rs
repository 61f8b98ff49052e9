//! In-memory cache backing conditional requests.
//!
//! Each upstream resource the engine tracks gets one [`CacheEntry`] holding
//! the last validator token (ETag) the server issued and the last
//! successfully mapped payload. Entries live for the process lifetime; there
//! is no disk persistence.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

/// Open/closed partition for repo-scoped list resources.
///
/// Upstream paginates open and closed pull requests / issues as separate
/// queries, so each partition revalidates and caches independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatePartition {
    Open,
    Closed,
}

impl StatePartition {
    /// The `state` query-parameter value for this partition.
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            StatePartition::Open => "open",
            StatePartition::Closed => "closed",
        }
    }
}

/// Structured cache key.
///
/// Keys combine resource type, repo scope, and state partition as enum
/// structure rather than concatenated strings, so collisions across
/// namespaces are impossible by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    AuthenticatedUser,
    OwnRepositories,
    StarredRepositories,
    PullRequests {
        owner: String,
        repo: String,
        state: StatePartition,
    },
    Issues {
        owner: String,
        repo: String,
        state: StatePartition,
    },
}

/// One cached resource: validator token plus last-known-good payload.
///
/// The payload is `None` while only a token is known, which happens when a
/// fresh response carried a payload the mappers could not use. The token is
/// still stored so the next request revalidates correctly.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub etag: Option<String>,
    pub payload: Option<T>,
    pub cached_at: DateTime<Utc>,
}

/// Per-key store of cache entries.
///
/// The lock is held only for map access; payloads are cloned out, so
/// concurrent open/closed branch fetches never serialize on the network.
#[derive(Debug)]
pub struct ResourceCache<T> {
    entries: Mutex<HashMap<ResourceKey, CacheEntry<T>>>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> ResourceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceKey, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The validator token to send with the next conditional request for
    /// this key, if any.
    #[must_use]
    pub fn etag(&self, key: &ResourceKey) -> Option<String> {
        self.lock().get(key).and_then(|e| e.etag.clone())
    }

    /// The last-known-good payload for this key, if any.
    #[must_use]
    pub fn payload(&self, key: &ResourceKey) -> Option<T> {
        self.lock().get(key).and_then(|e| e.payload.clone())
    }

    /// Store fresh data and the validator token the server issued with it.
    pub fn put(&self, key: ResourceKey, etag: Option<String>, payload: T) {
        self.lock().insert(
            key,
            CacheEntry {
                etag,
                payload: Some(payload),
                cached_at: Utc::now(),
            },
        );
    }

    /// Overwrite the validator token without touching the payload.
    ///
    /// Token bookkeeping is independent of payload use: a fresh response
    /// updates the token even when its payload later turns out to be
    /// unusable, so future revalidation stays correct.
    pub fn touch_etag(&self, key: ResourceKey, etag: Option<String>) {
        let mut entries = self.lock();
        match entries.get_mut(&key) {
            Some(entry) => entry.etag = etag,
            None => {
                entries.insert(
                    key,
                    CacheEntry {
                        etag,
                        payload: None,
                        cached_at: Utc::now(),
                    },
                );
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_pulls_key(owner: &str, repo: &str) -> ResourceKey {
        ResourceKey::PullRequests {
            owner: owner.to_string(),
            repo: repo.to_string(),
            state: StatePartition::Open,
        }
    }

    #[test]
    fn state_partition_query_values() {
        assert_eq!(StatePartition::Open.as_query(), "open");
        assert_eq!(StatePartition::Closed.as_query(), "closed");
    }

    #[test]
    fn empty_cache_has_no_entries() {
        let cache: ResourceCache<Vec<String>> = ResourceCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.etag(&ResourceKey::AuthenticatedUser), None);
        assert_eq!(cache.payload(&ResourceKey::AuthenticatedUser), None);
    }

    #[test]
    fn put_stores_etag_and_payload() {
        let cache = ResourceCache::new();
        cache.put(
            ResourceKey::OwnRepositories,
            Some("W/\"abc\"".to_string()),
            vec![1, 2, 3],
        );

        assert_eq!(
            cache.etag(&ResourceKey::OwnRepositories),
            Some("W/\"abc\"".to_string())
        );
        assert_eq!(cache.payload(&ResourceKey::OwnRepositories), Some(vec![1, 2, 3]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_replaces_payload_wholesale() {
        let cache = ResourceCache::new();
        cache.put(ResourceKey::StarredRepositories, None, vec!["a"]);
        cache.put(
            ResourceKey::StarredRepositories,
            Some("\"t2\"".to_string()),
            vec!["b", "c"],
        );

        assert_eq!(
            cache.payload(&ResourceKey::StarredRepositories),
            Some(vec!["b", "c"])
        );
        assert_eq!(
            cache.etag(&ResourceKey::StarredRepositories),
            Some("\"t2\"".to_string())
        );
    }

    #[test]
    fn touch_etag_overwrites_token_but_keeps_payload() {
        let cache = ResourceCache::new();
        cache.put(
            ResourceKey::AuthenticatedUser,
            Some("\"t1\"".to_string()),
            "payload",
        );

        cache.touch_etag(ResourceKey::AuthenticatedUser, Some("\"t2\"".to_string()));
        assert_eq!(
            cache.etag(&ResourceKey::AuthenticatedUser),
            Some("\"t2\"".to_string())
        );
        assert_eq!(cache.payload(&ResourceKey::AuthenticatedUser), Some("payload"));

        // A fresh response without an ETag clears the token.
        cache.touch_etag(ResourceKey::AuthenticatedUser, None);
        assert_eq!(cache.etag(&ResourceKey::AuthenticatedUser), None);
        assert_eq!(cache.payload(&ResourceKey::AuthenticatedUser), Some("payload"));
    }

    #[test]
    fn touch_etag_creates_entry_without_payload() {
        let cache: ResourceCache<String> = ResourceCache::new();
        cache.touch_etag(ResourceKey::AuthenticatedUser, Some("\"t1\"".to_string()));

        assert_eq!(
            cache.etag(&ResourceKey::AuthenticatedUser),
            Some("\"t1\"".to_string())
        );
        assert_eq!(cache.payload(&ResourceKey::AuthenticatedUser), None);
    }

    #[test]
    fn open_and_closed_partitions_are_distinct_keys() {
        let cache = ResourceCache::new();
        let open = open_pulls_key("acme", "widgets");
        let closed = ResourceKey::PullRequests {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            state: StatePartition::Closed,
        };

        cache.put(open.clone(), Some("\"open\"".to_string()), vec![1]);
        cache.put(closed.clone(), Some("\"closed\"".to_string()), vec![2]);

        assert_eq!(cache.payload(&open), Some(vec![1]));
        assert_eq!(cache.payload(&closed), Some(vec![2]));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn pull_request_and_issue_keys_never_collide() {
        let cache = ResourceCache::new();
        let pulls = open_pulls_key("acme", "widgets");
        let issues = ResourceKey::Issues {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            state: StatePartition::Open,
        };

        cache.put(pulls.clone(), None, vec![10]);
        assert_eq!(cache.payload(&issues), None);
        assert_eq!(cache.payload(&pulls), Some(vec![10]));
    }
}
