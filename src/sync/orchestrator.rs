//! Sync cycle orchestration.
//!
//! A cycle fetches the authenticated user first, then owned and starred
//! repositories concurrently, each through the conditional client so
//! unchanged resources cost a 304 instead of a payload. Whatever happens,
//! the cycle stamps its completion time and publishes the snapshot; failures
//! degrade to the last-known-good cache instead of erasing state.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::avatar::{decorate_user, AvatarResolver};
use crate::cache::{ResourceCache, ResourceKey, StatePartition};
use crate::github::{convert, routes, FetchOutcome, GitHubClient, GitHubError, MAX_PAGE_SIZE};
use crate::http::HttpTransport;
use crate::model::{Issue, PullRequest, Repo, Snapshot, User};
use crate::publish::{Publisher, Update};
use crate::settings::Settings;

/// Reads older than this trigger a refresh at the read boundary.
pub const STALENESS_THRESHOLD_MINUTES: i64 = 15;

/// Where the engine currently is in its sync loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Cooldown,
}

/// The engine: caches, snapshot, and the fetch choreography over them.
///
/// All dependencies are injected, so one process can run several engines
/// against different accounts or transports.
pub struct SyncOrchestrator {
    transport: Arc<dyn HttpTransport>,
    publisher: Arc<dyn Publisher>,
    resolver: Arc<dyn AvatarResolver>,
    settings: watch::Receiver<Settings>,
    users: ResourceCache<User>,
    repo_lists: ResourceCache<Vec<Repo>>,
    pull_lists: ResourceCache<Vec<PullRequest>>,
    issue_lists: ResourceCache<Vec<Issue>>,
    snapshot: Mutex<Snapshot>,
    state: Mutex<SyncState>,
}

impl SyncOrchestrator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        publisher: Arc<dyn Publisher>,
        resolver: Arc<dyn AvatarResolver>,
        settings: watch::Receiver<Settings>,
    ) -> Self {
        Self {
            transport,
            publisher,
            resolver,
            settings,
            users: ResourceCache::new(),
            repo_lists: ResourceCache::new(),
            pull_lists: ResourceCache::new(),
            issue_lists: ResourceCache::new(),
            snapshot: Mutex::new(Snapshot::default()),
            state: Mutex::new(SyncState::default()),
        }
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: SyncState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn client(&self) -> GitHubClient {
        let token = self.settings.borrow().access_token.clone();
        GitHubClient::new(self.transport.clone(), token.as_str())
    }

    /// A fresh receiver on the settings channel, for the scheduler.
    pub(crate) fn settings_receiver(&self) -> watch::Receiver<Settings> {
        self.settings.clone()
    }

    /// Whether the current snapshot is past the read-boundary threshold.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.lock_snapshot()
            .is_stale(Duration::minutes(STALENESS_THRESHOLD_MINUTES), Utc::now())
    }

    /// The current snapshot, refreshed first if it has gone stale.
    pub async fn snapshot(&self) -> Snapshot {
        if self.is_stale() {
            debug!("snapshot stale at read boundary, refreshing");
            self.run_cycle().await;
        }
        self.lock_snapshot().clone()
    }

    /// Run one full sync cycle and publish the resulting snapshot.
    ///
    /// The user fetch gates the rest: if identity cannot be established this
    /// cycle (rate limited, bad token, transport down), the repo fetches are
    /// skipped and existing snapshot data stays as it was. The completion
    /// stamp and the publish happen regardless.
    pub async fn run_cycle(&self) {
        self.set_state(SyncState::Syncing);
        let client = self.client();

        if let Some(user) = self.fetch_user(&client).await {
            let fetched_at = Utc::now();
            let own_route = routes::own_repositories(MAX_PAGE_SIZE);
            let starred_route = routes::starred_repositories(MAX_PAGE_SIZE);
            let (own, starred) = tokio::join!(
                fetch_cached(
                    &client,
                    &self.repo_lists,
                    ResourceKey::OwnRepositories,
                    &own_route,
                    |body| convert::repo_list(body, fetched_at),
                ),
                fetch_cached(
                    &client,
                    &self.repo_lists,
                    ResourceKey::StarredRepositories,
                    &starred_route,
                    |body| convert::repo_list(body, fetched_at),
                ),
            );

            let mut snapshot = self.lock_snapshot();
            snapshot.user = Some(user);
            if let Some(own) = own {
                snapshot.my_repositories = own;
            }
            if let Some(starred) = starred {
                snapshot.starred_repositories = starred;
            }
        } else {
            debug!("user identity unavailable, skipping repository fetches");
        }

        let snapshot = {
            let mut snapshot = self.lock_snapshot();
            snapshot.last_updated = Some(Utc::now());
            snapshot.clone()
        };
        self.set_state(SyncState::Cooldown);
        self.publisher.publish(Update::Snapshot(snapshot));
    }

    /// Establish identity for this cycle.
    ///
    /// `None` means no usable identity right now; the cycle must not touch
    /// repository listings.
    async fn fetch_user(&self, client: &GitHubClient) -> Option<User> {
        let key = ResourceKey::AuthenticatedUser;
        let cached_etag = self.users.etag(&key);
        match client
            .get_conditional(&routes::authenticated_user(), cached_etag.as_deref())
            .await
        {
            Ok(FetchOutcome::Fresh { body, etag }) => {
                // Token bookkeeping happens before mapping so a malformed
                // body cannot wedge future revalidation.
                self.users.touch_etag(key.clone(), etag.clone());
                match convert::user_profile(body) {
                    Ok(mut user) => {
                        decorate_user(self.resolver.as_ref(), &mut user).await;
                        self.users.put(key, etag, user.clone());
                        Some(user)
                    }
                    Err(err) => {
                        warn!(%err, "user payload unusable, falling back to cache");
                        self.users.payload(&key)
                    }
                }
            }
            Ok(FetchOutcome::NotModified { etag }) => {
                if etag.is_some() {
                    self.users.touch_etag(key.clone(), etag);
                }
                self.users.payload(&key)
            }
            Ok(FetchOutcome::RateLimited) => {
                warn!("rate limited fetching user, skipping this cycle");
                None
            }
            Err(err) => {
                warn!(%err, "user fetch failed, skipping this cycle");
                None
            }
        }
    }

    /// Fetch open and closed pull requests of one repo, publish and return
    /// the combined list (open first, then closed).
    pub async fn pull_requests(&self, owner: &str, repo: &str) -> Vec<PullRequest> {
        let client = self.client();
        let open_route = routes::pull_requests(owner, repo, StatePartition::Open, MAX_PAGE_SIZE);
        let closed_route =
            routes::pull_requests(owner, repo, StatePartition::Closed, MAX_PAGE_SIZE);
        let (open, closed) = tokio::join!(
            fetch_cached(
                &client,
                &self.pull_lists,
                ResourceKey::PullRequests {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    state: StatePartition::Open,
                },
                &open_route,
                convert::pull_request_list,
            ),
            fetch_cached(
                &client,
                &self.pull_lists,
                ResourceKey::PullRequests {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    state: StatePartition::Closed,
                },
                &closed_route,
                convert::pull_request_list,
            ),
        );

        let mut combined = open.unwrap_or_default();
        combined.extend(closed.unwrap_or_default());
        self.publisher.publish(Update::PullRequests(combined.clone()));
        combined
    }

    /// Fetch open and closed issues of one repo, publish and return the
    /// combined list (open first, then closed).
    pub async fn issues(&self, owner: &str, repo: &str) -> Vec<Issue> {
        let client = self.client();
        let open_route = routes::issues(owner, repo, StatePartition::Open, MAX_PAGE_SIZE);
        let closed_route = routes::issues(owner, repo, StatePartition::Closed, MAX_PAGE_SIZE);
        let (open, closed) = tokio::join!(
            fetch_cached(
                &client,
                &self.issue_lists,
                ResourceKey::Issues {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    state: StatePartition::Open,
                },
                &open_route,
                convert::issue_list,
            ),
            fetch_cached(
                &client,
                &self.issue_lists,
                ResourceKey::Issues {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    state: StatePartition::Closed,
                },
                &closed_route,
                convert::issue_list,
            ),
        );

        let mut combined = open.unwrap_or_default();
        combined.extend(closed.unwrap_or_default());
        self.publisher.publish(Update::Issues(combined.clone()));
        combined
    }
}

/// One conditional fetch with last-known-good fallback.
///
/// Fresh data replaces the cache entry; anything else (not modified, rate
/// limited, transport error, unusable payload) serves whatever the cache
/// already holds. `None` only when the resource was never cached.
async fn fetch_cached<T, F>(
    client: &GitHubClient,
    cache: &ResourceCache<T>,
    key: ResourceKey,
    route: &str,
    map: F,
) -> Option<T>
where
    T: Clone,
    F: FnOnce(Value) -> Result<T, GitHubError>,
{
    let cached_etag = cache.etag(&key);
    match client.get_conditional(route, cached_etag.as_deref()).await {
        Ok(FetchOutcome::Fresh { body, etag }) => {
            cache.touch_etag(key.clone(), etag.clone());
            match map(body) {
                Ok(payload) => {
                    cache.put(key, etag, payload.clone());
                    Some(payload)
                }
                Err(err) => {
                    warn!(route, %err, "payload unusable, serving cached data");
                    cache.payload(&key)
                }
            }
        }
        Ok(FetchOutcome::NotModified { etag }) => {
            if etag.is_some() {
                cache.touch_etag(key.clone(), etag);
            }
            cache.payload(&key)
        }
        Ok(FetchOutcome::RateLimited) => {
            warn!(route, "rate limited, serving cached data");
            cache.payload(&key)
        }
        Err(err) => {
            warn!(route, %err, "fetch failed, serving cached data");
            cache.payload(&key)
        }
    }
}
