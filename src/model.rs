//! Display-facing data model.
//!
//! These types are what the engine publishes toward clients, serialized in
//! camelCase. They are deliberately decoupled from the upstream API wire
//! shapes (see [`crate::github::types`]); the mappers in
//! [`crate::github::convert`] bridge the two.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An account, either the authenticated user or a repo owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub url: String,
}

/// A repository, from either the owned or the starred listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: User,
    pub description: Option<String>,
    pub url: String,
    pub default_branch: Option<String>,
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub size: u64,
    pub language: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub archived: bool,
    pub disabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    /// When this engine fetched the listing the repo came from.
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

/// Why a closed issue was closed, when upstream reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateReason {
    Completed,
    Reopened,
    NotPlanned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: u64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: ItemState,
    pub draft: bool,
    pub locked: bool,
    pub author: Option<User>,
    pub body: Option<String>,
    pub url: String,
    pub source_branch: String,
    pub target_branch: String,
    pub labels: Vec<Label>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: ItemState,
    pub state_reason: Option<StateReason>,
    pub locked: bool,
    pub author: Option<User>,
    pub body: Option<String>,
    pub url: String,
    pub comments: u64,
    pub labels: Vec<Label>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// The account-level view published after every sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub user: Option<User>,
    pub my_repositories: Vec<Repo>,
    pub starred_repositories: Vec<Repo>,
    /// Completion time of the most recent sync cycle, including cycles
    /// that ended rate-limited or failed.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Whether the snapshot is older than `threshold` as of `now`.
    ///
    /// A snapshot with no completed cycle yet is always stale.
    #[must_use]
    pub fn is_stale(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        match self.last_updated {
            Some(at) => now - at > threshold,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_without_cycle_is_stale() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_stale(Duration::minutes(15), Utc::now()));
    }

    #[test]
    fn snapshot_staleness_respects_threshold() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut snapshot = Snapshot::default();

        snapshot.last_updated = Some(now - Duration::minutes(14));
        assert!(!snapshot.is_stale(Duration::minutes(15), now));

        snapshot.last_updated = Some(now - Duration::minutes(16));
        assert!(snapshot.is_stale(Duration::minutes(15), now));
    }

    #[test]
    fn user_serializes_camel_case() {
        let user = User {
            id: 7,
            username: "octocat".to_string(),
            avatar_url: Some("https://example.com/a.png".to_string()),
            url: "https://example.com/octocat".to_string(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["avatarUrl"], "https://example.com/a.png");
        assert_eq!(json["username"], "octocat");
    }

    #[test]
    fn item_state_uses_lowercase_wire_form() {
        assert_eq!(serde_json::to_value(ItemState::Open).unwrap(), "open");
        assert_eq!(serde_json::to_value(ItemState::Closed).unwrap(), "closed");
    }

    #[test]
    fn state_reason_uses_snake_case_wire_form() {
        assert_eq!(
            serde_json::to_value(StateReason::NotPlanned).unwrap(),
            "not_planned"
        );
    }
}
