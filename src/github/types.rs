//! Wire types for the upstream REST API.
//!
//! Decoding is tolerant by design: fields the engine can live without carry
//! `#[serde(default)]` or are `Option`, so one missing field in one element
//! does not sink a whole listing.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Option<RawUser>,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub size: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// The `head`/`base` refs on a pull request; only the label is used.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBranchRef {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub locked: bool,
    pub user: Option<RawUser>,
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub head: Option<RawBranchRef>,
    pub base: Option<RawBranchRef>,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: String,
    pub state_reason: Option<String>,
    #[serde(default)]
    pub locked: bool,
    pub user: Option<RawUser>,
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}
