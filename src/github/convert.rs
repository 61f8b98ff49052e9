//! Mapping from wire types to the display-facing model.
//!
//! All mappers are pure functions over already-decoded values. List decoders
//! take the raw JSON body so the caller can store the validator token before
//! mapping is attempted.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::github::error::GitHubError;
use crate::github::types::{RawIssue, RawLabel, RawPullRequest, RawRepo, RawUser};
use crate::model::{Issue, ItemState, Label, PullRequest, Repo, StateReason, User};

pub fn to_user(raw: RawUser) -> User {
    User {
        id: raw.id,
        username: raw.login,
        avatar_url: raw.avatar_url,
        url: raw.html_url,
    }
}

pub fn to_repo(raw: RawRepo, fetched_at: DateTime<Utc>) -> Repo {
    Repo {
        id: raw.id,
        name: raw.name,
        full_name: raw.full_name,
        owner: raw.owner.map(to_user).unwrap_or_default(),
        description: raw.description,
        url: raw.html_url,
        default_branch: raw.default_branch,
        stars: raw.stargazers_count,
        watchers: raw.watchers_count,
        forks: raw.forks_count,
        open_issues: raw.open_issues_count,
        size: raw.size,
        language: raw.language,
        private: raw.private,
        fork: raw.fork,
        archived: raw.archived,
        disabled: raw.disabled,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        pushed_at: raw.pushed_at,
        fetched_at,
    }
}

pub fn to_pull_request(raw: RawPullRequest) -> PullRequest {
    PullRequest {
        id: raw.id,
        number: raw.number,
        title: raw.title,
        state: item_state(&raw.state),
        draft: raw.draft,
        locked: raw.locked,
        author: raw.user.map(to_user),
        body: raw.body,
        url: raw.html_url,
        source_branch: raw.head.map(|r| r.label).unwrap_or_default(),
        target_branch: raw.base.map(|r| r.label).unwrap_or_default(),
        labels: raw.labels.into_iter().map(to_label).collect(),
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        closed_at: raw.closed_at,
        merged_at: raw.merged_at,
    }
}

pub fn to_issue(raw: RawIssue) -> Issue {
    Issue {
        id: raw.id,
        number: raw.number,
        title: raw.title,
        state: item_state(&raw.state),
        state_reason: raw.state_reason.as_deref().and_then(state_reason),
        locked: raw.locked,
        author: raw.user.map(to_user),
        body: raw.body,
        url: raw.html_url,
        comments: raw.comments,
        labels: raw.labels.into_iter().map(to_label).collect(),
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        closed_at: raw.closed_at,
    }
}

fn to_label(raw: RawLabel) -> Label {
    Label {
        id: raw.id,
        name: raw.name,
        color: raw.color,
    }
}

/// Anything the API reports that is not `closed` counts as open.
fn item_state(state: &str) -> ItemState {
    if state.eq_ignore_ascii_case("closed") {
        ItemState::Closed
    } else {
        ItemState::Open
    }
}

fn state_reason(reason: &str) -> Option<StateReason> {
    match reason {
        "completed" => Some(StateReason::Completed),
        "reopened" => Some(StateReason::Reopened),
        "not_planned" => Some(StateReason::NotPlanned),
        _ => None,
    }
}

/// Decode a repository listing body.
pub fn repo_list(body: Value, fetched_at: DateTime<Utc>) -> Result<Vec<Repo>, GitHubError> {
    let raw: Vec<RawRepo> =
        serde_json::from_value(body).map_err(|e| GitHubError::decode(e.to_string()))?;
    Ok(raw.into_iter().map(|r| to_repo(r, fetched_at)).collect())
}

/// Decode a pull-request listing body.
pub fn pull_request_list(body: Value) -> Result<Vec<PullRequest>, GitHubError> {
    let raw: Vec<RawPullRequest> =
        serde_json::from_value(body).map_err(|e| GitHubError::decode(e.to_string()))?;
    Ok(raw.into_iter().map(to_pull_request).collect())
}

/// Decode an issue listing body.
///
/// The issues endpoint also returns pull requests, marked by a
/// `pull_request` key; those are filtered out here.
pub fn issue_list(body: Value) -> Result<Vec<Issue>, GitHubError> {
    let elements: Vec<Value> =
        serde_json::from_value(body).map_err(|e| GitHubError::decode(e.to_string()))?;
    let mut issues = Vec::with_capacity(elements.len());
    for element in elements {
        if element.get("pull_request").is_some() {
            continue;
        }
        let raw: RawIssue =
            serde_json::from_value(element).map_err(|e| GitHubError::decode(e.to_string()))?;
        issues.push(to_issue(raw));
    }
    Ok(issues)
}

/// Decode the authenticated-user body.
pub fn user_profile(body: Value) -> Result<User, GitHubError> {
    let raw: RawUser =
        serde_json::from_value(body).map_err(|e| GitHubError::decode(e.to_string()))?;
    Ok(to_user(raw))
}
