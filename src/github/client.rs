//! Conditional-request client for the GitHub REST API.
//!
//! Every read goes through [`GitHubClient::get_conditional`], which attaches
//! the cached validator token as `If-None-Match` and classifies the response
//! into a [`FetchOutcome`]. Rate limiting is an outcome, not an error: a
//! depleted quota means "skip this cycle, keep what is cached".

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use crate::github::error::GitHubError;
use crate::http::{HttpHeaders, HttpRequest, HttpResponse, HttpTransport};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Upstream caps list pages at 100 elements.
pub const MAX_PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("hubdeck/", env!("CARGO_PKG_VERSION"));

/// Rate-limit state reported in response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: Option<DateTime<Utc>>,
}

/// Parse `x-ratelimit-*` headers, if the response carries them.
#[must_use]
pub fn parse_rate_limit(response: &HttpResponse) -> Option<RateLimitInfo> {
    let limit = response.header("x-ratelimit-limit")?.parse().ok()?;
    let remaining = response.header("x-ratelimit-remaining")?.parse().ok()?;
    let reset_at = response
        .header("x-ratelimit-reset")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    Some(RateLimitInfo {
        limit,
        remaining,
        reset_at,
    })
}

/// Result of one conditional fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The resource changed (or was fetched for the first time). The body is
    /// raw JSON; the caller stores `etag` before attempting to map it.
    Fresh {
        body: Value,
        etag: Option<String>,
    },
    /// Not modified since the token we presented; serve from cache.
    NotModified { etag: Option<String> },
    /// Quota depleted. Skip this cycle; cached data stays valid.
    RateLimited,
}

/// Thin authenticated client over an [`HttpTransport`].
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    token: Arc<str>,
}

impl GitHubClient {
    pub fn new(transport: Arc<dyn HttpTransport>, token: impl Into<Arc<str>>) -> Self {
        Self {
            transport,
            token: token.into(),
        }
    }

    fn headers(&self, cached_etag: Option<&str>) -> HttpHeaders {
        let mut headers: HttpHeaders = vec![
            ("Accept".to_string(), "application/vnd.github+json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (
                "X-GitHub-Api-Version".to_string(),
                GITHUB_API_VERSION.to_string(),
            ),
        ];
        if !self.token.is_empty() {
            headers.push(("Authorization".to_string(), format!("Bearer {}", self.token)));
        }
        if let Some(etag) = cached_etag {
            headers.push(("If-None-Match".to_string(), etag.to_string()));
        }
        headers
    }

    /// Issue a conditional GET for `route` (a path-and-query relative to the
    /// API base) and classify the response.
    pub async fn get_conditional(
        &self,
        route: &str,
        cached_etag: Option<&str>,
    ) -> Result<FetchOutcome, GitHubError> {
        let url = format!("{GITHUB_API_BASE}{route}");
        let response = self
            .transport
            .get(HttpRequest {
                url,
                headers: self.headers(cached_etag),
            })
            .await?;

        let etag = response.header("etag").map(str::to_string);
        match response.status {
            200 => {
                let body: Value = serde_json::from_slice(&response.body)
                    .map_err(|e| GitHubError::decode(e.to_string()))?;
                Ok(FetchOutcome::Fresh { body, etag })
            }
            304 => Ok(FetchOutcome::NotModified { etag }),
            status @ (403 | 429) if rate_limit_depleted(&response) => {
                debug!(route, status, "rate limit depleted, skipping fetch");
                Ok(FetchOutcome::RateLimited)
            }
            401 | 403 => Err(GitHubError::AuthRejected),
            404 => Err(GitHubError::not_found(route)),
            status => Err(GitHubError::unexpected_status(status, route)),
        }
    }
}

fn rate_limit_depleted(response: &HttpResponse) -> bool {
    parse_rate_limit(response).is_some_and(|info| info.remaining == 0)
}

/// Route builders for the endpoints the engine reads.
pub mod routes {
    use super::MAX_PAGE_SIZE;
    use crate::cache::StatePartition;

    pub fn authenticated_user() -> String {
        "/user".to_string()
    }

    pub fn own_repositories(per_page: u32) -> String {
        format!(
            "/user/repos?sort=updated&per_page={}",
            per_page.min(MAX_PAGE_SIZE)
        )
    }

    pub fn starred_repositories(per_page: u32) -> String {
        format!(
            "/user/starred?sort=updated&per_page={}",
            per_page.min(MAX_PAGE_SIZE)
        )
    }

    pub fn pull_requests(owner: &str, repo: &str, state: StatePartition, per_page: u32) -> String {
        format!(
            "/repos/{owner}/{repo}/pulls?state={}&per_page={}",
            state.as_query(),
            per_page.min(MAX_PAGE_SIZE)
        )
    }

    pub fn issues(owner: &str, repo: &str, state: StatePartition, per_page: u32) -> String {
        format!(
            "/repos/{owner}/{repo}/issues?state={}&per_page={}",
            state.as_query(),
            per_page.min(MAX_PAGE_SIZE)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{header_get, ScriptedTransport};
    use crate::StatePartition;
    use serde_json::json;

    fn json_response(status: u16, headers: Vec<(&str, &str)>, body: Value) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    fn client(transport: &ScriptedTransport, token: &str) -> GitHubClient {
        GitHubClient::new(Arc::new(transport.clone()), token)
    }

    #[tokio::test]
    async fn fresh_response_carries_body_and_etag() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            format!("{GITHUB_API_BASE}/user"),
            json_response(200, vec![("ETag", "W/\"t1\"")], json!({"id": 1, "login": "me"})),
        );

        let outcome = client(&transport, "tok")
            .get_conditional(&routes::authenticated_user(), None)
            .await
            .unwrap();

        match outcome {
            FetchOutcome::Fresh { body, etag } => {
                assert_eq!(body["login"], "me");
                assert_eq!(etag.as_deref(), Some("W/\"t1\""));
            }
            other => panic!("expected fresh outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cached_etag_is_sent_as_if_none_match() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            format!("{GITHUB_API_BASE}/user"),
            json_response(304, vec![("ETag", "W/\"t1\"")], Value::Null),
        );

        let outcome = client(&transport, "tok")
            .get_conditional(&routes::authenticated_user(), Some("W/\"t1\""))
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::NotModified { .. }));

        let requests = transport.requests();
        assert_eq!(
            header_get(&requests[0].headers, "if-none-match"),
            Some("W/\"t1\"")
        );
        assert_eq!(
            header_get(&requests[0].headers, "authorization"),
            Some("Bearer tok")
        );
        assert_eq!(
            header_get(&requests[0].headers, "x-github-api-version"),
            Some(GITHUB_API_VERSION)
        );
    }

    #[tokio::test]
    async fn first_fetch_sends_no_validator_and_no_auth_for_empty_token() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            format!("{GITHUB_API_BASE}/user"),
            json_response(200, vec![], json!({"id": 1, "login": "me"})),
        );

        client(&transport, "")
            .get_conditional(&routes::authenticated_user(), None)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(header_get(&requests[0].headers, "if-none-match"), None);
        assert_eq!(header_get(&requests[0].headers, "authorization"), None);
    }

    #[tokio::test]
    async fn depleted_quota_is_an_outcome_not_an_error() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            format!("{GITHUB_API_BASE}/user"),
            json_response(
                403,
                vec![
                    ("x-ratelimit-limit", "60"),
                    ("x-ratelimit-remaining", "0"),
                    ("x-ratelimit-reset", "1750000000"),
                ],
                json!({"message": "API rate limit exceeded"}),
            ),
        );

        let outcome = client(&transport, "tok")
            .get_conditional(&routes::authenticated_user(), None)
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::RateLimited));
    }

    #[tokio::test]
    async fn forbidden_with_remaining_quota_is_auth_rejection() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            format!("{GITHUB_API_BASE}/user"),
            json_response(
                403,
                vec![("x-ratelimit-limit", "60"), ("x-ratelimit-remaining", "42")],
                json!({"message": "forbidden"}),
            ),
        );

        let err = client(&transport, "bad")
            .get_conditional(&routes::authenticated_user(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::AuthRejected));
    }

    #[tokio::test]
    async fn unauthorized_is_auth_rejection() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            format!("{GITHUB_API_BASE}/user"),
            json_response(401, vec![], json!({"message": "bad credentials"})),
        );

        let err = client(&transport, "bad")
            .get_conditional(&routes::authenticated_user(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::AuthRejected));
    }

    #[tokio::test]
    async fn unhandled_status_is_reported_with_route() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            format!("{GITHUB_API_BASE}/user"),
            json_response(500, vec![], json!({"message": "boom"})),
        );

        let err = client(&transport, "tok")
            .get_conditional(&routes::authenticated_user(), None)
            .await
            .unwrap_err();
        match err {
            GitHubError::UnexpectedStatus { status, route } => {
                assert_eq!(status, 500);
                assert_eq!(route, "/user");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rate_limit_headers_parse() {
        let resp = json_response(
            200,
            vec![
                ("x-ratelimit-limit", "5000"),
                ("x-ratelimit-remaining", "4999"),
                ("x-ratelimit-reset", "1750000000"),
            ],
            Value::Null,
        );
        let info = parse_rate_limit(&resp).unwrap();
        assert_eq!(info.limit, 5000);
        assert_eq!(info.remaining, 4999);
        assert!(info.reset_at.is_some());

        let bare = json_response(200, vec![], Value::Null);
        assert_eq!(parse_rate_limit(&bare), None);
    }

    #[test]
    fn route_builders_clamp_page_size() {
        assert_eq!(
            routes::own_repositories(500),
            "/user/repos?sort=updated&per_page=100"
        );
        assert_eq!(
            routes::pull_requests("acme", "widgets", StatePartition::Closed, 100),
            "/repos/acme/widgets/pulls?state=closed&per_page=100"
        );
        assert_eq!(
            routes::issues("acme", "widgets", StatePartition::Open, 30),
            "/repos/acme/widgets/issues?state=open&per_page=30"
        );
    }
}
