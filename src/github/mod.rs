//! GitHub REST API integration: conditional client, wire types, mappers.

pub mod client;
pub mod convert;
pub mod error;
pub mod types;

pub use client::{
    parse_rate_limit, routes, FetchOutcome, GitHubClient, RateLimitInfo, GITHUB_API_BASE,
    GITHUB_API_VERSION, MAX_PAGE_SIZE,
};
pub use error::GitHubError;
