//! Avatar URL resolution.
//!
//! Display clients may need avatar URLs rewritten (proxied, cached, resized)
//! before they are usable. The engine delegates that to an
//! [`AvatarResolver`] and treats failures as cosmetic: the upstream URL is
//! kept and the sync cycle continues.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::model::User;

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("avatar unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AvatarResolver: Send + Sync {
    /// Map an upstream avatar URL to the URL a display client should use.
    async fn resolve(&self, url: &str) -> Result<String, AvatarError>;
}

/// Resolver that hands the upstream URL through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

#[async_trait]
impl AvatarResolver for PassthroughResolver {
    async fn resolve(&self, url: &str) -> Result<String, AvatarError> {
        Ok(url.to_string())
    }
}

/// Rewrite `user.avatar_url` through the resolver, keeping the upstream URL
/// when resolution fails.
pub async fn decorate_user(resolver: &dyn AvatarResolver, user: &mut User) {
    let Some(upstream) = user.avatar_url.clone() else {
        return;
    };
    match resolver.resolve(&upstream).await {
        Ok(resolved) => user.avatar_url = Some(resolved),
        Err(err) => {
            debug!(username = %user.username, %err, "avatar resolution failed, keeping upstream url");
        }
    }
}
