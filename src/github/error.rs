//! Error type for GitHub API interaction.

use thiserror::Error;

use crate::http::HttpError;

#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// A response body could not be decoded or mapped.
    #[error("decode error: {0}")]
    Decode(String),

    /// The token was rejected (401, or 403 outside rate limiting).
    #[error("credentials rejected by the API")]
    AuthRejected,

    /// The requested route does not exist or is not visible to this token.
    #[error("not found: {route}")]
    NotFound { route: String },

    /// A status code the engine has no handling for.
    #[error("unexpected status {status} from {route}")]
    UnexpectedStatus { status: u16, route: String },
}

impl GitHubError {
    pub fn decode(message: impl Into<String>) -> Self {
        GitHubError::Decode(message.into())
    }

    pub fn not_found(route: impl Into<String>) -> Self {
        GitHubError::NotFound {
            route: route.into(),
        }
    }

    pub fn unexpected_status(status: u16, route: impl Into<String>) -> Self {
        GitHubError::UnexpectedStatus {
            status,
            route: route.into(),
        }
    }
}
