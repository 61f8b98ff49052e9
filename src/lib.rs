//! Incremental GitHub account sync engine for display clients.
//!
//! The engine keeps a [`model::Snapshot`] of an account (profile, owned and
//! starred repositories) warm in the background and serves per-repo pull
//! request and issue listings on demand. Every upstream read is a
//! conditional request: validator tokens live in a [`cache::ResourceCache`],
//! so unchanged resources cost a 304 and a depleted rate limit quota means
//! a skipped cycle, never lost data.
//!
//! Wiring it up:
//!
//! ```no_run
//! use std::sync::Arc;
//! use hubdeck::avatar::PassthroughResolver;
//! use hubdeck::http::ReqwestTransport;
//! use hubdeck::publish::ChannelPublisher;
//! use hubdeck::settings::{Settings, SettingsBridge};
//! use hubdeck::sync::{scheduler, SyncOrchestrator};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::with_timeout(std::time::Duration::from_secs(30))?;
//! let (publisher, mut updates) = ChannelPublisher::new();
//! let (bridge, settings_rx) = SettingsBridge::new(Settings::default());
//!
//! let engine = Arc::new(SyncOrchestrator::new(
//!     Arc::new(transport),
//!     Arc::new(publisher),
//!     Arc::new(PassthroughResolver),
//!     settings_rx,
//! ));
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! tokio::spawn(scheduler::run(engine.clone(), shutdown_rx));
//!
//! while let Some(update) = updates.recv().await {
//!     // forward to the display client
//!     let _ = update;
//! }
//! # Ok(())
//! # }
//! ```

pub mod avatar;
pub mod cache;
pub mod github;
pub mod http;
pub mod model;
pub mod publish;
pub mod settings;
pub mod sync;

pub use cache::{ResourceCache, ResourceKey, StatePartition};
pub use github::{FetchOutcome, GitHubClient, GitHubError};
pub use model::{Issue, PullRequest, Repo, Snapshot, User};
pub use publish::{ChannelPublisher, Publisher, Update};
pub use settings::{Settings, SettingsBridge, SettingsUpdate};
pub use sync::{SyncOrchestrator, SyncState};
