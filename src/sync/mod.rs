//! Sync engine: cycle orchestration and the background loop driving it.

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{SyncOrchestrator, SyncState, STALENESS_THRESHOLD_MINUTES};
