//! Background sync loop.
//!
//! Runs cycles back to back with a cooldown between them. A settings change
//! cuts the current cooldown short so the new interval and token apply on
//! the next cycle; it never interrupts a cycle already in flight.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::sync::orchestrator::SyncOrchestrator;

/// Drive the orchestrator until `shutdown` signals (a value change or its
/// sender dropping).
pub async fn run(orchestrator: Arc<SyncOrchestrator>, mut shutdown: watch::Receiver<bool>) {
    let mut settings_rx = orchestrator.settings_receiver();
    settings_rx.mark_unchanged();

    loop {
        orchestrator.run_cycle().await;

        let cooldown = settings_rx.borrow_and_update().effective_interval();
        debug!(secs = cooldown.as_secs(), "cooldown until next cycle");

        tokio::select! {
            _ = tokio::time::sleep(cooldown) => {}
            changed = settings_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                debug!("settings changed, starting next cycle early");
            }
            _ = shutdown.changed() => break,
        }
    }
    debug!("sync loop stopped");
}
