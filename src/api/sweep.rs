//! Background pruning of expired in-memory state.
//!
//! Every read path re-checks expiry on its own, so this loop is memory
//! hygiene only; the service is correct with the sweeper disabled.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use super::handlers::auth::AuthState;

/// Spawn a task that periodically drops expired challenges, aged-out
/// rate windows, and naturally-expired revocation entries.
pub fn spawn_sweeper(state: Arc<AuthState>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = if interval.is_zero() {
            Duration::from_secs(1)
        } else {
            interval
        };

        loop {
            sleep(interval).await;
            state.prune_expired(Utc::now());
            debug!("swept expired auth state");
        }
    })
}
