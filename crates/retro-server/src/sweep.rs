use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use retro_api::AppState;

/// Expired sessions stay readable (answered with Gone) for this long
/// before the sweeper reclaims them. The expiry gate, not the sweep,
/// defines visibility.
const GRACE_DAYS: i64 = 7;

/// Background task that prunes sessions long past their expiry.
///
/// Runs on an interval and deletes sessions whose `expires_at` passed more
/// than the grace period ago; their cards and votes go via cascade.
pub async fn run_sweep_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let cutoff = (Utc::now() - chrono::Duration::days(GRACE_DAYS)).to_rfc3339();
        let state = state.clone();
        let result =
            tokio::task::spawn_blocking(move || state.db.delete_sessions_expired_before(&cutoff))
                .await;

        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Sweep: pruned {} expired sessions", count);
                }
            }
            Ok(Err(e)) => warn!("Sweep error: {}", e),
            Err(e) => warn!("Sweep join error: {}", e),
        }
    }
}
