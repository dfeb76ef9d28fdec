//! Expiry Sweeper
//!
//! Background task that removes sessions older than the session TTL on a
//! cron schedule. The storage layer cascades the deletion to the
//! sessions' tasks.

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::Store;

/// Parses a cron pattern into a schedule.
///
/// Five-field patterns (minute precision, as in `0 */6 * * *`) get a
/// seconds column prepended; six- and seven-field patterns are passed
/// through unchanged.
pub fn parse_cron_pattern(pattern: &str) -> Result<Schedule, cron::error::Error> {
    let normalized = if pattern.split_whitespace().count() == 5 {
        format!("0 {}", pattern)
    } else {
        pattern.to_string()
    };

    Schedule::from_str(&normalized)
}

/// Spawns the expiry sweeper.
///
/// The task sleeps until the schedule's next occurrence, then deletes all
/// sessions created at or before `now - session_ttl`. A failed run is
/// logged and skipped; the next scheduled run catches up. Running with no
/// expired sessions is a no-op.
///
/// # Arguments
/// * `store` - Store handle used for the deletions
/// * `schedule` - Parsed cron schedule
/// * `session_ttl` - Session lifetime in seconds
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_expiry_sweeper(
    store: Store,
    schedule: Schedule,
    session_ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting expiry sweeper with session TTL of {} seconds",
            session_ttl.as_secs()
        );

        loop {
            let now = Utc::now();
            let Some(next) = schedule.after(&now).next() else {
                warn!("Sweeper schedule has no future occurrences, stopping");
                break;
            };

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!("Next expiry sweep at {}", next);
            tokio::time::sleep(wait).await;

            if let Err(error) = run_sweep(&store, session_ttl).await {
                // Skip this cycle; the next scheduled run catches up.
                warn!("Expiry sweep failed, skipping this cycle: {}", error);
            }
        }
    })
}

/// Performs one sweep: deletes every session (and, via cascade, its
/// tasks) created at or before `now - session_ttl`.
pub async fn run_sweep(store: &Store, session_ttl: Duration) -> sqlx::Result<u64> {
    let cutoff = Utc::now()
        - chrono::Duration::from_std(session_ttl).unwrap_or(chrono::Duration::zero());

    info!("Deleting sessions older than {}", cutoff.to_rfc2822());

    let deleted = store.delete_sessions_created_before(cutoff).await?;

    info!("Expiry sweep complete: {} session(s) removed.", deleted);
    Ok(deleted)
}
