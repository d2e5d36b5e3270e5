//! Periodic cleanup of in-process state
//!
//! The subscription cache and the per-(user, channel) locks gain one entry
//! per pair ever checked. A background task sweeps both on a fixed interval:
//! cache entries past their TTL and locks nobody holds are dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::context::ServiceContext;

/// Shortest interval between sweeps
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// What one sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_subscriptions: usize,
    pub idle_locks: usize,
}

/// Drop stale cache entries and idle locks as of `now`
pub fn sweep(ctx: &ServiceContext, now: DateTime<Utc>) -> SweepReport {
    SweepReport {
        expired_subscriptions: ctx.subscription_cache().purge_expired(now),
        idle_locks: ctx.subscription_locks().prune(),
    }
}

/// Sweep interval for a context: one cache TTL, at least a second
pub fn sweep_interval(ctx: &ServiceContext) -> Duration {
    ctx.config().cache_ttl.max(MIN_SWEEP_INTERVAL)
}

/// Run sweeps every `every` until `cancel` fires
pub async fn run(ctx: ServiceContext, every: Duration, cancel: CancellationToken) {
    info!(interval_ms = every.as_millis() as u64, "Cache maintenance started");

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("Cache maintenance stopping");
                break;
            }
            _ = interval.tick() => {
                let report = sweep(&ctx, Utc::now());
                if report != SweepReport::default() {
                    debug!(
                        expired_subscriptions = report.expired_subscriptions,
                        idle_locks = report.idle_locks,
                        remaining = ctx.subscription_cache().len(),
                        "Swept in-process state"
                    );
                }
            }
        }
    }
}

/// Spawn [`run`] on the runtime
pub fn start(ctx: ServiceContext, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run(ctx, every, cancel))
}
