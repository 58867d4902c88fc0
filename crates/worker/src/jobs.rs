//! Periodic maintenance jobs.
//!
//! Each job is one pass of work. [`run_every`] drives a job on a fixed period
//! until the shutdown channel flips.

use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use bazaar_api::db::{OrderRepository, RefreshTokenRepository};
use bazaar_api::services::InventoryService;

pub const EMAIL_PERIOD: Duration = Duration::from_secs(10);
pub const NOTIFICATION_PERIOD: Duration = Duration::from_secs(15);
pub const INVENTORY_PERIOD: Duration = Duration::from_secs(30);
pub const ORDER_PERIOD: Duration = Duration::from_secs(5);

/// Run `job` every `period` until `shutdown` changes or its sender is dropped.
///
/// The first pass happens one full period after start.
pub async fn run_every<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(worker = name, period_secs = period.as_secs(), "Worker started");
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => job().await,
        }
    }
    info!(worker = name, "Worker stopped");
}

/// Outgoing mail is sent inline by the API; this loop only reports liveness.
pub fn email_heartbeat() {
    debug!("Email worker heartbeat");
}

/// Delete expired and revoked refresh tokens.
pub async fn purge_refresh_tokens(pool: &PgPool) {
    match RefreshTokenRepository::new(pool).purge_stale().await {
        Ok(0) => debug!("No stale refresh tokens"),
        Ok(purged) => info!(purged, "Purged stale refresh tokens"),
        Err(e) => error!(error = %e, "Refresh token purge failed"),
    }
}

/// Report products whose available stock is at or below `threshold`.
pub async fn scan_low_stock(pool: &PgPool, threshold: i32) {
    match InventoryService::new(pool).low_stock(threshold).await {
        Ok(rows) if rows.is_empty() => debug!(threshold, "Inventory levels healthy"),
        Ok(rows) => {
            for row in &rows {
                warn!(
                    product_id = %row.product_id,
                    available = row.available,
                    threshold,
                    "Low stock"
                );
            }
            info!(count = rows.len(), threshold, "Low stock scan complete");
        }
        Err(e) => error!(error = %e, "Low stock scan failed"),
    }
}

/// Log the size of the pending order backlog.
pub async fn count_pending_orders(pool: &PgPool) {
    match OrderRepository::new(pool).count_pending().await {
        Ok(0) => debug!("No pending orders"),
        Ok(pending) => info!(pending, "Pending orders awaiting payment"),
        Err(e) => error!(error = %e, "Pending order count failed"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_job(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + use<> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_once_per_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_every(
            "test",
            Duration::from_secs(10),
            rx,
            counting_job(&counter),
        ));

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pass_before_first_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_every(
            "test",
            Duration::from_secs(30),
            rx,
            counting_job(&counter),
        ));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        drop(tx);
        handle.await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_periods() {
        assert_eq!(EMAIL_PERIOD, Duration::from_secs(10));
        assert_eq!(NOTIFICATION_PERIOD, Duration::from_secs(15));
        assert_eq!(INVENTORY_PERIOD, Duration::from_secs(30));
        assert_eq!(ORDER_PERIOD, Duration::from_secs(5));
    }
}
