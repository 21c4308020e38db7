use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::cache::SnapshotCache;
use crate::hub::BroadcastHub;
use crate::source::PriceSource;

/// Drives fetch-and-publish cycles on a fixed period.
///
/// Holds its collaborators by handle rather than through globals, so tests
/// can build isolated instances and drive cycles directly.
pub struct Poller {
    source: Box<dyn PriceSource>,
    cache: Arc<SnapshotCache>,
    hub: Arc<BroadcastHub>,
    period: Duration,
}

impl Poller {
    pub fn new(
        source: Box<dyn PriceSource>,
        cache: Arc<SnapshotCache>,
        hub: Arc<BroadcastHub>,
        period: Duration,
    ) -> Self {
        Poller {
            source,
            cache,
            hub,
            period,
        }
    }

    /// One poll cycle: fetch, and on success overwrite the cache and fan
    /// out to connected clients. A failed fetch is logged and the cycle
    /// skipped; the cache keeps its last good value and the next tick is
    /// the retry policy.
    pub async fn run_cycle(&self) {
        match self.source.fetch().await {
            Ok(snapshot) => {
                self.cache.set(snapshot.clone());
                let delivered = self.hub.publish(snapshot);
                tracing::info!(
                    provider = self.source.provider_id(),
                    delivered,
                    "snapshot broadcast"
                );
            }
            Err(err) => {
                tracing::warn!(
                    provider = self.source.provider_id(),
                    error = %err,
                    "fetch failed, skipping cycle"
                );
            }
        }
    }

    /// Runs forever. The interval's first tick completes immediately, which
    /// gives the eager startup fetch: the cache is populated before the
    /// first client connects instead of waiting a full period. Fetches are
    /// awaited inline and missed ticks are skipped, so cycles never overlap
    /// even when one outlasts the period.
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            provider = self.source.provider_id(),
            period_secs = self.period.as_secs(),
            "poller started"
        );

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }
}
