use crate::client::SplitsApi;
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared::RequestGen;
use shared::splits::api::SplitConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Last successfully fetched view of the active and scheduled configs.
#[derive(Debug, Clone, Default)]
pub struct SplitsSnapshot {
    pub generation: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    pub server_timestamp: Option<DateTime<Utc>>,
    pub active: Vec<SplitConfig>,
    pub scheduled: Vec<SplitConfig>,
}

// Shared between the poll loop and readers. Each refresh takes a ticket
// before fetching; a result is applied only while its ticket is still
// the newest issued, so a slow response never clobbers a newer one.
#[derive(Debug, Default)]
pub struct ActiveSplitsState {
    snapshot: RwLock<SplitsSnapshot>,
    generations: RequestGen,
}

impl ActiveSplitsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&self) -> u64 {
        self.generations.next()
    }

    pub fn apply(
        &self,
        generation: u64,
        server_timestamp: Option<DateTime<Utc>>,
        active: Vec<SplitConfig>,
        scheduled: Vec<SplitConfig>,
    ) -> bool {
        if !self.generations.is_current(generation) {
            debug!(
                generation,
                current = self.generations.current(),
                "dropping stale splits snapshot"
            );
            return false;
        }
        *self.snapshot.write() = SplitsSnapshot {
            generation,
            fetched_at: Some(Utc::now()),
            server_timestamp,
            active,
            scheduled,
        };
        true
    }

    pub fn snapshot(&self) -> SplitsSnapshot {
        self.snapshot.read().clone()
    }
}

pub async fn poll_active_splits(
    api: SplitsApi,
    state: Arc<ActiveSplitsState>,
    interval: Duration,
    shutdown: CancellationToken,
) -> Result<(), ApiError> {
    let mut initial_loop = true;
    loop {
        if initial_loop {
            initial_loop = false;
        } else {
            tokio::select! {
                _ = sleep(interval) => {}
                _ = shutdown.cancelled() => {
                    info!("shutting down splits poller");
                    break;
                }
            }
        }

        let generation = state.begin_refresh();
        match tokio::try_join!(api.get_active_configs(), api.get_scheduled_configs()) {
            Ok((active, scheduled)) => {
                if state.apply(
                    generation,
                    Some(active.timestamp),
                    active.configs,
                    scheduled.configs,
                ) {
                    debug!(generation, "refreshed active and scheduled splits");
                }
            }
            Err(error) => warn!(%error, "failed to refresh active splits, will retry"),
        }

        if shutdown.is_cancelled() {
            info!("shutting down splits poller");
            break;
        }
    }

    Ok(())
}
