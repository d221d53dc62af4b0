use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::repositories::InMemoryTokenDenylist;
use crate::services::abuse::InMemoryRateLimiter;
use crate::services::otp::InMemoryOtpStore;

/// Configuration for the cleanup service
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Longest rate-limit window in use; older windows are dropped
    pub max_window_seconds: u64,
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            max_window_seconds: 3600,
            enabled: true,
        }
    }
}

/// Result of a cleanup cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupResult {
    pub otp_records_removed: usize,
    pub rate_limit_keys_removed: usize,
    pub denylist_entries_removed: usize,
}

impl CleanupResult {
    pub fn total_cleaned(&self) -> usize {
        self.otp_records_removed + self.rate_limit_keys_removed + self.denylist_entries_removed
    }
}

pub struct CleanupService {
    otp_store: Arc<InMemoryOtpStore>,
    rate_limiter: Arc<InMemoryRateLimiter>,
    denylist: Arc<InMemoryTokenDenylist>,
    config: CleanupConfig,
}

impl CleanupService {
    pub fn new(
        otp_store: Arc<InMemoryOtpStore>,
        rate_limiter: Arc<InMemoryRateLimiter>,
        denylist: Arc<InMemoryTokenDenylist>,
        config: CleanupConfig,
    ) -> Self {
        Self {
            otp_store,
            rate_limiter,
            denylist,
            config,
        }
    }

    /// Run a single cleanup cycle
    pub async fn run_cleanup(&self) -> CleanupResult {
        let now = Utc::now();
        let result = CleanupResult {
            otp_records_removed: self.otp_store.purge_expired(now).await,
            rate_limit_keys_removed: self
                .rate_limiter
                .purge_expired(self.config.max_window_seconds, now)
                .await,
            denylist_entries_removed: self.denylist.purge_expired(now).await,
        };

        if result.total_cleaned() > 0 {
            info!(
                otp_records = result.otp_records_removed,
                rate_limit_keys = result.rate_limit_keys_removed,
                denylist_entries = result.denylist_entries_removed,
                event = "cleanup_completed",
                "Expired entries purged"
            );
        }
        result
    }

    /// Spawn a tokio task that runs cleanup at regular intervals
    pub fn start_background_task(self: Arc<Self>) {
        if !self.config.enabled {
            warn!("Cleanup service is disabled");
            return;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);
        tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "Cleanup service started"
            );
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                self.run_cleanup().await;
            }
        });
    }
}
