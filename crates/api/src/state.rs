//! Application state shared across handlers.

use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};
use crate::settings::{IntegrationSettings, ServiceConfig};
use moka::future::Cache;
use messaging::NotificationDispatcher;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use store::Store;

/// Maximum remembered webhook signatures.
const REPLAY_CACHE_MAX_CAPACITY: u64 = 100_000;

/// Shortest replay window, used when the timestamp check is disabled.
const MIN_REPLAY_WINDOW: Duration = Duration::from_secs(120);

/// How often idle rate-limit buckets are dropped.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Webhook deliveries seen within the replay window.
///
/// Keyed by the lowercase hex signature. A timestamp may sit up to the
/// tolerance on either side of server time, so entries live for twice the
/// tolerance; anything older fails the freshness check instead.
#[derive(Clone)]
pub struct ReplayGuard {
    cache: Cache<String, ()>,
}

impl ReplayGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(REPLAY_CACHE_MAX_CAPACITY)
                .time_to_live(window.max(Duration::from_secs(1)))
                .build(),
        }
    }

    /// Window covering timestamps within `tolerance_secs` of now.
    pub fn window_for(tolerance_secs: u64) -> Duration {
        Duration::from_secs(tolerance_secs.saturating_mul(2)).max(MIN_REPLAY_WINDOW)
    }

    /// Records a signature. Returns false if it was already seen.
    pub async fn first_seen(&self, signature: &str) -> bool {
        let entry = self.cache.entry(cache_key(signature)).or_insert(()).await;
        entry.is_fresh()
    }

    /// Drops a recorded signature so the sender may retry the delivery.
    pub async fn forget(&self, signature: &str) {
        self.cache.invalidate(&cache_key(signature)).await;
    }
}

fn cache_key(signature: &str) -> String {
    let key = signature.trim().to_ascii_lowercase();
    key.strip_prefix("sha256=").unwrap_or(&key).to_string()
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Sessions, orders, vouchers and outbox
    pub store: Arc<Store>,
    /// WhatsApp and MikPos delivery
    pub dispatcher: NotificationDispatcher,
    /// Request-path settings
    pub config: Arc<ServiceConfig>,
    /// Integration settings shown and edited by the admin surface
    pub integrations: Arc<RwLock<IntegrationSettings>>,
    /// Webhook replay protection
    pub replay_guard: ReplayGuard,
    /// Rate limiter
    pub rate_limiter: SharedRateLimiter,
    /// Serializes env file rewrites from the admin surface
    pub settings_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        dispatcher: NotificationDispatcher,
        config: ServiceConfig,
        integrations: IntegrationSettings,
    ) -> Self {
        Self::with_rate_limit(
            store,
            dispatcher,
            config,
            integrations,
            RateLimitConfig::default(),
        )
    }

    /// Create with custom rate limit config.
    pub fn with_rate_limit(
        store: Arc<Store>,
        dispatcher: NotificationDispatcher,
        config: ServiceConfig,
        integrations: IntegrationSettings,
        rate_config: RateLimitConfig,
    ) -> Self {
        let replay_window = ReplayGuard::window_for(config.replay_tolerance_secs);
        Self {
            store,
            dispatcher,
            config: Arc::new(config),
            integrations: Arc::new(RwLock::new(integrations)),
            replay_guard: ReplayGuard::new(replay_window),
            rate_limiter: Arc::new(RateLimiter::new(rate_config)),
            settings_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Start the rate limiter cleanup background task.
    /// Returns a handle that can be used to cancel the task.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                rate_limiter.cleanup(RATE_LIMIT_CLEANUP_INTERVAL);
            }
        })
    }
}
