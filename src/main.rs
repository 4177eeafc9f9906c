//! GARDENS-NET voucher service
//!
//! Sells time-boxed hotspot vouchers:
//! - MikPos webhook gateway with HMAC signature verification
//! - Session, order and voucher lifecycle with atomic payment completion
//! - WhatsApp delivery and MikPos callbacks with an outbox for retries
//! - Background expiry sweeping

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use api::middleware::rate_limit::RateLimitConfig;
use api::{router, AppState, IntegrationSettings, ServiceConfig};
use gardens_core::limits::DEFAULT_REPLAY_TOLERANCE_SECS;
use messaging::{
    BillingConfig, BillingNotifier, MessageSender, MessagingConfig, MikPosClient,
    NotificationDispatcher, WhatsAppClient,
};
use store::{Store, StoreConfig};
use telemetry::{health, init_tracing_from_env};
use worker::{WorkerConfig, WorkerScheduler};

/// Inbound webhook settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct WebhookConfig {
    /// Shared HMAC secret (`MIKPOS_WEBHOOK_SECRET`)
    #[serde(default)]
    secret: String,
    #[serde(default = "default_replay_tolerance_secs")]
    replay_tolerance_secs: u64,
}

fn default_replay_tolerance_secs() -> u64 {
    DEFAULT_REPLAY_TOLERANCE_SECS
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            replay_tolerance_secs: default_replay_tolerance_secs(),
        }
    }
}

/// RouterOS credentials. Stored and editable only; nothing dials the router.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RouterConfig {
    #[serde(default)]
    host: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Storefront base URL customers are redirected to
    #[serde(default = "default_storefront_url")]
    storefront_url: String,

    /// Bearer token for the admin routes
    #[serde(default)]
    admin_token: Option<String>,

    /// Env file loaded at startup and written by the admin settings route
    #[serde(default = "default_env_file")]
    env_file: String,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    webhook: WebhookConfig,

    #[serde(default)]
    whatsapp: MessagingConfig,

    #[serde(default)]
    mikpos: BillingConfig,

    #[serde(default)]
    mikrotik: RouterConfig,

    #[serde(default)]
    rate_limit: RateLimitConfig,

    #[serde(default)]
    worker: WorkerConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_storefront_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storefront_url: default_storefront_url(),
            admin_token: None,
            env_file: default_env_file(),
            store: StoreConfig::default(),
            webhook: WebhookConfig::default(),
            whatsapp: MessagingConfig::default(),
            mikpos: BillingConfig::default(),
            mikrotik: RouterConfig::default(),
            rate_limit: RateLimitConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl Config {
    fn integrations(&self) -> IntegrationSettings {
        IntegrationSettings {
            whatsapp_api_url: self.whatsapp.api_url.clone(),
            whatsapp_api_token: self.whatsapp.api_token.clone(),
            whatsapp_sender: self.whatsapp.sender.clone(),
            mikpos_base_url: self.mikpos.base_url.clone(),
            mikpos_api_key: self.mikpos.api_key.clone(),
            mikpos_webhook_secret: self.webhook.secret.clone(),
            mikrotik_host: self.mikrotik.host.clone(),
            mikrotik_username: self.mikrotik.username.clone(),
            mikrotik_password: self.mikrotik.password.clone(),
        }
    }

    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            storefront_url: self.storefront_url.clone(),
            webhook_secret: self.webhook.secret.clone(),
            replay_tolerance_secs: self.webhook.replay_tolerance_secs,
            admin_token: self.admin_token.clone().filter(|t| !t.trim().is_empty()),
            env_file: PathBuf::from(&self.env_file),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Admin settings are persisted to this file, so load it before anything
    // reads the environment.
    let env_file = std::env::var("GARDENS_ENV_FILE").unwrap_or_else(|_| default_env_file());
    dotenvy::from_path(&env_file).ok();

    init_tracing_from_env();

    info!("Starting GARDENS-NET voucher service v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config()?;
    config.env_file = env_file;

    if config.webhook.secret.is_empty() {
        warn!("MIKPOS_WEBHOOK_SECRET is not set; every webhook will be rejected with 503");
    }
    if config.service_config().admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; admin routes are disabled");
    }

    let store = Arc::new(Store::new(config.store.clone()));

    let whatsapp = Arc::new(
        WhatsAppClient::new(config.whatsapp.clone()).context("Failed to create WhatsApp client")?,
    );
    let mikpos = Arc::new(
        MikPosClient::new(config.mikpos.clone()).context("Failed to create MikPos client")?,
    );

    check_health(&config, whatsapp.as_ref()).await;

    let dispatcher = NotificationDispatcher::new(
        whatsapp.clone() as Arc<dyn MessageSender>,
        mikpos.clone() as Arc<dyn BillingNotifier>,
    );

    // Start background workers
    let worker_scheduler = Arc::new(WorkerScheduler::new(
        config.worker.clone(),
        store.clone(),
        dispatcher.clone(),
    ));
    let _worker_handles = worker_scheduler.start();

    // Create application state
    let state = AppState::with_rate_limit(
        store.clone(),
        dispatcher,
        config.service_config(),
        config.integrations(),
        config.rate_limit.clone(),
    );

    // Start rate limiter cleanup background task
    let _rate_limiter_cleanup = state.start_rate_limiter_cleanup();
    info!("Started rate limiter cleanup task (every 5 minutes)");

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    health().mark_ready();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    let stats = store.stats();
    if stats.outbox_pending > 0 {
        warn!(
            outbox_pending = stats.outbox_pending,
            "Undelivered notifications dropped at shutdown"
        );
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("GARDENS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat names written by the admin settings route
    let overrides: [(&str, &mut String); 9] = [
        ("WHATSAPP_API_URL", &mut config.whatsapp.api_url),
        ("WHATSAPP_API_TOKEN", &mut config.whatsapp.api_token),
        ("WHATSAPP_SENDER", &mut config.whatsapp.sender),
        ("MIKPOS_BASE_URL", &mut config.mikpos.base_url),
        ("MIKPOS_API_KEY", &mut config.mikpos.api_key),
        ("MIKPOS_WEBHOOK_SECRET", &mut config.webhook.secret),
        ("MIKROTIK_HOST", &mut config.mikrotik.host),
        ("MIKROTIK_USERNAME", &mut config.mikrotik.username),
        ("MIKROTIK_PASSWORD", &mut config.mikrotik.password),
    ];
    for (key, field) in overrides {
        if let Ok(value) = std::env::var(key) {
            *field = value.trim().to_string();
        }
    }

    if let Ok(token) = std::env::var("ADMIN_TOKEN") {
        config.admin_token = Some(token.trim().to_string());
    }
    if let Ok(url) = std::env::var("STOREFRONT_URL") {
        config.storefront_url = url.trim().to_string();
    }

    Ok(config)
}

/// Check integration health on startup.
async fn check_health(config: &Config, whatsapp: &WhatsAppClient) {
    match whatsapp.test_connection().await {
        Ok(true) if whatsapp.is_mock() => info!("WhatsApp client: mock mode"),
        Ok(true) => info!("WhatsApp provider: healthy"),
        Ok(false) => warn!("WhatsApp provider: unhealthy, notifications will queue for retry"),
        Err(e) => {
            health().messaging.set_unhealthy(e.to_string());
            warn!(error = %e, "WhatsApp provider: not configured");
        }
    }

    if config.mikpos.is_mock() {
        info!("MikPos client: mock mode");
    } else if config.mikpos.api_key.trim().is_empty() {
        health().billing.set_unhealthy("MikPos API key not configured");
        warn!("MikPos callbacks: API key not configured");
    } else {
        health().billing.set_healthy();
        info!(url = %config.mikpos.callback_url(), "MikPos callbacks: configured");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
