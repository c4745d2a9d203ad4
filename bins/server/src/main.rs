//! AuditDesk API Server
//!
//! Main entry point for the audit tracking service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auditdesk_api::{AppState, create_router, keys::KeyCache};
use auditdesk_core::calendar::BusinessCalendar;
use auditdesk_core::clock::SystemClock;
use auditdesk_core::credentials::CredentialCipher;
use auditdesk_core::duration::DurationAccumulator;
use auditdesk_core::lifecycle::LifecycleEngine;
use auditdesk_core::storage::{StorageConfig, StorageService};
use auditdesk_db::connect;
use auditdesk_shared::{AppConfig, TokenVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auditdesk=debug,user_action=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    let storage = match AppConfig::load_section::<StorageConfig>("storage")? {
        Some(storage_config) => Some(Arc::new(StorageService::from_config(storage_config)?)),
        None => {
            tracing::warn!("No [storage] section; attachment uploads are disabled");
            None
        }
    };

    let cipher = CredentialCipher::from_base64_key(&config.credentials.key)
        .context("Invalid credentials.key")?;

    let calendar = BusinessCalendar::with_config(
        config.calendar.cache_capacity,
        config.calendar.cache_ttl_secs,
    );
    let engine = LifecycleEngine::new(DurationAccumulator::new(calendar));

    info!(
        issuer = %config.identity.issuer,
        jwks = %config.identity.jwks_endpoint(),
        "Identity provider configured"
    );
    let state = AppState {
        db,
        engine,
        clock: Arc::new(SystemClock),
        cipher,
        storage,
        keys: Arc::new(KeyCache::from_config(&config.identity)?),
        verifier: Arc::new(TokenVerifier::new(&config.identity)),
    };

    let app = create_router(state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
