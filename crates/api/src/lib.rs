//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Identity provider authentication and role checks
//! - Error responses

pub mod error;
pub mod keys;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auditdesk_core::clock::Clock;
use auditdesk_core::credentials::CredentialCipher;
use auditdesk_core::lifecycle::LifecycleEngine;
use auditdesk_core::storage::StorageService;
use auditdesk_db::{
    AssignmentRepository, AuditRepository, AuditRequestRepository, AuditorRepository,
    DashboardRepository, ProviderRepository, RemediationPlanRepository,
};
use auditdesk_shared::TokenVerifier;

use crate::keys::KeyCache;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DatabaseConnection,
    /// Audit lifecycle engine.
    pub engine: LifecycleEngine,
    /// Source of "now".
    pub clock: Arc<dyn Clock>,
    /// Seals test-account secrets.
    pub cipher: CredentialCipher,
    /// Attachment storage (optional).
    pub storage: Option<Arc<StorageService>>,
    /// Identity provider signing keys.
    pub keys: Arc<KeyCache>,
    /// Token verifier for the configured issuer and audience.
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Audit repository on this state's clock.
    #[must_use]
    pub fn audits(&self) -> AuditRepository {
        AuditRepository::with_clock(
            self.db.clone(),
            self.engine.clone(),
            Arc::clone(&self.clock),
        )
    }

    /// Provider repository.
    #[must_use]
    pub fn providers(&self) -> ProviderRepository {
        ProviderRepository::new(self.db.clone())
    }

    /// Auditor repository.
    #[must_use]
    pub fn auditors(&self) -> AuditorRepository {
        AuditorRepository::new(self.db.clone())
    }

    /// Assignment repository.
    #[must_use]
    pub fn assignments(&self) -> AssignmentRepository {
        AssignmentRepository::new(self.db.clone())
    }

    /// Audit request repository.
    #[must_use]
    pub fn requests(&self) -> AuditRequestRepository {
        AuditRequestRepository::new(self.db.clone(), self.cipher.clone())
    }

    /// Remediation plan repository.
    #[must_use]
    pub fn plans(&self) -> RemediationPlanRepository {
        RemediationPlanRepository::new(self.db.clone())
    }

    /// Dashboard repository.
    #[must_use]
    pub fn dashboard(&self) -> DashboardRepository {
        DashboardRepository::new(self.db.clone())
    }
}

/// Creates the main application router.
///
/// An empty `cors_origins` allows any origin.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
