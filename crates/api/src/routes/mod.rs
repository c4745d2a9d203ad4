//! API route definitions.

use axum::{Router, middleware};

use crate::AppState;
use crate::middleware::{auth_middleware, require_admin, require_staff};

pub mod assignments;
pub mod audit_requests;
pub mod auditors;
pub mod audits;
pub mod dashboard;
pub mod health;
pub mod me;
pub mod plans;
pub mod providers;

/// Creates the API router with protected routes that need state for middleware.
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let upload_limit = audits::upload_body_limit(state.storage.as_deref());

    // Admins and the audit team
    let staff_routes = Router::new()
        .merge(audits::routes(upload_limit))
        .merge(providers::routes())
        .merge(auditors::routes())
        .merge(assignments::routes())
        .merge(plans::routes())
        .merge(audit_requests::review_routes())
        .route_layer(middleware::from_fn(require_staff));

    let admin_routes = Router::new()
        .merge(dashboard::routes())
        .route_layer(middleware::from_fn(require_admin));

    // Any authenticated user
    let protected_routes = Router::new()
        .merge(me::routes())
        .merge(audit_requests::routes())
        .merge(staff_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
