//! Dashboard routes.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard/kpis", get(kpis))
}

/// GET `/dashboard/kpis`
async fn kpis(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let kpis = state.dashboard().kpis().await?;
    auth.log_action("view_dashboard", "kpis");
    Ok(Json(kpis))
}
