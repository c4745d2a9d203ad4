//! Current user endpoint.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::{AppState, middleware::AuthUser};

/// The authenticated user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Subject.
    pub sub: String,
    /// Name actions are attributed to.
    pub username: String,
    /// Email address.
    pub email: Option<String>,
    /// Realm roles.
    pub roles: Vec<String>,
}

/// GET `/me`
async fn me(auth: AuthUser) -> Json<MeResponse> {
    let claims = auth.claims();
    Json(MeResponse {
        sub: claims.sub.clone(),
        username: auth.username().to_string(),
        email: claims.email.clone(),
        roles: claims.roles().to_vec(),
    })
}

/// Creates the current user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
