//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use auditdesk_shared::Claims;
use auditdesk_shared::identity::{ROLE_ADMIN, ROLE_AUDIT_TEAM};

use crate::AppState;
use crate::error::ApiError;

/// Roles allowed to run audits.
pub const STAFF_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_AUDIT_TEAM];

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware that verifies identity provider tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Verifies it against the identity provider's signing keys
/// 3. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "MISSING_TOKEN",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    match state.keys.verify(token, &state.verifier).await {
        Ok(claims) => {
            tracing::debug!(username = claims.username(), "Authenticated request");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected token");
            ApiError::from(e).into_response()
        }
    }
}

fn require_roles(request: &Request, roles: &[&str]) -> Result<(), ApiError> {
    let allowed = request
        .extensions()
        .get::<Claims>()
        .is_some_and(|claims| claims.has_any_role(roles));
    if allowed {
        Ok(())
    } else {
        Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "You do not have the role required for this action",
        ))
    }
}

/// Lets through admins and audit team members.
pub async fn require_staff(request: Request, next: Next) -> Response {
    match require_roles(&request, STAFF_ROLES) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Lets through admins only.
pub async fn require_admin(request: Request, next: Next) -> Response {
    match require_roles(&request, &[ROLE_ADMIN]) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Extractor for authenticated user claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Name actions are attributed to.
    #[must_use]
    pub fn username(&self) -> &str {
        self.0.username()
    }

    /// Returns true for admins and audit team members.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.0.has_any_role(STAFF_ROLES)
    }

    /// Returns the inner claims.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    /// Records an action in the `user_action` log.
    pub fn log_action(&self, action: &str, details: &str) {
        tracing::info!(
            target: "user_action",
            username = self.username(),
            action,
            details,
            "User action"
        );
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Authentication required")
            })
    }
}
