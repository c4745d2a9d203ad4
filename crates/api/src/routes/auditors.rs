//! Auditor management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;
use uuid::Uuid;

use auditdesk_db::repositories::AuditorInput;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the auditor routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auditors", get(list_auditors).post(create_auditor))
        .route("/auditors/{id}", put(update_auditor).delete(delete_auditor))
}

/// Query parameters for listing auditors.
#[derive(Debug, Deserialize)]
pub struct ListAuditorsQuery {
    /// Only auditors of this provider.
    pub provider_id: Option<Uuid>,
}

/// Request body for creating or replacing an auditor.
#[derive(Debug, Deserialize)]
#[allow(missing_docs)]
pub struct AuditorRequest {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: String,
    /// Employing provider.
    pub provider_id: Uuid,
}

impl AuditorRequest {
    fn into_input(self) -> Result<AuditorInput, ApiError> {
        let required = [
            ("last_name", &self.last_name),
            ("first_name", &self.first_name),
            ("email", &self.email),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ApiError::validation(format!("{field} is required")));
        }
        if !self.email.contains('@') {
            return Err(ApiError::validation("email is invalid"));
        }
        Ok(AuditorInput {
            last_name: self.last_name.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            provider_id: self.provider_id,
        })
    }
}

/// GET `/auditors`
async fn list_auditors(
    State(state): State<AppState>,
    Query(query): Query<ListAuditorsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auditors().list(query.provider_id).await?))
}

/// POST `/auditors`
async fn create_auditor(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AuditorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auditor = state.auditors().create(payload.into_input()?).await?;
    auth.log_action(
        "create_auditor",
        &format!("{} {}", auditor.first_name, auditor.last_name),
    );
    Ok((StatusCode::CREATED, Json(auditor)))
}

/// PUT `/auditors/{id}`
async fn update_auditor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AuditorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auditor = state.auditors().update(id, payload.into_input()?).await?;
    auth.log_action("update_auditor", &id.to_string());
    Ok(Json(auditor))
}

/// DELETE `/auditors/{id}`
async fn delete_auditor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.auditors().delete(id).await?;
    auth.log_action("delete_auditor", &id.to_string());
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str) -> AuditorRequest {
        AuditorRequest {
            last_name: " Benali ".to_string(),
            first_name: "Sara".to_string(),
            email: email.to_string(),
            phone: "0600000000".to_string(),
            provider_id: Uuid::nil(),
        }
    }

    #[test]
    fn test_into_input_trims() {
        let input = request("sara@provider.test").into_input().unwrap();
        assert_eq!(input.last_name, "Benali");
    }

    #[test]
    fn test_into_input_rejects_bad_email() {
        let err = request("not-an-email").into_input().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(request("  ").into_input().is_err());
    }
}
