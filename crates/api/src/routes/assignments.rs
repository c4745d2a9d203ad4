//! Assignment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auditdesk_db::entities::{assignments, auditors};
use auditdesk_db::repositories::{AssignmentWithAuditors, CreateAssignmentInput};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the assignment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route("/assignments/{id}", get(get_assignment))
        .route("/assignments/{id}/status", patch(set_assignment_status))
}

/// Request body for assigning a request to a provider.
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    /// Audit request being assigned.
    pub audit_request_id: Uuid,
    /// Provider doing the work.
    pub provider_id: Option<Uuid>,
    /// Kind of audit (pentest, code review, ...).
    pub audit_type: String,
    /// Assignment date. Defaults to today.
    pub assigned_on: Option<NaiveDate>,
    /// Auditors assigned.
    #[serde(default)]
    pub auditor_ids: Vec<Uuid>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct AssignmentStatusRequest {
    /// `pending` or `started`.
    pub status: String,
}

/// An assignment with its auditors.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    #[serde(flatten)]
    assignment: assignments::Model,
    auditors: Vec<auditors::Model>,
}

impl From<AssignmentWithAuditors> for AssignmentResponse {
    fn from(value: AssignmentWithAuditors) -> Self {
        Self {
            assignment: value.assignment,
            auditors: value.auditors,
        }
    }
}

/// GET `/assignments`
async fn list_assignments(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.assignments().list().await?))
}

/// GET `/assignments/{id}`
async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state.assignments().get(id).await?;
    Ok(Json(AssignmentResponse::from(assignment)))
}

/// POST `/assignments`
async fn create_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.audit_type.trim().is_empty() {
        return Err(ApiError::validation("audit_type is required"));
    }
    let created = state
        .assignments()
        .create(CreateAssignmentInput {
            audit_request_id: payload.audit_request_id,
            provider_id: payload.provider_id,
            audit_type: payload.audit_type.trim().to_string(),
            assigned_on: payload.assigned_on,
            auditor_ids: payload.auditor_ids,
        })
        .await?;

    auth.log_action(
        "create_assignment",
        &format!(
            "assignment {} for request {}",
            created.assignment.id, created.assignment.audit_request_id
        ),
    );
    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(created))))
}

/// PATCH `/assignments/{id}/status`
async fn set_assignment_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignmentStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.assignments().set_status(id, &payload.status).await?;
    auth.log_action(
        "set_assignment_status",
        &format!("assignment {id} -> {}", payload.status.trim()),
    );
    Ok(Json(updated))
}
