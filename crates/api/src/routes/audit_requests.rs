//! Audit request routes.
//!
//! Any authenticated user may submit a request and read their own. Staff see
//! every request and review them.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auditdesk_core::credentials::TestAccount;
use auditdesk_db::entities::sea_orm_active_enums::RequestStatus;
use auditdesk_db::repositories::{
    AuditRequestError, CreateAuditRequestInput, OpenedAuditRequest,
};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Submission and read routes, open to any authenticated user.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audit-requests", get(list_requests).post(create_request))
        .route("/audit-requests/{id}", get(get_request))
}

/// Review routes, for staff.
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/audit-requests/{id}/status", patch(review_request))
}

/// Request body for submitting an audit request.
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    /// Contact of the requesting team.
    pub requester_email: String,
    /// Application to audit.
    pub application_name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Web, mobile, API, ...
    pub application_type: String,
    /// Where the application is reachable.
    pub target_url: String,
    /// Desired start date.
    pub planned_date: Option<NaiveDate>,
    /// Accounts the auditors may log in with.
    #[serde(default)]
    pub test_accounts: Vec<TestAccount>,
}

/// Request body for reviewing a request.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    /// `pending`, `validated` or `rejected`.
    pub status: String,
    /// Required when rejecting.
    pub comment: Option<String>,
}

/// A request summary. Test-account secrets are never listed.
#[derive(Debug, Serialize)]
pub struct RequestSummary {
    /// Request ID.
    pub id: Uuid,
    /// Review status.
    pub status: RequestStatus,
    /// Application to audit.
    pub application_name: String,
    /// Contact of the requesting team.
    pub requester_email: String,
    /// Desired start date.
    pub planned_date: Option<NaiveDate>,
    /// Submitter.
    pub created_by: String,
    /// Submission time.
    pub created_at: DateTime<FixedOffset>,
}

/// A request with its test accounts opened.
#[derive(Debug, Serialize)]
pub struct RequestDetail {
    /// Request ID.
    pub id: Uuid,
    /// Review status.
    pub status: RequestStatus,
    /// Contact of the requesting team.
    pub requester_email: String,
    /// Application to audit.
    pub application_name: String,
    /// Free-text description.
    pub description: String,
    /// Web, mobile, API, ...
    pub application_type: String,
    /// Where the application is reachable.
    pub target_url: String,
    /// Desired start date.
    pub planned_date: Option<NaiveDate>,
    /// Accounts in clear text.
    pub test_accounts: Vec<TestAccount>,
    /// Reason given on rejection.
    pub rejection_comment: Option<String>,
    /// Submitter.
    pub created_by: String,
    /// Submission time.
    pub created_at: DateTime<FixedOffset>,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<OpenedAuditRequest> for RequestDetail {
    fn from(opened: OpenedAuditRequest) -> Self {
        let r = opened.request;
        Self {
            id: r.id,
            status: r.status,
            requester_email: r.requester_email,
            application_name: r.application_name,
            description: r.description,
            application_type: r.application_type,
            target_url: r.target_url,
            planned_date: r.planned_date,
            test_accounts: opened.test_accounts,
            rejection_comment: r.rejection_comment,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// POST `/audit-requests`
async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let account_count = body.test_accounts.len();
    let request = state
        .requests()
        .create(CreateAuditRequestInput {
            requester_email: body.requester_email,
            application_name: body.application_name,
            description: body.description,
            application_type: body.application_type,
            target_url: body.target_url,
            planned_date: body.planned_date,
            test_accounts: body.test_accounts,
            created_by: auth.username().to_string(),
        })
        .await?;

    auth.log_action(
        "create_audit_request",
        &format!(
            "{} ({} test accounts)",
            request.application_name, account_count
        ),
    );
    Ok((
        StatusCode::CREATED,
        Json(RequestSummary {
            id: request.id,
            status: request.status,
            application_name: request.application_name,
            requester_email: request.requester_email,
            planned_date: request.planned_date,
            created_by: request.created_by,
            created_at: request.created_at,
        }),
    ))
}

/// GET `/audit-requests`
///
/// Staff see every request; other users only their own.
async fn list_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let owner = (!auth.is_staff()).then(|| auth.username());
    let requests = state
        .requests()
        .list(owner)
        .await?
        .into_iter()
        .map(|r| RequestSummary {
            id: r.id,
            status: r.status,
            application_name: r.application_name,
            requester_email: r.requester_email,
            planned_date: r.planned_date,
            created_by: r.created_by,
            created_at: r.created_at,
        })
        .collect::<Vec<_>>();
    Ok(Json(requests))
}

/// GET `/audit-requests/{id}`
async fn get_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let opened = state.requests().get_opened(id).await?;
    // Others' requests look absent rather than forbidden.
    if !auth.is_staff() && opened.request.created_by != auth.username() {
        return Err(AuditRequestError::NotFound(id).into());
    }
    auth.log_action("view_audit_request", &id.to_string());
    Ok(Json(RequestDetail::from(opened)))
}

/// PATCH `/audit-requests/{id}/status`
async fn review_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewBody>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .requests()
        .set_status(id, &body.status, body.comment)
        .await?;
    auth.log_action(
        "review_audit_request",
        &format!("request {id} -> {}", body.status.trim()),
    );
    Ok(Json(RequestSummary {
        id: updated.id,
        status: updated.status,
        application_name: updated.application_name,
        requester_email: updated.requester_email,
        planned_date: updated.planned_date,
        created_by: updated.created_by,
        created_at: updated.created_at,
    }))
}
