//! Remediation plan routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use auditdesk_db::entities::sea_orm_active_enums::VulnerabilitySeverity;
use auditdesk_db::repositories::{
    CreatePlanInput, Period, PlanFilter, UpdatePlanInput, VulnerabilityInput,
};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the remediation plan routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route(
            "/plans/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
}

/// A vulnerability in a plan body.
#[derive(Debug, Deserialize)]
pub struct VulnerabilityRequest {
    /// Short title.
    pub title: String,
    /// `critical`, `major`, `moderate` or `minor`.
    pub severity: VulnerabilitySeverity,
    /// Free-form remediation status.
    pub remediation_status: Option<String>,
}

impl From<VulnerabilityRequest> for VulnerabilityInput {
    fn from(v: VulnerabilityRequest) -> Self {
        Self {
            title: v.title,
            severity: v.severity,
            remediation_status: v.remediation_status,
        }
    }
}

/// Request body for creating a plan.
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    /// Audited application.
    pub application: String,
    /// Kind of application.
    pub application_type: Option<String>,
    /// Kind of audit.
    pub audit_type: String,
    /// Security level.
    pub security_level: Option<String>,
    /// When the audit was carried out. Required.
    pub realised_on: Option<NaiveDate>,
    /// When the plan was closed.
    pub closed_on: Option<NaiveDate>,
    /// When the report was delivered.
    pub reported_on: Option<NaiveDate>,
    /// Remediation progress, percent.
    pub remediation_rate: Option<Decimal>,
    /// Security team comment.
    pub security_comment: Option<String>,
    /// Project team comment.
    pub project_comment: Option<String>,
    /// Vulnerabilities found.
    #[serde(default)]
    pub vulnerabilities: Vec<VulnerabilityRequest>,
}

/// Request body for updating a plan. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[allow(missing_docs)]
pub struct UpdatePlanRequest {
    pub application: Option<String>,
    pub application_type: Option<String>,
    pub audit_type: Option<String>,
    pub security_level: Option<String>,
    pub realised_on: Option<NaiveDate>,
    pub closed_on: Option<NaiveDate>,
    pub reported_on: Option<NaiveDate>,
    pub remediation_rate: Option<Decimal>,
    pub security_comment: Option<String>,
    pub project_comment: Option<String>,
    pub vulnerabilities: Option<Vec<VulnerabilityRequest>>,
}

/// Query parameters for listing plans.
#[derive(Debug, Default, Deserialize)]
#[allow(missing_docs)]
pub struct ListPlansQuery {
    pub reference: Option<String>,
    pub application: Option<String>,
    pub audit_type: Option<String>,
    pub security_level: Option<String>,
    pub realised_on: Option<NaiveDate>,
    pub closed_on: Option<NaiveDate>,
    pub reported_on: Option<NaiveDate>,
    pub realised_year: Option<i32>,
    pub realised_month: Option<u32>,
    pub closed_year: Option<i32>,
    pub closed_month: Option<u32>,
    pub reported_year: Option<i32>,
    pub reported_month: Option<u32>,
}

impl From<ListPlansQuery> for PlanFilter {
    fn from(q: ListPlansQuery) -> Self {
        Self {
            reference: q.reference,
            application: q.application,
            audit_type: q.audit_type,
            security_level: q.security_level,
            realised_on: q.realised_on,
            closed_on: q.closed_on,
            reported_on: q.reported_on,
            realised_in: Period {
                year: q.realised_year,
                month: q.realised_month,
            },
            closed_in: Period {
                year: q.closed_year,
                month: q.closed_month,
            },
            reported_in: Period {
                year: q.reported_year,
                month: q.reported_month,
            },
        }
    }
}

/// GET `/plans`
async fn list_plans(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListPlansQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = state.plans().list(&query.into()).await?;
    auth.log_action("list_plans", &format!("{} plans", plans.len()));
    Ok(Json(plans))
}

/// GET `/plans/{id}`
async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.plans().get(id).await?))
}

/// POST `/plans`
async fn create_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let realised_on = payload
        .realised_on
        .ok_or_else(|| ApiError::validation("realised_on is required"))?;
    let plan = state
        .plans()
        .create(CreatePlanInput {
            application: payload.application,
            application_type: payload.application_type,
            audit_type: payload.audit_type,
            security_level: payload.security_level,
            realised_on,
            closed_on: payload.closed_on,
            reported_on: payload.reported_on,
            remediation_rate: payload.remediation_rate,
            security_comment: payload.security_comment,
            project_comment: payload.project_comment,
            vulnerabilities: payload.vulnerabilities.into_iter().map(Into::into).collect(),
        })
        .await?;

    auth.log_action("create_plan", &plan.plan.reference);
    Ok((StatusCode::CREATED, Json(plan)))
}

/// PUT `/plans/{id}`
async fn update_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .plans()
        .update(
            id,
            UpdatePlanInput {
                application: payload.application,
                application_type: payload.application_type,
                audit_type: payload.audit_type,
                security_level: payload.security_level,
                realised_on: payload.realised_on,
                closed_on: payload.closed_on,
                reported_on: payload.reported_on,
                remediation_rate: payload.remediation_rate,
                security_comment: payload.security_comment,
                project_comment: payload.project_comment,
                vulnerabilities: payload
                    .vulnerabilities
                    .map(|v| v.into_iter().map(Into::into).collect()),
            },
        )
        .await?;

    auth.log_action("update_plan", &plan.plan.reference);
    Ok(Json(plan))
}

/// DELETE `/plans/{id}`
async fn delete_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.plans().delete(id).await?;
    auth.log_action("delete_plan", &id.to_string());
    Ok(StatusCode::NO_CONTENT)
}
