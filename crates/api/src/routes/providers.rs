//! Provider management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use auditdesk_db::repositories::{CreateProviderInput, UpdateProviderInput};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the provider routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/providers", get(list_providers).post(create_provider))
        .route(
            "/providers/{id}",
            get(get_provider).put(update_provider).delete(delete_provider),
        )
}

/// Request body for creating a provider.
#[derive(Debug, Deserialize)]
pub struct CreateProviderRequest {
    /// Unique provider name.
    pub name: String,
    /// Public market number.
    pub market_number: Option<String>,
    /// Public market subject.
    pub market_subject: Option<String>,
    /// Total contract budget.
    pub budget_total: Option<Decimal>,
    /// Contract start date.
    pub contract_start: Option<NaiveDate>,
    /// Contract end date.
    pub contract_end: Option<NaiveDate>,
    /// Daily rate per auditor.
    pub budget_jour_homme: Option<Decimal>,
    /// Service classes covered by the contract.
    pub classes: Option<String>,
}

/// Request body for updating a provider. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[allow(missing_docs)]
pub struct UpdateProviderRequest {
    pub name: Option<String>,
    pub market_number: Option<String>,
    pub market_subject: Option<String>,
    pub budget_total: Option<Decimal>,
    pub contract_start: Option<NaiveDate>,
    pub contract_end: Option<NaiveDate>,
    pub budget_jour_homme: Option<Decimal>,
    pub classes: Option<String>,
}

/// GET `/providers`
async fn list_providers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.providers().list().await?))
}

/// GET `/providers/{id}`
async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.providers().find(id).await?))
}

/// POST `/providers`
async fn create_provider(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateProviderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    let provider = state
        .providers()
        .create(CreateProviderInput {
            name: payload.name.trim().to_string(),
            market_number: payload.market_number,
            market_subject: payload.market_subject,
            budget_total: payload.budget_total,
            contract_start: payload.contract_start,
            contract_end: payload.contract_end,
            budget_jour_homme: payload.budget_jour_homme,
            classes: payload.classes,
        })
        .await?;

    auth.log_action("create_provider", &provider.name);
    Ok((StatusCode::CREATED, Json(provider)))
}

/// PUT `/providers/{id}`
async fn update_provider(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProviderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("name cannot be empty"));
    }
    let provider = state
        .providers()
        .update(
            id,
            UpdateProviderInput {
                name: payload.name.map(|n| n.trim().to_string()),
                market_number: payload.market_number,
                market_subject: payload.market_subject,
                budget_total: payload.budget_total,
                contract_start: payload.contract_start,
                contract_end: payload.contract_end,
                budget_jour_homme: payload.budget_jour_homme,
                classes: payload.classes,
            },
        )
        .await?;

    auth.log_action("update_provider", &provider.name);
    Ok(Json(provider))
}

/// DELETE `/providers/{id}`
async fn delete_provider(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.providers().delete(id).await?;
    auth.log_action("delete_provider", &id.to_string());
    Ok(StatusCode::NO_CONTENT)
}
