//! Audit lifecycle routes.
//!
//! Audits are opened from an assignment, moved through their lifecycle with
//! `PATCH /audits/{id}/status`, and collect comments and attachments along
//! the way.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auditdesk_core::ledger::Settlement;
use auditdesk_core::lifecycle::AuditStatus;
use auditdesk_core::storage::{StorageConfig, StorageService};
use auditdesk_db::entities::{attachments, auditors, audits, comments};
use auditdesk_db::repositories::{CreateAuditInput, NewAttachment};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Room left for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Request body cap for uploads.
pub fn upload_body_limit(storage: Option<&StorageService>) -> usize {
    let max_file = storage.map_or(StorageConfig::DEFAULT_MAX_FILE_SIZE, |s| {
        s.config().max_file_size
    });
    usize::try_from(max_file)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD)
}

/// Creates the audit routes.
pub fn routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/audits", get(list_audits).post(create_audit))
        .route("/audits/{id}", get(get_audit))
        .route("/audits/{id}/status", patch(transition_audit))
        .route("/audits/{id}/duration", get(audit_duration))
        .route("/audits/{id}/comments", get(list_comments).post(add_comment))
        .route(
            "/audits/{id}/attachments",
            get(list_attachments)
                .post(upload_attachment)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/audits/{id}/attachments/{attachment_id}",
            get(download_attachment),
        )
}

/// Request body for opening an audit.
#[derive(Debug, Deserialize)]
pub struct CreateAuditRequest {
    /// Assignment the audit is opened for.
    pub assignment_id: Uuid,
    /// Provider charged on completion. Defaults to the assignment's provider.
    pub provider_id: Option<Uuid>,
    /// Auditors working on the audit.
    #[serde(default)]
    pub auditor_ids: Vec<Uuid>,
}

/// Request body for a lifecycle transition.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target status.
    pub status: String,
}

/// Request body for a comment.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    /// Comment text.
    pub content: String,
}

/// An audit with its live duration.
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    /// The stored audit.
    #[serde(flatten)]
    pub audit: audits::Model,
    /// Working days so far, including the running interval.
    pub current_duration: Decimal,
}

/// An audit with its team.
#[derive(Debug, Serialize)]
pub struct AuditDetailResponse {
    /// The stored audit.
    #[serde(flatten)]
    pub audit: audits::Model,
    /// Auditors on the audit.
    pub auditors: Vec<auditors::Model>,
    /// Working days so far, including the running interval.
    pub current_duration: Decimal,
}

/// Result of a transition.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    /// The audit after the transition.
    pub audit: audits::Model,
    /// Budget settlement, present when completion charged a provider.
    pub settlement: Option<Settlement>,
}

/// Live duration of an audit.
#[derive(Debug, Serialize)]
pub struct DurationResponse {
    /// Audit ID.
    pub audit_id: Uuid,
    /// Working days so far.
    pub current_duration: Decimal,
    /// When the value was computed.
    pub computed_at: DateTime<Utc>,
}

/// POST `/audits`
async fn create_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAuditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let audit = state
        .audits()
        .create(CreateAuditInput {
            assignment_id: payload.assignment_id,
            provider_id: payload.provider_id,
            auditor_ids: payload.auditor_ids,
        })
        .await?;

    auth.log_action(
        "create_audit",
        &format!("audit {} for assignment {}", audit.id, audit.assignment_id),
    );
    Ok((
        StatusCode::CREATED,
        Json(AuditResponse {
            audit,
            current_duration: Decimal::ZERO,
        }),
    ))
}

/// GET `/audits`
async fn list_audits(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let audits = state
        .audits()
        .list()
        .await?
        .into_iter()
        .map(|s| AuditResponse {
            audit: s.audit,
            current_duration: s.current_duration,
        })
        .collect::<Vec<_>>();
    Ok(Json(audits))
}

/// GET `/audits/{id}`
async fn get_audit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.audits().get(id).await?;
    Ok(Json(AuditDetailResponse {
        audit: details.audit,
        auditors: details.auditors,
        current_duration: details.current_duration,
    }))
}

/// PATCH `/audits/{id}/status`
async fn transition_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.audits().transition(id, &payload.status).await?;

    let status = AuditStatus::from(outcome.audit.status);
    let details = match &outcome.settlement {
        Some(s) => format!(
            "audit {id} -> {status}, charged {} (realisation {} -> {})",
            s.cost, s.previous_realisation, s.realisation
        ),
        None => format!("audit {id} -> {status}"),
    };
    auth.log_action("transition_audit", &details);

    Ok(Json(TransitionResponse {
        audit: outcome.audit,
        settlement: outcome.settlement,
    }))
}

/// GET `/audits/{id}/duration`
async fn audit_duration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let current_duration = state.audits().current_duration(id).await?;
    Ok(Json(DurationResponse {
        audit_id: id,
        current_duration,
        computed_at: state.clock.now(),
    }))
}

/// POST `/audits/{id}/comments`
async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment: comments::Model = state
        .audits()
        .add_comment(id, auth.username(), &payload.content)
        .await?;
    auth.log_action("add_comment", &format!("audit {id}"));
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET `/audits/{id}/comments`
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.audits().comments(id).await?))
}

/// POST `/audits/{id}/attachments` (multipart, one `file` part)
async fn upload_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let storage = storage(&state)?;
    let repo = state.audits();
    repo.find(id).await?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        file = Some((filename, content_type, data.to_vec()));
        break;
    }
    let (filename, content_type, data) =
        file.ok_or_else(|| ApiError::validation("multipart part `file` is required"))?;

    let attachment_id = Uuid::new_v4();
    let stored = storage
        .upload(id, attachment_id, &filename, &content_type, data)
        .await?;

    let recorded = repo
        .add_attachment(NewAttachment {
            id: attachment_id,
            audit_id: id,
            author: auth.username().to_string(),
            filename: filename.clone(),
            storage_key: stored.storage_key.clone(),
            content_type,
            size: stored.size,
        })
        .await;

    let attachment: attachments::Model = match recorded {
        Ok(a) => a,
        Err(e) => {
            if let Err(cleanup) = storage.delete(&stored.storage_key).await {
                tracing::warn!(
                    key = %stored.storage_key,
                    error = %cleanup,
                    "Failed to remove orphaned attachment"
                );
            }
            return Err(e.into());
        }
    };

    auth.log_action(
        "upload_attachment",
        &format!("audit {id}: {filename} ({} bytes)", stored.size),
    );
    Ok((StatusCode::CREATED, Json(attachment)))
}

/// GET `/audits/{id}/attachments`
async fn list_attachments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.audits().attachments(id).await?))
}

/// GET `/audits/{id}/attachments/{attachment_id}`
async fn download_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let storage = storage(&state)?;
    let attachment = state.audits().attachment(id, attachment_id).await?;
    let bytes = storage.read(&attachment.storage_key).await?;

    auth.log_action(
        "download_attachment",
        &format!("audit {id}: {}", attachment.filename),
    );
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment.filename.replace(['"', '\\', '\r', '\n'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, attachment.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

fn storage(state: &AppState) -> Result<Arc<StorageService>, ApiError> {
    state.storage.clone().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "STORAGE_UNAVAILABLE",
            "Attachment storage is not configured",
        )
    })
}
