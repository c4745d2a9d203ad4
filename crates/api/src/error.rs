//! HTTP error responses.
//!
//! Every failure leaves the API as `{ "error": "<code>", "message": "<text>" }`
//! with the status code its domain error carries.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use auditdesk_core::credentials::CredentialError;
use auditdesk_core::ledger::LedgerError;
use auditdesk_core::lifecycle::LifecycleError;
use auditdesk_core::storage::StorageError;
use auditdesk_db::repositories::{
    AssignmentError, AuditError, AuditRequestError, AuditorError, DashboardError, PlanError,
    ProviderError,
};
use auditdesk_shared::{AppError, IdentityError};

/// An error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates an error response.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 404 with a `not_found`-style code.
    #[must_use]
    pub fn not_found(code: &'static str, message: impl ToString) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message.to_string())
    }

    /// 400 validation failure.
    #[must_use]
    pub fn validation(message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.to_string())
    }

    /// 500 that hides the cause from the client and logs it.
    #[must_use]
    pub fn internal(cause: &impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }

    /// The HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_parts(status: u16, code: &'static str, message: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code, error = %message, "Request failed");
            return Self::new(status, code, "An internal error occurred");
        }
        Self::new(status, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.code, "message": self.message })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::from_parts(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        let code = match &err {
            IdentityError::Expired => "TOKEN_EXPIRED",
            IdentityError::KeySet(_) => "IDENTITY_UNAVAILABLE",
            _ => "INVALID_TOKEN",
        };
        let app = AppError::from(err);
        Self::new(
            StatusCode::from_u16(app.status_code()).unwrap_or(StatusCode::UNAUTHORIZED),
            code,
            app.to_string(),
        )
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        Self::from_parts(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::from_parts(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::from_parts(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        Self::internal(&err)
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::NotFound(_) => Self::not_found("AUDIT_NOT_FOUND", err),
            AuditError::AttachmentNotFound(_) => Self::not_found("ATTACHMENT_NOT_FOUND", err),
            AuditError::AssignmentNotFound(_) => Self::not_found("ASSIGNMENT_NOT_FOUND", err),
            AuditError::AuditorNotFound(_) => Self::not_found("AUDITOR_NOT_FOUND", err),
            AuditError::AssignmentStarted(_) => {
                Self::new(StatusCode::CONFLICT, "ASSIGNMENT_STARTED", err.to_string())
            }
            AuditError::Validation(_) => Self::validation(err),
            AuditError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(_) => Self::not_found("PROVIDER_NOT_FOUND", err),
            ProviderError::DuplicateName(_) => {
                Self::new(StatusCode::CONFLICT, "DUPLICATE_PROVIDER", err.to_string())
            }
            ProviderError::InUse(_) => {
                Self::new(StatusCode::CONFLICT, "PROVIDER_IN_USE", err.to_string())
            }
            ProviderError::Ledger(e) => e.into(),
            ProviderError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<AuditorError> for ApiError {
    fn from(err: AuditorError) -> Self {
        match err {
            AuditorError::NotFound(_) => Self::not_found("AUDITOR_NOT_FOUND", err),
            AuditorError::ProviderNotFound(_) => Self::not_found("PROVIDER_NOT_FOUND", err),
            AuditorError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::NotFound(_) => Self::not_found("ASSIGNMENT_NOT_FOUND", err),
            AssignmentError::RequestNotFound(_) => Self::not_found("REQUEST_NOT_FOUND", err),
            AssignmentError::ProviderNotFound(_) => Self::not_found("PROVIDER_NOT_FOUND", err),
            AssignmentError::AuditorNotFound(_) => Self::not_found("AUDITOR_NOT_FOUND", err),
            AssignmentError::RequestRejected(_) => {
                Self::new(StatusCode::CONFLICT, "REQUEST_REJECTED", err.to_string())
            }
            AssignmentError::InvalidStatus(_) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_STATE", err.to_string())
            }
            AssignmentError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<AuditRequestError> for ApiError {
    fn from(err: AuditRequestError) -> Self {
        match err {
            AuditRequestError::NotFound(_) => Self::not_found("REQUEST_NOT_FOUND", err),
            AuditRequestError::InvalidStatus(_) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_STATE", err.to_string())
            }
            AuditRequestError::RejectionCommentRequired | AuditRequestError::Validation(_) => {
                Self::validation(err)
            }
            AuditRequestError::Credentials(e) => e.into(),
            AuditRequestError::CorruptAccounts(_) => Self::internal(&err),
            AuditRequestError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::NotFound(_) => Self::not_found("PLAN_NOT_FOUND", err),
            PlanError::Validation(_) => Self::validation(err),
            PlanError::Database(e) => Self::internal(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditdesk_core::lifecycle::AuditStatus;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    #[case(LifecycleError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND, "AUDIT_NOT_FOUND")]
    #[case(LifecycleError::InvalidState("Archived".into()), StatusCode::BAD_REQUEST, "INVALID_STATE")]
    #[case(
        LifecycleError::InvalidTransition { from: AuditStatus::Completed, to: AuditStatus::InProgress },
        StatusCode::BAD_REQUEST,
        "INVALID_TRANSITION"
    )]
    #[case(
        LifecycleError::Persistence("deadlock".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
        "PERSISTENCE_ERROR"
    )]
    fn test_lifecycle_errors(
        #[case] err: LifecycleError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let api: ApiError = err.into();
        assert_eq!(api.status(), status);
        assert_eq!(api.code(), code);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let api: ApiError = LifecycleError::Persistence("password=hunter2".into()).into();
        assert_eq!(api.message, "An internal error occurred");
    }

    #[test]
    fn test_identity_errors() {
        let expired: ApiError = IdentityError::Expired.into();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.code(), "TOKEN_EXPIRED");

        let down: ApiError = IdentityError::KeySet("timeout".into()).into();
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(down.code(), "IDENTITY_UNAVAILABLE");
    }

    #[test]
    fn test_plan_errors() {
        let missing: ApiError = PlanError::NotFound(Uuid::nil()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), "PLAN_NOT_FOUND");

        let bad: ApiError = PlanError::Validation("a month filter needs a year".into()).into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_rejection_without_comment_is_validation_error() {
        let api: ApiError = AuditRequestError::RejectionCommentRequired.into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), "VALIDATION_ERROR");
    }
}
