//! Audit request repository.
//!
//! Test-account secrets are sealed with [`CredentialCipher`] before they are
//! written and opened only when a single request is read back.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use auditdesk_core::credentials::{
    CredentialCipher, CredentialError, SealedTestAccount, TestAccount,
};

use crate::entities::{audit_requests, sea_orm_active_enums::RequestStatus};

/// Error types for audit request operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditRequestError {
    /// Request not found.
    #[error("Audit request not found: {0}")]
    NotFound(Uuid),

    /// Unknown status token.
    #[error("Invalid request status: {0}")]
    InvalidStatus(String),

    /// Rejecting a request needs a comment.
    #[error("A rejection comment is required")]
    RejectionCommentRequired,

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Sealing or opening a secret failed.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Stored test accounts are not valid JSON.
    #[error("Corrupt test accounts on request {0}")]
    CorruptAccounts(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for submitting an audit request.
#[derive(Debug, Clone)]
pub struct CreateAuditRequestInput {
    /// Contact email of the requester.
    pub requester_email: String,
    /// Application to audit.
    pub application_name: String,
    /// What the application does.
    pub description: String,
    /// Kind of application (web, mobile, API, ...).
    pub application_type: String,
    /// Where the application runs.
    pub target_url: String,
    /// Desired audit date.
    pub planned_date: Option<NaiveDate>,
    /// Accounts for the auditors, in clear text.
    pub test_accounts: Vec<TestAccount>,
    /// Submitting user.
    pub created_by: String,
}

/// A request with its test accounts opened.
#[derive(Debug, Clone)]
pub struct OpenedAuditRequest {
    /// Request row. `test_accounts` still holds the sealed form.
    pub request: audit_requests::Model,
    /// Test accounts in clear text.
    pub test_accounts: Vec<TestAccount>,
}

/// Audit request repository.
#[derive(Clone)]
pub struct AuditRequestRepository {
    db: DatabaseConnection,
    cipher: CredentialCipher,
}

impl AuditRequestRepository {
    /// Creates a new audit request repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, cipher: CredentialCipher) -> Self {
        Self { db, cipher }
    }

    /// Submits a request in `pending` status.
    pub async fn create(
        &self,
        input: CreateAuditRequestInput,
    ) -> Result<audit_requests::Model, AuditRequestError> {
        validate(&input)?;

        let sealed = self.cipher.seal_all(&input.test_accounts)?;
        let now = Utc::now().into();
        let request = audit_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            status: Set(RequestStatus::Pending),
            requester_email: Set(input.requester_email),
            application_name: Set(input.application_name),
            description: Set(input.description),
            application_type: Set(input.application_type),
            target_url: Set(input.target_url),
            planned_date: Set(input.planned_date),
            test_accounts: Set(sealed_to_json(&sealed)),
            rejection_comment: Set(None),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            audit_request_id = %request.id,
            accounts = sealed.len(),
            "Audit request submitted"
        );
        Ok(request)
    }

    /// Lists requests, newest first. Secrets stay sealed.
    pub async fn list(
        &self,
        created_by: Option<&str>,
    ) -> Result<Vec<audit_requests::Model>, AuditRequestError> {
        let mut query = audit_requests::Entity::find();
        if let Some(user) = created_by {
            query = query.filter(audit_requests::Column::CreatedBy.eq(user));
        }
        Ok(query
            .order_by_desc(audit_requests::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Reads a request and opens its test accounts.
    pub async fn get_opened(&self, id: Uuid) -> Result<OpenedAuditRequest, AuditRequestError> {
        let request = self.find(id).await?;
        let sealed = sealed_from_json(&request)?;
        let test_accounts = self.cipher.open_all(&sealed)?;
        Ok(OpenedAuditRequest {
            request,
            test_accounts,
        })
    }

    /// Sets the review status of a request.
    pub async fn set_status(
        &self,
        id: Uuid,
        raw: &str,
        comment: Option<String>,
    ) -> Result<audit_requests::Model, AuditRequestError> {
        let status = RequestStatus::parse(raw)
            .ok_or_else(|| AuditRequestError::InvalidStatus(raw.to_string()))?;
        let comment = comment.filter(|c| !c.trim().is_empty());
        if status == RequestStatus::Rejected && comment.is_none() {
            return Err(AuditRequestError::RejectionCommentRequired);
        }

        let existing = self.find(id).await?;
        let mut active: audit_requests::ActiveModel = existing.into();
        active.status = Set(status);
        active.rejection_comment = Set(comment);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await?;

        tracing::info!(audit_request_id = %id, status = ?status, "Audit request reviewed");
        Ok(updated)
    }

    /// Finds a request row.
    pub async fn find(&self, id: Uuid) -> Result<audit_requests::Model, AuditRequestError> {
        audit_requests::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AuditRequestError::NotFound(id))
    }
}

fn validate(input: &CreateAuditRequestInput) -> Result<(), AuditRequestError> {
    let required = [
        ("requester_email", &input.requester_email),
        ("application_name", &input.application_name),
        ("application_type", &input.application_type),
        ("target_url", &input.target_url),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(AuditRequestError::Validation(format!("{field} is required")));
    }
    if !input.requester_email.contains('@') {
        return Err(AuditRequestError::Validation(
            "requester_email is not an email address".to_string(),
        ));
    }
    if input.test_accounts.iter().any(|a| a.identifier.trim().is_empty()) {
        return Err(AuditRequestError::Validation(
            "test account identifier is required".to_string(),
        ));
    }
    Ok(())
}

fn sealed_to_json(sealed: &[SealedTestAccount]) -> serde_json::Value {
    serde_json::Value::Array(
        sealed
            .iter()
            .map(|a| {
                serde_json::json!({
                    "identifier": a.identifier,
                    "sealed_secret": a.sealed_secret,
                })
            })
            .collect(),
    )
}

fn sealed_from_json(
    request: &audit_requests::Model,
) -> Result<Vec<SealedTestAccount>, AuditRequestError> {
    serde_json::from_value(request.test_accounts.clone())
        .map_err(|_| AuditRequestError::CorruptAccounts(request.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateAuditRequestInput {
        CreateAuditRequestInput {
            requester_email: "owner@example.org".to_string(),
            application_name: "Payroll".to_string(),
            description: "HR payroll portal".to_string(),
            application_type: "web".to_string(),
            target_url: "https://payroll.example.org".to_string(),
            planned_date: None,
            test_accounts: vec![TestAccount {
                identifier: "qa-user".to_string(),
                secret: "s3cret!".to_string(),
            }],
            created_by: "jdoe".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(validate(&input()).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut missing_name = input();
        missing_name.application_name = "  ".to_string();
        assert!(matches!(
            validate(&missing_name),
            Err(AuditRequestError::Validation(msg)) if msg.contains("application_name")
        ));

        let mut bad_email = input();
        bad_email.requester_email = "owner".to_string();
        assert!(validate(&bad_email).is_err());

        let mut blank_account = input();
        blank_account.test_accounts[0].identifier = String::new();
        assert!(validate(&blank_account).is_err());
    }

    #[test]
    fn test_sealed_accounts_json_shape() {
        let cipher = CredentialCipher::new(&[7u8; 32]);
        let sealed = cipher.seal_all(&input().test_accounts).unwrap();
        let json = sealed_to_json(&sealed);

        assert_eq!(json[0]["identifier"], "qa-user");
        assert!(!json.to_string().contains("s3cret!"));

        let now = Utc::now().into();
        let row = audit_requests::Model {
            id: Uuid::new_v4(),
            status: RequestStatus::Pending,
            requester_email: "owner@example.org".to_string(),
            application_name: "Payroll".to_string(),
            description: String::new(),
            application_type: "web".to_string(),
            target_url: "https://payroll.example.org".to_string(),
            planned_date: None,
            test_accounts: json,
            rejection_comment: None,
            created_by: "jdoe".to_string(),
            created_at: now,
            updated_at: now,
        };
        let back = sealed_from_json(&row).unwrap();
        assert_eq!(cipher.open_all(&back).unwrap(), input().test_accounts);
    }

    #[test]
    fn test_corrupt_accounts_detected() {
        let now = Utc::now().into();
        let id = Uuid::new_v4();
        let row = audit_requests::Model {
            id,
            status: RequestStatus::Pending,
            requester_email: String::new(),
            application_name: String::new(),
            description: String::new(),
            application_type: String::new(),
            target_url: String::new(),
            planned_date: None,
            test_accounts: serde_json::json!({"not": "a list"}),
            rejection_comment: None,
            created_by: String::new(),
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(
            sealed_from_json(&row),
            Err(AuditRequestError::CorruptAccounts(got)) if got == id
        ));
    }
}
