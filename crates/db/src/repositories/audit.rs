//! Audit repository.
//!
//! Owns the atomic unit of the audit lifecycle: a transition reads the audit
//! under a row lock, lets [`LifecycleEngine`] compute the new state and any
//! settlement, and writes the audit and its provider in one transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use auditdesk_core::clock::{Clock, SystemClock};
use auditdesk_core::ledger::Settlement;
use auditdesk_core::lifecycle::{
    AuditState, AuditStatus, LifecycleEngine, LifecycleError, TransitionOutcome,
};

use crate::entities::{
    assignments, attachments, audit_auditors, auditors, audits, comments, providers,
    sea_orm_active_enums::{self, AssignmentStatus},
};

use super::provider::provider_budget;

/// Maximum comment length, in characters.
pub const MAX_COMMENT_LEN: usize = 500;

/// Error types for audit operations other than transitions.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Audit not found.
    #[error("Audit not found: {0}")]
    NotFound(Uuid),

    /// Attachment not found on this audit.
    #[error("Attachment not found: {0}")]
    AttachmentNotFound(Uuid),

    /// Assignment not found.
    #[error("Assignment not found: {0}")]
    AssignmentNotFound(Uuid),

    /// Assignment already has an audit.
    #[error("Assignment {0} already has an audit")]
    AssignmentStarted(Uuid),

    /// One of the auditors does not exist.
    #[error("Auditor not found: {0}")]
    AuditorNotFound(Uuid),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for opening an audit on an assignment.
#[derive(Debug, Clone)]
pub struct CreateAuditInput {
    /// Assignment the audit executes.
    pub assignment_id: Uuid,
    /// Funding provider. Defaults to the assignment's provider.
    pub provider_id: Option<Uuid>,
    /// Auditors working on the audit.
    pub auditor_ids: Vec<Uuid>,
}

/// An audit with its live duration.
#[derive(Debug, Clone)]
pub struct AuditSummary {
    /// Audit row.
    pub audit: audits::Model,
    /// Accumulated plus running working days, 2 dp.
    pub current_duration: Decimal,
}

/// An audit with its auditors and live duration.
#[derive(Debug, Clone)]
pub struct AuditDetails {
    /// Audit row.
    pub audit: audits::Model,
    /// Auditors working on the audit.
    pub auditors: Vec<auditors::Model>,
    /// Accumulated plus running working days, 2 dp.
    pub current_duration: Decimal,
}

/// Input for recording a stored attachment.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    /// Attachment ID, also part of the storage key.
    pub id: Uuid,
    /// Audit the file belongs to.
    pub audit_id: Uuid,
    /// Uploader.
    pub author: String,
    /// Original file name.
    pub filename: String,
    /// Object storage key.
    pub storage_key: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// Audit repository.
#[derive(Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
    engine: LifecycleEngine,
    clock: Arc<dyn Clock>,
}

impl AuditRepository {
    /// Creates a repository on the wall clock.
    #[must_use]
    pub fn new(db: DatabaseConnection, engine: LifecycleEngine) -> Self {
        Self::with_clock(db, engine, Arc::new(SystemClock))
    }

    /// Creates a repository reading "now" from `clock`.
    #[must_use]
    pub fn with_clock(
        db: DatabaseConnection,
        engine: LifecycleEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { db, engine, clock }
    }

    /// Opens an audit on an assignment and marks the assignment started.
    pub async fn create(&self, input: CreateAuditInput) -> Result<audits::Model, AuditError> {
        let txn = self.db.begin().await?;

        let assignment = assignments::Entity::find_by_id(input.assignment_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AuditError::AssignmentNotFound(input.assignment_id))?;
        if assignment.status == AssignmentStatus::Started {
            return Err(AuditError::AssignmentStarted(assignment.id));
        }

        let found = auditors::Entity::find()
            .filter(auditors::Column::Id.is_in(input.auditor_ids.clone()))
            .all(&txn)
            .await?;
        if let Some(missing) = input
            .auditor_ids
            .iter()
            .find(|id| !found.iter().any(|a| a.id == **id))
        {
            return Err(AuditError::AuditorNotFound(*missing));
        }

        let now = self.clock.now().into();
        let audit = audits::ActiveModel {
            id: Set(Uuid::new_v4()),
            audit_request_id: Set(assignment.audit_request_id),
            assignment_id: Set(assignment.id),
            provider_id: Set(input.provider_id.or(assignment.provider_id)),
            status: Set(sea_orm_active_enums::AuditStatus::Pending),
            accumulated_duration: Set(Decimal::ZERO),
            active_interval_start: Set(None),
            last_pause_time: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for auditor in &found {
            audit_auditors::ActiveModel {
                audit_id: Set(audit.id),
                auditor_id: Set(auditor.id),
            }
            .insert(&txn)
            .await?;
        }

        let mut started: assignments::ActiveModel = assignment.into();
        started.status = Set(AssignmentStatus::Started);
        started.updated_at = Set(now);
        started.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            audit_id = %audit.id,
            assignment_id = %audit.assignment_id,
            auditors = found.len(),
            "Opened audit"
        );
        Ok(audit)
    }

    /// Lists audits, newest first, with their live durations.
    pub async fn list(&self) -> Result<Vec<AuditSummary>, AuditError> {
        let now = self.clock.now();
        let rows = audits::Entity::find()
            .order_by_desc(audits::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|audit| AuditSummary {
                current_duration: self.engine.current_duration(&audit.state(), now),
                audit,
            })
            .collect())
    }

    /// Gets an audit with its auditors.
    pub async fn get(&self, id: Uuid) -> Result<AuditDetails, AuditError> {
        let audit = self.find(id).await?;
        let auditors = audit.find_related(auditors::Entity).all(&self.db).await?;
        Ok(AuditDetails {
            current_duration: self.engine.current_duration(&audit.state(), self.clock.now()),
            audit,
            auditors,
        })
    }

    /// Moves an audit to `new_status`.
    ///
    /// The audit row, and the provider row when the audit completes, are
    /// locked for the duration of the transaction. On any error nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `new_status` is not a status token
    /// - `NotFound` if the audit does not exist
    /// - `InvalidTransition` if the lifecycle forbids the move
    /// - `Persistence` if the database fails
    pub async fn transition(
        &self,
        audit_id: Uuid,
        new_status: &str,
    ) -> Result<TransitionOutcome<audits::Model>, LifecycleError> {
        let to = LifecycleEngine::parse_status(new_status)?;

        let txn = self.db.begin().await.map_err(persistence)?;

        let audit = audits::Entity::find_by_id(audit_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(persistence)?
            .ok_or(LifecycleError::NotFound(audit_id))?;

        let provider = match audit.provider_id {
            Some(provider_id) if to == AuditStatus::Completed => {
                providers::Entity::find_by_id(provider_id)
                    .lock_exclusive()
                    .one(&txn)
                    .await
                    .map_err(persistence)?
            }
            _ => None,
        };
        let budget = provider.as_ref().map(provider_budget);

        let now = self.clock.now();
        let outcome = self
            .engine
            .transition(&audit.state(), to, budget.as_ref(), now)?;

        let from = audit.status;
        let updated = audit_update(audit, &outcome.audit, now)
            .update(&txn)
            .await
            .map_err(persistence)?;

        if let (Some(provider), Some(settlement)) = (provider, outcome.settlement.as_ref()) {
            settled_provider(provider, settlement, now)
                .update(&txn)
                .await
                .map_err(persistence)?;
        }

        txn.commit().await.map_err(persistence)?;

        tracing::info!(
            %audit_id,
            from = ?from,
            to = %to,
            accumulated_duration = %updated.accumulated_duration,
            cost = ?outcome.settlement.as_ref().map(|s| s.cost),
            "Audit transition committed"
        );

        Ok(TransitionOutcome {
            audit: updated,
            settlement: outcome.settlement,
        })
    }

    /// Live duration of an audit in working days, 2 dp.
    pub async fn current_duration(&self, audit_id: Uuid) -> Result<Decimal, LifecycleError> {
        let audit = audits::Entity::find_by_id(audit_id)
            .one(&self.db)
            .await
            .map_err(persistence)?
            .ok_or(LifecycleError::NotFound(audit_id))?;
        Ok(self.engine.current_duration(&audit.state(), self.clock.now()))
    }

    /// Adds a comment to an audit.
    pub async fn add_comment(
        &self,
        audit_id: Uuid,
        author: &str,
        content: &str,
    ) -> Result<comments::Model, AuditError> {
        let content = validate_comment(content)?;
        self.find(audit_id).await?;

        let comment = comments::ActiveModel {
            id: Set(Uuid::new_v4()),
            audit_id: Set(audit_id),
            author: Set(author.to_string()),
            content: Set(content.to_string()),
            created_at: Set(self.clock.now().into()),
        }
        .insert(&self.db)
        .await?;
        Ok(comment)
    }

    /// Comments of an audit, oldest first.
    pub async fn comments(&self, audit_id: Uuid) -> Result<Vec<comments::Model>, AuditError> {
        self.find(audit_id).await?;
        Ok(comments::Entity::find()
            .filter(comments::Column::AuditId.eq(audit_id))
            .order_by_asc(comments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Records an attachment already written to storage.
    pub async fn add_attachment(
        &self,
        input: NewAttachment,
    ) -> Result<attachments::Model, AuditError> {
        let size = i64::try_from(input.size)
            .map_err(|_| AuditError::Validation("attachment too large".to_string()))?;
        let attachment = attachments::ActiveModel {
            id: Set(input.id),
            audit_id: Set(input.audit_id),
            author: Set(input.author),
            filename: Set(input.filename),
            storage_key: Set(input.storage_key),
            content_type: Set(input.content_type),
            size_bytes: Set(size),
            uploaded_at: Set(self.clock.now().into()),
        }
        .insert(&self.db)
        .await?;
        Ok(attachment)
    }

    /// Attachments of an audit, oldest first.
    pub async fn attachments(&self, audit_id: Uuid) -> Result<Vec<attachments::Model>, AuditError> {
        self.find(audit_id).await?;
        Ok(attachments::Entity::find()
            .filter(attachments::Column::AuditId.eq(audit_id))
            .order_by_asc(attachments::Column::UploadedAt)
            .all(&self.db)
            .await?)
    }

    /// One attachment of an audit.
    pub async fn attachment(
        &self,
        audit_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<attachments::Model, AuditError> {
        attachments::Entity::find_by_id(attachment_id)
            .filter(attachments::Column::AuditId.eq(audit_id))
            .one(&self.db)
            .await?
            .ok_or(AuditError::AttachmentNotFound(attachment_id))
    }

    /// Finds an audit row.
    pub async fn find(&self, id: Uuid) -> Result<audits::Model, AuditError> {
        audits::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AuditError::NotFound(id))
    }
}

fn persistence(e: DbErr) -> LifecycleError {
    LifecycleError::Persistence(e.to_string())
}

/// Trims a comment and checks its length.
fn validate_comment(content: &str) -> Result<&str, AuditError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AuditError::Validation("comment is empty".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AuditError::Validation(format!(
            "comment exceeds {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(content)
}

/// Update of the lifecycle columns of `audit` to `state`.
fn audit_update(
    audit: audits::Model,
    state: &AuditState,
    now: DateTime<Utc>,
) -> audits::ActiveModel {
    let mut active: audits::ActiveModel = audit.into();
    active.status = Set(state.status.into());
    active.accumulated_duration = Set(state.accumulated_duration);
    active.active_interval_start = Set(state.active_interval_start.map(Into::into));
    active.last_pause_time = Set(state.last_pause_time.map(Into::into));
    active.updated_at = Set(now.into());
    active
}

/// Update of a provider's consumption after a settlement.
fn settled_provider(
    provider: providers::Model,
    settlement: &Settlement,
    now: DateTime<Utc>,
) -> providers::ActiveModel {
    let mut active: providers::ActiveModel = provider.into();
    active.realisation = Set(settlement.realisation);
    active.solde = Set(settlement.solde);
    active.updated_at = Set(now.into());
    active
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
