//! Assignment repository.
//!
//! An assignment hands a validated audit request to a provider and a team of
//! auditors. Its status is independent of the audit lifecycle.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use auditdesk_core::lifecycle;

use crate::entities::{
    assignment_auditors, assignments, audit_requests, auditors, providers,
    sea_orm_active_enums::{AssignmentStatus, RequestStatus},
};

/// Error types for assignment operations.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// Assignment not found.
    #[error("Assignment not found: {0}")]
    NotFound(Uuid),

    /// Audit request not found.
    #[error("Audit request not found: {0}")]
    RequestNotFound(Uuid),

    /// Audit request was rejected.
    #[error("Audit request {0} was rejected")]
    RequestRejected(Uuid),

    /// Provider not found.
    #[error("Provider not found: {0}")]
    ProviderNotFound(Uuid),

    /// Auditor not found.
    #[error("Auditor not found: {0}")]
    AuditorNotFound(Uuid),

    /// Unknown status token.
    #[error("Invalid assignment status: {0}")]
    InvalidStatus(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an assignment.
#[derive(Debug, Clone)]
pub struct CreateAssignmentInput {
    /// Request being assigned.
    pub audit_request_id: Uuid,
    /// Provider executing the audit.
    pub provider_id: Option<Uuid>,
    /// Kind of audit (pentest, code review, ...).
    pub audit_type: String,
    /// Assignment date. Defaults to today.
    pub assigned_on: Option<NaiveDate>,
    /// Assigned auditors.
    pub auditor_ids: Vec<Uuid>,
}

/// An assignment with its auditors.
#[derive(Debug, Clone)]
pub struct AssignmentWithAuditors {
    /// Assignment row.
    pub assignment: assignments::Model,
    /// Assigned auditors.
    pub auditors: Vec<auditors::Model>,
}

/// Assignment repository.
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    db: DatabaseConnection,
}

impl AssignmentRepository {
    /// Creates a new assignment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a pending assignment.
    pub async fn create(
        &self,
        input: CreateAssignmentInput,
    ) -> Result<AssignmentWithAuditors, AssignmentError> {
        let txn = self.db.begin().await?;

        let request = audit_requests::Entity::find_by_id(input.audit_request_id)
            .one(&txn)
            .await?
            .ok_or(AssignmentError::RequestNotFound(input.audit_request_id))?;
        if request.status == RequestStatus::Rejected {
            return Err(AssignmentError::RequestRejected(request.id));
        }

        if let Some(provider_id) = input.provider_id {
            providers::Entity::find_by_id(provider_id)
                .one(&txn)
                .await?
                .ok_or(AssignmentError::ProviderNotFound(provider_id))?;
        }

        let team = auditors::Entity::find()
            .filter(auditors::Column::Id.is_in(input.auditor_ids.clone()))
            .all(&txn)
            .await?;
        if let Some(missing) = input
            .auditor_ids
            .iter()
            .find(|id| !team.iter().any(|a| a.id == **id))
        {
            return Err(AssignmentError::AuditorNotFound(*missing));
        }

        let now = Utc::now();
        let assignment = assignments::ActiveModel {
            id: Set(Uuid::new_v4()),
            audit_request_id: Set(request.id),
            provider_id: Set(input.provider_id),
            audit_type: Set(input.audit_type),
            assigned_on: Set(input.assigned_on.unwrap_or_else(|| now.date_naive())),
            status: Set(AssignmentStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        for auditor in &team {
            assignment_auditors::ActiveModel {
                assignment_id: Set(assignment.id),
                auditor_id: Set(auditor.id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            assignment_id = %assignment.id,
            audit_request_id = %assignment.audit_request_id,
            auditors = team.len(),
            "Created assignment"
        );
        Ok(AssignmentWithAuditors {
            assignment,
            auditors: team,
        })
    }

    /// Lists assignments, newest first.
    pub async fn list(&self) -> Result<Vec<assignments::Model>, AssignmentError> {
        Ok(assignments::Entity::find()
            .order_by_desc(assignments::Column::AssignedOn)
            .order_by_desc(assignments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Gets an assignment with its auditors.
    pub async fn get(&self, id: Uuid) -> Result<AssignmentWithAuditors, AssignmentError> {
        let assignment = assignments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AssignmentError::NotFound(id))?;
        let auditors = assignment.find_related(auditors::Entity).all(&self.db).await?;
        Ok(AssignmentWithAuditors {
            assignment,
            auditors,
        })
    }

    /// Sets an assignment's status from a token.
    pub async fn set_status(
        &self,
        id: Uuid,
        raw: &str,
    ) -> Result<assignments::Model, AssignmentError> {
        let status = lifecycle::AssignmentStatus::parse(raw)
            .ok_or_else(|| AssignmentError::InvalidStatus(raw.to_string()))?;

        let existing = assignments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AssignmentError::NotFound(id))?;

        let mut active: assignments::ActiveModel = existing.into();
        active.status = Set(status.into());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await?;

        tracing::info!(assignment_id = %id, status = %status, "Assignment status changed");
        Ok(updated)
    }
}
