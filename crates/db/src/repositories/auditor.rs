//! Auditor repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{auditors, providers};

/// Error types for auditor operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditorError {
    /// Auditor not found.
    #[error("Auditor not found: {0}")]
    NotFound(Uuid),

    /// Provider not found.
    #[error("Provider not found: {0}")]
    ProviderNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Auditor fields, used for both create and replace.
#[derive(Debug, Clone)]
pub struct AuditorInput {
    /// Family name.
    pub last_name: String,
    /// Given name.
    pub first_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Employing provider.
    pub provider_id: Uuid,
}

/// Auditor repository.
#[derive(Debug, Clone)]
pub struct AuditorRepository {
    db: DatabaseConnection,
}

impl AuditorRepository {
    /// Creates a new auditor repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists auditors, optionally for one provider.
    pub async fn list(
        &self,
        provider_id: Option<Uuid>,
    ) -> Result<Vec<auditors::Model>, AuditorError> {
        let mut query = auditors::Entity::find();
        if let Some(provider_id) = provider_id {
            query = query.filter(auditors::Column::ProviderId.eq(provider_id));
        }
        Ok(query
            .order_by_asc(auditors::Column::LastName)
            .order_by_asc(auditors::Column::FirstName)
            .all(&self.db)
            .await?)
    }

    /// Creates an auditor.
    pub async fn create(&self, input: AuditorInput) -> Result<auditors::Model, AuditorError> {
        self.ensure_provider(input.provider_id).await?;

        let now = Utc::now().into();
        let auditor = auditors::ActiveModel {
            id: Set(Uuid::new_v4()),
            last_name: Set(input.last_name),
            first_name: Set(input.first_name),
            email: Set(input.email),
            phone: Set(input.phone),
            provider_id: Set(input.provider_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;
        Ok(auditor)
    }

    /// Replaces an auditor's fields.
    pub async fn update(
        &self,
        id: Uuid,
        input: AuditorInput,
    ) -> Result<auditors::Model, AuditorError> {
        let existing = auditors::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AuditorError::NotFound(id))?;
        self.ensure_provider(input.provider_id).await?;

        let mut active: auditors::ActiveModel = existing.into();
        active.last_name = Set(input.last_name);
        active.first_name = Set(input.first_name);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.provider_id = Set(input.provider_id);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes an auditor. Audit and assignment links are removed with it.
    pub async fn delete(&self, id: Uuid) -> Result<(), AuditorError> {
        let result = auditors::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AuditorError::NotFound(id));
        }
        Ok(())
    }

    async fn ensure_provider(&self, provider_id: Uuid) -> Result<(), AuditorError> {
        providers::Entity::find_by_id(provider_id)
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(AuditorError::ProviderNotFound(provider_id))
    }
}
