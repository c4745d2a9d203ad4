//! Provider repository.
//!
//! Derived contract figures are recomputed on every create and update.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use auditdesk_core::ledger::{ContractTerms, LedgerError, ProviderBudget};

use crate::entities::{assignments, audits, auditors, providers};

/// Error types for provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Provider not found.
    #[error("Provider not found: {0}")]
    NotFound(Uuid),

    /// Another provider already has this name.
    #[error("Provider name already in use: {0}")]
    DuplicateName(String),

    /// Provider is still referenced.
    #[error("Provider {0} still has auditors, assignments or audits")]
    InUse(Uuid),

    /// Budget figures are invalid.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a provider.
#[derive(Debug, Clone, Default)]
pub struct CreateProviderInput {
    /// Unique name.
    pub name: String,
    /// Public market number.
    pub market_number: Option<String>,
    /// Public market subject.
    pub market_subject: Option<String>,
    /// Contracted total budget.
    pub budget_total: Option<Decimal>,
    /// Contract start.
    pub contract_start: Option<NaiveDate>,
    /// Contract end.
    pub contract_end: Option<NaiveDate>,
    /// Daily rate.
    pub budget_jour_homme: Option<Decimal>,
    /// Service classes.
    pub classes: Option<String>,
}

/// Input for updating a provider. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateProviderInput {
    /// New name.
    pub name: Option<String>,
    /// New market number.
    pub market_number: Option<String>,
    /// New market subject.
    pub market_subject: Option<String>,
    /// New total budget.
    pub budget_total: Option<Decimal>,
    /// New contract start.
    pub contract_start: Option<NaiveDate>,
    /// New contract end.
    pub contract_end: Option<NaiveDate>,
    /// New daily rate.
    pub budget_jour_homme: Option<Decimal>,
    /// New service classes.
    pub classes: Option<String>,
}

/// Budget figures of a provider row, as the ledger sees them.
#[must_use]
pub fn provider_budget(provider: &providers::Model) -> ProviderBudget {
    ProviderBudget {
        budget_total: provider.budget_total,
        realisation: provider.realisation,
        solde: provider.solde,
        budget_jour_homme: provider.budget_jour_homme,
    }
}

fn validate_amounts(
    budget_total: Option<Decimal>,
    budget_jour_homme: Option<Decimal>,
) -> Result<(), LedgerError> {
    if let Some(total) = budget_total.filter(|t| t.is_sign_negative()) {
        return Err(LedgerError::NegativeBudget(total));
    }
    if let Some(rate) = budget_jour_homme.filter(|r| r.is_sign_negative()) {
        return Err(LedgerError::NegativeDailyRate(rate));
    }
    Ok(())
}

/// Provider repository.
#[derive(Debug, Clone)]
pub struct ProviderRepository {
    db: DatabaseConnection,
}

impl ProviderRepository {
    /// Creates a new provider repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists providers by name.
    pub async fn list(&self) -> Result<Vec<providers::Model>, ProviderError> {
        Ok(providers::Entity::find()
            .order_by_asc(providers::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a provider.
    pub async fn find(&self, id: Uuid) -> Result<providers::Model, ProviderError> {
        providers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ProviderError::NotFound(id))
    }

    /// Creates a provider with zero realisation.
    pub async fn create(
        &self,
        input: CreateProviderInput,
    ) -> Result<providers::Model, ProviderError> {
        validate_amounts(input.budget_total, input.budget_jour_homme)?;
        self.ensure_name_free(&input.name, None).await?;

        let realisation = Decimal::ZERO;
        let terms = ContractTerms::compute_if_complete(
            input.contract_start,
            input.contract_end,
            input.budget_total,
            realisation,
        )?;

        let now = Utc::now().into();
        let provider = providers::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            market_number: Set(input.market_number),
            market_subject: Set(input.market_subject),
            budget_total: Set(input.budget_total),
            contract_start: Set(input.contract_start),
            contract_end: Set(input.contract_end),
            realisation: Set(realisation),
            solde: Set(terms.map(|t| t.solde).or(input.budget_total)),
            annual_amount: Set(terms.map(|t| t.annual_amount)),
            contract_years: Set(terms.map(|t| t.contract_years)),
            classes: Set(input.classes),
            budget_jour_homme: Set(input.budget_jour_homme),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = provider.insert(&self.db).await?;
        tracing::info!(provider_id = %created.id, name = %created.name, "Created provider");
        Ok(created)
    }

    /// Updates a provider and recomputes its contract figures.
    ///
    /// The row is locked so a concurrent settlement cannot interleave with
    /// the recomputation of `solde`.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProviderInput,
    ) -> Result<providers::Model, ProviderError> {
        validate_amounts(input.budget_total, input.budget_jour_homme)?;
        if let Some(name) = &input.name {
            self.ensure_name_free(name, Some(id)).await?;
        }

        let txn = self.db.begin().await?;
        let existing = providers::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ProviderError::NotFound(id))?;

        let budget_total = input.budget_total.or(existing.budget_total);
        let contract_start = input.contract_start.or(existing.contract_start);
        let contract_end = input.contract_end.or(existing.contract_end);
        let terms = ContractTerms::compute_if_complete(
            contract_start,
            contract_end,
            budget_total,
            existing.realisation,
        )?;

        let mut active: providers::ActiveModel = existing.clone().into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if input.market_number.is_some() {
            active.market_number = Set(input.market_number);
        }
        if input.market_subject.is_some() {
            active.market_subject = Set(input.market_subject);
        }
        if input.classes.is_some() {
            active.classes = Set(input.classes);
        }
        if input.budget_jour_homme.is_some() {
            active.budget_jour_homme = Set(input.budget_jour_homme);
        }
        active.budget_total = Set(budget_total);
        active.contract_start = Set(contract_start);
        active.contract_end = Set(contract_end);
        if let Some(terms) = terms {
            active.solde = Set(Some(terms.solde));
            active.annual_amount = Set(Some(terms.annual_amount));
            active.contract_years = Set(Some(terms.contract_years));
        } else if input.budget_total.is_some() {
            active.solde = Set(budget_total.map(|t| (t - existing.realisation).max(Decimal::ZERO)));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(provider_id = %id, "Updated provider");
        Ok(updated)
    }

    /// Deletes a provider that nothing references.
    pub async fn delete(&self, id: Uuid) -> Result<(), ProviderError> {
        let provider = self.find(id).await?;

        let referenced = auditors::Entity::find()
            .filter(auditors::Column::ProviderId.eq(id))
            .count(&self.db)
            .await?
            + assignments::Entity::find()
                .filter(assignments::Column::ProviderId.eq(id))
                .count(&self.db)
                .await?
            + audits::Entity::find()
                .filter(audits::Column::ProviderId.eq(id))
                .count(&self.db)
                .await?;
        if referenced > 0 {
            return Err(ProviderError::InUse(id));
        }

        providers::Entity::delete_by_id(provider.id)
            .exec(&self.db)
            .await?;
        tracing::info!(provider_id = %id, "Deleted provider");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), ProviderError> {
        let mut query = providers::Entity::find().filter(providers::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(providers::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(ProviderError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(total: Option<Decimal>, rate: Option<Decimal>) -> providers::Model {
        let now = Utc::now().into();
        providers::Model {
            id: Uuid::new_v4(),
            name: "Acme Security".to_string(),
            market_number: None,
            market_subject: None,
            budget_total: total,
            contract_start: None,
            contract_end: None,
            realisation: dec!(250),
            solde: total.map(|t| t - dec!(250)),
            annual_amount: None,
            contract_years: None,
            classes: None,
            budget_jour_homme: rate,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_provider_budget_copies_figures() {
        let budget = provider_budget(&row(Some(dec!(1000)), Some(dec!(125))));
        assert_eq!(budget.budget_total, Some(dec!(1000)));
        assert_eq!(budget.realisation, dec!(250));
        assert_eq!(budget.solde, Some(dec!(750)));
        assert!(budget.is_billable());
        assert!(!provider_budget(&row(Some(dec!(1000)), None)).is_billable());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amounts(Some(dec!(0)), Some(dec!(10))).is_ok());
        assert!(validate_amounts(None, None).is_ok());
        assert!(matches!(
            validate_amounts(Some(dec!(-1)), None),
            Err(LedgerError::NegativeBudget(_))
        ));
        assert!(matches!(
            validate_amounts(None, Some(dec!(-0.5))),
            Err(LedgerError::NegativeDailyRate(_))
        ));
    }
}
