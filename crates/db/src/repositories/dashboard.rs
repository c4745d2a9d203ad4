//! Dashboard repository for workload and budget KPIs.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    assignment_auditors, assignments, audits, auditors, providers,
    sea_orm_active_enums::AuditStatus,
};

/// Error types for dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Audit counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditCounts {
    /// All audits.
    pub total: u64,
    /// Not started.
    pub pending: u64,
    /// Running.
    pub in_progress: u64,
    /// Paused.
    pub suspended: u64,
    /// Finished.
    pub completed: u64,
}

/// A named count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    /// Provider name or audit type.
    pub name: String,
    /// Count.
    pub count: u64,
}

/// Budget figures of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderBudgetKpi {
    /// Provider name.
    pub name: String,
    /// Allocated budget, zero when unset.
    pub budget_total: Decimal,
    /// Consumed so far.
    pub realisation: Decimal,
    /// Remaining balance, zero when unset.
    pub solde: Decimal,
    /// Consumption over allocation, percent, 2 dp.
    pub consumption_rate: Decimal,
}

/// Completed audits in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Audits completed in the month.
    pub count: u64,
}

/// Dashboard KPIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardKpis {
    /// Number of auditors.
    pub auditors_total: u64,
    /// Number of providers.
    pub providers_total: u64,
    /// Share of auditors with at least one assignment, percent, 2 dp.
    pub auditor_occupancy_rate: Decimal,
    /// Audits per status.
    pub audits: AuditCounts,
    /// Number of assignments.
    pub assignments_total: u64,
    /// Sum of provider budgets.
    pub budget_total_allocated: Decimal,
    /// Sum of provider consumption.
    pub realisation_total: Decimal,
    /// Sum of provider balances.
    pub solde_total: Decimal,
    /// Consumption over allocation, percent, 2 dp.
    pub budget_consumption_rate: Decimal,
    /// Providers that have consumed nothing.
    pub inactive_providers: u64,
    /// Five providers with the most assignments.
    pub top_providers: Vec<NamedCount>,
    /// Audits per audit type.
    pub audit_types: Vec<NamedCount>,
    /// Audits per provider.
    pub audits_per_provider: Vec<NamedCount>,
    /// Budget figures per provider, by name.
    pub provider_budgets: Vec<ProviderBudgetKpi>,
    /// Completed audits per month, oldest first.
    pub completed_per_month: Vec<MonthCount>,
}

/// Assignment fields the KPIs need.
#[derive(Debug, Clone)]
pub struct AssignmentFacts {
    /// Assignment ID.
    pub id: Uuid,
    /// Provider, if any.
    pub provider_id: Option<Uuid>,
    /// Audit type.
    pub audit_type: String,
}

/// Raw figures the KPIs are computed from.
#[derive(Debug, Clone, Default)]
pub struct DashboardFacts {
    /// Number of auditors.
    pub auditors_total: u64,
    /// Auditors with at least one assignment.
    pub busy_auditors: u64,
    /// Provider rows.
    pub providers: Vec<providers::Model>,
    /// Assignments.
    pub assignments: Vec<AssignmentFacts>,
    /// `(assignment_id, status)` of every audit.
    pub audits: Vec<(Uuid, AuditStatus)>,
    /// When each completed audit was completed.
    pub completions: Vec<DateTime<Utc>>,
}

const TOP_PROVIDERS: usize = 5;

fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole > Decimal::ZERO {
        (part / whole * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    } else {
        Decimal::ZERO
    }
}

fn ranked(counts: HashMap<String, u64>) -> Vec<NamedCount> {
    let mut ranked: Vec<_> = counts
        .into_iter()
        .map(|(name, count)| NamedCount { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked
}

fn provider_budgets(providers: &[providers::Model]) -> Vec<ProviderBudgetKpi> {
    let mut budgets: Vec<_> = providers
        .iter()
        .map(|p| {
            let budget_total = p.budget_total.unwrap_or_default();
            ProviderBudgetKpi {
                name: p.name.clone(),
                budget_total,
                realisation: p.realisation,
                solde: p.solde.unwrap_or_default(),
                consumption_rate: percent(p.realisation, budget_total),
            }
        })
        .collect();
    budgets.sort_by(|a, b| a.name.cmp(&b.name));
    budgets
}

fn completed_per_month(completions: &[DateTime<Utc>]) -> Vec<MonthCount> {
    let mut months: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for at in completions {
        *months.entry((at.year(), at.month())).or_default() += 1;
    }
    months
        .into_iter()
        .map(|((year, month), count)| MonthCount { year, month, count })
        .collect()
}

/// Computes the KPIs from raw figures.
#[must_use]
pub fn compute_kpis(facts: &DashboardFacts) -> DashboardKpis {
    let names: HashMap<Uuid, &str> = facts
        .providers
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect();
    let provider_name =
        |id: Option<Uuid>| id.and_then(|id| names.get(&id)).map(|n| (*n).to_string());

    let mut audits = AuditCounts::default();
    for (_, status) in &facts.audits {
        audits.total += 1;
        match status {
            AuditStatus::Pending => audits.pending += 1,
            AuditStatus::InProgress => audits.in_progress += 1,
            AuditStatus::Suspended => audits.suspended += 1,
            AuditStatus::Completed => audits.completed += 1,
        }
    }

    let budget_total_allocated: Decimal =
        facts.providers.iter().filter_map(|p| p.budget_total).sum();
    let realisation_total: Decimal = facts.providers.iter().map(|p| p.realisation).sum();
    let solde_total: Decimal = facts.providers.iter().filter_map(|p| p.solde).sum();

    let mut assignments_by_provider: HashMap<String, u64> = HashMap::new();
    for a in &facts.assignments {
        if let Some(name) = provider_name(a.provider_id) {
            *assignments_by_provider.entry(name).or_default() += 1;
        }
    }
    let mut top_providers = ranked(assignments_by_provider);
    top_providers.truncate(TOP_PROVIDERS);

    let by_id: HashMap<Uuid, &AssignmentFacts> =
        facts.assignments.iter().map(|a| (a.id, a)).collect();
    let mut audit_types: HashMap<String, u64> = HashMap::new();
    let mut audits_per_provider: HashMap<String, u64> = HashMap::new();
    for (assignment_id, _) in &facts.audits {
        if let Some(a) = by_id.get(assignment_id) {
            *audit_types.entry(a.audit_type.clone()).or_default() += 1;
            if let Some(name) = provider_name(a.provider_id) {
                *audits_per_provider.entry(name).or_default() += 1;
            }
        }
    }

    DashboardKpis {
        auditors_total: facts.auditors_total,
        providers_total: facts.providers.len() as u64,
        auditor_occupancy_rate: percent(
            Decimal::from(facts.busy_auditors),
            Decimal::from(facts.auditors_total),
        ),
        audits,
        assignments_total: facts.assignments.len() as u64,
        budget_total_allocated,
        realisation_total,
        solde_total,
        budget_consumption_rate: percent(realisation_total, budget_total_allocated),
        inactive_providers: facts
            .providers
            .iter()
            .filter(|p| p.realisation.is_zero())
            .count() as u64,
        top_providers,
        audit_types: ranked(audit_types),
        audits_per_provider: ranked(audits_per_provider),
        provider_budgets: provider_budgets(&facts.providers),
        completed_per_month: completed_per_month(&facts.completions),
    }
}

/// Dashboard repository.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Gathers the raw figures and computes the KPIs.
    pub async fn kpis(&self) -> Result<DashboardKpis, DashboardError> {
        let auditors_total = auditors::Entity::find().count(&self.db).await?;

        let busy: HashSet<Uuid> = assignment_auditors::Entity::find()
            .select_only()
            .column(assignment_auditors::Column::AuditorId)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let providers = providers::Entity::find().all(&self.db).await?;

        let assignments = assignments::Entity::find()
            .select_only()
            .columns([
                assignments::Column::Id,
                assignments::Column::ProviderId,
                assignments::Column::AuditType,
            ])
            .into_tuple::<(Uuid, Option<Uuid>, String)>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(id, provider_id, audit_type)| AssignmentFacts {
                id,
                provider_id,
                audit_type,
            })
            .collect();

        let audits = audits::Entity::find()
            .select_only()
            .columns([audits::Column::AssignmentId, audits::Column::Status])
            .into_tuple::<(Uuid, AuditStatus)>()
            .all(&self.db)
            .await?;

        // Completed is terminal, so the last update is the completion.
        let completions = audits::Entity::find()
            .filter(audits::Column::Status.eq(AuditStatus::Completed))
            .select_only()
            .column(audits::Column::UpdatedAt)
            .into_tuple::<DateTime<FixedOffset>>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|at| at.to_utc())
            .collect();

        let facts = DashboardFacts {
            auditors_total,
            busy_auditors: busy.len() as u64,
            providers,
            assignments,
            audits,
            completions,
        };
        let kpis = compute_kpis(&facts);
        tracing::debug!(
            audits = kpis.audits.total,
            providers = kpis.providers_total,
            "Computed dashboard KPIs"
        );
        Ok(kpis)
    }
}

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;
