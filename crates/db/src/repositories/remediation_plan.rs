//! Remediation plan repository.
//!
//! A plan records the outcome of an audit on one application: when it was
//! carried out, closed and reported, how far remediation has progressed, and
//! the vulnerabilities found. Plans get a `PLAN-<year>-<seq>` reference from
//! the year they were carried out in.

use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    remediation_plans, sea_orm_active_enums::VulnerabilitySeverity, vulnerabilities,
};

const REFERENCE_PREFIX: &str = "PLAN";
const REFERENCE_ATTEMPTS: usize = 3;

/// Error types for remediation plan operations.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Plan not found.
    #[error("Remediation plan not found: {0}")]
    NotFound(Uuid),

    /// Input failed validation.
    #[error("Invalid remediation plan: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A vulnerability to record on a plan.
#[derive(Debug, Clone)]
pub struct VulnerabilityInput {
    /// Short title.
    pub title: String,
    /// Severity.
    pub severity: VulnerabilitySeverity,
    /// Free-form remediation status.
    pub remediation_status: Option<String>,
}

/// Input for creating a plan.
#[derive(Debug, Clone)]
pub struct CreatePlanInput {
    /// Audited application.
    pub application: String,
    /// Kind of application.
    pub application_type: Option<String>,
    /// Kind of audit.
    pub audit_type: String,
    /// Security level.
    pub security_level: Option<String>,
    /// When the audit was carried out.
    pub realised_on: NaiveDate,
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
    pub vulnerabilities: Vec<VulnerabilityInput>,
}

/// Input for updating a plan. `None` leaves a field unchanged; a present
/// vulnerability list replaces the stored one.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct UpdatePlanInput {
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
    pub vulnerabilities: Option<Vec<VulnerabilityInput>>,
}

/// Year and optional month a date column must fall in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    /// Year.
    pub year: Option<i32>,
    /// Month, 1 to 12. Only meaningful with a year.
    pub month: Option<u32>,
}

impl Period {
    /// Half-open date range `[from, to)` covered by this period.
    ///
    /// # Errors
    ///
    /// `Validation` for a month outside 1 to 12, a month without a year, or
    /// a year chrono cannot represent.
    pub fn range(self) -> Result<Option<(NaiveDate, NaiveDate)>, PlanError> {
        let invalid = || PlanError::Validation(format!("invalid period {self:?}"));
        match (self.year, self.month) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(PlanError::Validation(
                "a month filter needs a year".to_string(),
            )),
            (Some(year), None) => {
                let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
                let to = year
                    .checked_add(1)
                    .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
                    .ok_or_else(invalid)?;
                Ok(Some((from, to)))
            }
            (Some(year), Some(month)) => {
                let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                let to = from
                    .checked_add_months(Months::new(1))
                    .ok_or_else(invalid)?;
                Ok(Some((from, to)))
            }
        }
    }
}

/// Plan list filters. Every filter present must match.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Substring of the reference.
    pub reference: Option<String>,
    /// Substring of the application name.
    pub application: Option<String>,
    /// Exact audit type.
    pub audit_type: Option<String>,
    /// Exact security level.
    pub security_level: Option<String>,
    /// Exact date the audit was carried out.
    pub realised_on: Option<NaiveDate>,
    /// Exact closing date.
    pub closed_on: Option<NaiveDate>,
    /// Exact report date.
    pub reported_on: Option<NaiveDate>,
    /// Period the audit was carried out in.
    pub realised_in: Period,
    /// Period the plan was closed in.
    pub closed_in: Period,
    /// Period the report was delivered in.
    pub reported_in: Period,
}

impl PlanFilter {
    /// Query condition for this filter.
    ///
    /// # Errors
    ///
    /// `Validation` if a period is invalid.
    pub fn condition(&self) -> Result<Condition, PlanError> {
        use remediation_plans::Column;

        let mut cond = Condition::all();
        if let Some(r) = self.reference.as_deref().filter(|r| !r.is_empty()) {
            cond = cond.add(Column::Reference.contains(r));
        }
        if let Some(a) = self.application.as_deref().filter(|a| !a.is_empty()) {
            cond = cond.add(Column::Application.contains(a));
        }
        if let Some(t) = &self.audit_type {
            cond = cond.add(Column::AuditType.eq(t.as_str()));
        }
        if let Some(l) = &self.security_level {
            cond = cond.add(Column::SecurityLevel.eq(l.as_str()));
        }

        let dates = [
            (Column::RealisedOn, self.realised_on, self.realised_in),
            (Column::ClosedOn, self.closed_on, self.closed_in),
            (Column::ReportedOn, self.reported_on, self.reported_in),
        ];
        for (column, exact, period) in dates {
            if let Some(day) = exact {
                cond = cond.add(column.eq(day));
            }
            if let Some((from, to)) = period.range()? {
                cond = cond.add(column.gte(from)).add(column.lt(to));
            }
        }
        Ok(cond)
    }
}

/// Vulnerability counts per severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// All vulnerabilities.
    pub total: u64,
    /// Critical.
    pub critical: u64,
    /// Major.
    pub major: u64,
    /// Moderate.
    pub moderate: u64,
    /// Minor.
    pub minor: u64,
}

impl SeverityCounts {
    /// Counts `vulns` by severity.
    #[must_use]
    pub fn of(vulns: &[vulnerabilities::Model]) -> Self {
        let mut counts = Self::default();
        for v in vulns {
            counts.total += 1;
            match v.severity {
                VulnerabilitySeverity::Critical => counts.critical += 1,
                VulnerabilitySeverity::Major => counts.major += 1,
                VulnerabilitySeverity::Moderate => counts.moderate += 1,
                VulnerabilitySeverity::Minor => counts.minor += 1,
            }
        }
        counts
    }
}

/// A plan with its vulnerabilities.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDetails {
    /// The stored plan.
    #[serde(flatten)]
    pub plan: remediation_plans::Model,
    /// Vulnerabilities found.
    pub vulnerabilities: Vec<vulnerabilities::Model>,
    /// Counts per severity.
    pub severity_counts: SeverityCounts,
}

impl PlanDetails {
    fn new(plan: remediation_plans::Model, vulnerabilities: Vec<vulnerabilities::Model>) -> Self {
        let severity_counts = SeverityCounts::of(&vulnerabilities);
        Self {
            plan,
            vulnerabilities,
            severity_counts,
        }
    }
}

/// Next reference for `year` given the references already issued that year.
///
/// References that do not parse are ignored.
#[must_use]
pub fn next_reference<'a>(year: i32, existing: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = format!("{REFERENCE_PREFIX}-{year}-");
    let last = existing
        .into_iter()
        .filter_map(|r| r.strip_prefix(&prefix)?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{:03}", last + 1)
}

fn validate_rate(rate: Option<Decimal>) -> Result<(), PlanError> {
    match rate {
        Some(r) if r < Decimal::ZERO || r > Decimal::ONE_HUNDRED => Err(PlanError::Validation(
            format!("remediation rate {r} is outside 0 to 100"),
        )),
        _ => Ok(()),
    }
}

fn validate_required(field: &str, value: &str) -> Result<(), PlanError> {
    if value.trim().is_empty() {
        return Err(PlanError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_vulnerabilities(vulns: &[VulnerabilityInput]) -> Result<(), PlanError> {
    if vulns.iter().any(|v| v.title.trim().is_empty()) {
        return Err(PlanError::Validation(
            "vulnerability title is required".to_string(),
        ));
    }
    Ok(())
}

fn vulnerability_rows(
    plan_id: Uuid,
    vulns: Vec<VulnerabilityInput>,
) -> Vec<vulnerabilities::ActiveModel> {
    let now = Utc::now().into();
    vulns
        .into_iter()
        .map(|v| vulnerabilities::ActiveModel {
            id: Set(Uuid::new_v4()),
            plan_id: Set(plan_id),
            title: Set(v.title.trim().to_string()),
            severity: Set(v.severity),
            remediation_status: Set(v.remediation_status),
            created_at: Set(now),
        })
        .collect()
}

/// Remediation plan repository.
#[derive(Debug, Clone)]
pub struct RemediationPlanRepository {
    db: DatabaseConnection,
}

impl RemediationPlanRepository {
    /// Creates a new remediation plan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists plans matching `filter`, most recent first.
    pub async fn list(&self, filter: &PlanFilter) -> Result<Vec<PlanDetails>, PlanError> {
        let rows = remediation_plans::Entity::find()
            .filter(filter.condition()?)
            .find_with_related(vulnerabilities::Entity)
            .order_by_desc(remediation_plans::Column::RealisedOn)
            .order_by_desc(remediation_plans::Column::Reference)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(plan, vulns)| PlanDetails::new(plan, vulns))
            .collect())
    }

    /// Finds a plan with its vulnerabilities.
    pub async fn get(&self, id: Uuid) -> Result<PlanDetails, PlanError> {
        let plan = remediation_plans::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PlanError::NotFound(id))?;
        let vulns = plan
            .find_related(vulnerabilities::Entity)
            .order_by_asc(vulnerabilities::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(PlanDetails::new(plan, vulns))
    }

    /// Creates a plan and its vulnerabilities under a fresh reference.
    ///
    /// A reference taken concurrently by another plan is retried a few times.
    pub async fn create(&self, input: CreatePlanInput) -> Result<PlanDetails, PlanError> {
        validate_required("application", &input.application)?;
        validate_required("audit type", &input.audit_type)?;
        validate_rate(input.remediation_rate)?;
        validate_vulnerabilities(&input.vulnerabilities)?;

        let mut attempt = 1;
        loop {
            match self.insert(input.clone()).await {
                Err(PlanError::Database(e))
                    if attempt < REFERENCE_ATTEMPTS
                        && matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                {
                    tracing::debug!(attempt, "Plan reference taken, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn insert(&self, input: CreatePlanInput) -> Result<PlanDetails, PlanError> {
        let year = input.realised_on.year();
        let txn = self.db.begin().await?;

        let issued: Vec<String> = remediation_plans::Entity::find()
            .select_only()
            .column(remediation_plans::Column::Reference)
            .filter(
                remediation_plans::Column::Reference
                    .starts_with(format!("{REFERENCE_PREFIX}-{year}-")),
            )
            .into_tuple()
            .all(&txn)
            .await?;
        let reference = next_reference(year, issued.iter().map(String::as_str));

        let now = Utc::now().into();
        let plan = remediation_plans::ActiveModel {
            id: Set(Uuid::new_v4()),
            reference: Set(reference),
            application: Set(input.application.trim().to_string()),
            application_type: Set(input.application_type),
            audit_type: Set(input.audit_type.trim().to_string()),
            security_level: Set(input.security_level),
            realised_on: Set(input.realised_on),
            closed_on: Set(input.closed_on),
            reported_on: Set(input.reported_on),
            remediation_rate: Set(input.remediation_rate),
            security_comment: Set(input.security_comment),
            project_comment: Set(input.project_comment),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut vulns = Vec::with_capacity(input.vulnerabilities.len());
        for row in vulnerability_rows(plan.id, input.vulnerabilities) {
            vulns.push(row.insert(&txn).await?);
        }
        txn.commit().await?;

        tracing::info!(
            plan_id = %plan.id,
            reference = %plan.reference,
            vulnerabilities = vulns.len(),
            "Created remediation plan"
        );
        Ok(PlanDetails::new(plan, vulns))
    }

    /// Updates a plan. The reference never changes.
    pub async fn update(&self, id: Uuid, input: UpdatePlanInput) -> Result<PlanDetails, PlanError> {
        if let Some(a) = &input.application {
            validate_required("application", a)?;
        }
        if let Some(t) = &input.audit_type {
            validate_required("audit type", t)?;
        }
        validate_rate(input.remediation_rate)?;
        if let Some(v) = &input.vulnerabilities {
            validate_vulnerabilities(v)?;
        }

        let txn = self.db.begin().await?;
        let existing = remediation_plans::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PlanError::NotFound(id))?;

        let mut active: remediation_plans::ActiveModel = existing.into();
        if let Some(a) = input.application {
            active.application = Set(a.trim().to_string());
        }
        if let Some(t) = input.application_type {
            active.application_type = Set(Some(t));
        }
        if let Some(t) = input.audit_type {
            active.audit_type = Set(t.trim().to_string());
        }
        if let Some(l) = input.security_level {
            active.security_level = Set(Some(l));
        }
        if let Some(d) = input.realised_on {
            active.realised_on = Set(d);
        }
        if let Some(d) = input.closed_on {
            active.closed_on = Set(Some(d));
        }
        if let Some(d) = input.reported_on {
            active.reported_on = Set(Some(d));
        }
        if let Some(r) = input.remediation_rate {
            active.remediation_rate = Set(Some(r));
        }
        if let Some(c) = input.security_comment {
            active.security_comment = Set(Some(c));
        }
        if let Some(c) = input.project_comment {
            active.project_comment = Set(Some(c));
        }
        active.updated_at = Set(Utc::now().into());
        let plan = active.update(&txn).await?;

        let vulns = match input.vulnerabilities {
            Some(replacement) => {
                vulnerabilities::Entity::delete_many()
                    .filter(vulnerabilities::Column::PlanId.eq(id))
                    .exec(&txn)
                    .await?;
                let mut vulns = Vec::with_capacity(replacement.len());
                for row in vulnerability_rows(id, replacement) {
                    vulns.push(row.insert(&txn).await?);
                }
                vulns
            }
            None => {
                plan.find_related(vulnerabilities::Entity)
                    .order_by_asc(vulnerabilities::Column::CreatedAt)
                    .all(&txn)
                    .await?
            }
        };
        txn.commit().await?;

        tracing::info!(plan_id = %id, reference = %plan.reference, "Updated remediation plan");
        Ok(PlanDetails::new(plan, vulns))
    }

    /// Deletes a plan and its vulnerabilities.
    pub async fn delete(&self, id: Uuid) -> Result<(), PlanError> {
        let result = remediation_plans::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(PlanError::NotFound(id));
        }
        tracing::info!(plan_id = %id, "Deleted remediation plan");
        Ok(())
    }
}

#[cfg(test)]
#[path = "remediation_plan_tests.rs"]
mod tests;
