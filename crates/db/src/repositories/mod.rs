//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod assignment;
pub mod audit;
pub mod audit_request;
pub mod auditor;
pub mod dashboard;
pub mod provider;
pub mod remediation_plan;

pub use assignment::{
    AssignmentError, AssignmentRepository, AssignmentWithAuditors, CreateAssignmentInput,
};
pub use audit::{
    AuditDetails, AuditError, AuditRepository, AuditSummary, CreateAuditInput, NewAttachment,
};
pub use audit_request::{
    AuditRequestError, AuditRequestRepository, CreateAuditRequestInput, OpenedAuditRequest,
};
pub use auditor::{AuditorError, AuditorInput, AuditorRepository};
pub use dashboard::{DashboardError, DashboardKpis, DashboardRepository};
pub use provider::{CreateProviderInput, ProviderError, ProviderRepository, UpdateProviderInput};
pub use remediation_plan::{
    CreatePlanInput, Period, PlanDetails, PlanError, PlanFilter, RemediationPlanRepository,
    UpdatePlanInput, VulnerabilityInput,
};
