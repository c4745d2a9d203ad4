//! Entity re-exports.

pub use super::assignment_auditors::Entity as AssignmentAuditors;
pub use super::assignments::Entity as Assignments;
pub use super::attachments::Entity as Attachments;
pub use super::audit_auditors::Entity as AuditAuditors;
pub use super::audit_requests::Entity as AuditRequests;
pub use super::auditors::Entity as Auditors;
pub use super::audits::Entity as Audits;
pub use super::comments::Entity as Comments;
pub use super::providers::Entity as Providers;
pub use super::remediation_plans::Entity as RemediationPlans;
pub use super::vulnerabilities::Entity as Vulnerabilities;
