//! `SeaORM` entities.
//!
//! One module per table. Enum columns live in [`sea_orm_active_enums`].

pub mod prelude;

pub mod assignment_auditors;
pub mod assignments;
pub mod attachments;
pub mod audit_auditors;
pub mod audit_requests;
pub mod auditors;
pub mod audits;
pub mod comments;
pub mod providers;
pub mod remediation_plans;
pub mod sea_orm_active_enums;
pub mod vulnerabilities;
