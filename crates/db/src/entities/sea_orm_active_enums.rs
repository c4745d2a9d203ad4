//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use auditdesk_core::lifecycle;

/// `audit_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "audit_status")]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl From<AuditStatus> for lifecycle::AuditStatus {
    fn from(status: AuditStatus) -> Self {
        match status {
            AuditStatus::Pending => Self::Pending,
            AuditStatus::InProgress => Self::InProgress,
            AuditStatus::Suspended => Self::Suspended,
            AuditStatus::Completed => Self::Completed,
        }
    }
}

impl From<lifecycle::AuditStatus> for AuditStatus {
    fn from(status: lifecycle::AuditStatus) -> Self {
        match status {
            lifecycle::AuditStatus::Pending => Self::Pending,
            lifecycle::AuditStatus::InProgress => Self::InProgress,
            lifecycle::AuditStatus::Suspended => Self::Suspended,
            lifecycle::AuditStatus::Completed => Self::Completed,
        }
    }
}

/// `assignment_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "assignment_status")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "started")]
    Started,
}

impl From<AssignmentStatus> for lifecycle::AssignmentStatus {
    fn from(status: AssignmentStatus) -> Self {
        match status {
            AssignmentStatus::Pending => Self::Pending,
            AssignmentStatus::Started => Self::Started,
        }
    }
}

impl From<lifecycle::AssignmentStatus> for AssignmentStatus {
    fn from(status: lifecycle::AssignmentStatus) -> Self {
        match status {
            lifecycle::AssignmentStatus::Pending => Self::Pending,
            lifecycle::AssignmentStatus::Started => Self::Started,
        }
    }
}

/// `request_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "request_status")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "validated")]
    Validated,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl RequestStatus {
    /// Parses a status token.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "validated" => Some(Self::Validated),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// `vulnerability_severity` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "vulnerability_severity")]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilitySeverity {
    #[sea_orm(string_value = "critical")]
    Critical,
    #[sea_orm(string_value = "major")]
    Major,
    #[sea_orm(string_value = "moderate")]
    Moderate,
    #[sea_orm(string_value = "minor")]
    Minor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_status_maps_both_ways() {
        for status in lifecycle::AuditStatus::ALL {
            let db: AuditStatus = status.into();
            assert_eq!(lifecycle::AuditStatus::from(db), status);
        }
    }

    #[test]
    fn test_request_status_parse() {
        assert_eq!(RequestStatus::parse("Rejected"), Some(RequestStatus::Rejected));
        assert_eq!(RequestStatus::parse("validée"), None);
    }
}
