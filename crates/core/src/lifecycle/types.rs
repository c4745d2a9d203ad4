//! Audit lifecycle domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::Settlement;

/// Status of an audit.
///
/// The valid transitions are:
/// - Pending → InProgress (start)
/// - InProgress → Suspended (pause)
/// - Suspended → InProgress (resume)
/// - InProgress → Completed, Suspended → Completed (close)
/// - InProgress → InProgress, Suspended → Suspended (checkpoint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Created, work not started.
    Pending,
    /// Work running; elapsed working days are being accrued.
    InProgress,
    /// Work paused; no time accrues.
    Suspended,
    /// Work finished and settled (terminal).
    Completed,
}

impl AuditStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Suspended,
        Self::Completed,
    ];

    /// Returns the persisted token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Suspended => "suspended",
            Self::Completed => "completed",
        }
    }

    /// Parses a persisted token. Surrounding whitespace and case are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "suspended" => Some(Self::Suspended),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns true if no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of an assignment. Independent of [`AuditStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Assigned, no audit opened yet.
    Pending,
    /// An audit has been opened for the assignment.
    Started,
}

impl AssignmentStatus {
    /// Returns the persisted token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Started => "started",
        }
    }

    /// Parses a persisted token.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "started" => Some(Self::Started),
            _ => None,
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time-accounting state of one audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditState {
    /// Current status.
    pub status: AuditStatus,
    /// Working days accrued by closed intervals.
    pub accumulated_duration: Decimal,
    /// Start of the running interval. Set iff status is InProgress.
    pub active_interval_start: Option<DateTime<Utc>>,
    /// When the audit last left InProgress.
    pub last_pause_time: Option<DateTime<Utc>>,
}

impl AuditState {
    /// State of a freshly created audit.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: AuditStatus::Pending,
            accumulated_duration: Decimal::ZERO,
            active_interval_start: None,
            last_pause_time: None,
        }
    }

    /// Returns true if the interval invariant holds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.active_interval_start.is_some() == (self.status == AuditStatus::InProgress)
            && self.accumulated_duration >= Decimal::ZERO
    }
}

impl Default for AuditState {
    fn default() -> Self {
        Self::pending()
    }
}

/// Result of a transition: the updated audit plus the settlement it
/// triggered, if any. Both are persisted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome<A> {
    /// The audit after the transition.
    pub audit: A,
    /// Budget settlement, present only when the audit was completed
    /// against a provider with both a daily rate and a total budget.
    pub settlement: Option<Settlement>,
}

impl<A> TransitionOutcome<A> {
    /// Replaces the audit representation, keeping the settlement.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> TransitionOutcome<B> {
        TransitionOutcome {
            audit: f(self.audit),
            settlement: self.settlement,
        }
    }
}
