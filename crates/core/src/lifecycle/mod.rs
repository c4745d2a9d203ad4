//! Audit lifecycle management.
//!
//! This module implements the audit state machine and the working-day time
//! accounting driven by its transitions.
//!
//! # Modules
//!
//! - `types` - Lifecycle domain types (AuditStatus, AuditState, TransitionOutcome)
//! - `error` - Lifecycle-specific error types
//! - `service` - Transition and duration logic

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LifecycleError;
pub use service::LifecycleEngine;
pub use types::{AssignmentStatus, AuditState, AuditStatus, TransitionOutcome};
