//! Core business logic for AuditDesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `calendar` - Business calendar with fixed and lunar public holidays
//! - `duration` - Working-day accumulation between instants
//! - `lifecycle` - Audit state machine and time accounting
//! - `ledger` - Provider budget settlement and contract figures
//! - `credentials` - Test-account secrets sealed at rest
//! - `storage` - Attachment object storage
//! - `clock` - Injectable source of "now"

pub mod calendar;
pub mod clock;
pub mod credentials;
pub mod duration;
pub mod ledger;
pub mod lifecycle;
pub mod storage;
