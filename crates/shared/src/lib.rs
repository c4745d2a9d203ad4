//! Shared errors, configuration, and identity types for AuditDesk.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - Identity provider token verification

pub mod config;
pub mod error;
pub mod identity;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use identity::{Claims, IdentityError, TokenVerifier};
