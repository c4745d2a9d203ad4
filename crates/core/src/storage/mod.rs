//! Attachment storage using Apache OpenDAL.
//!
//! Audit evidence files live in object storage under
//! `audits/{audit_id}/{attachment_id}/{filename}`. Supported backends:
//! - S3-compatible (AWS S3, MinIO, Cloudflare R2)
//! - Azure Blob Storage
//! - Local filesystem

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{StorageService, StoredObject};
