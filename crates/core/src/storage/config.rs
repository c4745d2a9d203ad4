//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage (AWS S3, MinIO, Cloudflare R2).
    S3 {
        /// Endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Azure Blob Storage.
    AzureBlob {
        /// Storage account name.
        account: String,
        /// Storage access key.
        access_key: String,
        /// Container name.
        container: String,
    },
    /// Local directory.
    LocalFs {
        /// Root directory.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Local directory backend.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Short backend name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Attachment storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend.
    pub provider: StorageProvider,
    /// Maximum upload size in bytes.
    #[serde(default = "StorageConfig::default_max_file_size")]
    pub max_file_size: u64,
    /// Accepted MIME types.
    #[serde(default = "StorageConfig::default_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max file size: 20MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

    /// Creates a config with default limits.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    fn default_max_file_size() -> u64 {
        Self::DEFAULT_MAX_FILE_SIZE
    }

    /// Audit evidence formats accepted by default.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        [
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/zip",
            "text/plain",
            "text/csv",
            "image/png",
            "image/jpeg",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    /// Check if a MIME type is allowed. Parameters such as `; charset=` are ignored.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::new(StorageProvider::local_fs("./storage"));
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.provider.name(), "local");
    }

    #[test]
    fn test_mime_type_validation() {
        let config = StorageConfig::new(StorageProvider::local_fs("./storage"));
        assert!(config.is_mime_type_allowed("application/pdf"));
        assert!(config.is_mime_type_allowed("text/plain; charset=utf-8"));
        assert!(config.is_mime_type_allowed("IMAGE/PNG"));
        assert!(!config.is_mime_type_allowed("application/x-executable"));
        assert!(!config.is_mime_type_allowed("text/html"));
    }

    #[test]
    fn test_deserialize_tagged_provider() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"provider":{"type":"local_fs","root":"/tmp/a"}}"#).unwrap();
        assert!(matches!(config.provider, StorageProvider::LocalFs { .. }));
        assert!(!config.allowed_mime_types.is_empty());
    }
}
