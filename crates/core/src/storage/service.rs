//! Attachment storage on Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage key.
    pub storage_key: String,
    /// Size in bytes.
    pub size: u64,
}

/// Storage service for audit attachments.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Creates a storage service from configuration.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        tracing::info!(provider = config.provider.name(), "Attachment storage ready");
        Ok(Self { operator, config })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let configuration = |e: opendal::Error| StorageError::configuration(e.to_string());

        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Ok(Operator::new(builder).map_err(configuration)?.finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                Ok(Operator::new(builder).map_err(configuration)?.finish())
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                let builder = services::Fs::default().root(root);
                Ok(Operator::new(builder).map_err(configuration)?.finish())
            }
        }
    }

    /// Checks an upload against the size and MIME type limits.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }
        if size > self.config.max_file_size {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }
        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::InvalidMimeType {
                mime_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    /// Storage key for an attachment.
    ///
    /// Format: `audits/{audit_id}/{attachment_id}/{sanitized_filename}`
    #[must_use]
    pub fn storage_key(audit_id: Uuid, attachment_id: Uuid, filename: &str) -> String {
        format!(
            "audits/{audit_id}/{attachment_id}/{}",
            sanitize_filename(filename)
        )
    }

    /// Validates and writes an attachment.
    pub async fn upload(
        &self,
        audit_id: Uuid,
        attachment_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredObject, StorageError> {
        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
        self.validate_upload(content_type, size)?;

        let storage_key = Self::storage_key(audit_id, attachment_id, filename);
        self.operator.write(&storage_key, data).await?;

        tracing::debug!(%audit_id, %attachment_id, key = %storage_key, size, "Stored attachment");
        Ok(StoredObject { storage_key, size })
    }

    /// Reads an attachment's bytes.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self.operator.read(key).await?;
        Ok(buffer.to_vec())
    }

    /// Deletes an attachment. Deleting a missing key succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Returns true if the key exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage stat failed");
                false
            }
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Replaces anything but ASCII alphanumerics, dots, hyphens and underscores.
///
/// Leading dots are replaced too so a name can never climb out of its
/// directory.
fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let safe = c.is_ascii_alphanumeric() || c == '-' || c == '_' || (c == '.' && i > 0);
            if safe { c } else { '_' }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            Uuid::parse_str("6ba7b811-9dad-11d1-80b4-00c04fd430c8").unwrap(),
        )
    }

    fn temp_service() -> StorageService {
        let root = std::env::temp_dir().join(format!("auditdesk-storage-{}", Uuid::new_v4()));
        StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(root))).unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("pentest report (v2).pdf"), "pentest_report__v2_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "_._.._etc_passwd");
        assert_eq!(sanitize_filename(".env"), "_env");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_storage_key_format() {
        let (audit_id, att_id) = ids();
        assert_eq!(
            StorageService::storage_key(audit_id, att_id, "scan results.csv"),
            format!("audits/{audit_id}/{att_id}/scan_results.csv")
        );
    }

    #[test]
    fn test_validate_upload() {
        let service = temp_service();
        assert!(service.validate_upload("application/pdf", 512).is_ok());
        assert!(matches!(
            service.validate_upload("application/pdf", 0),
            Err(StorageError::EmptyFile)
        ));
        assert!(matches!(
            service.validate_upload("application/pdf", StorageConfig::DEFAULT_MAX_FILE_SIZE + 1),
            Err(StorageError::FileTooLarge { .. })
        ));
        assert!(matches!(
            service.validate_upload("application/x-msdownload", 10),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[tokio::test]
    async fn test_upload_read_delete() {
        let service = temp_service();
        let (audit_id, att_id) = ids();

        let stored = service
            .upload(audit_id, att_id, "notes.txt", "text/plain", b"finding #1".to_vec())
            .await
            .unwrap();
        assert_eq!(stored.size, 10);
        assert!(service.exists(&stored.storage_key).await);
        assert_eq!(service.read(&stored.storage_key).await.unwrap(), b"finding #1");

        service.delete(&stored.storage_key).await.unwrap();
        assert!(!service.exists(&stored.storage_key).await);
        assert!(matches!(
            service.read(&stored.storage_key).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let service = temp_service();
        let (audit_id, att_id) = ids();
        let err = service
            .upload(audit_id, att_id, "tool.exe", "application/x-msdownload", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidMimeType { .. }));
        let key = StorageService::storage_key(audit_id, att_id, "tool.exe");
        assert!(!service.exists(&key).await);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);
            prop_assert!(!sanitized.is_empty());
            prop_assert!(!sanitized.starts_with('.'));
            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }

        #[test]
        fn prop_file_size_validation(
            max_size in 1024u64..10_000_000,
            file_size in 1u64..20_000_000,
        ) {
            let config = StorageConfig::new(StorageProvider::local_fs("./test"))
                .with_max_file_size(max_size);
            let service = StorageService::from_config(config).unwrap();
            let result = service.validate_upload("application/pdf", file_size);
            if file_size <= max_size {
                prop_assert!(result.is_ok());
            } else {
                let too_large = matches!(result, Err(StorageError::FileTooLarge { .. }));
                prop_assert!(too_large);
            }
        }
    }
}
