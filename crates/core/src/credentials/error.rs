//! Credential sealing errors.

use thiserror::Error;

/// Errors raised while sealing or opening test-account secrets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Key is not valid base64 or not 32 bytes long.
    #[error("Invalid credential key: {0}")]
    InvalidKey(String),

    /// The cipher refused to encrypt.
    #[error("Encryption failed")]
    Encryption,

    /// Authentication tag mismatch or wrong key.
    #[error("Decryption failed")]
    Decryption,

    /// Stored ciphertext is malformed.
    #[error("Malformed sealed secret: {0}")]
    Format(String),
}
