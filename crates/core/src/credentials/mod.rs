//! Test-account credentials sealed at rest.
//!
//! Audit requests carry accounts the auditors log in with. Their secrets are
//! stored only as AES-256-GCM ciphertext (`base64(nonce || ciphertext)`) and
//! opened at the read boundary.

pub mod cipher;
pub mod error;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use cipher::CredentialCipher;
pub use error::CredentialError;

/// An account supplied for testing the audited application.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAccount {
    /// Login name.
    pub identifier: String,
    /// Password or token in clear text.
    pub secret: String,
}

impl fmt::Debug for TestAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestAccount")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A test account as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedTestAccount {
    /// Login name, stored in clear.
    pub identifier: String,
    /// `base64(nonce || ciphertext)` of the secret.
    pub sealed_secret: String,
}
