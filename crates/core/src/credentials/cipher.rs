//! AES-256-GCM sealing of test-account secrets.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;

use super::error::CredentialError;
use super::{SealedTestAccount, TestAccount};

/// Key length for AES-256.
pub const KEY_LEN: usize = 32;

/// GCM nonce length.
const NONCE_LEN: usize = 12;

/// GCM authentication tag length.
const TAG_LEN: usize = 16;

/// Seals and opens test-account secrets.
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Arc<Aes256Gcm>,
}

impl CredentialCipher {
    /// Creates a cipher from a raw 32-byte key.
    #[must_use]
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Arc::new(Aes256Gcm::new(&(*key).into())),
        }
    }

    /// Creates a cipher from a base64-encoded 32-byte key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CredentialError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CredentialError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", b.len()))
        })?;
        Ok(Self::new(&key))
    }

    /// Encrypts a secret under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CredentialError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CredentialError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Decrypts a secret produced by [`Self::encrypt`].
    pub fn decrypt(&self, sealed: &str) -> Result<String, CredentialError> {
        let bytes = STANDARD
            .decode(sealed)
            .map_err(|e| CredentialError::Format(e.to_string()))?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CredentialError::Format(format!(
                "sealed secret too short ({} bytes)",
                bytes.len()
            )));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialError::Decryption)?;

        String::from_utf8(plaintext).map_err(|e| CredentialError::Format(e.to_string()))
    }

    /// Seals one account.
    pub fn seal(&self, account: &TestAccount) -> Result<SealedTestAccount, CredentialError> {
        Ok(SealedTestAccount {
            identifier: account.identifier.clone(),
            sealed_secret: self.encrypt(&account.secret)?,
        })
    }

    /// Opens one account.
    pub fn open(&self, sealed: &SealedTestAccount) -> Result<TestAccount, CredentialError> {
        Ok(TestAccount {
            identifier: sealed.identifier.clone(),
            secret: self.decrypt(&sealed.sealed_secret)?,
        })
    }

    /// Seals every account, failing on the first error.
    pub fn seal_all(
        &self,
        accounts: &[TestAccount],
    ) -> Result<Vec<SealedTestAccount>, CredentialError> {
        accounts.iter().map(|a| self.seal(a)).collect()
    }

    /// Opens every account, failing on the first error.
    pub fn open_all(
        &self,
        sealed: &[SealedTestAccount],
    ) -> Result<Vec<TestAccount>, CredentialError> {
        sealed.iter().map(|s| self.open(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> CredentialCipher {
        CredentialCipher::new(&[7u8; KEY_LEN])
    }

    fn account() -> TestAccount {
        TestAccount {
            identifier: "qa.user".to_string(),
            secret: "S3cret!pass".to_string(),
        }
    }

    #[test]
    fn test_seal_then_open() {
        let c = cipher();
        let sealed = c.seal(&account()).unwrap();
        assert_eq!(sealed.identifier, "qa.user");
        assert!(!sealed.sealed_secret.contains("S3cret"));
        assert_eq!(c.open(&sealed).unwrap(), account());
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let c = cipher();
        let a = c.encrypt("same").unwrap();
        let b = c.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = cipher().seal(&account()).unwrap();
        let other = CredentialCipher::new(&[9u8; KEY_LEN]);
        assert_eq!(other.open(&sealed), Err(CredentialError::Decryption));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let c = cipher();
        let mut bytes = STANDARD.decode(c.encrypt("secret").unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert_eq!(
            c.decrypt(&STANDARD.encode(bytes)),
            Err(CredentialError::Decryption)
        );
    }

    #[test]
    fn test_malformed_input() {
        let c = cipher();
        assert!(matches!(c.decrypt("not base64!"), Err(CredentialError::Format(_))));
        assert!(matches!(
            c.decrypt(&STANDARD.encode([0u8; 8])),
            Err(CredentialError::Format(_))
        ));
    }

    #[test]
    fn test_key_from_base64() {
        let encoded = STANDARD.encode([1u8; KEY_LEN]);
        assert!(CredentialCipher::from_base64_key(&encoded).is_ok());

        let short = STANDARD.encode([1u8; 16]);
        assert!(matches!(
            CredentialCipher::from_base64_key(&short),
            Err(CredentialError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", account());
        assert!(rendered.contains("qa.user"));
        assert!(!rendered.contains("S3cret"));
    }

    #[test]
    fn test_seal_all_and_open_all() {
        let c = cipher();
        let accounts = vec![
            account(),
            TestAccount {
                identifier: "admin".to_string(),
                secret: String::new(),
            },
        ];
        let sealed = c.seal_all(&accounts).unwrap();
        assert_eq!(c.open_all(&sealed).unwrap(), accounts);
    }
}
