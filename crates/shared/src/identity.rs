//! Identity provider tokens.
//!
//! Access tokens are RS256 JWTs issued by an OpenID Connect provider. Roles
//! come from the `realm_access.roles` claim. Key retrieval is left to the
//! caller; this module only verifies a token against a key set.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::IdentityConfig;

/// Role granted full access.
pub const ROLE_ADMIN: &str = "admin";

/// Role of the audit team.
pub const ROLE_AUDIT_TEAM: &str = "audit_team";

/// Realm-level role assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmAccess {
    /// Role names.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims read from an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject.
    pub sub: String,
    /// Login name.
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Realm roles.
    #[serde(default)]
    pub realm_access: RealmAccess,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// Name to attribute actions to: the login name, else the subject.
    #[must_use]
    pub fn username(&self) -> &str {
        self.preferred_username.as_deref().unwrap_or(&self.sub)
    }

    /// Realm roles.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.realm_access.roles
    }

    /// Returns true if the user holds at least one of `required`.
    #[must_use]
    pub fn has_any_role(&self, required: &[&str]) -> bool {
        self.roles().iter().any(|r| required.contains(&r.as_str()))
    }
}

/// Errors raised while verifying a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Header carries no `kid`.
    #[error("token header has no key id")]
    MissingKeyId,

    /// No key in the set matches the token's `kid`.
    #[error("unknown signing key: {0}")]
    UnknownKey(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Signature, audience, issuer or format check failed.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Key set could not be fetched or parsed.
    #[error("signing keys unavailable: {0}")]
    KeySet(String),
}

impl IdentityError {
    /// Returns true when refreshing the key set may make the token valid.
    #[must_use]
    pub fn is_unknown_key(&self) -> bool {
        matches!(self, Self::UnknownKey(_))
    }
}

/// Verifies access tokens for one issuer and audience.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    validation: Validation,
}

impl TokenVerifier {
    /// Creates a verifier from configuration.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.leeway = config.leeway_secs;
        Self { validation }
    }

    /// Extracts the `kid` from a token header without verifying it.
    pub fn key_id(token: &str) -> Result<String, IdentityError> {
        let header = decode_header(token).map_err(|e| IdentityError::Invalid(e.to_string()))?;
        header.kid.ok_or(IdentityError::MissingKeyId)
    }

    /// Verifies `token` against `keys` and returns its claims.
    pub fn verify(&self, token: &str, keys: &JwkSet) -> Result<Claims, IdentityError> {
        let kid = Self::key_id(token)?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| IdentityError::UnknownKey(kid.clone()))?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| IdentityError::KeySet(e.to_string()))?;

        decode::<Claims>(token, &key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
