//! Identity provider signing keys.
//!
//! The key set is fetched once and reused until its time-to-live expires or
//! it is invalidated. A token signed with a key the cached set does not know
//! forces a refresh, which picks up rotated keys. Forced refreshes are spaced
//! at least [`MIN_FORCED_REFRESH`] apart.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use moka::future::Cache;

use auditdesk_shared::config::IdentityConfig;
use auditdesk_shared::{Claims, IdentityError, TokenVerifier};

enum KeySource {
    Remote { http: reqwest::Client, url: String },
    Fixed(Arc<JwkSet>),
}

/// Shortest time between two refreshes forced by unknown key ids.
pub const MIN_FORCED_REFRESH: Duration = Duration::from_secs(30);

/// Process-wide cache of the identity provider's key set.
pub struct KeyCache {
    source: KeySource,
    cache: Cache<(), Arc<JwkSet>>,
    min_forced_refresh: Duration,
    last_forced_refresh: Mutex<Option<Instant>>,
    fetches: AtomicUsize,
}

impl KeyCache {
    /// Creates a cache that fetches keys from the configured endpoint.
    ///
    /// # Errors
    ///
    /// `KeySet` if the HTTP client cannot be built.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::KeySet(format!("HTTP client: {e}")))?;
        Ok(Self::with_source(
            KeySource::Remote {
                http,
                url: config.jwks_endpoint(),
            },
            config.jwks_ttl_secs,
        ))
    }

    /// Creates a cache over a fixed key set.
    #[must_use]
    pub fn fixed(keys: JwkSet) -> Self {
        Self::with_source(KeySource::Fixed(Arc::new(keys)), u64::from(u32::MAX))
    }

    fn with_source(source: KeySource, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self {
            source,
            cache,
            min_forced_refresh: MIN_FORCED_REFRESH,
            last_forced_refresh: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of times the key set has been loaded from its source.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Returns the cached key set, fetching it if absent or expired.
    pub async fn keys(&self) -> Result<Arc<JwkSet>, IdentityError> {
        self.cache
            .try_get_with((), self.fetch())
            .await
            .map_err(|e| (*e).clone())
    }

    /// Drops the cached key set.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }

    /// Verifies a token, refreshing the key set on an unknown key id unless
    /// another forced refresh happened recently.
    pub async fn verify(
        &self,
        token: &str,
        verifier: &TokenVerifier,
    ) -> Result<Claims, IdentityError> {
        let keys = self.keys().await?;
        match verifier.verify(token, &keys) {
            Err(e) if e.is_unknown_key() => {
                if !self.claim_forced_refresh() {
                    tracing::debug!(error = %e, "Unknown signing key; refresh throttled");
                    return Err(e);
                }
                tracing::info!(error = %e, "Unknown signing key; refreshing key set");
                self.invalidate().await;
                let keys = self.keys().await?;
                verifier.verify(token, &keys)
            }
            result => result,
        }
    }

    /// Takes the forced-refresh slot if the last one is old enough.
    fn claim_forced_refresh(&self) -> bool {
        let mut last = self
            .last_forced_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        if last.is_some_and(|at| now.duration_since(at) < self.min_forced_refresh) {
            return false;
        }
        *last = Some(now);
        true
    }

    async fn fetch(&self) -> Result<Arc<JwkSet>, IdentityError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        match &self.source {
            KeySource::Fixed(keys) => Ok(Arc::clone(keys)),
            KeySource::Remote { http, url } => {
                let keys = http
                    .get(url)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| IdentityError::KeySet(e.to_string()))?
                    .json::<JwkSet>()
                    .await
                    .map_err(|e| IdentityError::KeySet(e.to_string()))?;
                tracing::debug!(url = %url, keys = keys.keys.len(), "Fetched signing keys");
                Ok(Arc::new(keys))
            }
        }
    }
}
