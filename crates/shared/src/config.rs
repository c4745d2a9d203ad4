//! Application configuration management.
//!
//! Sources, later ones overriding earlier ones:
//! `config/default`, `config/{RUN_MODE}`, then `AUDITDESK__*` environment
//! variables (`AUDITDESK__DATABASE__URL`, `AUDITDESK__IDENTITY__AUDIENCE`, ...).

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AUDITDESK";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity provider configuration.
    pub identity: IdentityConfig,
    /// Test-account sealing configuration.
    pub credentials: CredentialsConfig,
    /// Business calendar configuration.
    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Identity provider (OpenID Connect) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Expected `iss` claim, e.g. `https://sso.example.com/realms/audit`.
    pub issuer: String,
    /// JWKS endpoint. Defaults to the issuer's standard certs endpoint.
    #[serde(default)]
    pub jwks_url: Option<String>,
    /// Expected `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,
    /// How long fetched signing keys are trusted, in seconds.
    #[serde(default = "default_jwks_ttl")]
    pub jwks_ttl_secs: u64,
    /// Clock skew tolerated on `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl IdentityConfig {
    /// The JWKS endpoint to fetch keys from.
    #[must_use]
    pub fn jwks_endpoint(&self) -> String {
        self.jwks_url.clone().unwrap_or_else(|| {
            format!(
                "{}/protocol/openid-connect/certs",
                self.issuer.trim_end_matches('/')
            )
        })
    }
}

fn default_audience() -> String {
    "account".to_string()
}

fn default_jwks_ttl() -> u64 {
    3600
}

fn default_leeway() -> u64 {
    30
}

/// Test-account sealing configuration.
#[derive(Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Base64-encoded 32-byte AES key.
    pub key: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("key", &"[hidden]")
            .finish()
    }
}

/// Business calendar cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// Number of memoized years.
    #[serde(default = "default_calendar_capacity")]
    pub cache_capacity: u64,
    /// Lifetime of a memoized year, in seconds.
    #[serde(default = "default_calendar_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_calendar_capacity(),
            cache_ttl_secs: default_calendar_ttl(),
        }
    }
}

fn default_calendar_capacity() -> u64 {
    64
}

fn default_calendar_ttl() -> u64 {
    86_400
}

fn build_sources() -> Result<config::Config, config::ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
}

impl AppConfig {
    /// Loads configuration from config files and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        build_sources()?.try_deserialize()
    }

    /// Loads one optional top-level section into a caller-defined type.
    ///
    /// Returns `Ok(None)` when the section is absent.
    pub fn load_section<T: DeserializeOwned>(key: &str) -> Result<Option<T>, config::ConfigError> {
        match build_sources()?.get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
