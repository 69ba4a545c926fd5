use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use thiserror::Error;

use crate::identity::TokenPolicy;

/// Environment prefix for every registry server setting.
pub const ENV_PREFIX: &str = "CHARM_REGISTRY_";

/// Which store backs the registry.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Supabase PostgREST over HTTPS.
    #[default]
    Supabase,
    /// Process-local tables, lost on restart. Local development only.
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Supabase => f.write_str("supabase"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Registry server configuration, read from `CHARM_REGISTRY_*` variables.
#[derive(Clone, Deserialize)]
pub struct RegistryServerConfig {
    /// Listen address (default: 0.0.0.0:8000)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    #[serde(default)]
    pub store: StoreBackend,

    /// Supabase project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Privileged service-role key. Never logged.
    #[serde(default)]
    pub supabase_service_key: Option<String>,

    /// Host used when building public agent URLs.
    #[serde(default = "default_public_host")]
    pub public_host: String,

    /// Name reported by the health endpoint.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default)]
    pub token_policy: TokenPolicy,

    /// Per-call timeout for store requests, in seconds.
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CHARM_REGISTRY_SUPABASE_URL is required when the store is supabase")]
    MissingSupabaseUrl,

    #[error("CHARM_REGISTRY_SUPABASE_SERVICE_KEY is required when the store is supabase")]
    MissingServiceKey,

    #[error("invalid Supabase URL '{0}': must start with http:// or https://")]
    InvalidSupabaseUrl(String),

    #[error("CHARM_REGISTRY_STORE_TIMEOUT_SECS must be greater than zero")]
    ZeroTimeout,
}

/// Supabase endpoint and credential after validation.
#[derive(Clone)]
pub struct SupabaseCredentials {
    pub url: String,
    pub service_key: String,
}

impl std::fmt::Debug for SupabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseCredentials")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .finish()
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000))
}

fn default_public_host() -> String {
    "charm.ai".to_string()
}

fn default_service_name() -> String {
    "Charm Registry".to_string()
}

fn default_store_timeout_secs() -> u64 {
    10
}

impl RegistryServerConfig {
    /// Check cross-field requirements that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.store == StoreBackend::Supabase {
            self.supabase_credentials()?;
        }
        Ok(())
    }

    /// Supabase URL and key, or the error naming what is missing.
    pub fn supabase_credentials(&self) -> Result<SupabaseCredentials, ConfigError> {
        let url = self
            .supabase_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSupabaseUrl)?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidSupabaseUrl(url.to_string()));
        }
        let service_key = self
            .supabase_service_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingServiceKey)?;
        Ok(SupabaseCredentials {
            url: url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }
}

impl Default for RegistryServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            store: StoreBackend::default(),
            supabase_url: None,
            supabase_service_key: None,
            public_host: default_public_host(),
            service_name: default_service_name(),
            token_policy: TokenPolicy::default(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for RegistryServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryServerConfig")
            .field("listen_addr", &self.listen_addr)
            .field("store", &self.store)
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_service_key",
                &self.supabase_service_key.as_ref().map(|_| "<redacted>"),
            )
            .field("public_host", &self.public_host)
            .field("service_name", &self.service_name)
            .field("token_policy", &self.token_policy)
            .field("store_timeout_secs", &self.store_timeout_secs)
            .finish()
    }
}
