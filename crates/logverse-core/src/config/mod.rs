//! Remote backend configuration.
//!
//! The remote path is enabled only when both a base URL and an anon key are
//! provided. Missing or placeholder values select local-only mode.

use std::env;

use thiserror::Error;

use crate::util::{is_http_url, normalize_config_value};

pub const ENV_SUPABASE_URL: &str = "LOGVERSE_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "LOGVERSE_SUPABASE_ANON_KEY";
const ENV_SUPABASE_URL_FALLBACK: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY_FALLBACK: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Remote configuration is incomplete: {0} is missing")]
    Incomplete(&'static str),
    #[error("Remote base URL must include http:// or https://")]
    InvalidUrl,
}

/// Public endpoint and anon key of the hosted backend.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    base_url: String,
    anon_key: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl RemoteConfig {
    /// Resolve from optional raw values.
    ///
    /// Returns `Ok(None)` when neither value is usable, and an error when only
    /// one of the pair is present.
    pub fn resolve(
        base_url: Option<String>,
        anon_key: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let base_url = normalize_config_value(base_url);
        let anon_key = normalize_config_value(anon_key);

        match (base_url, anon_key) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::Incomplete("anon key")),
            (None, Some(_)) => Err(ConfigError::Incomplete("base URL")),
            (Some(base_url), Some(anon_key)) => {
                if !is_http_url(&base_url) {
                    return Err(ConfigError::InvalidUrl);
                }
                Ok(Some(Self {
                    base_url: strip_service_suffix(&base_url),
                    anon_key,
                }))
            }
        }
    }

    /// Resolve from `LOGVERSE_SUPABASE_*`, falling back to `SUPABASE_*`.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::resolve(
            read_env(ENV_SUPABASE_URL, ENV_SUPABASE_URL_FALLBACK),
            read_env(ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_ANON_KEY_FALLBACK),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Auth service root, e.g. `https://x.supabase.co/auth/v1`.
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base_url)
    }

    /// Table API root, e.g. `https://x.supabase.co/rest/v1`.
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url)
    }
}

fn read_env(primary: &str, fallback: &str) -> Option<String> {
    normalize_config_value(env::var(primary).ok())
        .or_else(|| normalize_config_value(env::var(fallback).ok()))
}

fn strip_service_suffix(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    trimmed
        .strip_suffix("/auth/v1")
        .or_else(|| trimmed.strip_suffix("/rest/v1"))
        .unwrap_or(trimmed)
        .to_string()
}
