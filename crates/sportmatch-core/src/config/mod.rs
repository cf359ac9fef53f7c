//! Environment-driven runtime configuration.
//!
//! Every backend is optional: without Turso the database is local-only,
//! without Supabase auth commands are unavailable, and without R2 media is
//! written to a local directory.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::auth::resolve_optional_supabase_config;
use crate::db::SyncConfig;
use crate::storage::{ConfiguredBlobStore, LocalBlobStore, R2Config, R2Storage};
use crate::util::normalize_text_option;

const ENV_DB_PATH: &str = "SPORTMATCH_DB_PATH";
const ENV_TURSO_URL: &str = "TURSO_DATABASE_URL";
const ENV_TURSO_TOKEN: &str = "TURSO_AUTH_TOKEN";
const ENV_SYNC_INTERVAL: &str = "SPORTMATCH_SYNC_INTERVAL_SECS";
const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_MEDIA_DIR: &str = "SPORTMATCH_MEDIA_DIR";
const ENV_MESSAGE_PAGE_SIZE: &str = "SPORTMATCH_MESSAGE_PAGE_SIZE";

/// Messages loaded per chat page when nothing else is configured.
pub const DEFAULT_MESSAGE_PAGE_SIZE: usize = 50;
const MAX_MESSAGE_PAGE_SIZE: usize = 500;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Supabase project endpoint and public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database file; `None` lets the front end pick its default location
    pub db_path: Option<PathBuf>,
    pub sync: Option<SyncConfig>,
    pub supabase: Option<SupabaseSettings>,
    pub r2: Option<R2Config>,
    pub media_dir: Option<PathBuf>,
    pub message_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            sync: None,
            supabase: None,
            r2: None,
            media_dir: None,
            message_page_size: DEFAULT_MESSAGE_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = optional_trimmed(&lookup, ENV_DB_PATH).map(PathBuf::from);
        let media_dir = optional_trimmed(&lookup, ENV_MEDIA_DIR).map(PathBuf::from);

        let sync = parse_sync_config(&lookup)?;

        let supabase = resolve_optional_supabase_config(
            lookup(ENV_SUPABASE_URL),
            lookup(ENV_SUPABASE_ANON_KEY),
        )
        .map_err(|_| {
            ConfigError::Invalid(format!(
                "{ENV_SUPABASE_URL} and {ENV_SUPABASE_ANON_KEY} must be set together"
            ))
        })?
        .map(|(url, anon_key)| SupabaseSettings { url, anon_key });

        let r2 = R2Config::from_lookup(&lookup)
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;

        let message_page_size = match optional_trimmed(&lookup, ENV_MESSAGE_PAGE_SIZE) {
            None => DEFAULT_MESSAGE_PAGE_SIZE,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|size| (1..=MAX_MESSAGE_PAGE_SIZE).contains(size))
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "{ENV_MESSAGE_PAGE_SIZE} must be an integer in [1, {MAX_MESSAGE_PAGE_SIZE}]"
                    ))
                })?,
        };

        Ok(Self {
            db_path,
            sync,
            supabase,
            r2,
            media_dir,
            message_page_size,
        })
    }

    /// Database path, falling back to `default` when none is configured.
    #[must_use]
    pub fn db_path_or(&self, default: &Path) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| default.to_path_buf())
    }

    /// The blob store media should go to: R2 when configured, otherwise the
    /// media directory (or `default_media_dir`).
    #[must_use]
    pub fn blob_store(&self, default_media_dir: &Path) -> ConfiguredBlobStore {
        if let Some(r2) = &self.r2 {
            return ConfiguredBlobStore::R2(R2Storage::new(r2.clone()));
        }
        let dir = self
            .media_dir
            .clone()
            .unwrap_or_else(|| default_media_dir.to_path_buf());
        ConfiguredBlobStore::Local(LocalBlobStore::new(dir))
    }
}

fn parse_sync_config(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<SyncConfig>, ConfigError> {
    let url = optional_trimmed(lookup, ENV_TURSO_URL);
    let token = optional_trimmed(lookup, ENV_TURSO_TOKEN);

    let (url, token) = match (url, token) {
        (None, None) => return Ok(None),
        (Some(url), Some(token)) => (url, token),
        (Some(_), None) => return Err(ConfigError::MissingVar(ENV_TURSO_TOKEN)),
        (None, Some(_)) => return Err(ConfigError::MissingVar(ENV_TURSO_URL)),
    };

    if !(url.starts_with("libsql://") || crate::util::is_http_url(&url)) {
        return Err(ConfigError::Invalid(format!(
            "{ENV_TURSO_URL} must start with libsql://, http:// or https://"
        )));
    }

    let interval_secs = match optional_trimmed(lookup, ENV_SYNC_INTERVAL) {
        None => DEFAULT_SYNC_INTERVAL_SECS,
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!("{ENV_SYNC_INTERVAL} must be a whole number of seconds"))
        })?,
    };

    let config = SyncConfig::new(url, token);
    Ok(Some(if interval_secs == 0 {
        config.without_auto_sync()
    } else {
        config.with_sync_interval(Duration::from_secs(interval_secs))
    }))
}

fn optional_trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_is_local_only() {
        let config = config_from(&[]).unwrap();
        assert!(config.db_path.is_none());
        assert!(config.sync.is_none());
        assert!(config.supabase.is_none());
        assert!(config.r2.is_none());
        assert_eq!(config.message_page_size, DEFAULT_MESSAGE_PAGE_SIZE);
    }

    #[test]
    fn turso_pair_builds_sync_config() {
        let config = config_from(&[
            (ENV_TURSO_URL, "libsql://sportmatch.turso.io"),
            (ENV_TURSO_TOKEN, "token"),
            (ENV_SYNC_INTERVAL, "0"),
        ])
        .unwrap();
        let sync = config.sync.unwrap();
        assert!(sync.is_configured());
        assert_eq!(sync.sync_interval, None);
    }

    #[test]
    fn half_configured_pairs_are_rejected() {
        assert!(matches!(
            config_from(&[(ENV_TURSO_URL, "libsql://sportmatch.turso.io")]),
            Err(ConfigError::MissingVar(ENV_TURSO_TOKEN))
        ));
        assert!(matches!(
            config_from(&[(ENV_SUPABASE_URL, "https://demo.supabase.co")]),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            config_from(&[("R2_BUCKET", "media")]),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn message_page_size_is_bounded() {
        let config = config_from(&[(ENV_MESSAGE_PAGE_SIZE, "20")]).unwrap();
        assert_eq!(config.message_page_size, 20);
        assert!(config_from(&[(ENV_MESSAGE_PAGE_SIZE, "0")]).is_err());
        assert!(config_from(&[(ENV_MESSAGE_PAGE_SIZE, "many")]).is_err());
    }

    #[test]
    fn blob_store_prefers_r2_then_media_dir() {
        let local = config_from(&[(ENV_MEDIA_DIR, "/srv/media")]).unwrap();
        match local.blob_store(Path::new("/default")) {
            ConfiguredBlobStore::Local(store) => assert_eq!(store.root(), Path::new("/srv/media")),
            ConfiguredBlobStore::R2(_) => panic!("expected local store"),
        }

        let remote = config_from(&[
            ("R2_ACCOUNT_ID", "acct"),
            ("R2_BUCKET", "media"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
        ])
        .unwrap();
        assert!(matches!(
            remote.blob_store(Path::new("/default")),
            ConfiguredBlobStore::R2(_)
        ));
    }

    #[test]
    fn db_path_falls_back_to_default() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.db_path_or(Path::new("/data/sportmatch.db")),
            PathBuf::from("/data/sportmatch.db")
        );
    }
}
