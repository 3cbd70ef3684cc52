//! Configuration loading for the activity feed.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `ACTIVITY_FEED_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::IpAddr, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const ENV_PREFIX: &str = "ACTIVITY_FEED_";

/// Upper bound on how many actions the feed may return per request.
pub const MAX_FEED_LIMIT: u64 = 500;

/// Application configuration derived from `ACTIVITY_FEED_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default = "default_feed_limit")]
    pub feed_limit: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            feed_limit: default_feed_limit(),
        }
    }
}

impl AppConfig {
    /// Returns the configured listen address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost {
                value: self.host.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Returns a JSON representation with database credentials masked.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        config.database_url = redact_url_credentials(&config.database_url);
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort { value: self.port });
        }

        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections {
                value: self.db_max_connections,
            });
        }

        if self.feed_limit == 0 || self.feed_limit > MAX_FEED_LIMIT {
            return Err(ConfigError::InvalidFeedLimit {
                value: self.feed_limit,
            });
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        Ok(())
    }
}

/// Mask the password of a URL-shaped connection string.
///
/// Strings `url` cannot rewrite, such as Postgres socket URLs with an empty
/// host, lose their whole userinfo instead.
fn redact_url_credentials(raw: &str) -> String {
    if let Ok(mut url) = Url::parse(raw) {
        if url.password().is_none() && !url.cannot_be_a_base() {
            return raw.to_string();
        }
        if url.set_password(Some("redacted")).is_ok() {
            return url.to_string();
        }
    }
    mask_userinfo(raw)
}

/// Replace everything between the scheme and the last `@` with `redacted`.
fn mask_userinfo(raw: &str) -> String {
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (format!("{scheme}://"), rest),
        None => (String::new(), raw),
    };

    match rest.rfind('@') {
        Some(at) => format!("{scheme}redacted@{}", &rest[at + 1..]),
        None => raw.to_string(),
    }
}

/// Parse an optional numeric setting, keeping the default when unset.
fn parse_setting<T: std::str::FromStr>(
    layered: &mut BTreeMap<String, String>,
    key: &'static str,
    default: fn() -> T,
) -> Result<T, ConfigError> {
    match layered.remove(key).filter(|v| !v.is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::UnparsableSetting { key, value }),
        None => Ok(default()),
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://activity_feed.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_feed_limit() -> u64 {
    crate::repositories::DEFAULT_RECENT_LIMIT
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid listen host '{value}': {source}")]
    InvalidHost {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid port '{value}'; set ACTIVITY_FEED_PORT or PORT to a number between 1 and 65535")]
    UnparsablePort { value: String },
    #[error("invalid value '{value}' for ACTIVITY_FEED_{key}; expected a non-negative integer")]
    UnparsableSetting { key: &'static str, value: String },
    #[error("port must be non-zero, got {value}")]
    InvalidPort { value: u16 },
    #[error("database URL is missing; set ACTIVITY_FEED_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("database pool size must be positive, got {value}")]
    InvalidMaxConnections { value: u32 },
    #[error("feed limit must be between 1 and 500, got {value}")]
    InvalidFeedLimit { value: u64 },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
}

/// Loads configuration using layered `.env` files and `ACTIVITY_FEED_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates configuration.
    ///
    /// Precedence, lowest first: `.env`, `.env.local`, `.env.<profile>`,
    /// `.env.<profile>.local`, unprefixed `PORT`/`DATABASE_URL` from the
    /// process environment, then prefixed process variables.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Hosting platforms commonly inject these without a prefix.
        for key in ["PORT", "DATABASE_URL"] {
            if let Ok(value) = env::var(key) {
                layered.insert(key.to_string(), value);
            }
        }

        // Overlay prefixed process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let host = layered
            .remove("HOST")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_host);
        let port = match layered.remove("PORT").filter(|v| !v.is_empty()) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::UnparsablePort { value })?,
            None => default_port(),
        };
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections =
            parse_setting(&mut layered, "DB_MAX_CONNECTIONS", default_db_max_connections)?;
        let db_acquire_timeout_ms = parse_setting(
            &mut layered,
            "DB_ACQUIRE_TIMEOUT_MS",
            default_db_acquire_timeout_ms,
        )?;
        let feed_limit = parse_setting(&mut layered, "FEED_LIMIT", default_feed_limit)?;

        let config = AppConfig {
            profile,
            host,
            port,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            feed_limit,
        };
        config.validate()?;

        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
