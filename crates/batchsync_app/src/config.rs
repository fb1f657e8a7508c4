use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use batchsync_core::PollPolicy;
use batchsync_engine::{AuthTokens, ClientSettings};
use log::LevelFilter;
use sync_logging::{sync_error, sync_info, sync_warn};
use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {0}")]
    Missing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub settings: ClientSettings,
    pub policy: PollPolicy,
    pub auth_bypass: bool,
    pub tokens: Option<AuthTokens>,
    pub history_dir: PathBuf,
    pub desktop_notifications: bool,
}

impl AppConfig {
    /// Level for the logger, read before the rest of the config so that
    /// config warnings are not lost.
    pub fn log_level_from_env() -> LevelFilter {
        env::var("BATCHSYNC_LOG_LEVEL")
            .ok()
            .and_then(|raw| sync_logging::parse_level(&raw))
            .unwrap_or(LevelFilter::Info)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset and blank values count
    /// as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match var("BATCHSYNC_ENV").as_deref() {
            Some("production") => Environment::Production,
            Some("development") | None => Environment::Development,
            Some(other) => {
                sync_warn!("Unknown BATCHSYNC_ENV {:?}, assuming development", other);
                Environment::Development
            }
        };

        let api_url = var("BATCHSYNC_API_URL");
        if environment == Environment::Production && api_url.is_none() {
            return Err(ConfigError::Missing("BATCHSYNC_API_URL".to_string()));
        }
        let base_url = api_url.unwrap_or_else(|| {
            sync_info!("BATCHSYNC_API_URL not set, using default: {}", DEFAULT_API_URL);
            DEFAULT_API_URL.to_string()
        });

        let bypass_requested = var("BATCHSYNC_DEV_AUTH_BYPASS").as_deref() == Some("true");
        let auth_bypass = bypass_requested && environment == Environment::Development;
        if bypass_requested && !auth_bypass {
            sync_error!(
                "BATCHSYNC_DEV_AUTH_BYPASS=true is ignored outside development; remove it"
            );
        }

        let tokens = match (var("BATCHSYNC_ACCESS_TOKEN"), var("BATCHSYNC_REFRESH_TOKEN")) {
            (Some(access), refresh) => Some(AuthTokens::new(access, refresh.unwrap_or_default())),
            (None, Some(_)) => {
                sync_warn!("BATCHSYNC_REFRESH_TOKEN set without BATCHSYNC_ACCESS_TOKEN; ignoring it");
                None
            }
            (None, None) => None,
        };

        let defaults = ClientSettings::default();
        let settings = ClientSettings {
            base_url,
            request_timeout: Duration::from_secs(parse_or(
                &var,
                "BATCHSYNC_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            translate_timeout: Duration::from_secs(parse_or(
                &var,
                "BATCHSYNC_TRANSLATE_TIMEOUT_SECS",
                defaults.translate_timeout.as_secs(),
            )),
            ..defaults
        };

        let history_dir = var("BATCHSYNC_HISTORY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".batchsync"));

        Ok(Self {
            environment,
            settings,
            policy: PollPolicy::default(),
            auth_bypass,
            tokens,
            history_dir,
            desktop_notifications: var("BATCHSYNC_DESKTOP_NOTIFY").as_deref() == Some("granted"),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            sync_warn!("Invalid {} value {:?}: {}; using {}", key, raw, err, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn development_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.settings.base_url, DEFAULT_API_URL);
        assert_eq!(config.settings.translate_timeout, Duration::from_secs(120));
        assert!(!config.auth_bypass);
        assert!(config.tokens.is_none());
    }

    #[test]
    fn production_requires_api_url() {
        let err = AppConfig::from_lookup(lookup(&[("BATCHSYNC_ENV", "production")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BATCHSYNC_API_URL".to_string()));
    }

    #[test]
    fn auth_bypass_only_in_development() {
        let dev = AppConfig::from_lookup(lookup(&[("BATCHSYNC_DEV_AUTH_BYPASS", "true")])).unwrap();
        assert!(dev.auth_bypass);

        let prod = AppConfig::from_lookup(lookup(&[
            ("BATCHSYNC_ENV", "production"),
            ("BATCHSYNC_API_URL", "https://api.example.com"),
            ("BATCHSYNC_DEV_AUTH_BYPASS", "true"),
        ]))
        .unwrap();
        assert!(!prod.auth_bypass);
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BATCHSYNC_REQUEST_TIMEOUT_SECS", "soon"),
            ("BATCHSYNC_TRANSLATE_TIMEOUT_SECS", "300"),
        ]))
        .unwrap();
        assert_eq!(config.settings.request_timeout, Duration::from_secs(30));
        assert_eq!(config.settings.translate_timeout, Duration::from_secs(300));
    }
}
