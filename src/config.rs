// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! typed configuration for both tiers. `.env` files are loaded with `dotenvy`
//! by the binaries before [`ApiConfig::from_env`] / [`WebConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SECRET_KEY` | Shared credential signing secret | Unset (signing not configured) |
//! | `SESSION_SALT` | Shared salt; must match on both tiers | `session-relay.credential` |
//! | `CREDENTIAL_SCHEME` | `reference` or `self-contained` | `reference` |
//! | `CREDENTIAL_MAX_AGE_SECS` | Self-contained credential lifetime | `3600` |
//! | `STORE_HOST` / `STORE_PORT` | Shared Redis store | `localhost` / `6379` |
//! | `STORE_CONNECT_ATTEMPTS` | Startup connection attempts | `5` |
//! | `STORE_RETRY_BACKOFF_MS` | Pause between attempts | `1000` |
//! | `STORE_TIMEOUT_MS` | Per-call store timeout (1 to 2000) | `2000` |
//! | `SESSION_TTL_SECS` | Session record lifetime (web) | `86400` |
//! | `TRUSTED_PROXY_ADDRS` | Comma-separated proxies allowed to set `X-User` (api) | Empty |
//! | `API_URL` | Base URL of the API tier (web) | Unset |
//! | `COOKIE_SECURE` | Add `Secure` to the session cookie (web) | `false` |
//! | `HOST` / `PORT` | Bind address | `0.0.0.0` / `8000` (api), `8080` (web) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::auth::{CredentialScheme, TokenCodec};
use crate::session::{RedisConnector, RetryPolicy, SessionStore};
use crate::web::backend::api_base;

pub const SECRET_KEY_ENV: &str = "SECRET_KEY";
pub const SESSION_SALT_ENV: &str = "SESSION_SALT";
pub const CREDENTIAL_SCHEME_ENV: &str = "CREDENTIAL_SCHEME";
pub const CREDENTIAL_MAX_AGE_ENV: &str = "CREDENTIAL_MAX_AGE_SECS";
pub const STORE_HOST_ENV: &str = "STORE_HOST";
pub const STORE_PORT_ENV: &str = "STORE_PORT";
pub const STORE_CONNECT_ATTEMPTS_ENV: &str = "STORE_CONNECT_ATTEMPTS";
pub const STORE_RETRY_BACKOFF_ENV: &str = "STORE_RETRY_BACKOFF_MS";
pub const STORE_TIMEOUT_ENV: &str = "STORE_TIMEOUT_MS";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const TRUSTED_PROXY_ADDRS_ENV: &str = "TRUSTED_PROXY_ADDRS";
pub const API_URL_ENV: &str = "API_URL";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Salt used when `SESSION_SALT` is unset. Both tiers must agree on it.
pub const DEFAULT_SALT: &str = "session-relay.credential";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_API_PORT: u16 = 8000;
const DEFAULT_WEB_PORT: u16 = 8080;
const DEFAULT_STORE_HOST: &str = "localhost";
const DEFAULT_STORE_PORT: u16 = 6379;
const DEFAULT_MAX_AGE_SECS: u64 = 3600;
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}={value:?} is invalid: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// Reads one variable. Lets tests supply values without touching the process env.
trait Lookup: Fn(&str) -> Option<String> {}
impl<F: Fn(&str) -> Option<String>> Lookup for F {}

fn lookup_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn read(lookup: &impl Lookup, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T>(lookup: &impl Lookup, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match read(lookup, name) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError {
            name,
            value,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_nonzero(lookup: &impl Lookup, name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match parse(lookup, name, default)? {
        0 => Err(ConfigError {
            name,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        value => Ok(value),
    }
}

fn parse_bind(lookup: &impl Lookup, default_port: u16) -> Result<SocketAddr, ConfigError> {
    let host = read(lookup, HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port: u16 = parse(lookup, PORT_ENV, default_port)?;
    let ip: IpAddr = host.parse().map_err(|e: std::net::AddrParseError| ConfigError {
        name: HOST_ENV,
        value: host.clone(),
        reason: e.to_string(),
    })?;
    Ok(SocketAddr::new(ip, port))
}

/// Settings shared by both tiers: signing and the session store.
#[derive(Clone)]
pub struct RelayConfig {
    pub secret: Option<String>,
    pub salt: String,
    pub scheme: CredentialScheme,
    pub store_host: String,
    pub store_port: u16,
    pub retry: RetryPolicy,
    pub store_timeout: Duration,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("salt", &self.salt)
            .field("scheme", &self.scheme)
            .field("store_host", &self.store_host)
            .field("store_port", &self.store_port)
            .field("retry", &self.retry)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

impl RelayConfig {
    fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let scheme = match read(lookup, CREDENTIAL_SCHEME_ENV).as_deref() {
            None | Some("reference") => CredentialScheme::Reference,
            Some("self-contained") => CredentialScheme::SelfContained {
                max_age: Duration::from_secs(parse(lookup, CREDENTIAL_MAX_AGE_ENV, DEFAULT_MAX_AGE_SECS)?),
            },
            Some(other) => {
                return Err(ConfigError {
                    name: CREDENTIAL_SCHEME_ENV,
                    value: other.to_string(),
                    reason: "expected `reference` or `self-contained`".to_string(),
                })
            }
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            attempts: parse(lookup, STORE_CONNECT_ATTEMPTS_ENV, defaults.attempts)?,
            backoff: Duration::from_millis(parse(
                lookup,
                STORE_RETRY_BACKOFF_ENV,
                u64::try_from(defaults.backoff.as_millis()).unwrap_or(u64::MAX),
            )?),
        };

        Ok(Self {
            secret: read(lookup, SECRET_KEY_ENV),
            salt: read(lookup, SESSION_SALT_ENV).unwrap_or_else(|| DEFAULT_SALT.to_string()),
            scheme,
            store_host: read(lookup, STORE_HOST_ENV).unwrap_or_else(|| DEFAULT_STORE_HOST.to_string()),
            store_port: parse(lookup, STORE_PORT_ENV, DEFAULT_STORE_PORT)?,
            retry,
            store_timeout: Duration::from_millis(parse_nonzero(lookup, STORE_TIMEOUT_ENV, DEFAULT_STORE_TIMEOUT_MS)?),
        })
    }

    /// Build the codec, or `None` when no secret is configured.
    pub fn codec(&self) -> Option<TokenCodec> {
        let Some(secret) = &self.secret else {
            warn!("{SECRET_KEY_ENV} is not set; credentials cannot be signed or verified");
            return None;
        };
        match TokenCodec::new(secret, &self.salt, self.scheme) {
            Ok(codec) => Some(codec),
            Err(e) => {
                warn!(error = %e, "Signing key unusable; credentials cannot be signed or verified");
                None
            }
        }
    }

    pub fn connector(&self) -> RedisConnector {
        RedisConnector::new(&self.store_host, self.store_port, self.store_timeout)
    }

    /// Connect to the shared store with the configured retry budget.
    pub async fn connect_store(&self) -> SessionStore {
        SessionStore::connect(&self.connector(), self.retry, self.store_timeout).await
    }
}

/// API tier configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub relay: RelayConfig,
    pub bind: SocketAddr,
    /// Peers allowed to assert `X-User`.
    pub trusted_proxies: Vec<IpAddr>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&lookup_env)
    }

    fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let trusted_proxies = match read(lookup, TRUSTED_PROXY_ADDRS_ENV) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<IpAddr>().map_err(|e| ConfigError {
                        name: TRUSTED_PROXY_ADDRS_ENV,
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            relay: RelayConfig::from_lookup(lookup)?,
            bind: parse_bind(lookup, DEFAULT_API_PORT)?,
            trusted_proxies,
        })
    }
}

/// Web tier configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub relay: RelayConfig,
    pub bind: SocketAddr,
    /// Base URL of the API tier. Missing is reported to users, not fatal.
    pub api_url: Option<Url>,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
}

impl WebConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&lookup_env)
    }

    fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let api_url = match read(lookup, API_URL_ENV) {
            Some(raw) => Some(api_base(Url::parse(&raw).map_err(|e| ConfigError {
                name: API_URL_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?)),
            None => None,
        };

        Ok(Self {
            relay: RelayConfig::from_lookup(lookup)?,
            bind: parse_bind(lookup, DEFAULT_WEB_PORT)?,
            api_url,
            session_ttl: Duration::from_secs(parse(lookup, SESSION_TTL_ENV, DEFAULT_SESSION_TTL_SECS)?),
            cookie_secure: parse(lookup, COOKIE_SECURE_ENV, false)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn api_defaults() {
        let config = ApiConfig::from_lookup(&env(&[])).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8000".parse().unwrap());
        assert!(config.trusted_proxies.is_empty());
        assert_eq!(config.relay.secret, None);
        assert_eq!(config.relay.salt, DEFAULT_SALT);
        assert_eq!(config.relay.scheme, CredentialScheme::Reference);
        assert_eq!(config.relay.retry, RetryPolicy::default());
        assert_eq!(config.relay.store_timeout, Duration::from_secs(2));
        assert!(config.relay.codec().is_none());
    }

    #[test]
    fn self_contained_scheme_reads_max_age() {
        let config = ApiConfig::from_lookup(&env(&[
            ("CREDENTIAL_SCHEME", "self-contained"),
            ("CREDENTIAL_MAX_AGE_SECS", "120"),
            ("SECRET_KEY", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(
            config.relay.scheme,
            CredentialScheme::SelfContained {
                max_age: Duration::from_secs(120)
            }
        );
        assert!(config.relay.codec().is_some());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = ApiConfig::from_lookup(&env(&[("CREDENTIAL_SCHEME", "jwt")])).unwrap_err();
        assert_eq!(err.name, CREDENTIAL_SCHEME_ENV);
    }

    #[test]
    fn trusted_proxies_are_parsed() {
        let config =
            ApiConfig::from_lookup(&env(&[("TRUSTED_PROXY_ADDRS", "10.0.0.2, ::1,")])).unwrap();
        assert_eq!(
            config.trusted_proxies,
            vec!["10.0.0.2".parse::<IpAddr>().unwrap(), "::1".parse().unwrap()]
        );

        let err = ApiConfig::from_lookup(&env(&[("TRUSTED_PROXY_ADDRS", "proxy.local")])).unwrap_err();
        assert_eq!(err.value, "proxy.local");
    }

    #[test]
    fn web_config_reads_api_url_and_cookie_flag() {
        let config = WebConfig::from_lookup(&env(&[
            ("API_URL", "http://api:8000/"),
            ("COOKIE_SECURE", "true"),
            ("PORT", "9090"),
        ]))
        .unwrap();
        assert_eq!(config.api_url.unwrap().as_str(), "http://api:8000/");
        assert!(config.cookie_secure);
        assert_eq!(config.bind.port(), 9090);
        assert_eq!(config.session_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = WebConfig::from_lookup(&env(&[("STORE_PORT", "redis")])).unwrap_err();
        assert_eq!(err.name, STORE_PORT_ENV);
        assert!(err.to_string().contains("STORE_PORT"));
    }

    #[test]
    fn api_url_prefix_gets_trailing_slash() {
        let config = WebConfig::from_lookup(&env(&[("API_URL", "http://gw.internal/relay")])).unwrap();
        assert_eq!(config.api_url.unwrap().as_str(), "http://gw.internal/relay/");
    }

    #[test]
    fn zero_store_timeout_is_rejected() {
        let err = ApiConfig::from_lookup(&env(&[("STORE_TIMEOUT_MS", "0")])).unwrap_err();
        assert_eq!(err.name, STORE_TIMEOUT_ENV);
        assert_eq!(err.value, "0");

        let config = ApiConfig::from_lookup(&env(&[("STORE_TIMEOUT_MS", "250")])).unwrap();
        assert_eq!(config.relay.store_timeout, Duration::from_millis(250));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = ApiConfig::from_lookup(&env(&[("SECRET_KEY", "hunter2")])).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
