//! Client configuration: gateway location, credentials and defaults.

use std::env;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::Error;

pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub const ENV_URL: &str = "AEROSPIKE_REST_URL";
pub const ENV_AUTHORIZATION: &str = "AEROSPIKE_REST_AUTHORIZATION";
pub const ENV_USER_AGENT: &str = "AEROSPIKE_REST_USER_AGENT";
pub const ENV_CONNECT_TIMEOUT: &str = "AEROSPIKE_REST_CONNECT_TIMEOUT";
pub const ENV_CLIENT_COMPRESSION: &str = "AEROSPIKE_REST_CLIENT_COMPRESSION";
pub const ENV_HTTP_COMPRESSION: &str = "AEROSPIKE_REST_HTTP_COMPRESSION";

/// Settings shared by every request a `RestClient` issues.
///
/// The base URL is normalized on construction: trailing slashes are removed
/// and `https://` is prepended when no `http://` or `https://` scheme is given.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    authorization: Option<String>,
    user_agent: String,
    connect_timeout: Duration,
    client_compression: bool,
    http_compression: bool,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            authorization: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            client_compression: true,
            http_compression: true,
        })
    }

    /// Build a configuration from `AEROSPIKE_REST_*` environment variables.
    ///
    /// Only `AEROSPIKE_REST_URL` is required; unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = env::var(ENV_URL)
            .map_err(|_| Error::InvalidConfig(format!("{ENV_URL} is not set")))?;
        let mut config = Self::new(&base_url)?;

        if let Some(authorization) = env_value(ENV_AUTHORIZATION) {
            config = config.with_authorization(authorization);
        }
        if let Some(user_agent) = env_value(ENV_USER_AGENT) {
            config = config.with_user_agent(user_agent);
        }
        if let Some(raw) = env_value(ENV_CONNECT_TIMEOUT) {
            config = config.with_connect_timeout(parse_seconds(ENV_CONNECT_TIMEOUT, &raw)?);
        }
        if let Some(raw) = env_value(ENV_CLIENT_COMPRESSION) {
            config = config.with_client_compression(parse_flag(ENV_CLIENT_COMPRESSION, &raw)?);
        }
        if let Some(raw) = env_value(ENV_HTTP_COMPRESSION) {
            config = config.with_http_compression(parse_flag(ENV_HTTP_COMPRESSION, &raw)?);
        }
        Ok(config)
    }

    /// Send `value` verbatim as the `Authorization` header.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Authenticate as an Aerospike user with HTTP basic auth.
    pub fn with_basic_auth(self, user: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{user}:{password}"));
        self.with_authorization(format!("Basic {token}"))
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Compression between the gateway and the database (`compress` param).
    pub fn with_client_compression(mut self, enabled: bool) -> Self {
        self.client_compression = enabled;
        self
    }

    /// Compression between this client and the gateway (`Accept-Encoding`).
    pub fn with_http_compression(mut self, enabled: bool) -> Self {
        self.http_compression = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn client_compression(&self) -> bool {
        self.client_compression
    }

    pub fn http_compression(&self) -> bool {
        self.http_compression
    }
}

fn normalize_base_url(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidConfig("base URL must not be empty".to_string()));
    }
    if has_scheme(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

fn has_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_seconds(name: &str, raw: &str) -> Result<Duration, Error> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| Error::InvalidConfig(format!("{name}: expected seconds, got {raw:?}")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig(format!("{name}: expected a boolean, got {raw:?}"))),
    }
}
