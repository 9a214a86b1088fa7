//! # Client Configuration
//!
//! [`ClientConfig`] gathers everything needed to talk to a TouchWorks installation. It can be
//! built in code or deserialized from a JSON file. Older fixture files that use the
//! `server` / `serviceusername` / `servicepassword` / `appname` / `ehr_username` keys are
//! accepted as well.
use serde::Deserialize;
use std::{fmt, path::Path, time::Duration};

/// Tokens are considered stale after twenty minutes unless configured otherwise.
pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(20 * 60);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("'{0}' can not be empty")]
    Missing(&'static str),
    #[error("Invalid base url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Root of the web service, e.g. `https://ehr.example.org/Unity/UnityService.svc`.
    #[serde(alias = "server")]
    pub base_url: String,
    #[serde(alias = "serviceusername")]
    pub username: String,
    #[serde(alias = "servicepassword")]
    pub password: String,
    #[serde(alias = "appname")]
    pub app_name: String,
    /// EHR user sent as `AppUserID` when an action call does not name one.
    #[serde(default, alias = "ehr_username")]
    pub app_username: Option<String>,
    /// When disabled, a new token is acquired before every request.
    #[serde(default = "default_cache_token")]
    pub cache_token: bool,
    #[serde(
        default = "default_token_timeout",
        rename = "token_timeout_secs",
        with = "duration_secs"
    )]
    pub token_timeout: Duration,
    #[serde(
        default = "default_request_timeout",
        rename = "request_timeout_secs",
        with = "duration_secs"
    )]
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            app_name: app_name.into(),
            app_username: None,
            cache_token: default_cache_token(),
            token_timeout: DEFAULT_TOKEN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_app_username(mut self, app_username: impl Into<String>) -> Self {
        self.app_username = Some(app_username.into());
        self
    }

    pub fn with_token_cache(mut self, enabled: bool) -> Self {
        self.cache_token = enabled;
        self
    }

    pub fn with_token_timeout(mut self, timeout: Duration) -> Self {
        self.token_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Checks that every required field is present and that the base url parses.
    ///
    /// Fields are checked in declaration order and the first empty one is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("base_url", &self.base_url),
            ("username", &self.username),
            ("password", &self.password),
            ("app_name", &self.app_name),
        ];

        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Missing(*name));
        }

        reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Joins `path` onto the base url.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// The configured default EHR user, if it is non-empty.
    pub fn default_app_username(&self) -> Option<&str> {
        self.app_username.as_deref().filter(|name| !name.is_empty())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("app_name", &self.app_name)
            .field("app_username", &self.app_username)
            .field("cache_token", &self.cache_token)
            .field("token_timeout", &self.token_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn default_cache_token() -> bool {
    true
}

fn default_token_timeout() -> Duration {
    DEFAULT_TOKEN_TIMEOUT
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
