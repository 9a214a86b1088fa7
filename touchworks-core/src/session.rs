//! # Session
//!
//! The [`SessionManager`] owns the security token that authorizes every Magic JSON call.
//!
//! A token is obtained by posting the service credentials to `json/GetToken`. The service
//! answers with a bare UUID string (not JSON). The token is then reused until it is older than
//! the configured timeout, or for a single request only when token caching is disabled.
//!
//! ## Refresh
//!
//! The current token sits behind a read/write lock so envelopes can be built without waiting.
//! Refreshing goes through a separate async mutex, and freshness is checked again once the
//! mutex is held, so concurrent callers that all find a stale token trigger one acquisition.
use crate::{
    clock::Clock,
    config::ClientConfig,
    error::Error,
    logging::LogSink,
    transport::{GET_TOKEN_PATH, Transport},
};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::{collections::VecDeque, fmt, sync::Arc, time::Duration};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("unable to acquire the token from web service")]
    EmptyToken,
    #[error("unable to acquire the token from web service")]
    MalformedToken(#[source] uuid::Error),
}

/// A token handed out by the web service, stamped with the time it was acquired.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityToken {
    token: String,
    acquired_at: DateTime<Utc>,
}

impl SecurityToken {
    pub fn new(
        token: impl Into<String>,
        acquired_at: DateTime<Utc>,
    ) -> Result<Self, AuthenticationError> {
        let token = token.into();
        if token.is_empty() {
            return Err(AuthenticationError::EmptyToken);
        }
        Ok(Self { token, acquired_at })
    }

    /// Validates a raw `GetToken` response body.
    ///
    /// The body must be a UUID in one of its textual forms. The version nibble is not checked.
    pub fn parse(body: &str, acquired_at: DateTime<Utc>) -> Result<Self, AuthenticationError> {
        if body.is_empty() {
            return Err(AuthenticationError::EmptyToken);
        }
        Uuid::parse_str(body).map_err(AuthenticationError::MalformedToken)?;
        Self::new(body, acquired_at)
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// The first characters of the token, for display.
    pub fn masked(&self) -> String {
        let visible: String = self.token.chars().take(8).collect();
        format!("{visible}…")
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityToken")
            .field("token", &self.masked())
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// Service account used to acquire tokens.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl From<&ClientConfig> for Credentials {
    fn from(config: &ClientConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How many replaced tokens are remembered for [`SessionManager::issued`].
const SUPERSEDED_HISTORY: usize = 16;

struct TokenState {
    current: SecurityToken,
    superseded: VecDeque<String>,
}

/// Acquires, tracks and refreshes the session token.
pub struct SessionManager {
    credentials: Credentials,
    cache_token: bool,
    token_timeout: Duration,
    clock: Arc<dyn Clock>,
    log: Arc<dyn LogSink>,
    state: RwLock<TokenState>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Acquires the first token and returns a manager holding it.
    pub async fn start<T: Transport>(
        config: &ClientConfig,
        transport: &T,
        clock: Arc<dyn Clock>,
        log: Arc<dyn LogSink>,
    ) -> Result<Self, Error> {
        let credentials = Credentials::from(config);
        let token = acquire(&credentials, transport, clock.as_ref(), log.as_ref()).await?;

        Ok(Self {
            credentials,
            cache_token: config.cache_token,
            token_timeout: config.token_timeout,
            clock,
            log,
            state: RwLock::new(TokenState {
                current: token,
                superseded: VecDeque::new(),
            }),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// A snapshot of the cached token, fresh or not.
    pub fn token(&self) -> SecurityToken {
        self.state.read().current.clone()
    }

    /// Whether `token` was handed out to this session, either now or before a refresh.
    ///
    /// Only the last few replaced tokens are remembered.
    pub fn issued(&self, token: &str) -> bool {
        let state = self.state.read();
        state.current.as_str() == token || state.superseded.iter().any(|old| old == token)
    }

    /// Whether `token` can still be used.
    ///
    /// Always `false` when token caching is disabled.
    pub fn is_fresh(&self, token: &SecurityToken) -> bool {
        if !self.cache_token {
            return false;
        }
        let timeout = TimeDelta::from_std(self.token_timeout).unwrap_or(TimeDelta::MAX);
        let age = self.clock.now() - token.acquired_at();
        if age > timeout {
            self.log.debug("token needs to be reset");
            return false;
        }
        true
    }

    /// Returns a usable token, acquiring a new one if the cached one is stale.
    pub async fn current_token<T: Transport>(&self, transport: &T) -> Result<SecurityToken, Error> {
        let stale = self.token();
        if self.is_fresh(&stale) {
            return Ok(stale);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we were waiting.
        if self.cache_token {
            let current = self.token();
            if current != stale && self.is_fresh(&current) {
                return Ok(current);
            }
        }

        self.log.debug("refreshing security token");
        self.refresh(transport).await
    }

    /// Unconditionally acquires a new token and makes it the current one.
    pub async fn refresh<T: Transport>(&self, transport: &T) -> Result<SecurityToken, Error> {
        let token = acquire(
            &self.credentials,
            transport,
            self.clock.as_ref(),
            self.log.as_ref(),
        )
        .await?;
        let mut state = self.state.write();
        let previous = std::mem::replace(&mut state.current, token.clone());
        if state.superseded.len() == SUPERSEDED_HISTORY {
            state.superseded.pop_front();
        }
        state.superseded.push_back(previous.token);
        Ok(token)
    }
}

/// Posts the credentials to `json/GetToken` and validates the answer.
pub async fn acquire<T: Transport>(
    credentials: &Credentials,
    transport: &T,
    clock: &dyn Clock,
    log: &dyn LogSink,
) -> Result<SecurityToken, Error> {
    let body = serde_json::json!({
        "Username": credentials.username,
        "Password": credentials.password,
    });

    log.debug(&format!("acquiring token for '{}'", credentials.username));

    let response = transport
        .post_json(GET_TOKEN_PATH, &body)
        .await?
        .error_for_status(GET_TOKEN_PATH)?;

    match SecurityToken::parse(&response.body, clock.now()) {
        Ok(token) => {
            log.debug(&format!("token acquired: {}", token.masked()));
            Ok(token)
        }
        Err(err) => {
            log.exception(
                &format!(
                    "response was not a valid token string ({} bytes)",
                    response.body.len()
                ),
                &err,
            );
            Err(err.into())
        }
    }
}
