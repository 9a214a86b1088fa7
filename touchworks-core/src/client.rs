//! # TouchWorks Client
//!
//! This module implements the request/response engine shared by every Magic JSON action.
//!
//! A call goes through three steps:
//!
//! 1. **Envelope**: [`TouchWorksClient::build_envelope`] turns an [`EnvelopeDraft`] into the
//!    fixed-shape wire envelope, filling unset identity fields from the configuration and the
//!    token from the session.
//! 2. **Execute**: [`TouchWorksClient::execute`] makes sure the token is fresh (refreshing it
//!    if needed), posts the envelope to `json/MagicJson` and parses the JSON answer.
//! 3. **Unwrap**: [`TouchWorksClient::unwrap`] extracts the action's result key or turns the
//!    vendor `Error` field into [`Error::Action`].
//!
//! The typed per-action methods (`search_patients`, `save_note`, ...) live in [`actions`] and
//! all go through [`TouchWorksClient::invoke`], which drives the three steps from the
//! [`catalog`](crate::magic::catalog) entry of the action.
//!
//! ## Example
//!
//! ```rust,no_run
//! use touchworks_core::{ClientConfig, TouchWorksClient};
//!
//! # async fn run() -> Result<(), touchworks_core::Error> {
//! let config = ClientConfig::new("https://ehr.example.org/Unity", "svc", "secret", "MyApp")
//!     .with_app_username("jmedici");
//!
//! let client = TouchWorksClient::connect(config).await?;
//! let patients = client.search_patients(None, "J*", None, None).await?;
//! # Ok(())
//! # }
//! ```
pub mod actions;
mod types;

pub use types::*;

use crate::{
    clock::{Clock, SystemClock},
    config::ClientConfig,
    error::Error,
    logging::{LogSink, NoopSink},
    magic::{
        Action, ActionArgs, EnvelopeDraft, RequestEnvelope,
        envelope::{EnvelopeDefaults, redact_token},
        response::{Unwrapped, inspect},
    },
    session::{SecurityToken, SessionManager},
    transport::{HttpTransport, MAGIC_JSON_PATH, Transport},
};
use serde_json::Value;
use std::sync::Arc;

/// Collaborators injected into the client.
#[derive(Clone)]
pub struct ClientOptions {
    pub clock: Arc<dyn Clock>,
    pub log: Arc<dyn LogSink>,
}

impl ClientOptions {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            log: Arc::new(NoopSink),
        }
    }
}

/// A client bound to one TouchWorks installation and one service account.
///
/// The generic parameter `T` is the transport used to reach the web service.
pub struct TouchWorksClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
    session: SessionManager,
    log: Arc<dyn LogSink>,
}

impl TouchWorksClient<HttpTransport> {
    /// Validates `config`, connects over HTTP and acquires the first token.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        Self::connect_with(config, ClientOptions::default()).await
    }

    pub async fn connect_with(config: ClientConfig, options: ClientOptions) -> Result<Self, Error> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::from_transport(config, transport, options).await
    }
}

impl<T: Transport> TouchWorksClient<T> {
    /// Creates a client on top of an existing transport and acquires the first token.
    ///
    /// # Returns
    ///
    /// * `Err(Error::Configuration)` - A required setting is empty.
    /// * `Err(Error::Authentication)` - The service did not hand out a valid token.
    /// * `Err(Error::Transport)` - The token request itself failed.
    pub async fn from_transport(
        config: ClientConfig,
        transport: T,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        config.validate()?;

        let session =
            SessionManager::start(&config, &transport, options.clock, options.log.clone()).await?;

        Ok(Self {
            config,
            transport,
            session,
            log: options.log,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The cached token, whether or not it is still fresh.
    pub fn token(&self) -> SecurityToken {
        self.session.token()
    }

    pub fn token_is_fresh(&self) -> bool {
        self.session.is_fresh(&self.session.token())
    }

    /// Acquires a new token right away, regardless of the age of the current one.
    pub async fn refresh_token(&self) -> Result<SecurityToken, Error> {
        self.session.refresh(&self.transport).await
    }

    /// Builds the wire envelope for `draft` using the cached token.
    pub fn build_envelope(&self, draft: EnvelopeDraft) -> RequestEnvelope {
        let token = self.session.token();
        self.build_envelope_with(draft, &token)
    }

    fn build_envelope_with(&self, draft: EnvelopeDraft, token: &SecurityToken) -> RequestEnvelope {
        draft.build(EnvelopeDefaults {
            token: token.as_str(),
            app_name: &self.config.app_name,
            app_username: self.config.default_app_username(),
        })
    }

    /// Sends `envelope` to the generic action endpoint and returns the parsed JSON answer.
    ///
    /// If the session token is stale it is refreshed first. The envelope's token is replaced by
    /// the current one when it is empty or was handed out to this session earlier. A token the
    /// session never issued is sent as is.
    pub async fn execute(&self, mut envelope: RequestEnvelope) -> Result<Value, Error> {
        let token = self.session.current_token(&self.transport).await?;

        if envelope.token.is_empty() || self.session.issued(&envelope.token) {
            envelope.token = token.as_str().to_string();
        }

        self.send(&envelope).await
    }

    /// Extracts `result_key` from `response`. See [`crate::magic::unwrap_result`].
    ///
    /// The reason a response is malformed is logged; the caller only gets [`Error::Protocol`].
    pub fn unwrap(&self, response: &Value, action: &str, result_key: &str) -> Result<Value, Error> {
        let outcome = inspect(response, result_key);

        match &outcome {
            Unwrapped::Result(_) => {}
            Unwrapped::ActionFailed(message) => {
                self.log.error(&format!("{action} API failed : {message}"));
            }
            Unwrapped::Malformed(reason) => {
                self.log
                    .exception(&format!("{action}: unexpected response"), reason);
            }
        }

        outcome.into_result(action)
    }

    /// Builds, executes and unwraps one call.
    pub async fn call(&self, draft: EnvelopeDraft, result_key: &str) -> Result<Value, Error> {
        let token = self.session.current_token(&self.transport).await?;
        let envelope = self.build_envelope_with(draft, &token);
        let response = self.send(&envelope).await?;
        self.unwrap(&response, &envelope.action, result_key)
    }

    /// Runs a catalog action with named arguments.
    ///
    /// Arguments are validated against the catalog before any request is made.
    pub async fn invoke(&self, action: &Action, args: ActionArgs) -> Result<Value, Error> {
        let result = match action.draft(args) {
            Ok(draft) => self.call(draft, action.result_key).await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = &result {
            self.log
                .debug(&format!("{} failed with a {} error", action.name, err.kind()));
        }
        result
    }

    async fn send(&self, envelope: &RequestEnvelope) -> Result<Value, Error> {
        let body = envelope.to_json().map_err(|err| {
            self.log.exception(
                &format!("{}: envelope could not be serialized", envelope.action),
                &err,
            );
            Error::Protocol
        })?;

        self.log.debug(&format!(
            "POST {MAGIC_JSON_PATH} {}",
            redact_token(body.clone())
        ));

        let response = self.transport.post_json(MAGIC_JSON_PATH, &body).await?;

        self.log.debug(&format!(
            "{} answered with {} ({} bytes)",
            envelope.action,
            response.status,
            response.body.len()
        ));

        let response = response.error_for_status(MAGIC_JSON_PATH)?;

        serde_json::from_str(&response.body).map_err(|err| {
            self.log.exception(
                &format!("{}: response is not valid JSON", envelope.action),
                &err,
            );
            Error::Protocol
        })
    }
}
