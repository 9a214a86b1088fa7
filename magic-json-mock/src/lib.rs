//! # Magic JSON Mock
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-process stand-in for the
//! TouchWorks web service, used to integration test `touchworks_core` and the `touchworks` CLI.
//! It is not intended for production use.
//!
//! The server answers `json/GetToken` with a fresh UUID token when the credentials match and
//! `json/MagicJson` with the reply registered for the envelope's `Action`. Envelopes carrying a
//! token the server never issued are answered with a vendor `Error`.
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, task::JoinHandle};

pub const GET_TOKEN_PATH: &str = "/json/GetToken";
pub const MAGIC_JSON_PATH: &str = "/json/MagicJson";

/// Text the service answers `GetToken` with when the credentials are wrong.
pub const INVALID_CREDENTIALS: &str = "Error: Username and/or Password not valid";
pub const INVALID_TOKEN: &str = "Security token is not valid";

/// What the server answers for one action.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A JSON body returned as is.
    Json(Value),
    /// A body returned with an arbitrary status and no JSON guarantees.
    Raw { status: u16, body: String },
}

impl Reply {
    /// `[{ result_key: value }]`
    pub fn result(result_key: &str, value: Value) -> Self {
        let mut entry = serde_json::Map::new();
        entry.insert(result_key.to_string(), value);
        Reply::Json(Value::Array(vec![Value::Object(entry)]))
    }

    /// `[{ "Error": message }]`
    pub fn error(message: &str) -> Self {
        Reply::Json(json!([{ "Error": message }]))
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Reply::Raw {
            status,
            body: body.into(),
        }
    }

    fn into_http(self) -> Response {
        match self {
            Reply::Json(value) => json_response(StatusCode::OK, value.to_string()),
            Reply::Raw { status, body } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, body).into_response()
            }
        }
    }
}

/// A request received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: &'static str,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    username: String,
    password: String,
    token_body: Option<String>,
    replies: HashMap<String, Reply>,
    issued: Mutex<Vec<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Configures a [`MockServer`].
#[derive(Default)]
pub struct MockBuilder {
    state: MockState,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service account accepted by `GetToken`.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.state.username = username.to_string();
        self.state.password = password.to_string();
        self
    }

    /// Answers every valid `GetToken` with `body` instead of a fresh UUID.
    pub fn token_body(mut self, body: &str) -> Self {
        self.state.token_body = Some(body.to_string());
        self
    }

    /// Registers the reply for `action`. Action names are matched exactly.
    pub fn reply(mut self, action: &str, reply: Reply) -> Self {
        self.state.replies.insert(action.to_string(), reply);
        self
    }

    /// Binds an ephemeral local port and starts serving.
    pub async fn spawn(self) -> std::io::Result<MockServer> {
        let state = Arc::new(self.state);

        let app = Router::new()
            .route(GET_TOKEN_PATH, post(get_token))
            .route(MAGIC_JSON_PATH, post(magic_json))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(MockServer {
            addr,
            state,
            handle,
        })
    }
}

/// A running mock. The server stops when this is dropped.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub fn builder() -> MockBuilder {
        MockBuilder::new()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base url with a trailing slash, as found in real configurations.
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Number of `GetToken` requests received, successful or not.
    pub fn login_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path == GET_TOKEN_PATH)
            .count()
    }

    /// Bodies posted to `json/MagicJson`, in order.
    pub fn envelopes(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == MAGIC_JSON_PATH)
            .map(|r| r.body)
            .collect()
    }

    /// Tokens handed out so far, oldest first.
    pub fn issued_tokens(&self) -> Vec<String> {
        self.state.issued.lock().clone()
    }

    /// Forgets every issued token, as if they all expired server side.
    pub fn revoke_tokens(&self) {
        self.state.issued.lock().clear();
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn record(state: &MockState, path: &'static str, body: &str) -> Value {
    let body = serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));
    state.requests.lock().push(RecordedRequest {
        path,
        body: body.clone(),
    });
    body
}

async fn get_token(State(state): State<Arc<MockState>>, body: String) -> Response {
    let body = record(&state, GET_TOKEN_PATH, &body);

    let username = body.get("Username").and_then(Value::as_str);
    let password = body.get("Password").and_then(Value::as_str);

    if username != Some(state.username.as_str()) || password != Some(state.password.as_str()) {
        return (StatusCode::OK, INVALID_CREDENTIALS).into_response();
    }

    let token = state
        .token_body
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    state.issued.lock().push(token.clone());

    (StatusCode::OK, token).into_response()
}

async fn magic_json(State(state): State<Arc<MockState>>, body: String) -> Response {
    let body = record(&state, MAGIC_JSON_PATH, &body);

    let token = body.get("Token").and_then(Value::as_str).unwrap_or_default();
    if !state.issued.lock().iter().any(|issued| issued == token) {
        return Reply::error(INVALID_TOKEN).into_http();
    }

    let action = body.get("Action").and_then(Value::as_str).unwrap_or_default();
    match state.replies.get(action) {
        Some(reply) => reply.clone().into_http(),
        None => Reply::error(&format!("Unknown action {action}")).into_http(),
    }
}
