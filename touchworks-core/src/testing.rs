//! In-memory transport used by the unit tests.
use crate::{
    logging::LogSink,
    transport::{GET_TOKEN_PATH, Transport, TransportError, TransportResponse},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

pub const TOKEN_A: &str = "9c5b94b1-35ad-49bb-b118-8e8fc24abf80";
pub const TOKEN_B: &str = "1d7a3f52-0c2e-4b7e-9a5b-6c1f0e2d3b4a";

/// Answers `GetToken` from a queue of token bodies and `MagicJson` from a queue of responses.
///
/// When the token queue runs dry the last token handed out is repeated.
#[derive(Default)]
pub struct FakeTransport {
    tokens: Mutex<VecDeque<TransportResponse>>,
    last_token: Mutex<Option<TransportResponse>>,
    replies: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(self, tokens: &[&str]) -> Self {
        self.tokens
            .lock()
            .extend(tokens.iter().map(|t| TransportResponse::ok(*t)));
        self
    }

    pub fn with_token_response(self, response: TransportResponse) -> Self {
        self.tokens.lock().push_back(response);
        self
    }

    pub fn with_reply(self, reply: serde_json::Value) -> Self {
        self.replies
            .lock()
            .push_back(TransportResponse::ok(reply.to_string()));
        self
    }

    pub fn with_raw_reply(self, response: TransportResponse) -> Self {
        self.replies.lock().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().clone()
    }

    pub fn token_requests(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|(path, _)| path == GET_TOKEN_PATH)
            .count()
    }

    /// Envelopes posted to the generic action endpoint, in order.
    pub fn envelopes(&self) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .iter()
            .filter(|(path, _)| path != GET_TOKEN_PATH)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push((path.to_string(), body.clone()));

        if path == GET_TOKEN_PATH {
            let next = self.tokens.lock().pop_front();
            let mut last = self.last_token.lock();
            if let Some(response) = next {
                *last = Some(response);
            }
            return Ok(last.clone().unwrap_or_else(|| TransportResponse::ok("")));
        }

        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| TransportResponse::ok("[]")))
    }
}

/// Keeps every line it is given.
#[derive(Default)]
pub struct RecordingSink {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn debug(&self, message: &str) {
        self.lines.lock().push(format!("DEBUG {message}"));
    }

    fn error(&self, message: &str) {
        self.lines.lock().push(format!("ERROR {message}"));
    }
}
