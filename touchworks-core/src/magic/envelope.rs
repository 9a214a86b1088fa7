//! # Request Envelope
//!
//! The service rejects envelopes with missing keys, so every field is always serialized, with
//! an empty string standing in for "not used".
use serde::Serialize;

/// The body posted to `json/MagicJson`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestEnvelope {
    pub action: String,
    #[serde(rename = "AppUserID")]
    pub app_user_id: String,
    #[serde(rename = "Appname")]
    pub app_name: String,
    #[serde(rename = "PatientID")]
    pub patient_id: String,
    pub token: String,
    pub parameter1: String,
    pub parameter2: String,
    pub parameter3: String,
    pub parameter4: String,
    pub parameter5: String,
    pub parameter6: String,
    pub data: String,
}

impl RequestEnvelope {
    /// The envelope as a JSON value, ready to be posted.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// The envelope as a JSON value with the token blanked out, for logging.
    pub fn redacted(&self) -> serde_json::Result<serde_json::Value> {
        self.to_json().map(redact_token)
    }
}

/// Blanks out the `Token` key of a serialized envelope.
pub fn redact_token(mut body: serde_json::Value) -> serde_json::Value {
    if let Some(token) = body.get_mut("Token") {
        *token = serde_json::Value::String("<redacted>".to_string());
    }
    body
}

/// Caller-side form of an envelope. Anything left as `None` (or empty) is filled in by
/// [`EnvelopeDraft::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeDraft {
    pub action: String,
    pub user_id: Option<String>,
    pub app_name: Option<String>,
    pub patient_id: Option<String>,
    pub token: Option<String>,
    pub parameters: [Option<String>; 6],
    pub data: Option<String>,
}

/// Session values substituted for fields the draft leaves unset.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeDefaults<'a> {
    pub token: &'a str,
    pub app_name: &'a str,
    pub app_username: Option<&'a str>,
}

impl EnvelopeDraft {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets slot `index` (1 to 6). Out of range indexes are ignored.
    pub fn parameter(mut self, index: usize, value: impl Into<String>) -> Self {
        if let Some(slot) = index.checked_sub(1).and_then(|i| self.parameters.get_mut(i)) {
            *slot = Some(value.into());
        }
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Produces the wire envelope. Empty identity and token fields fall back to `defaults`.
    pub fn build(self, defaults: EnvelopeDefaults<'_>) -> RequestEnvelope {
        let [p1, p2, p3, p4, p5, p6] = self.parameters.map(Option::unwrap_or_default);

        RequestEnvelope {
            action: self.action,
            app_user_id: non_empty(self.user_id)
                .or_else(|| defaults.app_username.map(str::to_string))
                .unwrap_or_default(),
            app_name: non_empty(self.app_name).unwrap_or_else(|| defaults.app_name.to_string()),
            patient_id: self.patient_id.unwrap_or_default(),
            token: non_empty(self.token).unwrap_or_else(|| defaults.token.to_string()),
            parameter1: p1,
            parameter2: p2,
            parameter3: p3,
            parameter4: p4,
            parameter5: p5,
            parameter6: p6,
            data: self.data.unwrap_or_default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
