//! # Response Unwrapping
//!
//! The service always answers with a JSON array and only its first element carries meaning.
//! That element holds either the action's result key or an `Error` string.
use crate::error::Error;
use serde_json::Value;

/// Key the service uses to report a failed action.
pub const ERROR_KEY: &str = "Error";

/// Why a response could not be unwrapped. Only used for logging: callers see
/// [`Error::Protocol`].
#[derive(Debug, thiserror::Error)]
pub enum MalformedResponse {
    #[error("response is not a JSON array")]
    NotAnArray,
    #[error("response array is empty")]
    Empty,
    #[error("first response element is not an object")]
    NotAnObject,
    #[error("first response element has neither '{result_key}' nor 'Error'")]
    MissingKeys { result_key: String },
}

/// Outcome of inspecting a response.
#[derive(Debug)]
pub enum Unwrapped {
    Result(Value),
    ActionFailed(String),
    Malformed(MalformedResponse),
}

/// Classifies `response` without turning it into an error.
pub fn inspect(response: &Value, result_key: &str) -> Unwrapped {
    let Some(items) = response.as_array() else {
        return Unwrapped::Malformed(MalformedResponse::NotAnArray);
    };
    let Some(first) = items.first() else {
        return Unwrapped::Malformed(MalformedResponse::Empty);
    };
    let Some(first) = first.as_object() else {
        return Unwrapped::Malformed(MalformedResponse::NotAnObject);
    };

    if let Some(result) = first.get(result_key) {
        return Unwrapped::Result(result.clone());
    }

    match first.get(ERROR_KEY) {
        Some(Value::String(message)) => Unwrapped::ActionFailed(message.clone()),
        Some(other) => Unwrapped::ActionFailed(other.to_string()),
        None => Unwrapped::Malformed(MalformedResponse::MissingKeys {
            result_key: result_key.to_string(),
        }),
    }
}

impl Unwrapped {
    /// Maps the outcome onto [`Error`]. `action` names the call in [`Error::Action`].
    pub fn into_result(self, action: &str) -> Result<Value, Error> {
        match self {
            Unwrapped::Result(value) => Ok(value),
            Unwrapped::ActionFailed(message) => Err(Error::Action {
                action: action.to_string(),
                message,
            }),
            Unwrapped::Malformed(_) => Err(Error::Protocol),
        }
    }
}

/// Returns the value stored under `result_key` in the first response element.
///
/// # Returns
///
/// * `Ok(value)` - The element holds `result_key`.
/// * `Err(Error::Action)` - The element holds `Error`. The message names `action`.
/// * `Err(Error::Protocol)` - Anything else.
pub fn unwrap_result(response: &Value, action: &str, result_key: &str) -> Result<Value, Error> {
    inspect(response, result_key).into_result(action)
}
