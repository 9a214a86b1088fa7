//! # Errors
//!
//! Every public operation of the client either returns the vendor's unwrapped payload or fails
//! with one of the six variants of [`Error`]. Each concern keeps its own error enum next to the
//! code that raises it; they are composed here.
use crate::{
    config::ConfigError, magic::catalog::ValidationError, session::AuthenticationError,
    transport::TransportError,
};

/// Message used for every response that does not match the expected shape.
pub const MAGIC_JSON_FAILED: &str = "magic json api failed";

/// The closed set of failures surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error("Invalid argument: {0}")]
    Validation(#[from] ValidationError),
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("{action} API failed : {message}")]
    Action { action: String, message: String },
    #[error("{}", MAGIC_JSON_FAILED)]
    Protocol,
}

impl Error {
    /// Short, stable name of the error kind, suitable for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::Authentication(_) => "authentication",
            Error::Validation(_) => "validation",
            Error::Transport(_) => "transport",
            Error::Action { .. } => "action",
            Error::Protocol => "protocol",
        }
    }
}
