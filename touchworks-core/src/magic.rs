//! # Magic JSON
//!
//! This module contains the wire format of the generic action endpoint.
//!
//! Every request is the same fixed-shape envelope. The action name selects the operation,
//! six positional `ParameterN` slots carry its arguments and the answer is a JSON array whose
//! first element holds either the action's result key or an `Error` field.
//!
//! * [`envelope`]: the request envelope and the defaults used to fill it.
//! * [`response`]: unwrapping of the result key or the vendor error.
//! * [`catalog`]: the table of known actions and their named parameters.
pub mod catalog;
pub mod envelope;
pub mod response;

pub use catalog::{Action, ActionArgs, Param, Slot};
pub use envelope::{EnvelopeDraft, RequestEnvelope};
pub use response::unwrap_result;
