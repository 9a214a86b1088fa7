//! # TouchWorks Core
//!
//! `touchworks-core` is the library powering the `touchworks` CLI. It provides an async client
//! for the TouchWorks "Magic JSON" web service: a single generic RPC endpoint that dispatches
//! on an `Action` field and answers with a JSON array.
//!
//! ## Key Components
//!
//! * **[`TouchWorksClient`]:** The main entry point. It owns the session, builds request
//!   envelopes, sends them through a [`Transport`] and unwraps the vendor result.
//! * **[`session::SessionManager`]:** Acquires the security token, tracks its age and refreshes
//!   it once it goes stale.
//! * **[`magic::catalog`]:** The static table of supported actions. Every action declares its
//!   result key and how its named arguments map onto the six generic `ParameterN` slots.
//!
//! ## Transport
//!
//! The client is generic over the [`Transport`] trait. [`HttpTransport`] is the default,
//! backed by `reqwest`. Any other implementation (an in-memory fake, a proxying transport)
//! can be plugged in with [`TouchWorksClient::from_transport`].
//!
//! ## Logging
//!
//! Nothing is logged unless a [`logging::LogSink`] is supplied through [`ClientOptions`].
//! [`logging::TracingSink`] forwards everything to the `tracing` ecosystem.
//!
//! See the README.md for more details about usage.
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod magic;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{ClientOptions, TouchWorksClient};
pub use config::ClientConfig;
pub use error::Error;
pub use transport::{HttpTransport, Transport};

/// Type alias for the standard boxed error used by transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
