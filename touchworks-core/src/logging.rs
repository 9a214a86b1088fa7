//! # Log Sink
//!
//! The client never configures a global logger. It writes through a [`LogSink`] handed to it at
//! construction, which defaults to [`NoopSink`].
use std::error::Error as StdError;

/// Destination for the client's debug and error traces.
pub trait LogSink: Send + Sync {
    fn debug(&self, message: &str);

    fn error(&self, message: &str);

    /// Reports a failure together with the low-level error that caused it.
    fn exception(&self, message: &str, error: &(dyn StdError + 'static)) {
        self.error(&format!("{message}: {error}"));
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn debug(&self, _message: &str) {}

    fn error(&self, _message: &str) {}

    fn exception(&self, _message: &str, _error: &(dyn StdError + 'static)) {}
}

/// Forwards to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn exception(&self, message: &str, error: &(dyn StdError + 'static)) {
        tracing::error!(error = %error, "{message}");
    }
}
