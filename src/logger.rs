use crate::di::{Injectable, Injector};
use crate::error::Result;
use crate::server::ResolverFailure;

/// Event name of a failed route resolution. Log parsers key on it.
pub const RESOLVER_ERROR_EVENT: &str = "resolver-error";

/// Named application logger, bound in the bootstrap module and shared by every request.
///
/// Emits `tracing` events; where they end up is decided by the installed subscriber
/// (see [`crate::logging::init_tracing`]).
#[derive(Clone, Debug)]
pub struct Logger {
    name: String,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(logger = %self.name, "{message}");
    }

    pub fn info(&self, message: &str) {
        tracing::info!(logger = %self.name, "{message}");
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(logger = %self.name, "{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!(logger = %self.name, "{message}");
    }

    /// Log a failed `process()` with the `{event, stack, url, error}` shape.
    pub fn resolver_error(&self, failure: &ResolverFailure) {
        tracing::error!(
            logger = %self.name,
            event = RESOLVER_ERROR_EVENT,
            correlation_id = %failure.correlation_id,
            stack = %failure.stack,
            url = %failure.url,
            error = %failure.error,
            "route resolver failed"
        );
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

impl Injectable for Logger {
    fn inject(_injector: &Injector) -> Result<Self> {
        Ok(Logger::default())
    }
}
