//! Values seeded into every per-request injector.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::server::IncomingRequest;

/// String tokens of the request-scoped bindings.
pub mod tokens {
    pub const URL: &str = "url";
    pub const UUID: &str = "UUID";
    pub const DATA: &str = "data";
    pub const REQUEST: &str = "request";
    pub const RESPONSE: &str = "response";
    pub const MODULES: &str = "modules";
}

/// Parsed request URL, absolute against the request's `Host`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestUrl(Url);

impl RequestUrl {
    /// Never fails: a missing or malformed `Host` falls back to `localhost`,
    /// and a target that cannot be joined onto the base leaves just the base.
    pub fn parse(request: &IncomingRequest) -> Self {
        let raw = request.url();

        // Absolute-form targets carry their own scheme and authority.
        if request.uri().scheme().is_some() {
            if let Ok(url) = Url::parse(&raw) {
                return RequestUrl(url);
            }
        }

        let base = base_url(request.header("host"));
        match base.join(&raw) {
            Ok(url) => RequestUrl(url),
            Err(err) => {
                tracing::debug!(url = %raw, error = %err, "unparsable request target");
                RequestUrl(base)
            }
        }
    }

    pub fn query_params(&self) -> HashMap<String, String> {
        self.0.query_pairs().into_owned().collect()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl Deref for RequestUrl {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Base for requests without a usable `Host` header.
static LOCALHOST: Lazy<Url> =
    Lazy::new(|| Url::parse("http://localhost/").expect("literal url is valid"));

fn base_url(host: Option<&str>) -> Url {
    let Some(host) = host else {
        return LOCALHOST.clone();
    };
    Url::parse(&format!("http://{host}/")).unwrap_or_else(|err| {
        tracing::debug!(host, error = %err, "ignoring invalid host header");
        LOCALHOST.clone()
    })
}

/// Fresh identifier per request, used to correlate log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        CorrelationId(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Mutable bag for passing values between the steps of one request.
#[derive(Debug, Default)]
pub struct RequestData {
    entries: Mutex<Vec<Value>>,
}

impl RequestData {
    pub fn push(&self, value: Value) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
