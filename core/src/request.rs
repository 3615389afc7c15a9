//! Per-call request options.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Body, query parameters, header overrides and read timeout for one call.
///
/// Parameters and headers set here replace the client's defaults of the same
/// name; defaults with other names are still sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub(crate) body: Option<Value>,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            body: None,
            params: Vec::new(),
            headers: Vec::new(),
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `body` as the JSON request body.
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `body` into the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        upsert(&mut self.params, name.into(), value.to_string(), |a, b| a == b);
        self
    }

    /// Add or replace a header. Names match case-insensitively.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.headers, name.into(), value.into(), |a, b| {
            a.eq_ignore_ascii_case(b)
        });
        self
    }

    /// Read timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn body_value(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn read_timeout(&self) -> Duration {
        self.timeout
    }
}

/// Insert `(name, value)`, replacing the value of an existing matching key in place.
pub(crate) fn upsert(
    pairs: &mut Vec<(String, String)>,
    name: String,
    value: String,
    same: fn(&str, &str) -> bool,
) {
    match pairs.iter_mut().find(|(k, _)| same(k, &name)) {
        Some(entry) => entry.1 = value,
        None => pairs.push((name, value)),
    }
}
