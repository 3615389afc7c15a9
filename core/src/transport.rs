//! Execution of `HttpRequest` values over the network.
//!
//! # Design
//! The client never talks to the network directly; it hands a fully built
//! `HttpRequest` to a `Transport` and classifies the `HttpResponse` it gets
//! back. Transports report every status code as data and only fail when no
//! response was received at all (connect failure, timeout, I/O).

use std::io;

use tracing::trace;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP exchange. Implementations must be safe to share across
/// threads; the client calls `execute` exactly once per operation.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Largest response body `UreqTransport` reads by default: unbounded.
pub const DEFAULT_BODY_LIMIT: u64 = u64::MAX;

/// Blocking transport backed by a single `ureq::Agent`.
///
/// The agent is created once and reused for every request so keep-alive
/// connections are pooled across calls. Response bodies are read in full up to
/// `body_limit` bytes (see [`UreqTransport::with_body_limit`]).
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl Default for UreqTransport {
    fn default() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of response body bytes read per request. A larger body
    /// fails the call with `TransportError::Other`.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn body_limit(&self) -> u64 {
        self.body_limit
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref();

        let agent = &self.agent;
        let result = match request.method {
            HttpMethod::Get => send_without_body(prepare(agent.get(url), request), body),
            HttpMethod::Delete => send_without_body(prepare(agent.delete(url), request), body),
            HttpMethod::Post => send_with_body(prepare(agent.post(url), request), body),
            HttpMethod::Put => send_with_body(prepare(agent.put(url), request), body),
            HttpMethod::Patch => send_with_body(prepare(agent.patch(url), request), body),
        };
        let mut response = result.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(map_error)?;
        trace!(status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

type UreqResult = Result<ureq::http::Response<ureq::Body>, ureq::Error>;

/// Apply query, headers and the connect/read timeouts to a request builder.
fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.query {
        builder = builder.query(name, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let read = Some(request.timeouts.read);
    builder
        .config()
        .timeout_connect(Some(request.timeouts.connect))
        .timeout_recv_response(read)
        .timeout_recv_body(read)
        .build()
}

fn send_without_body(builder: RequestBuilder<WithoutBody>, body: Option<&str>) -> UreqResult {
    match body {
        Some(body) => builder.force_send_body().send(body.as_bytes()),
        None => builder.call(),
    }
}

fn send_with_body(builder: RequestBuilder<WithBody>, body: Option<&str>) -> UreqResult {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(which) => TransportError::Timeout(format!("{which:?}")),
        ureq::Error::HostNotFound => TransportError::Connect("host not found".to_string()),
        ureq::Error::ConnectionFailed => TransportError::Connect("connection failed".to_string()),
        ureq::Error::Io(err) => map_io_error(err),
        other => TransportError::Other(other.to_string()),
    }
}

fn map_io_error(err: io::Error) -> TransportError {
    match err.kind() {
        io::ErrorKind::TimedOut => TransportError::Timeout(err.to_string()),
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::AddrNotAvailable => TransportError::Connect(err.to_string()),
        _ => TransportError::Io(err.to_string()),
    }
}
