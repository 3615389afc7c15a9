//! Debug tracing of request and response exchanges.
//!
//! The client renders each exchange as text lines and hands them to a
//! `RequestTracer`. The default tracer forwards them to `tracing` at debug
//! level; tests can inject their own tracer to inspect what was emitted.

use crate::http::{HttpRequest, HttpResponse};

pub const TRACE_TARGET: &str = "aerospike_rest";

const EMPTY_BODY: &str = "<EMPTY BODY>";

/// Receives rendered trace lines. Implementations must not panic.
pub trait RequestTracer: Send + Sync {
    fn trace(&self, line: &str);
}

/// Forwards trace lines to `tracing::debug!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTracer;

impl RequestTracer for TracingTracer {
    fn trace(&self, line: &str) {
        tracing::debug!(target: TRACE_TARGET, "{line}");
    }
}

/// Discards all trace lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl RequestTracer for NoopTracer {
    fn trace(&self, _line: &str) {}
}

pub(crate) fn trace_request(tracer: &dyn RequestTracer, request: &HttpRequest) {
    tracer.trace("--- [REQUEST] ----------------------------------");
    tracer.trace(&format!("{} {}", request.method, request.url));
    for (name, value) in &request.headers {
        tracer.trace(&header_line(name, value));
    }
    tracer.trace(request.body.as_deref().unwrap_or(EMPTY_BODY));
}

pub(crate) fn trace_response(tracer: &dyn RequestTracer, response: &HttpResponse) {
    tracer.trace("--- [RESPONSE] ---------------------------------");
    tracer.trace(&format!("Status: {}", response.status));
    for (name, value) in &response.headers {
        tracer.trace(&header_line(name, value));
    }
    let text = response.text();
    let body = if text.is_empty() { EMPTY_BODY } else { &*text };
    tracer.trace(&format!("Body:\n{body}"));
}

fn header_line(name: &str, value: &str) -> String {
    format!("{name:24}: {value}")
}
