//! Request dispatch and response classification for the REST gateway.
//!
//! # Design
//! `RestClient` holds a `ClientConfig`, a shared `Transport` and a
//! `RequestTracer`, and carries no mutable state between calls. Every verb
//! method goes through `request`, which is split into two pure halves around
//! the single transport call:
//!
//! - `build_request` merges config defaults with per-call options into a
//!   complete `HttpRequest`;
//! - `classify_response` turns the `HttpResponse` into a JSON value or an
//!   `Error`.
//!
//! Both halves are public so they can be exercised without a network.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, Error, API_ERROR_STATUSES};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Timeouts};
use crate::request::{upsert, RequestOptions};
use crate::trace::{trace_request, trace_response, RequestTracer, TracingTracer};
use crate::transport::{Transport, UreqTransport};

/// Synchronous client for the Aerospike REST gateway.
///
/// Cloning is cheap and clones share the underlying transport, so one client
/// can serve many threads.
#[derive(Clone)]
pub struct RestClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tracer: Arc<dyn RequestTracer>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create a client that talks to the gateway over a pooled `ureq` agent.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            tracer: Arc::new(TracingTracer),
        }
    }

    /// Replace the tracer that receives request/response debug lines.
    pub fn with_tracer(mut self, tracer: Arc<dyn RequestTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, path: &str, options: &RequestOptions) -> Result<Value, Error> {
        self.request(HttpMethod::Get, path, options)
    }

    pub fn post(&self, path: &str, options: &RequestOptions) -> Result<Value, Error> {
        self.request(HttpMethod::Post, path, options)
    }

    pub fn put(&self, path: &str, options: &RequestOptions) -> Result<Value, Error> {
        self.request(HttpMethod::Put, path, options)
    }

    pub fn patch(&self, path: &str, options: &RequestOptions) -> Result<Value, Error> {
        self.request(HttpMethod::Patch, path, options)
    }

    pub fn delete(&self, path: &str, options: &RequestOptions) -> Result<Value, Error> {
        self.request(HttpMethod::Delete, path, options)
    }

    /// Send one request and classify the response. Never retries.
    ///
    /// Returns the decoded JSON body, `Value::Null` for a non-JSON body with
    /// a non-error status, or an `Error`.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value, Error> {
        let request = self.build_request(method, path, options)?;
        trace_request(self.tracer.as_ref(), &request);

        let response = self.transport.execute(&request)?;
        trace_response(self.tracer.as_ref(), &response);

        classify_response(&request.url, response)
    }

    /// Merge config defaults with `options` into the request that would be sent.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, Error> {
        let mut query = vec![(
            "compress".to_string(),
            self.config.client_compression().to_string(),
        )];
        for (name, value) in &options.params {
            upsert(&mut query, name.clone(), value.clone(), |a, b| a == b);
        }

        let mut headers = vec![("User-Agent".to_string(), self.config.user_agent().to_string())];
        if self.config.http_compression() {
            headers.push(("Accept-Encoding".to_string(), "gzip".to_string()));
        }
        if let Some(authorization) = self.config.authorization() {
            headers.push(("Authorization".to_string(), authorization.to_string()));
        }

        let body = options.body.as_ref().map(serde_json::to_string).transpose()?;
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        for (name, value) in &options.headers {
            upsert(&mut headers, name.clone(), value.clone(), |a, b| {
                a.eq_ignore_ascii_case(b)
            });
        }

        Ok(HttpRequest {
            method,
            url: join_url(self.config.base_url(), path),
            query,
            headers,
            body,
            timeouts: Timeouts {
                connect: self.config.connect_timeout(),
                read: options.timeout,
            },
        })
    }
}

/// Interpret a gateway response.
///
/// A JSON body is returned as-is unless the status is 403, 404 or 409, which
/// the gateway uses for application errors. A body that is not JSON is only
/// an error when the status is 4xx/5xx; its bytes are kept as lossy UTF-8.
pub fn classify_response(url: &str, response: HttpResponse) -> Result<Value, Error> {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(body) if API_ERROR_STATUSES.contains(&response.status) => {
            Err(ApiError::new(body, response.status).into())
        }
        Ok(body) => Ok(body),
        Err(_) if response.is_error_status() => Err(Error::Http {
            status: response.status,
            url: url.to_string(),
            body: response.text().into_owned(),
        }),
        Err(_) => Ok(Value::Null),
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use mockall::predicate::always;
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;
    use crate::trace::NoopTracer;
    use crate::transport::MockTransport;

    const VERBS: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    fn success_body() -> Value {
        json!({"inDoubt": false, "internalErrorCode": 0, "message": "success message"})
    }

    fn error_body() -> Value {
        json!({"inDoubt": true, "internalErrorCode": -1, "message": "error message"})
    }

    fn response(status: u16, body: impl AsRef<[u8]>) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_ref().to_vec(),
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("http://foo").unwrap()
    }

    fn client(config: ClientConfig) -> RestClient {
        RestClient::with_transport(config, Arc::new(MockTransport::new()))
    }

    /// A client whose transport answers every call with `status` and `body`.
    fn client_returning(status: u16, body: impl AsRef<[u8]>) -> RestClient {
        let body = body.as_ref().to_vec();
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(move |_| Ok(response(status, &body)));
        RestClient::with_transport(config(), Arc::new(transport))
    }

    fn call(
        client: &RestClient,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value, Error> {
        match method {
            HttpMethod::Get => client.get(path, options),
            HttpMethod::Post => client.post(path, options),
            HttpMethod::Put => client.put(path, options),
            HttpMethod::Patch => client.patch(path, options),
            HttpMethod::Delete => client.delete(path, options),
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn each_verb_calls_transport_once_with_its_method() {
        for method in VERBS {
            let mut transport = MockTransport::new();
            transport
                .expect_execute()
                .withf(move |req| req.method == method && req.url == "http://foo/bar")
                .times(1)
                .returning(|_| Ok(response(200, "")));
            let client = RestClient::with_transport(config(), Arc::new(transport));

            call(&client, method, "/bar", &RequestOptions::new()).unwrap();
        }
    }

    #[test]
    fn success_returns_json_body() {
        for method in VERBS {
            let client = client_returning(200, &success_body().to_string())
                .with_tracer(Arc::new(NoopTracer));
            let body = call(&client, method, "/bar", &RequestOptions::new()).unwrap();
            assert_eq!(body, success_body());
        }
    }

    #[test]
    fn api_error_statuses_raise_api_error() {
        for status in [403, 404, 409] {
            let client = client_returning(status, &error_body().to_string());
            let err = client.get("/bar", &RequestOptions::new()).unwrap_err();
            let api = err.api_error().expect("expected ApiError");
            assert_eq!(api.status(), status);
            assert_eq!(api.body(), &error_body());
        }
    }

    #[test]
    fn other_statuses_with_json_are_returned() {
        for status in [400, 401, 500, 201] {
            let client = client_returning(status, &error_body().to_string());
            assert_eq!(client.get("/bar", &RequestOptions::new()).unwrap(), error_body());
        }
    }

    #[test]
    fn unexpected_statuses_without_json_are_http_errors() {
        for status in [410, 500, 403] {
            let client = client_returning(status, "<html>Gone</html>");
            let err = client.get("/bar", &RequestOptions::new()).unwrap_err();
            assert!(!err.is_api_error(), "{status}: must not be ApiError");
            match err {
                Error::Http { status: got, url, body } => {
                    assert_eq!(got, status);
                    assert_eq!(url, "http://foo/bar");
                    assert_eq!(body, "<html>Gone</html>");
                }
                other => panic!("{status}: unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn non_error_status_without_json_is_null() {
        for status in [200, 204, 205] {
            let client = client_returning(status, "");
            assert_eq!(client.get("/bar", &RequestOptions::new()).unwrap(), Value::Null);
        }
    }

    #[test]
    fn non_utf8_bodies_are_classified_not_rejected() {
        let garbage = [0xff, 0xfe, 0x00, 0x80];

        let err = client_returning(500, garbage)
            .get("/bar", &RequestOptions::new())
            .unwrap_err();
        match err {
            Error::Http { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "\u{fffd}\u{fffd}\u{0}\u{fffd}");
            }
            other => panic!("expected Error::Http, got {other:?}"),
        }

        let value = client_returning(200, garbage)
            .get("/bar", &RequestOptions::new())
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn transport_errors_propagate_without_retry() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .with(always())
            .times(1)
            .returning(|_| Err(TransportError::Timeout("Connect".to_string())));
        let client = RestClient::with_transport(config(), Arc::new(transport));

        let err = client.post("/bar", &RequestOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Timeout(_))));
    }

    #[test]
    fn default_headers_params_and_timeouts() {
        let client = client(config());
        assert_eq!(client.config().base_url(), "http://foo");

        let req = client
            .build_request(HttpMethod::Get, "/bar", &RequestOptions::new())
            .unwrap();
        assert_eq!(req.url, "http://foo/bar");
        assert_eq!(
            req.headers,
            pairs(&[("User-Agent", "aerospike-rest/0.1.0"), ("Accept-Encoding", "gzip")])
        );
        assert_eq!(req.query, pairs(&[("compress", "true")]));
        assert_eq!(req.body, None);
        assert_eq!(
            req.timeouts,
            Timeouts {
                connect: Duration::from_secs(2),
                read: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn optional_headers_extend_and_override_defaults() {
        let options = RequestOptions::new()
            .header("Foo", "Bar")
            .header("accept-encoding", "identity");
        let req = client(config())
            .build_request(HttpMethod::Get, "bar", &options)
            .unwrap();
        assert_eq!(
            req.headers,
            pairs(&[
                ("User-Agent", "aerospike-rest/0.1.0"),
                ("Accept-Encoding", "identity"),
                ("Foo", "Bar"),
            ])
        );
    }

    #[test]
    fn optional_params_extend_and_override_defaults() {
        let options = RequestOptions::new().param("Foo", "Bar").param("compress", false);
        let req = client(config())
            .build_request(HttpMethod::Get, "/bar", &options)
            .unwrap();
        assert_eq!(req.query, pairs(&[("compress", "false"), ("Foo", "Bar")]));
    }

    #[test]
    fn optional_timeouts() {
        let config = config().with_connect_timeout(Duration::from_secs(999));
        let options = RequestOptions::new().timeout(Duration::from_secs(7));
        let req = client(config)
            .build_request(HttpMethod::Get, "/bar", &options)
            .unwrap();
        assert_eq!(req.timeouts.connect, Duration::from_secs(999));
        assert_eq!(req.timeouts.read, Duration::from_secs(7));
    }

    #[test]
    fn disabling_compression() {
        let config = config()
            .with_client_compression(false)
            .with_http_compression(false);
        let req = client(config)
            .build_request(HttpMethod::Get, "/bar", &RequestOptions::new())
            .unwrap();
        assert_eq!(req.header("Accept-Encoding"), None);
        assert_eq!(req.query_param("compress"), Some("false"));
    }

    #[test]
    fn authorization_and_user_agent() {
        let config = config()
            .with_authorization("Basic abcdefg=")
            .with_user_agent("bar");
        let req = client(config)
            .build_request(HttpMethod::Get, "/bar", &RequestOptions::new())
            .unwrap();
        assert_eq!(
            req.headers,
            pairs(&[
                ("User-Agent", "bar"),
                ("Accept-Encoding", "gzip"),
                ("Authorization", "Basic abcdefg="),
            ])
        );
    }

    #[test]
    fn body_is_serialized_with_content_type() {
        let options = RequestOptions::new().body(json!({"bin1": 1}));
        let req = client(config())
            .build_request(HttpMethod::Post, "/v1/kvs/test/demo/k", &options)
            .unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"bin1":1}"#));
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn url_join_uses_exactly_one_slash() {
        let c = client(ClientConfig::new("http://foo/api/").unwrap());
        for path in ["bar", "/bar", "//bar"] {
            let req = c.build_request(HttpMethod::Get, path, &RequestOptions::new()).unwrap();
            assert_eq!(req.url, "http://foo/api/bar", "{path}");
        }
    }

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl RequestTracer for Lines {
        fn trace(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn exchange_is_traced_through_injected_tracer() {
        let tracer = Arc::new(Lines::default());
        let client = client_returning(404, &error_body().to_string()).with_tracer(tracer.clone());

        let err = client.get("/bar", &RequestOptions::new()).unwrap_err();
        assert!(err.is_api_error());

        let lines = tracer.0.lock().unwrap();
        assert_eq!(lines[0], "--- [REQUEST] ----------------------------------");
        assert!(lines.contains(&"GET http://foo/bar".to_string()));
        assert!(lines.contains(&"--- [RESPONSE] ---------------------------------".to_string()));
        assert!(lines.contains(&"Status: 404".to_string()));
        assert_eq!(lines.last(), Some(&format!("Body:\n{}", error_body())));
    }

    #[test]
    fn classify_is_usable_without_a_client() {
        let value = classify_response("http://foo/bar", response(200, r#""valid json""#)).unwrap();
        assert_eq!(value, json!("valid json"));
    }
}
