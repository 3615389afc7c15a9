//! Synchronous client for the Aerospike REST gateway.
//!
//! # Overview
//! Translates verb calls (`get`, `post`, `put`, `patch`, `delete`) into HTTP
//! requests against the gateway and normalizes the JSON responses. Each call
//! is exactly one round trip; nothing is retried.
//!
//! # Design
//! - `ClientConfig` holds the normalized base URL, credentials, user agent,
//!   connect timeout and compression flags.
//! - `RequestOptions` carries the per-call body, query params, header
//!   overrides and read timeout. Per-call values win over config defaults.
//! - `RestClient` builds an `HttpRequest`, executes it through an injected
//!   `Transport` (a pooled `ureq` agent by default) and classifies the
//!   `HttpResponse`: 403/404/409 with a JSON body become `ApiError`, other
//!   4xx/5xx without JSON become `Error::Http`.
//! - Request/response debug output goes through an injectable
//!   `RequestTracer` instead of a global logger.
//!
//! ```no_run
//! use aerospike_rest::{ClientConfig, RequestOptions, RestClient};
//!
//! # fn main() -> Result<(), aerospike_rest::Error> {
//! let config = ClientConfig::new("localhost:8080")?.with_basic_auth("admin", "admin");
//! let client = RestClient::new(config);
//!
//! let options = RequestOptions::new().body(serde_json::json!({"name": "Bob"}));
//! client.post("/v1/kvs/test/users/bob", &options)?;
//!
//! match client.get("/v1/kvs/test/users/alice", &RequestOptions::new()) {
//!     Ok(record) => println!("{record}"),
//!     Err(err) if err.status() == Some(404) => println!("no such user"),
//!     Err(err) => return Err(err),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod trace;
pub mod transport;

pub use client::{classify_response, RestClient};
pub use config::ClientConfig;
pub use error::{ApiError, Error, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Timeouts};
pub use request::RequestOptions;
pub use trace::{NoopTracer, RequestTracer, TracingTracer};
pub use transport::{Transport, UreqTransport};
