//! In-memory stand-in for the Aerospike REST gateway.
//!
//! Serves the key-value record endpoints with the gateway's error shapes
//! (403/404/409 with a JSON body), plus `/v1/echo` and `/v1/status/{code}`
//! helpers that let client tests observe what went over the wire.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// Aerospike result codes used in error bodies.
pub const KEY_NOT_FOUND_ERROR: i32 = 2;
pub const KEY_EXISTS_ERROR: i32 = 5;
pub const NOT_AUTHENTICATED: i32 = 80;

pub type Bins = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub bins: Bins,
    pub generation: u32,
    pub ttl: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RecordKey {
    namespace: String,
    set: String,
    key: String,
}

type Db = Arc<RwLock<HashMap<RecordKey, Record>>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    authorization: Option<Arc<str>>,
}

/// Gateway that accepts every request.
pub fn app() -> Router {
    app_with_authorization(None)
}

/// Gateway that rejects requests whose `Authorization` header is not exactly
/// `authorization` (when set) with 403.
pub fn app_with_authorization(authorization: Option<String>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(HashMap::new())),
        authorization: authorization.map(Arc::from),
    };
    Router::new()
        .route(
            "/v1/kvs/{namespace}/{set}/{key}",
            get(get_record)
                .post(create_record)
                .put(replace_record)
                .patch(update_record)
                .delete(delete_record),
        )
        .route("/v1/echo", get(echo).post(echo).put(echo).patch(echo).delete(echo))
        .route("/v1/status/{code}", get(status))
        .layer(middleware::from_fn_with_state(state.clone(), require_authorization))
        .with_state(state)
}

pub async fn run(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

/// The JSON error body the gateway returns for application errors.
pub fn error_body(code: i32, message: &str) -> Value {
    json!({
        "inDoubt": false,
        "internalErrorCode": code,
        "message": message,
    })
}

fn api_error(status: StatusCode, code: i32, message: &str) -> Response {
    (status, Json(error_body(code, message))).into_response()
}

fn not_found() -> Response {
    api_error(
        StatusCode::NOT_FOUND,
        KEY_NOT_FOUND_ERROR,
        "AerospikeError: KEY_NOT_FOUND_ERROR",
    )
}

async fn require_authorization(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.authorization.as_deref() {
        let given = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            debug!(path = %request.uri().path(), "rejecting unauthenticated request");
            return api_error(
                StatusCode::FORBIDDEN,
                NOT_AUTHENTICATED,
                "AerospikeError: NOT_AUTHENTICATED",
            );
        }
    }
    next.run(request).await
}

fn record_key((namespace, set, key): (String, String, String)) -> RecordKey {
    RecordKey { namespace, set, key }
}

async fn get_record(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String)>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let db = state.db.read().await;
    let Some(record) = db.get(&record_key(path)) else {
        return not_found();
    };
    let mut record = record.clone();
    if let Some(wanted) = query.get("recordBins") {
        let wanted: Vec<&str> = wanted.split(',').collect();
        record.bins.retain(|name, _| wanted.contains(&name.as_str()));
    }
    Json(record).into_response()
}

async fn create_record(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String)>,
    Json(bins): Json<Bins>,
) -> Response {
    let mut db = state.db.write().await;
    let key = record_key(path);
    if db.contains_key(&key) {
        return api_error(
            StatusCode::CONFLICT,
            KEY_EXISTS_ERROR,
            "AerospikeError: KEY_EXISTS_ERROR",
        );
    }
    db.insert(
        key,
        Record {
            bins,
            generation: 1,
            ttl: -1,
        },
    );
    StatusCode::NO_CONTENT.into_response()
}

async fn replace_record(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String)>,
    Json(bins): Json<Bins>,
) -> Response {
    let mut db = state.db.write().await;
    let Some(record) = db.get_mut(&record_key(path)) else {
        return not_found();
    };
    record.bins = bins;
    record.generation += 1;
    StatusCode::NO_CONTENT.into_response()
}

async fn update_record(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String)>,
    Json(bins): Json<Bins>,
) -> Response {
    let mut db = state.db.write().await;
    let Some(record) = db.get_mut(&record_key(path)) else {
        return not_found();
    };
    record.bins.extend(bins);
    record.generation += 1;
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_record(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String)>,
) -> Response {
    let mut db = state.db.write().await;
    match db.remove(&record_key(path)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

/// Reflect the request's headers and query parameters back as JSON.
async fn echo(
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: String,
) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(json!({
        "headers": headers,
        "query": query,
        "body": body,
    }))
}

/// Respond with `code` and a plain-text body (empty for bodiless statuses).
async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match status.as_u16() {
        204 | 205 | 304 => status.into_response(),
        _ => (status, format!("status {}", status.as_u16())).into_response(),
    }
}
