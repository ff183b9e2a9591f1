//! HTTP front for the content store.
//!
//! One content route plus a health check:
//! - `POST /` ingests the request body and answers `201` with its CID
//! - `GET /?cid=..[&timeout=..]` streams the content back
//! - `HEAD /?cid=..[&timeout=..]` answers `200` or `404` from a probe
//! - `GET /health` reports status, uptime and version
//!
//! Daemon diagnostics never reach a response body. They are recorded by the
//! store client's event sink.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use cachipfs::{Cid, DaemonTimeout, EphemeralArea, LaunchError, StoreClient, StoreError};
use futures::StreamExt;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;

/// Largest request body accepted by `POST /`.
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Shared state for web handlers
#[derive(Clone)]
pub struct WebState {
    pub store: StoreClient,
    /// Where uploaded bodies are staged before `add`
    pub uploads: EphemeralArea,
    pub start_time: Instant,
}

impl WebState {
    pub fn new(store: StoreClient) -> Self {
        let uploads = EphemeralArea::new(&store.config().ephemeral_dir);
        Self {
            store,
            uploads,
            start_time: Instant::now(),
        }
    }
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route(
            "/",
            get(fetch_content).head(probe_content).post(add_content),
        )
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Query parameters for the content route
#[derive(Debug, Deserialize)]
struct ContentQuery {
    cid: Option<String>,
    timeout: Option<String>,
}

impl ContentQuery {
    fn cid(&self) -> Result<Cid, ApiError> {
        let raw = self
            .cid
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("missing cid parameter".to_string()))?;
        Cid::from_str_checked(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
    }

    fn timeout(&self, default: DaemonTimeout) -> Result<DaemonTimeout, ApiError> {
        match self.timeout.as_deref() {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e: cachipfs::TimeoutError| ApiError::BadRequest(e.to_string())),
        }
    }
}

/// Failures as seen by an HTTP client.
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Store(StoreError),
    /// The CID resolved to a directory, which has no single byte stream.
    NotAFile,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<LaunchError> for ApiError {
    fn from(e: LaunchError) -> Self {
        ApiError::Store(StoreError::Launch(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Store(StoreError::OperationFailed) => {
                (StatusCode::BAD_GATEWAY, "store operation failed".to_string())
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, "content store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "store unavailable".to_string())
            }
            ApiError::NotAFile => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "cid is not a single file".to_string(),
            ),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Health check endpoint
async fn handle_health(State(state): State<WebState>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();

    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": uptime.as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ingest the request body and answer with its CID
#[tracing::instrument(name = "http.content.add", skip_all, fields(size = body.len()))]
async fn add_content(State(state): State<WebState>, body: Bytes) -> Result<Response, ApiError> {
    let upload = state.uploads.allocate().map_err(StoreError::Ephemeral)?;
    tokio::fs::write(upload.path(), &body)
        .await
        .map_err(StoreError::Ephemeral)?;

    let cid = state.store.add(upload.path()).await?;
    drop(upload);

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "cid": cid }))).into_response())
}

/// Answer 200 or 404 depending on whether the CID can be read
#[tracing::instrument(name = "http.content.probe", skip_all)]
async fn probe_content(
    State(state): State<WebState>,
    Query(query): Query<ContentQuery>,
) -> Result<StatusCode, ApiError> {
    let cid = query.cid()?;
    let timeout = query.timeout(state.store.config().probe_timeout)?;

    if state.store.is_available(&cid, timeout).await? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

/// Stream fetched content back to the client
#[tracing::instrument(name = "http.content.fetch", skip_all)]
async fn fetch_content(
    State(state): State<WebState>,
    Query(query): Query<ContentQuery>,
) -> Result<Response, ApiError> {
    let cid = query.cid()?;
    let timeout = query.timeout(state.store.config().fetch_timeout)?;

    let fetched = state.store.get(&cid, timeout).await?;

    let metadata = tokio::fs::metadata(fetched.path())
        .await
        .map_err(StoreError::Ephemeral)?;
    if !metadata.is_file() {
        return Err(ApiError::NotAFile);
    }

    let file = tokio::fs::File::open(fetched.path())
        .await
        .map_err(StoreError::Ephemeral)?;

    // The guard rides along with the stream so the path outlives the body.
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _held = &fetched;
        chunk
    });

    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    if let Ok(value) = HeaderValue::from_str(cid.as_str()) {
        headers.insert("x-cid", value);
    }

    Ok(response)
}
