use anyhow::Result;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pagedex_core::{Catalog, ExtractorSet, IndexConfig, IndexStore, SearchHit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 3 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_pages: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub message: String,
    pub pages: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

/// Error body `{ "error": ... }` with a status derived from the core error kind.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl From<pagedex_core::Error> for ApiError {
    fn from(e: pagedex_core::Error) -> Self {
        let status = if e.is_input_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(e, pagedex_core::Error::NotFound { .. }) {
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(error = %e, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self { status, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Open (or create) the index under `index_dir` and build the router around it.
pub fn build_app(index_dir: &str, config: IndexConfig) -> Result<Router> {
    let catalog = Catalog::open(IndexStore::new(index_dir), config, Box::new(ExtractorSet::standard()))?;
    tracing::info!(index_dir, num_pages = catalog.snapshot().num_pages(), "catalog opened");
    Ok(router(Arc::new(catalog)))
}

pub fn router(catalog: Arc<Catalog>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/upload", post(upload_handler))
        .route("/search", get(search_handler))
        .route("/documents", get(documents_handler))
        .route("/documents/:doc_id", axum::routing::delete(delete_handler))
        .route("/documents/:doc_id/pages/:page", get(page_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(AppState { catalog })
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to pagedex! Upload a .pdf or .txt document to /upload, then query /search?q=...",
    }))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    if params.k == 0 {
        return Err(ApiError::bad_request("k must be a positive integer"));
    }
    let start = std::time::Instant::now();
    let index = state.catalog.snapshot();
    let results = pagedex_core::search_with(&params.q, params.k, &index, &state.catalog.config().snippet);
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_pages: index.num_pages(),
        results,
    }))
}

/// Multipart upload, field `file`. The file name becomes the document id.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::bad_request(e.body_text()))? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::bad_request("file field has no file name"))?;
        let data = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
        upload = Some((name, data.to_vec()));
        break;
    }
    let (name, data) = upload.ok_or_else(|| ApiError::bad_request("missing multipart field 'file'"))?;

    let catalog = Arc::clone(&state.catalog);
    let report = tokio::task::spawn_blocking(move || catalog.ingest(&name, &data))
        .await
        .map_err(|e| ApiError::internal(format!("indexing task failed: {e}")))??;
    Ok(Json(UploadResponse {
        ok: true,
        message: format!("Indexed {}", report.document_id),
        pages: report.pages,
    }))
}

async fn documents_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "documents": state.catalog.documents() }))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let catalog = Arc::clone(&state.catalog);
    let removed = tokio::task::spawn_blocking(move || catalog.remove_document(&doc_id))
        .await
        .map_err(|e| ApiError::internal(format!("indexing task failed: {e}")))??;
    Ok(Json(serde_json::json!({ "ok": true, "removed_pages": removed })))
}

async fn page_handler(
    State(state): State<AppState>,
    Path((doc_id, page)): Path<(String, u32)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state
        .catalog
        .page(&doc_id, page)
        .ok_or_else(|| pagedex_core::Error::NotFound { kind: "page", name: format!("{doc_id}#{page}") })?;
    Ok(Json(serde_json::json!({
        "document_id": record.document_id,
        "page_number": record.page_number,
        "text": record.text,
    })))
}

async fn rebuild_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let catalog = Arc::clone(&state.catalog);
    let pages = tokio::task::spawn_blocking(move || catalog.rebuild())
        .await
        .map_err(|e| ApiError::internal(format!("indexing task failed: {e}")))??;
    Ok(Json(serde_json::json!({ "ok": true, "pages": pages })))
}
