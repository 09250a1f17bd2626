//! JSON HTTP API over the retrieval engine.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/stats` | Index statistics |
//! | `POST` | `/query` | `{ "question": "...", "k": 3 }` → ranked fragments + answer |
//! | `POST` | `/ingest?filename=notes.pdf` | Raw document bytes → ingest report |
//! | `POST` | `/clear` | Delete the index |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "invalid_config", "message": "k must be >= 1" } }
//! ```
//!
//! Codes come from [`RetrievalError::code`]: `invalid_config`,
//! `source_unreadable`, `dimension_mismatch` and `length_mismatch` are 400;
//! `embedding_unavailable` and `storage_unavailable` are 503. Anything else
//! is `internal` (500).
//!
//! # Concurrency
//!
//! The engine sits behind one mutex, so requests run one at a time. Engine
//! calls are synchronous and run on tokio's blocking pool.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser front end
//! can be served from anywhere.

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use konspekt_core::models::IngestReport;
use konspekt_core::RetrievalError;

use crate::config::Config;
use crate::engine::{build_engine, AppEngine};
use crate::extract::{Format, SUPPORTED_EXTENSIONS};
use crate::search::{answer_question, QueryResponse};
use crate::stats::{collect_stats, IndexStats};

/// Largest accepted request body (uploads included).
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    engine: Arc<Mutex<AppEngine>>,
}

/// Build the router around an engine. Exposed for in-process tests.
pub fn build_router(config: Config, engine: AppEngine) -> Router {
    let state = AppState {
        config: Arc::new(config),
        engine: Arc::new(Mutex::new(engine)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route("/query", post(handle_query))
        .route("/ingest", post(handle_ingest))
        .route("/clear", post(handle_clear))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process ends.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let bind_addr = config.server.bind.clone();
    let app = build_router(config.clone(), engine);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
    println!("Konspekt server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        let status = match err {
            RetrievalError::InvalidConfig(_)
            | RetrievalError::SourceUnreadable { .. }
            | RetrievalError::DimensionMismatch { .. }
            | RetrievalError::LengthMismatch { .. } => StatusCode::BAD_REQUEST,
            RetrievalError::EmbeddingUnavailable(_) | RetrievalError::StorageUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        if status.is_server_error() {
            tracing::warn!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Run `f` against the locked engine on the blocking pool.
async fn with_engine<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&mut AppEngine) -> Result<T, RetrievalError> + Send + 'static,
    T: Send + 'static,
{
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = engine
            .lock()
            .map_err(|_| internal("engine lock poisoned"))?;
        f(&mut *guard).map_err(AppError::from)
    })
    .await
    .map_err(|e| internal(format!("engine task failed: {}", e)))?
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<IndexStats>, AppError> {
    let stats = with_engine(&state, |engine| Ok(collect_stats(engine.index()))).await?;
    Ok(Json(stats))
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
    #[serde(default)]
    k: Option<usize>,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let config = state.config.clone();
    let response = with_engine(&state, move |engine| {
        answer_question(engine, &config, &req.question, req.k)
    })
    .await?;
    Ok(Json(response))
}

// ============ POST /ingest ============

#[derive(Deserialize)]
struct IngestParams {
    filename: Option<String>,
}

/// Writes the body to a temp directory under its original file name, ingests
/// it, and removes it again whatever the outcome.
async fn handle_ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> Result<Json<IngestReport>, AppError> {
    let raw_name = params.filename.as_deref().ok_or_else(|| {
        AppError::from(RetrievalError::InvalidConfig(
            "missing ?filename= query parameter".to_string(),
        ))
    })?;
    let name = Path::new(raw_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            AppError::from(RetrievalError::InvalidConfig(format!(
                "invalid filename '{}'",
                raw_name
            )))
        })?;
    if Format::from_path(Path::new(&name)).is_none() {
        return Err(RetrievalError::unreadable(
            name,
            format!(
                "unsupported file type (expected one of: {})",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        )
        .into());
    }

    let report = with_engine(&state, move |engine| {
        let upload_dir = tempfile::tempdir()
            .map_err(|e| RetrievalError::StorageUnavailable(format!("temp dir: {}", e)))?;
        let path = upload_dir.path().join(&name);
        std::fs::write(&path, &body)
            .map_err(|e| RetrievalError::StorageUnavailable(format!("temp file: {}", e)))?;
        engine.ingest(&path)
    })
    .await?;
    Ok(Json(report))
}

// ============ POST /clear ============

#[derive(Serialize)]
struct ClearResponse {
    fragments: usize,
}

async fn handle_clear(State(state): State<AppState>) -> Result<Json<ClearResponse>, AppError> {
    with_engine(&state, |engine| engine.clear()).await?;
    Ok(Json(ClearResponse { fragments: 0 }))
}
