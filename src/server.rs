//! JSON HTTP server for the retrieval entry point.
//!
//! The chat completion service calls `POST /context` with the user's
//! question and splices the returned block into its system prompt.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/context` | Citation-annotated context for a query |
//! | `POST` | `/search` | Query intent plus ranked results |
//! | `GET`  | `/health` | Status, version and store summary |
//!
//! Request bodies are `{"query": "...", "top_k"?, "min_similarity"?, "filter_by"?}`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `timeout` (408), `provider_error` (502),
//! `consistency_error` (500), `internal` (500). A body that is not valid
//! JSON or lacks `query` is a `bad_request` too.
//!
//! A request that exceeds `[server].request_timeout_secs` is dropped, which
//! cancels the in-flight embedding call.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RagError;
use crate::intent::analyze_query;
use crate::models::{QueryIntent, SearchResult};
use crate::search::{Retriever, SearchOptions};

#[derive(Clone)]
struct AppState {
    retriever: Arc<Retriever>,
    request_timeout: Duration,
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let retriever = Retriever::from_config(config)?;
    let timeout = Duration::from_secs(config.server.request_timeout_secs);

    info!(
        chunks = retriever.store().len(),
        model = %retriever.store().model(),
        "retriever ready"
    );

    let app = router(retriever, timeout);

    println!("ragctx server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Exposed so tests can serve it on an ephemeral port.
pub fn router(retriever: Retriever, request_timeout: Duration) -> Router {
    let state = AppState {
        retriever: Arc::new(retriever),
        request_timeout,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/context", post(handle_context))
        .route("/search", post(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }

    fn timeout(after: Duration) -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            code: "timeout",
            message: format!("request timed out after {}s", after.as_secs()),
        }
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        let (status, code) = match &err {
            RagError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            RagError::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            RagError::Consistency(_) => (StatusCode::INTERNAL_SERVER_ERROR, "consistency_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            warn!(error = %err, code, "request failed");
        }
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
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

async fn with_timeout<T, F>(after: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, RagError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::timeout(after)),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(flatten)]
    options: SearchOptions,
}

impl QueryRequest {
    fn checked(body: Result<Json<Self>, JsonRejection>) -> Result<Self, AppError> {
        let Json(req) = body?;
        req.validate()?;
        Ok(req)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.query.trim().is_empty() {
            return Err(AppError::bad_request("query must not be empty"));
        }
        self.options.validate()?;
        Ok(())
    }
}

// ============ POST /context ============

#[derive(Serialize)]
struct ContextResponse {
    context: String,
}

async fn handle_context(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ContextResponse>, AppError> {
    let req = QueryRequest::checked(body)?;
    let context = with_timeout(
        state.request_timeout,
        state.retriever.get_relevant_context(&req.query, &req.options),
    )
    .await?;
    Ok(Json(ContextResponse { context }))
}

// ============ POST /search ============

#[derive(Serialize)]
struct SearchResponse {
    intent: QueryIntent,
    results: Vec<SearchResult>,
}

async fn handle_search(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let req = QueryRequest::checked(body)?;
    let results = with_timeout(
        state.request_timeout,
        state.retriever.search_with_intent(&req.query, &req.options),
    )
    .await?;
    Ok(Json(SearchResponse {
        intent: analyze_query(&req.query),
        results,
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
    dims: usize,
    chunks: usize,
    created_at: DateTime<Utc>,
    catalog_items: usize,
    top_k: usize,
    min_similarity: f32,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.retriever.store();
    let policy = state.retriever.policy();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: store.model().to_string(),
        dims: store.dims(),
        chunks: store.len(),
        created_at: store.created_at(),
        catalog_items: state.retriever.mapper().catalog_len(),
        top_k: policy.top_k,
        min_similarity: policy.min_similarity,
    })
}
