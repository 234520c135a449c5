//! MCP-compatible HTTP server.
//!
//! Exposes the example tools both as a plain JSON HTTP API and as a
//! standard MCP Streamable HTTP endpoint (see [`crate::mcp`]).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/tools/list` | List tools with parameter schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `*`    | `/mcp` | MCP JSON-RPC over Streamable HTTP |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "example not found: Foo.cs" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `corpus_unavailable` (503), `internal` (500).
//!
//! # Client Integration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "csla": { "url": "http://localhost:8080/mcp" }
//!   }
//! }
//! ```

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::CorpusError;
use crate::mcp::McpBridge;
use crate::tools::{self, ToolCall, ToolError, ToolInfo, ToolKind};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Build the application router (HTTP API + MCP endpoint).
pub fn build_router(config: Arc<Config>) -> Router {
    let mcp_config = config.clone();
    let mcp_service = StreamableHttpService::new(
        move || Ok(McpBridge::new(mcp_config.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(AppState { config })
}

/// Starts the HTTP server on `[server].bind` and runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());

    if !config.corpus.root.is_dir() {
        tracing::warn!(
            root = %config.corpus.root.display(),
            "examples directory does not exist; searches will fail until it does"
        );
    }

    let app = build_router(config.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        root = %config.corpus.root.display(),
        "MCP server listening on http://{}/mcp",
        bind_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: &'static str,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
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

impl From<ToolError> for AppError {
    fn from(err: ToolError) -> Self {
        let (status, code) = match &err {
            ToolError::UnknownTool(_) | ToolError::Corpus(CorpusError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            ToolError::InvalidArguments { .. }
            | ToolError::Corpus(CorpusError::InvalidName { .. }) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            ToolError::Corpus(CorpusError::CorpusUnavailable { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "corpus_unavailable")
            }
            ToolError::Corpus(_) | ToolError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        if status.is_server_error() {
            tracing::warn!(error = %err, "tool call failed");
        }

        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools() -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: ToolKind::ALL.into_iter().map(ToolKind::info).collect(),
    })
}

// ============ POST /tools/{name} ============

/// Decodes the call into a [`ToolCall`] and executes it.
///
/// Returns `404` for unknown tools and missing examples, `400` for bad
/// arguments or a body that is not JSON, `503` when the examples directory
/// is unavailable.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(params) = payload.map_err(|rejection| AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: rejection.body_text(),
    })?;

    let call = ToolCall::decode(&name, params)?;
    let output = tools::execute(call, state.config.clone()).await?;
    let result = output.to_json()?;

    Ok(Json(serde_json::json!({ "result": result })))
}
