//! HTTP server.
//!
//! Exposes the tool registry over two surfaces sharing one process and one
//! database pool:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `*`    | `/mcp` | MCP Streamable HTTP endpoint (JSON-RPC) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "keywords must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `storage_missing`
//! (500), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin tool calls.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::mcp::McpBridge;
use crate::migrate;
use crate::tools::{validate_params, ToolContext, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: sqlx::SqlitePool,
    tools: Arc<ToolRegistry>,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated. The schema is applied on startup
/// so a fresh database works without a separate `init`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());

    let pool = db::connect(&config).await?;
    migrate::apply_schema(&pool).await?;

    let tools = Arc::new(ToolRegistry::with_builtins());

    println!("Registered {} tools:", tools.len());
    for t in tools.tools() {
        println!("  POST /tools/{} — {}", t.name(), t.description());
    }

    let bridge = McpBridge::new(config.clone(), pool.clone(), tools.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        Arc::new(LocalSessionManager::default()),
        Default::default(),
    );

    let state = AppState {
        config,
        pool,
        tools,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(state);

    println!("Server listening on http://{}", bind_addr);
    println!("MCP endpoint at http://{}/mcp", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
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
    /// Machine-readable error code (e.g. `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

/// Map tool execution errors to the most appropriate HTTP status. Lets
/// built-in tools signal client errors (empty keywords → 400, unknown key →
/// 404) without a custom error type in the `Tool` trait.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("No index record") {
        not_found(format!("{}: {}", tool_name, msg))
    } else if msg.contains("no longer exists") {
        // Stale index record whose blob is gone
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "storage_missing".to_string(),
            message: format!("{}: {}", tool_name, msg),
        }
    } else if msg.contains("must not be empty")
        || msg.contains("must be")
        || msg.contains("divide by zero")
        || msg.contains("Unknown")
    {
        bad_request(format!("{}: {}", tool_name, msg))
    } else {
        tool_error(format!("{}: {}", tool_name, msg))
    }
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

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.parameters_schema(),
        })
        .collect();

    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Unified tool dispatch: look up by name, validate parameters against the
/// tool's schema, execute.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let validated_params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(e.to_string()))?;

    let ctx = ToolContext::new(state.config.clone(), state.pool.clone());
    let result = tool
        .execute(validated_params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
