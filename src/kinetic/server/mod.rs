// SPDX-License-Identifier: MIT

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adk::error::FlowError;
use crate::kinetic::config::Settings;
use crate::kinetic::storage::{InMemoryStore, RunRecord};
use crate::kinetic::workflow::graph::{Graph, GraphEngine};
use crate::kinetic::workflow::registry::ToolRegistry;
use crate::kinetic::workflow::state::WorkflowState;

const SERVICE_NAME: &str = "Graphflow Workflow Engine";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
    pub store: InMemoryStore,
    pub max_iterations: usize,
}

impl AppState {
    pub fn new(registry: ToolRegistry, max_iterations: usize) -> Self {
        Self {
            registry: Arc::new(registry),
            store: InMemoryStore::new(),
            max_iterations,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/graphs", get(list_graphs))
        .route("/graph/create", post(create_graph))
        .route("/graph/run", post(run_graph))
        .route("/graph/state/{run_id}", get(get_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(settings: &Settings, registry: ToolRegistry) -> Result<(), FlowError> {
    let app = router(AppState::new(registry, settings.max_iterations));

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| FlowError::config(format!("invalid listen address: {}", e)))?;
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Error body `{"detail": ...}` with a status derived from the error kind
pub struct ApiError(FlowError);

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FlowError::NotFound { .. } => StatusCode::NOT_FOUND,
            FlowError::Graph(_)
            | FlowError::InvalidState(_)
            | FlowError::UnknownOperator(_)
            | FlowError::Json(_)
            | FlowError::Yaml(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health"
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.registry.list()))
}

async fn list_graphs(State(state): State<AppState>) -> Json<Value> {
    let mut graphs = Vec::new();
    for id in state.store.list_graphs().await {
        if let Ok(graph) = state.store.get_graph(&id).await {
            graphs.push(json!({
                "graph_id": id,
                "name": graph.name(),
                "description": graph.description(),
                "start_node": graph.start_node(),
            }));
        }
    }
    Json(json!(graphs))
}

async fn create_graph(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let graph: Graph = serde_json::from_value(payload).map_err(FlowError::from)?;
    let name = graph.name().to_string();
    let graph_id = state.store.save_graph(graph).await;

    log::info!("Created graph: {} - {}", graph_id, name);

    Ok(Json(json!({
        "graph_id": graph_id,
        "message": format!("Graph '{}' created successfully", name),
    })))
}

#[derive(Deserialize)]
struct RunGraphRequest {
    graph_id: String,
    #[serde(default)]
    initial_state: Value,
}

async fn run_graph(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let payload: RunGraphRequest = serde_json::from_value(payload).map_err(FlowError::from)?;
    let graph = state.store.get_graph(&payload.graph_id).await?;
    let initial = WorkflowState::from_value(payload.initial_state)?;

    let registry = state.registry.clone();
    let max_iterations = state.max_iterations;
    let result = tokio::task::spawn_blocking(move || {
        GraphEngine::new(&graph, &registry)
            .with_max_iterations(max_iterations)
            .execute(initial.data)
    })
    .await
    .map_err(|e| FlowError::other(format!("run aborted: {}", e)))?;

    let run = state
        .store
        .save_run(RunRecord::new(payload.graph_id, result))
        .await;

    log::info!("Executed graph {}, run ID: {}", run.graph_id, run.run_id);

    Ok(Json(json!({
        "run_id": run.run_id,
        "graph_id": run.graph_id,
        "final_state": run.final_state,
        "execution_log": run.execution_log,
        "status": run.status,
    })))
}

async fn get_state(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let run = state.store.get_run(&run_id).await?;

    Ok(Json(json!({
        "run_id": run.run_id,
        "graph_id": run.graph_id,
        "current_state": run.final_state,
        "status": run.status,
        "execution_log": run.execution_log,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let not_found = ApiError(FlowError::not_found("Run", "x")).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad = ApiError(FlowError::InvalidState("list".to_string())).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let internal = ApiError(FlowError::other("boom")).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
