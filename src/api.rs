use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use url::Url;

use crate::{
    app_state::AppState,
    config::GraphBackendKind,
    domain::{self, DomainInfo},
    error::{PathQueryError, PathQueryResult},
    export::{self, ExportFormat},
    models::{QueryConfig, QueryHistoryEntry, QueryResult},
    stats::{self, ResultView},
    templates::Template,
};

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize, Default)]
pub struct ViewPayload {
    #[serde(default)]
    lengths: Vec<i64>,
    /// Sin dominios se usan los `selectedDomains` de la consulta ejecutada.
    #[serde(default)]
    domains: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfo {
    backend: &'static str,
    status: &'static str,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    browser_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/domains", get(domains_handler))
        .route("/api/templates", get(list_templates_handler))
        .route("/api/templates/:id", get(apply_template_handler))
        .route("/api/query", post(execute_query_handler))
        .route("/api/query/current", get(current_result_handler))
        .route("/api/query/view", post(view_handler))
        .route("/api/query/export/:format", get(export_handler))
        .route("/api/history", get(list_history_handler))
        .route("/api/history/latest", get(latest_history_handler))
        .route(
            "/api/history/:id",
            get(load_history_handler).delete(delete_history_handler),
        )
        .route("/api/backend-info", get(backend_info_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

fn current_result(state: &AppState) -> PathQueryResult<Arc<QueryResult>> {
    state
        .current_result
        .lock()
        .map_err(|_| PathQueryError::Storage("estado de resultado envenenado".to_string()))?
        .clone()
        .ok_or(PathQueryError::NoResult)
}

// --- Handlers ---

async fn domains_handler() -> Json<Vec<DomainInfo>> {
    Json(domain::list_domains())
}

async fn list_templates_handler(State(state): State<AppState>) -> Json<Vec<Template>> {
    Json(state.templates.list_templates().to_vec())
}

async fn apply_template_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PathQueryResult<Json<QueryConfig>> {
    state.templates.apply_template(&id).map(Json)
}

#[axum::debug_handler]
async fn execute_query_handler(
    State(state): State<AppState>,
    Json(config): Json<QueryConfig>,
) -> PathQueryResult<Json<QueryResult>> {
    let outcome = match state.config.query_timeout {
        Some(limit) => tokio::time::timeout(limit, state.executor.execute(&config))
            .await
            .map_err(|_| {
                PathQueryError::BackendUnavailable(format!(
                    "la consulta superó el límite de {} s",
                    limit.as_secs()
                ))
            })?,
        None => state.executor.execute(&config).await,
    };

    let result = match outcome {
        Ok(result) => Arc::new(result),
        Err(e) => {
            error!("Error ejecutando la consulta de rutas: {}", e);
            return Err(e);
        }
    };

    *state
        .current_result
        .lock()
        .map_err(|_| PathQueryError::Storage("estado de resultado envenenado".to_string()))? =
        Some(result.clone());

    Ok(Json(result.as_ref().clone()))
}

async fn current_result_handler(
    State(state): State<AppState>,
) -> PathQueryResult<Json<QueryResult>> {
    let result = current_result(&state)?;
    Ok(Json(result.as_ref().clone()))
}

async fn view_handler(
    State(state): State<AppState>,
    Json(payload): Json<ViewPayload>,
) -> PathQueryResult<Json<ResultView>> {
    let lengths = stats::parse_lengths(&payload.lengths)?;
    let result = current_result(&state)?;
    let domains = match &payload.domains {
        Some(raw) => stats::parse_domains(raw)?,
        None => result.query_config.selected_domains.clone(),
    };
    Ok(Json(stats::build_view(&result.paths, &lengths, &domains)))
}

async fn export_handler(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> PathQueryResult<impl IntoResponse> {
    let format: ExportFormat = format.parse()?;
    let result = current_result(&state)?;
    let body = export::export(&result, format)?;

    let disposition = format!(
        "attachment; filename=\"path_query_{}.{}\"",
        result.timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

async fn list_history_handler(
    State(state): State<AppState>,
) -> PathQueryResult<Json<Vec<QueryHistoryEntry>>> {
    state.history.list().map(Json)
}

async fn latest_history_handler(
    State(state): State<AppState>,
) -> PathQueryResult<Json<QueryConfig>> {
    state
        .history
        .latest()?
        .map(|entry| Json(entry.config))
        .ok_or(PathQueryError::NoResult)
}

async fn load_history_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PathQueryResult<Json<QueryConfig>> {
    state.history.load(&id).map(Json)
}

async fn delete_history_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PathQueryResult<StatusCode> {
    state.history.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// URL del Neo4j Browser para el host del URI bolt/neo4j configurado.
fn neo4j_browser_url(uri: &str) -> String {
    let host = Url::parse(uri)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string());
    format!("http://{host}:7474")
}

async fn backend_info_handler(State(state): State<AppState>) -> Json<BackendInfo> {
    let backend = state.executor.backend();
    let (target, browser_url) = match state.config.backend {
        GraphBackendKind::Http => (state.config.graph_api_url.clone(), None),
        GraphBackendKind::Neo4j => {
            let browser_url = neo4j_browser_url(&state.config.neo4j_uri);
            (state.config.neo4j_uri.clone(), Some(browser_url))
        }
    };

    let (status, detail) = match backend.health_check().await {
        Ok(()) => ("ok", None),
        Err(e) => {
            error!("Error en el health check del backend {}: {}", backend.name(), e);
            ("unavailable", Some(e.to_string()))
        }
    };

    Json(BackendInfo {
        backend: backend.name(),
        status,
        target,
        browser_url,
        detail,
    })
}

// --- Handler de Apagado ---

async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Ok(mut sender) = state.shutdown_sender.lock() {
        if let Some(sender) = sender.take() {
            let _ = sender.send(());
        }
    }
    (StatusCode::OK, Json(json!({ "message": "Apagando el servidor." })))
}
