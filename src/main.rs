// Módulos de la aplicación
mod aggregate;
mod api;
mod app_state;
mod backend;
mod config;
mod domain;
mod error;
mod executor;
mod export;
mod history;
mod models;
mod stats;
mod templates;

use crate::app_state::AppState;
use crate::backend::{HttpPathBackend, Neo4jPathBackend, PathBackend};
use crate::config::{AppConfig, GraphBackendKind};
use crate::executor::PathQueryExecutor;
use crate::history::{FileHistoryStore, HistoryStore};
use crate::templates::TemplateCatalog;
use anyhow::{Context, Result};
use axum::Router;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn build_backend(cfg: &AppConfig) -> Result<Arc<dyn PathBackend>> {
    match cfg.backend {
        GraphBackendKind::Http => {
            info!("Usando el servicio de rutas remoto en {}", cfg.graph_api_url);
            Ok(Arc::new(HttpPathBackend::new(&cfg.graph_api_url)))
        }
        GraphBackendKind::Neo4j => {
            let graph = backend::neo4j::connect_from_config(cfg)
                .await
                .context("Error conectando a Neo4j")?;
            Ok(Arc::new(Neo4jPathBackend::new(graph, cfg.neo4j_path_limit)))
        }
    }
}

async fn run() -> Result<()> {
    // 1. Cargar configuración
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;

    // 2. Backend de grafo e historial persistente
    let backend = build_backend(&cfg).await?;
    if let Err(e) = backend.health_check().await {
        error!("El backend {} no responde todavía: {}", backend.name(), e);
    }

    let history_store = FileHistoryStore::open(&cfg.history_path, cfg.history_capacity)
        .context("Error abriendo el historial de consultas")?;
    info!("Historial de consultas en {}", history_store.path().display());
    let history: Arc<dyn HistoryStore> = Arc::new(history_store);

    let executor = PathQueryExecutor::new(backend, history.clone(), cfg.max_hops_ceiling);

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 3. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        executor: Arc::new(executor),
        history,
        templates: Arc::new(TemplateCatalog::builtin()),
        current_result: Arc::new(Mutex::new(None)),
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    // 4. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .fallback_service(ServeDir::new("frontend"))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 5. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    let server_url = format!("http://{}", server_addr);
    info!("🚀 Servidor escuchando en {}", &server_url);

    if app_state.config.open_browser && webbrowser::open(&server_url).is_err() {
        info!("No se pudo abrir el navegador. Por favor, accede a {} manualmente.", server_url);
    }

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
