//! Ejecución de consultas de rutas:
//!   1. Validación de la configuración (antes de tocar la red).
//!   2. Una única llamada al backend de grafo.
//!   3. Traducción de las rutas crudas y agregación en un grafo.
//!   4. Registro en el historial, sólo tras una respuesta completa.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::aggregate::aggregate;
use crate::backend::{translate_path, PathBackend, PathRequest};
use crate::error::{PathQueryError, PathQueryResult};
use crate::history::HistoryStore;
use crate::models::{QueryConfig, QueryResult};

pub struct PathQueryExecutor {
    backend: Arc<dyn PathBackend>,
    history: Arc<dyn HistoryStore>,
    max_hops_ceiling: u32,
}

impl PathQueryExecutor {
    pub fn new(
        backend: Arc<dyn PathBackend>,
        history: Arc<dyn HistoryStore>,
        max_hops_ceiling: u32,
    ) -> Self {
        Self {
            backend,
            history,
            max_hops_ceiling,
        }
    }

    pub fn backend(&self) -> &dyn PathBackend {
        self.backend.as_ref()
    }

    pub fn validate(&self, config: &QueryConfig) -> PathQueryResult<()> {
        if config.start_entity_type.trim().is_empty() {
            return Err(PathQueryError::Validation(
                "falta el tipo de entidad de inicio".to_string(),
            ));
        }
        if config.end_entity_type.trim().is_empty() {
            return Err(PathQueryError::Validation(
                "falta el tipo de entidad final".to_string(),
            ));
        }
        if config.max_hops < 1 || config.max_hops > self.max_hops_ceiling {
            return Err(PathQueryError::Validation(format!(
                "maxHops debe estar entre 1 y {} (recibido {})",
                self.max_hops_ceiling, config.max_hops
            )));
        }
        if let Some(blank) = config.relationship_types.iter().find(|r| r.trim().is_empty()) {
            return Err(PathQueryError::Validation(format!(
                "tipo de relación vacío en el filtro: '{blank}'"
            )));
        }
        Ok(())
    }

    /// Ejecuta la consulta. Cero rutas es un resultado válido, no un error.
    ///
    /// No reintenta: los fallos de transporte se devuelven como
    /// `BackendUnavailable` y la política de reintento es de quien llama.
    pub async fn execute(&self, config: &QueryConfig) -> PathQueryResult<QueryResult> {
        self.validate(config)?;

        let request = PathRequest::from_config(config);
        info!(
            "Consulta de rutas {} -> {} (máx. {} saltos) vía {}",
            config.start_entity_type,
            config.end_entity_type,
            config.max_hops,
            self.backend.name()
        );

        let raw_paths = self.backend.find_paths(&request).await?;
        let paths = raw_paths
            .into_iter()
            .enumerate()
            .map(|(index, raw)| translate_path(raw, index))
            .collect::<PathQueryResult<Vec<_>>>()?;

        let result = QueryResult {
            graph_data: aggregate(&paths),
            total_paths: paths.len(),
            paths,
            query_config: config.clone(),
            timestamp: Utc::now(),
        };
        info!(
            "Consulta completada: {} rutas, {} nodos, {} relaciones",
            result.total_paths,
            result.graph_data.nodes.len(),
            result.graph_data.edges.len()
        );

        // El historial escribe a disco de forma síncrona.
        let history = Arc::clone(&self.history);
        let recorded_config = config.clone();
        let total_paths = result.total_paths;
        match tokio::task::spawn_blocking(move || history.record(&recorded_config, total_paths)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => error!("No se pudo registrar la consulta en el historial: {e}"),
            Err(e) => error!("La tarea de registro del historial falló: {e}"),
        }

        Ok(result)
    }
}
