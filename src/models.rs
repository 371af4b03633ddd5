//! Modelos de dominio: entidades y relaciones de una ruta, configuración de
//! consulta, resultados agregados y entradas del historial.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{self, Domain};

/// Nodo del grafo de visualización. Su identidad es `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl GraphNode {
    pub fn domain(&self) -> Domain {
        domain::classify(&self.entity_type)
    }
}

/// Relación entre dos nodos. `id` es único en todo el resultado agregado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub label: String,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

/// Una ruta devuelta por el backend, ya tipada.
///
/// Para una ruta simple `edges.len() == nodes.len() - 1` y `length == edges.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub length: usize,
    /// Tipos de relación en orden de recorrido.
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Unión deduplicada de nodos y relaciones de un conjunto de rutas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Parámetros de una consulta de rutas entre dominios.
///
/// Los conjuntos vacíos significan "sin restricción" y se serializan siempre,
/// de modo que un conjunto vacío nunca se confunde con un campo ausente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    pub start_entity_type: String,
    #[serde(default)]
    pub start_entity_id: Option<String>,
    pub end_entity_type: String,
    #[serde(default)]
    pub end_entity_id: Option<String>,
    pub max_hops: u32,
    #[serde(default)]
    pub relationship_types: BTreeSet<String>,
    #[serde(default)]
    pub selected_domains: BTreeSet<Domain>,
}

impl QueryConfig {
    /// Nombre corto para mostrar en el historial.
    pub fn display_name(&self) -> String {
        format!("{} → {}", self.start_entity_type, self.end_entity_type)
    }
}

/// Resultado inmutable de una ejecución. `graph_data` siempre se deriva de `paths`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub paths: Vec<PathResult>,
    pub graph_data: GraphData,
    pub query_config: QueryConfig,
    pub timestamp: DateTime<Utc>,
    pub total_paths: usize,
}

/// Entrada del historial de consultas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHistoryEntry {
    pub id: String,
    pub name: String,
    pub config: QueryConfig,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}
