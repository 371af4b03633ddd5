//! Frontera con el backend de grafo que resuelve las rutas.
//!
//! El recorrido (qué significa "más corta", desempates, límite de rutas) lo
//! decide el backend y aquí se trata como opaco. Este módulo define:
//!   - `PathRequest`: el formato de petición en el cable.
//!   - `RawPath`/`RawNode`/`RawEdge`: la respuesta tal cual llega, con todos
//!     los campos opcionales.
//!   - `translate_path`: el único punto donde se rellenan los huecos y se
//!     convierte la respuesta en `PathResult`.

pub mod http;
pub mod neo4j;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{PathQueryError, PathQueryResult};
use crate::models::{GraphEdge, GraphNode, PathResult, QueryConfig};

pub use self::http::HttpPathBackend;
pub use self::neo4j::Neo4jPathBackend;

/// Backend capaz de devolver las rutas entre dos tipos de entidad.
#[async_trait]
pub trait PathBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn find_paths(&self, request: &PathRequest) -> PathQueryResult<Vec<RawPath>>;

    async fn health_check(&self) -> PathQueryResult<()>;
}

/// Petición tal y como viaja al backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathRequest {
    pub start_entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_entity_id: Option<String>,
    pub end_entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_entity_id: Option<String>,
    pub max_path_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_types: Option<Vec<String>>,
}

impl PathRequest {
    pub fn from_config(config: &QueryConfig) -> Self {
        let relationship_types = if config.relationship_types.is_empty() {
            None
        } else {
            Some(config.relationship_types.iter().cloned().collect())
        };

        Self {
            start_entity_type: config.start_entity_type.clone(),
            start_entity_id: non_blank(&config.start_entity_id),
            end_entity_type: config.end_entity_type.clone(),
            end_entity_id: non_blank(&config.end_entity_id),
            max_path_length: config.max_hops,
            relationship_types,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type", alias = "entity_type")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub properties: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEdge {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "start", alias = "from")]
    pub source: Option<Value>,
    #[serde(default, alias = "end", alias = "to")]
    pub target: Option<Value>,
    #[serde(default, rename = "type", alias = "relationship_type")]
    pub rel_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPath {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default, alias = "relationships")]
    pub edges: Vec<RawEdge>,
    #[serde(default, alias = "path_types")]
    pub path: Option<Vec<String>>,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Identificador textual a partir de un valor JSON (los backends mezclan
/// ids numéricos y de texto).
fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn property_str(properties: &HashMap<String, Value>, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn translate_node(raw: RawNode, path_index: usize) -> PathQueryResult<GraphNode> {
    let id = raw.id.as_ref().and_then(value_to_id).ok_or_else(|| {
        PathQueryError::BackendError(format!("la ruta {path_index} contiene un nodo sin id"))
    })?;
    let properties = raw.properties.unwrap_or_default();

    let entity_type = raw
        .entity_type
        .filter(|t| !t.is_empty())
        .or_else(|| raw.labels.and_then(|labels| labels.into_iter().next()))
        .unwrap_or_else(|| "Unknown".to_string());

    let label = raw
        .label
        .filter(|l| !l.is_empty())
        .or_else(|| property_str(&properties, "name"))
        .or_else(|| property_str(&properties, "title"))
        .unwrap_or_else(|| id.clone());

    Ok(GraphNode {
        id,
        label,
        entity_type,
        properties,
    })
}

fn translate_edge(
    raw: RawEdge,
    position: usize,
    nodes: &[GraphNode],
    path_index: usize,
) -> PathQueryResult<GraphEdge> {
    // Sin extremos explícitos, la relación i une los nodos i e i+1 de la ruta.
    let source = raw
        .source
        .as_ref()
        .and_then(value_to_id)
        .or_else(|| nodes.get(position).map(|n| n.id.clone()));
    let target = raw
        .target
        .as_ref()
        .and_then(value_to_id)
        .or_else(|| nodes.get(position + 1).map(|n| n.id.clone()));

    let (source, target) = match (source, target) {
        (Some(s), Some(t)) => (s, t),
        _ => {
            return Err(PathQueryError::BackendError(format!(
                "la relación {position} de la ruta {path_index} no tiene extremos"
            )))
        }
    };

    let rel_type = raw
        .rel_type
        .filter(|t| !t.is_empty())
        .or_else(|| raw.label.clone())
        .unwrap_or_else(|| "RELATED_TO".to_string());
    let label = raw.label.unwrap_or_else(|| rel_type.clone());

    // Un id estructural hace que la misma relación en dos rutas se fusione y
    // que dos relaciones distintas nunca colisionen.
    let id = raw
        .id
        .as_ref()
        .and_then(value_to_id)
        .unwrap_or_else(|| format!("{source}-[{rel_type}]->{target}"));

    Ok(GraphEdge {
        id,
        source,
        target,
        rel_type,
        label,
        properties: raw.properties.unwrap_or_default(),
    })
}

/// Convierte una ruta cruda del backend en un `PathResult`.
///
/// Las rutas con relaciones que apuntan a nodos ausentes o con un número de
/// relaciones distinto de `nodos - 1` se aceptan para visualización, pero se
/// registran como aviso.
pub fn translate_path(raw: RawPath, path_index: usize) -> PathQueryResult<PathResult> {
    let nodes = raw
        .nodes
        .into_iter()
        .map(|n| translate_node(n, path_index))
        .collect::<PathQueryResult<Vec<_>>>()?;

    let edges = raw
        .edges
        .into_iter()
        .enumerate()
        .map(|(position, e)| translate_edge(e, position, &nodes, path_index))
        .collect::<PathQueryResult<Vec<_>>>()?;

    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &edges {
        if !node_ids.contains(edge.source.as_str()) || !node_ids.contains(edge.target.as_str()) {
            warn!(
                "Ruta {}: la relación {} referencia nodos fuera de la ruta ({} -> {})",
                path_index, edge.id, edge.source, edge.target
            );
        }
    }
    if !nodes.is_empty() && edges.len() + 1 != nodes.len() {
        warn!(
            "Ruta {}: {} nodos y {} relaciones, no es una ruta simple",
            path_index,
            nodes.len(),
            edges.len()
        );
    }
    if let Some(reported) = raw.length {
        if reported != edges.len() {
            warn!(
                "Ruta {}: el backend indica longitud {} pero hay {} relaciones",
                path_index,
                reported,
                edges.len()
            );
        }
    }

    let path = match raw.path {
        Some(types) if types.len() == edges.len() => types,
        _ => edges.iter().map(|e| e.rel_type.clone()).collect(),
    };

    Ok(PathResult {
        length: edges.len(),
        nodes,
        edges,
        path,
        weight: raw.weight,
        confidence: raw.confidence,
    })
}
