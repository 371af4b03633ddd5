//! Backend Neo4j: resuelve las rutas directamente con `allShortestPaths`.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use neo4rs::{query, Graph, Row};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{PathBackend, PathRequest, RawEdge, RawNode, RawPath};
use crate::config::AppConfig;
use crate::error::{PathQueryError, PathQueryResult};

pub async fn connect_from_config(cfg: &AppConfig) -> Result<Graph> {
    let url = Url::parse(&cfg.neo4j_uri)?;
    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(7687);
    let addr = format!("{host}:{port}");

    info!("Conectando a Neo4j en {addr}...");
    let graph = Graph::new(&addr, &cfg.neo4j_user, &cfg.neo4j_password).await?;
    info!("Conexión a Neo4j OK");
    Ok(graph)
}

pub struct Neo4jPathBackend {
    graph: Graph,
    path_limit: i64,
}

impl Neo4jPathBackend {
    pub fn new(graph: Graph, path_limit: i64) -> Self {
        Self { graph, path_limit }
    }
}

/// Las etiquetas no admiten parámetros en Cypher, así que sólo se aceptan
/// identificadores simples.
fn label_identifier(entity_type: &str) -> PathQueryResult<&str> {
    let valid = !entity_type.is_empty()
        && entity_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(entity_type)
    } else {
        Err(PathQueryError::Validation(format!(
            "el tipo de entidad '{entity_type}' no es un identificador válido"
        )))
    }
}

fn build_cypher(request: &PathRequest) -> PathQueryResult<String> {
    let start = label_identifier(&request.start_entity_type)?;
    let end = label_identifier(&request.end_entity_type)?;
    let max_hops = request.max_path_length;

    Ok(format!(
        "MATCH (s:`{start}`), (e:`{end}`)
         WHERE ($start_id = '' OR toString(s.id) = $start_id)
           AND ($end_id = '' OR toString(e.id) = $end_id)
           AND s <> e
         MATCH p = allShortestPaths((s)-[*1..{max_hops}]-(e))
         WHERE size($rel_types) = 0 OR all(r IN relationships(p) WHERE type(r) IN $rel_types)
         RETURN
           [n IN nodes(p) | toString(coalesce(n.id, elementId(n)))] AS node_ids,
           [n IN nodes(p) | toString(coalesce(n.name, n.title, n.id, elementId(n)))] AS node_labels,
           [n IN nodes(p) | coalesce(head(labels(n)), 'Unknown')] AS node_types,
           [r IN relationships(p) | elementId(r)] AS rel_ids,
           [r IN relationships(p) | type(r)] AS rel_types,
           [r IN relationships(p) | toString(coalesce(startNode(r).id, elementId(startNode(r))))] AS rel_sources,
           [r IN relationships(p) | toString(coalesce(endNode(r).id, elementId(endNode(r))))] AS rel_targets
         LIMIT $limit"
    ))
}

fn column(row: &Row, name: &str) -> PathQueryResult<Vec<String>> {
    row.get::<Vec<String>>(name).ok_or_else(|| {
        PathQueryError::BackendError(format!("Falta la columna '{name}' en el resultado de Neo4j"))
    })
}

fn row_to_raw_path(row: &Row) -> PathQueryResult<RawPath> {
    let node_ids = column(row, "node_ids")?;
    let node_labels = column(row, "node_labels")?;
    let node_types = column(row, "node_types")?;
    let rel_ids = column(row, "rel_ids")?;
    let rel_types = column(row, "rel_types")?;
    let rel_sources = column(row, "rel_sources")?;
    let rel_targets = column(row, "rel_targets")?;

    let nodes = node_ids
        .into_iter()
        .zip(node_labels)
        .zip(node_types)
        .map(|((id, label), entity_type)| RawNode {
            id: Some(Value::String(id)),
            label: Some(label),
            entity_type: Some(entity_type),
            labels: None,
            properties: Some(HashMap::new()),
        })
        .collect();

    let path = rel_types.clone();
    let edges = rel_ids
        .into_iter()
        .zip(rel_types)
        .zip(rel_sources.into_iter().zip(rel_targets))
        .map(|((id, rel_type), (source, target))| RawEdge {
            id: Some(Value::String(id)),
            source: Some(Value::String(source)),
            target: Some(Value::String(target)),
            rel_type: Some(rel_type),
            label: None,
            properties: None,
        })
        .collect();

    Ok(RawPath {
        nodes,
        edges,
        path: Some(path),
        length: None,
        weight: None,
        confidence: None,
    })
}

/// Fallos de transporte o de pool son reintentables; las respuestas de fallo
/// del servidor (Cypher inválido, función inexistente) no.
fn driver_error(err: neo4rs::Error) -> PathQueryError {
    match err {
        neo4rs::Error::IOError { .. }
        | neo4rs::Error::ConnectionError
        | neo4rs::Error::InvalidDnsName(_) => PathQueryError::BackendUnavailable(err.to_string()),
        other => PathQueryError::BackendError(other.to_string()),
    }
}

#[async_trait]
impl PathBackend for Neo4jPathBackend {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    async fn find_paths(&self, request: &PathRequest) -> PathQueryResult<Vec<RawPath>> {
        let cypher = build_cypher(request)?;
        let rel_types = request.relationship_types.clone().unwrap_or_default();

        let mut cursor = self
            .graph
            .execute(
                query(&cypher)
                    .param("start_id", request.start_entity_id.clone().unwrap_or_default())
                    .param("end_id", request.end_entity_id.clone().unwrap_or_default())
                    .param("rel_types", rel_types)
                    .param("limit", self.path_limit),
            )
            .await
            .map_err(driver_error)?;

        let mut paths = Vec::new();
        while let Some(row) = cursor
            .next()
            .await
            .map_err(driver_error)?
        {
            paths.push(row_to_raw_path(&row)?);
        }
        debug!("Neo4j devolvió {} rutas", paths.len());
        Ok(paths)
    }

    async fn health_check(&self) -> PathQueryResult<()> {
        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(driver_error)
    }
}
